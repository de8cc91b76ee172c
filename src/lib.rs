//! # Relay-Policy
//!
//! Transaction standardness rules used to judge whether an unconfirmed
//! transaction is the kind the reference client would relay.
//!
//! A transaction that pays us but that most of the network refuses to relay
//! is a risk: it may never confirm. This crate evaluates a transaction and its
//! known parents against a fixed policy and refines a caller-supplied baseline
//! risk check with the result.
//!
//! ## Architecture
//!
//! - Script parsing and shape recognition (`script`, `standard`)
//! - Per-transaction structural rules (`structure`)
//! - Standardness of a transaction against its parents (`evaluator`)
//! - Risk analysis composing a baseline with standardness (`risk`)
//!
//! ## Usage
//!
//! ```rust
//! use relay_policy::RelayPolicy;
//! use relay_policy::script::{p2pkh_script, push_data};
//! use relay_policy::types::*;
//!
//! let policy = RelayPolicy::new();
//!
//! let mut script_sig = Vec::new();
//! push_data(&mut script_sig, &[0x30; 71]);
//! push_data(&mut script_sig, &[0x02; 33]);
//!
//! let transaction = Transaction {
//!     version: 1,
//!     inputs: vec![TransactionInput {
//!         prevout: OutPoint { hash: [1; 32], index: 0 },
//!         script_sig,
//!         sequence: 0xffffffff,
//!     }],
//!     outputs: vec![TransactionOutput {
//!         value: 10_000,
//!         script_pubkey: p2pkh_script(&[7; 20]),
//!     }],
//!     lock_time: 0,
//! };
//! let analysis = policy.analyze(&transaction, &[], relay_policy::PermissiveBaseline);
//! assert_eq!(analysis.result(), RiskResult::Ok);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod config;
pub mod opcodes;
pub mod script;
pub mod serialization;
pub mod transaction;
pub mod standard;
pub mod structure;
pub mod evaluator;
pub mod risk;
pub mod pool;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{PolicyError, Result};
pub use config::PolicyConfig;
pub use evaluator::{evaluate, StandardnessCheck, StandardnessEvaluator, TransactionLookup, Violation};
pub use pool::TransactionPool;
pub use risk::{BaselineRiskCheck, PermissiveBaseline, RiskAnalysis, RiskAnalyzer};
pub use standard::StandardScript;
pub use structure::NonStandardReason;

use script::Script;

/// Relay policy under one configuration
///
/// # Examples
///
/// ```
/// use relay_policy::{RelayPolicy, StandardScript};
/// use relay_policy::script::p2sh_script;
///
/// let policy = RelayPolicy::new();
/// let script_pubkey = p2sh_script(&[0x51]);
/// assert_eq!(policy.classify(&script_pubkey), Some(StandardScript::PayToScriptHash));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelayPolicy {
    evaluator: StandardnessEvaluator,
}

impl RelayPolicy {
    /// Create a policy with the reference client's defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy from a validated configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::{PolicyConfig, RelayPolicy};
    ///
    /// let config = PolicyConfig::from_json_str(r#"{"max_multisig_n": 2}"#).unwrap();
    /// let policy = RelayPolicy::with_config(config).unwrap();
    /// assert_eq!(policy.config().max_multisig_n, 2);
    /// ```
    pub fn with_config(config: PolicyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            evaluator: StandardnessEvaluator::new(config),
        })
    }

    pub fn config(&self) -> &PolicyConfig {
        self.evaluator.config()
    }

    /// Standard shape of a raw locking script, if it has one
    pub fn classify(&self, script_pubkey: &[u8]) -> Option<StandardScript> {
        let script = Script::parse(script_pubkey).ok()?;
        standard::classify_script_pubkey(&script, self.config())
    }

    /// Number of unlocking elements a standard spend of `script_pubkey` carries
    ///
    /// `script_sig` is only consulted for pay-to-script-hash, where its last
    /// element is the redeem script.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::RelayPolicy;
    /// use relay_policy::script::{p2pkh_script, p2sh_script, push_data};
    ///
    /// let policy = RelayPolicy::new();
    /// assert_eq!(policy.args_required(&p2pkh_script(&[1; 20]), &[]), Some(2));
    ///
    /// let redeem = p2pkh_script(&[2; 20]);
    /// let mut script_sig = Vec::new();
    /// push_data(&mut script_sig, &redeem);
    /// assert_eq!(policy.args_required(&p2sh_script(&redeem), &script_sig), Some(3));
    /// ```
    pub fn args_required(&self, script_pubkey: &[u8], script_sig: &[u8]) -> Option<usize> {
        let script_pubkey = Script::parse(script_pubkey).ok()?;
        let script_sig = Script::parse(script_sig).ok()?;
        standard::script_args_required(&script_pubkey, Some(&script_sig), self.config())
    }

    /// First transaction found non-standard, `tx` itself or one of its parents
    pub fn evaluate<'a, L: TransactionLookup<'a>>(
        &self,
        tx: &'a Transaction,
        dependencies: L,
    ) -> Option<&'a Transaction> {
        self.evaluator.evaluate(tx, dependencies)
    }

    /// Run a risk analysis of `tx` with `baseline` consulted first
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::{PermissiveBaseline, RelayPolicy, RiskResult, TransactionPool};
    /// use relay_policy::script::{p2pkh_script, push_data};
    /// use relay_policy::types::*;
    ///
    /// let mut pool = TransactionPool::new();
    /// let parent_id = pool.insert(Transaction {
    ///     version: 1,
    ///     inputs: vec![TransactionInput {
    ///         prevout: OutPoint { hash: [1; 32], index: 0 },
    ///         script_sig: vec![],
    ///         sequence: 0xffffffff,
    ///     }],
    ///     outputs: vec![TransactionOutput { value: 20_000, script_pubkey: p2pkh_script(&[1; 20]) }],
    ///     lock_time: 0,
    /// });
    ///
    /// let mut script_sig = Vec::new();
    /// push_data(&mut script_sig, &[0x30; 71]);
    /// push_data(&mut script_sig, &[0x02; 33]);
    /// let child = Transaction {
    ///     version: 1,
    ///     inputs: vec![TransactionInput {
    ///         prevout: OutPoint { hash: parent_id, index: 0 },
    ///         script_sig,
    ///         sequence: 0xffffffff,
    ///     }],
    ///     outputs: vec![TransactionOutput { value: 10_000, script_pubkey: p2pkh_script(&[2; 20]) }],
    ///     lock_time: 0,
    /// };
    ///
    /// let policy = RelayPolicy::new();
    /// let analysis = policy.analyze(&child, pool.dependencies_of(&child), PermissiveBaseline);
    /// assert_eq!(analysis.result(), RiskResult::Ok);
    /// ```
    pub fn analyze<'a, D, B>(&self, tx: &'a Transaction, dependencies: D, baseline: B) -> RiskAnalysis<'a>
    where
        D: IntoIterator<Item = &'a Transaction>,
        B: BaselineRiskCheck,
    {
        RiskAnalyzer::with_standardness(tx, dependencies, baseline, self.evaluator.clone()).analyze()
    }
}
