//! Standardness evaluation of a transaction against its known parents

use crate::config::PolicyConfig;
use crate::script::Script;
use crate::standard::script_args_required;
use crate::structure::{check_canonical_encoding, check_outputs, check_script_sigs, NonStandardReason};
use crate::transaction::{is_coinbase, output_at, tx_id_hex};
use crate::types::*;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Hash-to-transaction lookup over parents of the transactions under analysis
///
/// A missing entry is normal: the parent is simply unknown.
pub trait TransactionLookup<'a> {
    fn lookup(&self, hash: &Hash) -> Option<&'a Transaction>;
}

impl<'a, 'm> TransactionLookup<'a> for &'m HashMap<Hash, &'a Transaction> {
    fn lookup(&self, hash: &Hash) -> Option<&'a Transaction> {
        self.get(hash).copied()
    }
}

impl<'a> TransactionLookup<'a> for &'a HashMap<Hash, Transaction> {
    fn lookup(&self, hash: &Hash) -> Option<&'a Transaction> {
        let map: &'a HashMap<Hash, Transaction> = *self;
        map.get(hash)
    }
}

/// First rule broken, and the transaction it is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation<'a> {
    pub offender: &'a Transaction,
    pub reason: NonStandardReason,
}

/// Capability the risk analyzer composes to judge one transaction
pub trait StandardnessCheck {
    fn check<'a>(
        &self,
        tx: &'a Transaction,
        dependencies: &DependencyMap<'a>,
    ) -> Option<Violation<'a>>;
}

/// Evaluates transactions under a fixed policy
#[derive(Debug, Clone, Default)]
pub struct StandardnessEvaluator {
    config: PolicyConfig,
}

impl StandardnessEvaluator {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// IsStandard: 𝒯𝒳 × 𝒟 → 𝒯𝒳?
    ///
    /// Returns the first transaction found to be non-standard, or `None`.
    pub fn evaluate<'a, L: TransactionLookup<'a>>(
        &self,
        tx: &'a Transaction,
        dependencies: L,
    ) -> Option<&'a Transaction> {
        self.find_violation(tx, dependencies).map(|v| v.offender)
    }

    /// Like [`evaluate`](Self::evaluate), also reporting the rule broken
    ///
    /// 1. Canonical encoding and version
    /// 2. Unlocking script size and push-only shape, per input
    /// 3. Locking script shape and dust, per output
    /// 4. Unless coinbase: each input's unlocking script must carry exactly the
    ///    number of elements its parent's locking script requires. Inputs
    ///    whose parent (or parent output) is unknown are skipped. A failure
    ///    here is attributed to the parent.
    pub fn find_violation<'a, L: TransactionLookup<'a>>(
        &self,
        tx: &'a Transaction,
        dependencies: L,
    ) -> Option<Violation<'a>> {
        let structural = check_canonical_encoding(tx, &self.config)
            .and_then(|_| check_script_sigs(tx, &self.config))
            .and_then(|_| check_outputs(tx, &self.config));
        if let Err(reason) = structural {
            return Some(self.reject(tx, reason));
        }

        if is_coinbase(tx) {
            return None;
        }

        for (i, input) in tx.inputs.iter().enumerate() {
            let parent = match dependencies.lookup(&input.prevout.hash) {
                Some(parent) => parent,
                None => {
                    trace!(input = i, "parent transaction unknown, skipping input");
                    continue;
                }
            };
            let prev_out = match output_at(parent, input.prevout.index) {
                Some(prev_out) => prev_out,
                None => {
                    trace!(input = i, index = input.prevout.index, "parent has no such output, skipping input");
                    continue;
                }
            };

            let script_sig = match Script::parse(&input.script_sig) {
                Ok(script_sig) => script_sig,
                Err(_) => return Some(self.reject(tx, NonStandardReason::UnparseableScriptSig { input: i })),
            };

            let required = Script::parse(&prev_out.script_pubkey)
                .ok()
                .and_then(|script_pubkey| {
                    script_args_required(&script_pubkey, Some(&script_sig), &self.config)
                });

            let reason = match required {
                None => NonStandardReason::IndeterminateScriptArgs { input: i },
                Some(expected) if script_sig.chunks().len() != expected => {
                    NonStandardReason::ScriptArgCountMismatch {
                        input: i,
                        expected,
                        actual: script_sig.chunks().len(),
                    }
                }
                Some(_) => continue,
            };
            return Some(self.reject(parent, reason));
        }

        None
    }

    fn reject<'a>(&self, offender: &'a Transaction, reason: NonStandardReason) -> Violation<'a> {
        debug!(tx = %tx_id_hex(offender), %reason, "transaction is non-standard");
        Violation { offender, reason }
    }
}

impl StandardnessCheck for StandardnessEvaluator {
    fn check<'a>(
        &self,
        tx: &'a Transaction,
        dependencies: &DependencyMap<'a>,
    ) -> Option<Violation<'a>> {
        self.find_violation(tx, dependencies)
    }
}

/// Evaluate `tx` under the default policy
pub fn evaluate<'a, L: TransactionLookup<'a>>(
    tx: &'a Transaction,
    dependencies: L,
) -> Option<&'a Transaction> {
    StandardnessEvaluator::default().evaluate(tx, dependencies)
}
