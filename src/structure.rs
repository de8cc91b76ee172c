//! Structural standardness checks: canonical encoding, unlocking script
//! shape, and locking script + dust rules
//!
//! Each check returns the first rule a transaction breaks. None of them
//! depend on other transactions.

use crate::config::PolicyConfig;
use crate::script::Script;
use crate::serialization::{deserialize_transaction, serialize_transaction};
use crate::standard::{classify_script_pubkey, StandardScript};
use crate::transaction::{is_dust, min_non_dust_value};
use crate::types::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule a transaction (or the script it spends) failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonStandardReason {
    #[error("version {0} is not standard")]
    Version(u64),

    #[error("non-canonical encoding: {0}")]
    NonCanonicalEncoding(String),

    #[error("input {input}: unlocking script of {size} bytes exceeds {max}")]
    ScriptSigTooLarge { input: usize, size: usize, max: usize },

    #[error("input {input}: unlocking script cannot be parsed")]
    UnparseableScriptSig { input: usize },

    #[error("input {input}: unlocking script contains non-push opcodes")]
    ScriptSigNotPushOnly { input: usize },

    #[error("output {output}: locking script is not a standard shape")]
    NonStandardScriptPubKey { output: usize },

    #[error("output {output}: multisig with n={n}, m={m} is out of bounds")]
    MultisigOutOfBounds { output: usize, n: u8, m: u8 },

    #[error("output {output}: more than one data output")]
    MultipleDataOutputs { output: usize },

    #[error("output {output}: value {value} is below dust threshold {threshold}")]
    Dust { output: usize, value: Integer, threshold: Integer },

    #[error("input {input}: spent locking script has no standard argument count")]
    IndeterminateScriptArgs { input: usize },

    #[error("input {input}: unlocking script has {actual} elements, {expected} required")]
    ScriptArgCountMismatch { input: usize, expected: usize, actual: usize },
}

/// Version and round-trip checks
///
/// The transaction is serialized, parsed back, and serialized again. The
/// round trip must reproduce identical bytes and an identical transaction.
pub fn check_canonical_encoding(
    tx: &Transaction,
    config: &PolicyConfig,
) -> Result<(), NonStandardReason> {
    if tx.version != config.max_standard_version {
        return Err(NonStandardReason::Version(tx.version));
    }

    let original = serialize_transaction(tx);
    let reparsed = deserialize_transaction(&original)
        .map_err(|e| NonStandardReason::NonCanonicalEncoding(e.to_string()))?;
    let reserialized = serialize_transaction(&reparsed);

    if original.len() != reserialized.len() || original != reserialized {
        return Err(NonStandardReason::NonCanonicalEncoding(format!(
            "re-serialization produced {} bytes from {}",
            reserialized.len(),
            original.len()
        )));
    }

    if reparsed != *tx {
        return Err(NonStandardReason::NonCanonicalEncoding(
            "fields do not survive the wire format".to_string(),
        ));
    }

    Ok(())
}

/// Whether raw wire bytes are the canonical encoding of the transaction they hold
pub fn is_canonical_serialization(raw: &[u8]) -> bool {
    match deserialize_transaction(raw) {
        Ok(tx) => serialize_transaction(&tx) == raw,
        Err(_) => false,
    }
}

/// Every unlocking script must be small and push-only
pub fn check_script_sigs(tx: &Transaction, config: &PolicyConfig) -> Result<(), NonStandardReason> {
    for (i, input) in tx.inputs.iter().enumerate() {
        if input.script_sig.len() > config.max_script_sig_size {
            return Err(NonStandardReason::ScriptSigTooLarge {
                input: i,
                size: input.script_sig.len(),
                max: config.max_script_sig_size,
            });
        }

        let script_sig = Script::parse(&input.script_sig)
            .map_err(|_| NonStandardReason::UnparseableScriptSig { input: i })?;
        if script_sig.has_non_push_opcodes() {
            return Err(NonStandardReason::ScriptSigNotPushOnly { input: i });
        }
    }

    Ok(())
}

/// Every output must be a standard shape and, unless it carries data, not dust
///
/// Bare multisig needs `1 <= n <= max` and `1 <= m <= n`, where `n` is the
/// first small integer and `m` the second. Only one data output is permitted
/// per transaction.
pub fn check_outputs(tx: &Transaction, config: &PolicyConfig) -> Result<(), NonStandardReason> {
    let mut already_had_data_out = false;

    for (i, output) in tx.outputs.iter().enumerate() {
        let script_pubkey = Script::parse(&output.script_pubkey)
            .map_err(|_| NonStandardReason::NonStandardScriptPubKey { output: i })?;

        match classify_script_pubkey(&script_pubkey, config) {
            Some(StandardScript::Multisig { n, m }) => {
                if n < 1 || n > config.max_multisig_n || m < 1 || m > n {
                    return Err(NonStandardReason::MultisigOutOfBounds { output: i, n, m });
                }
            }
            Some(StandardScript::NullData) => {
                if already_had_data_out {
                    return Err(NonStandardReason::MultipleDataOutputs { output: i });
                }
                already_had_data_out = true;
                // Data outputs are exempt from the dust check
                continue;
            }
            Some(_) => {}
            None => return Err(NonStandardReason::NonStandardScriptPubKey { output: i }),
        }

        if is_dust(output, config.dust_relay_fee_per_kb) {
            return Err(NonStandardReason::Dust {
                output: i,
                value: output.value,
                threshold: min_non_dust_value(output, config.dust_relay_fee_per_kb),
            });
        }
    }

    Ok(())
}
