//! Transaction-level helpers: identity, coinbase detection, dust thresholds

use crate::constants::*;
use crate::serialization::{serialize_transaction, serialized_output_size};
use crate::types::*;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};

/// Check if transaction is coinbase
///
/// A coinbase has exactly one input spending the null outpoint.
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1
        && tx.inputs[0].prevout.hash == [0u8; 32]
        && tx.inputs[0].prevout.index == COINBASE_PREVOUT_INDEX
}

/// TxId = SHA256(SHA256(Serialize(tx)))
pub fn calculate_tx_id(tx: &Transaction) -> Hash {
    sha256d::Hash::hash(&serialize_transaction(tx)).into_inner()
}

/// Transaction id in the conventional byte-reversed hex form
pub fn tx_id_hex(tx: &Transaction) -> String {
    sha256d::Hash::from_inner(calculate_tx_id(tx)).to_string()
}

/// Output at `index`, or `None` when the index does not exist
pub fn output_at(tx: &Transaction, index: Natural) -> Option<&TransactionOutput> {
    usize::try_from(index).ok().and_then(|i| tx.outputs.get(i))
}

/// Smallest value an output may carry without being dust
///
/// MinNonDust(o) = fee_per_kb × (|Serialize(o)| + 148) / 1000
pub fn min_non_dust_value(output: &TransactionOutput, fee_per_kb: Integer) -> Integer {
    let size = (serialized_output_size(output) + DUST_SPEND_INPUT_SIZE) as Integer;
    fee_per_kb.saturating_mul(size) / 1000
}

/// Check if an output's value is below its dust threshold
pub fn is_dust(output: &TransactionOutput, fee_per_kb: Integer) -> bool {
    output.value < min_non_dust_value(output, fee_per_kb)
}
