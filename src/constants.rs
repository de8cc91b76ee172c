//! Relay policy constants (reference client defaults)

/// Only version 1 transactions are considered standard
pub const MAX_STANDARD_VERSION: u64 = 1;

/// Maximum serialized size of a standard unlocking script
pub const MAX_STANDARD_SCRIPT_SIG_SIZE: usize = 500;

/// Maximum payload of the single push allowed after OP_RETURN
pub const MAX_DATA_CARRIER_BYTES: usize = 80;

/// Smallest public key push accepted in pay-to-pubkey and multisig scripts
pub const MIN_PUBKEY_PUSH_SIZE: usize = 33;

/// Largest public key push tolerated in pay-to-pubkey and multisig scripts
pub const MAX_PUBKEY_PUSH_SIZE: usize = 120;

/// Largest first small integer (n) in a standard bare multisig output
pub const MAX_STANDARD_MULTISIG_N: u8 = 3;

/// Reference default minimum fee per kB
pub const REFERENCE_DEFAULT_MIN_TX_FEE: i64 = 10_000;

/// Fee rate per kB used for dust: three times the reference minimum
pub const DUST_RELAY_FEE_PER_KB: i64 = 3 * REFERENCE_DEFAULT_MIN_TX_FEE;

/// Serialized size of a typical input spending an output (outpoint, signature, key, sequence)
pub const DUST_SPEND_INPUT_SIZE: usize = 148;

/// Previous output index marking a coinbase input
pub const COINBASE_PREVOUT_INDEX: u64 = 0xffffffff;
