//! Policy configuration
//!
//! Every field defaults to the reference client's standardness policy. Callers
//! may load overrides from JSON; omitted fields keep their defaults.

use crate::constants::*;
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};

/// Standardness policy parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// The only transaction version considered standard
    #[serde(default = "default_max_standard_version")]
    pub max_standard_version: u64,

    /// Maximum serialized size of an unlocking script (bytes)
    #[serde(default = "default_max_script_sig_size")]
    pub max_script_sig_size: usize,

    /// Maximum payload of the push following OP_RETURN (bytes)
    #[serde(default = "default_max_data_carrier_bytes")]
    pub max_data_carrier_bytes: usize,

    /// Public key push length bounds for pay-to-pubkey and multisig
    #[serde(default = "default_min_pubkey_push")]
    pub min_pubkey_push: usize,

    #[serde(default = "default_max_pubkey_push")]
    pub max_pubkey_push: usize,

    /// Upper bound on a bare multisig output's first small integer
    #[serde(default = "default_max_multisig_n")]
    pub max_multisig_n: u8,

    /// Fee rate per kB the dust threshold is derived from
    #[serde(default = "default_dust_relay_fee_per_kb")]
    pub dust_relay_fee_per_kb: i64,
}

fn default_max_standard_version() -> u64 {
    MAX_STANDARD_VERSION
}

fn default_max_script_sig_size() -> usize {
    MAX_STANDARD_SCRIPT_SIG_SIZE
}

fn default_max_data_carrier_bytes() -> usize {
    MAX_DATA_CARRIER_BYTES
}

fn default_min_pubkey_push() -> usize {
    MIN_PUBKEY_PUSH_SIZE
}

fn default_max_pubkey_push() -> usize {
    MAX_PUBKEY_PUSH_SIZE
}

fn default_max_multisig_n() -> u8 {
    MAX_STANDARD_MULTISIG_N
}

fn default_dust_relay_fee_per_kb() -> i64 {
    DUST_RELAY_FEE_PER_KB
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_standard_version: MAX_STANDARD_VERSION,
            max_script_sig_size: MAX_STANDARD_SCRIPT_SIG_SIZE,
            max_data_carrier_bytes: MAX_DATA_CARRIER_BYTES,
            min_pubkey_push: MIN_PUBKEY_PUSH_SIZE,
            max_pubkey_push: MAX_PUBKEY_PUSH_SIZE,
            max_multisig_n: MAX_STANDARD_MULTISIG_N,
            dust_relay_fee_per_kb: DUST_RELAY_FEE_PER_KB,
        }
    }
}

impl PolicyConfig {
    /// Load a configuration from JSON, filling omitted fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PolicyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations no script could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.min_pubkey_push > self.max_pubkey_push {
            return Err(PolicyError::Config(format!(
                "min_pubkey_push ({}) exceeds max_pubkey_push ({})",
                self.min_pubkey_push, self.max_pubkey_push
            )));
        }
        if self.max_multisig_n > 16 {
            return Err(PolicyError::Config(format!(
                "max_multisig_n ({}) exceeds the largest small integer, 16",
                self.max_multisig_n
            )));
        }
        if self.dust_relay_fee_per_kb < 0 {
            return Err(PolicyError::Config(
                "dust_relay_fee_per_kb must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a public key push of `len` bytes is within bounds
    pub fn pubkey_push_in_bounds(&self, len: usize) -> bool {
        (self.min_pubkey_push..=self.max_pubkey_push).contains(&len)
    }
}
