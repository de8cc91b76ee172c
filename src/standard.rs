//! Standard script classification and unlocking-argument counting
//!
//! Recognizes the locking script shapes the reference client relays and
//! computes how many push-only elements a standard unlocking script for each
//! shape must carry.

use crate::config::PolicyConfig;
use crate::opcodes::*;
use crate::script::{decode_small_int, Script, ScriptChunk};
use serde::{Deserialize, Serialize};

/// Pay-to-script-hash nesting allowed when counting arguments
const MAX_P2SH_DEPTH: usize = 1;

/// Standard locking script shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardScript {
    PayToAddress,
    PayToPubKey,
    PayToScriptHash,
    /// Bare CHECKMULTISIG: `n` decoded from the first chunk, `m` from the
    /// small integer before the final opcode
    Multisig { n: u8, m: u8 },
    NullData,
}

/// OP_RETURN alone, or OP_RETURN followed by one bounded data push
pub fn is_data_script(script: &Script, config: &PolicyConfig) -> bool {
    match script.chunks() {
        [first] => first.is_op(OP_RETURN),
        [first, ScriptChunk::Push(data)] => {
            first.is_op(OP_RETURN) && data.len() <= config.max_data_carrier_bytes
        }
        _ => false,
    }
}

/// Raw pubkey script whose key push length is within the policy bounds
pub fn is_standard_pay_to_pubkey(script: &Script, config: &PolicyConfig) -> bool {
    if !script.is_sent_to_raw_pubkey() {
        return false;
    }
    script.chunks()[0]
        .data()
        .map_or(false, |key| config.pubkey_push_in_bounds(key.len()))
}

/// Multisig script ending in CHECKMULTISIG with every key push within bounds
///
/// Returns `(n, m)`: `n` from the first chunk, `m` from the second-to-last.
/// The CHECKMULTISIGVERIFY form is recognized by
/// the underlying pattern but is not standard.
pub fn valid_multisig(script: &Script, config: &PolicyConfig) -> Option<(u8, u8)> {
    if !script.is_sent_to_multisig() {
        return None;
    }

    let chunks = script.chunks();
    if !chunks[chunks.len() - 1].is_op(OP_CHECKMULTISIG) {
        return None;
    }

    let n = decode_small_int(&chunks[0])?;
    let m = decode_small_int(&chunks[chunks.len() - 2])?;

    let key_pushes = &chunks[1..chunks.len() - 2];
    let all_in_bounds = key_pushes.iter().all(|chunk| {
        chunk
            .data()
            .map_or(false, |key| config.pubkey_push_in_bounds(key.len()))
    });
    if !all_in_bounds {
        return None;
    }

    Some((n, m))
}

/// Classify a locking script, `None` when it matches no standard shape
pub fn classify_script_pubkey(script: &Script, config: &PolicyConfig) -> Option<StandardScript> {
    if script.is_pay_to_address() {
        Some(StandardScript::PayToAddress)
    } else if is_standard_pay_to_pubkey(script, config) {
        Some(StandardScript::PayToPubKey)
    } else if let Some((n, m)) = valid_multisig(script, config) {
        Some(StandardScript::Multisig { n, m })
    } else if script.is_pay_to_script_hash() {
        Some(StandardScript::PayToScriptHash)
    } else if is_data_script(script, config) {
        Some(StandardScript::NullData)
    } else {
        None
    }
}

/// ScriptArgsRequired: 𝒮𝒞 × 𝒮𝒞? → ℕ ∪ {indeterminate}
///
/// Number of push-only elements a standard unlocking script for
/// `script_pubkey` must contain, or `None` when `script_pubkey` is not a
/// standard spendable shape:
/// 1. Pay-to-address: signature and public key (2)
/// 2. Pay-to-pubkey: signature (1)
/// 3. Multisig: `m` (the second small integer) plus the placeholder element
///    CHECKMULTISIG pops
/// 4. Pay-to-script-hash: the redeem script's own arguments plus the redeem
///    script push itself. The redeem script is the last element of
///    `script_sig`, and may not itself be pay-to-script-hash.
/// 5. Anything else (including data scripts): indeterminate
pub fn script_args_required(
    script_pubkey: &Script,
    script_sig: Option<&Script>,
    config: &PolicyConfig,
) -> Option<usize> {
    args_required_at_depth(script_pubkey, script_sig, config, 0)
}

fn args_required_at_depth(
    script_pubkey: &Script,
    script_sig: Option<&Script>,
    config: &PolicyConfig,
    depth: usize,
) -> Option<usize> {
    if script_pubkey.is_pay_to_address() {
        return Some(2);
    }

    if is_standard_pay_to_pubkey(script_pubkey, config) {
        return Some(1);
    }

    if let Some((_, m)) = valid_multisig(script_pubkey, config) {
        return Some(m as usize + 1);
    }

    if script_pubkey.is_pay_to_script_hash() {
        if depth >= MAX_P2SH_DEPTH {
            return None;
        }

        let redeem_bytes = match script_sig?.chunks().last()? {
            ScriptChunk::Push(data) => data,
            ScriptChunk::Op(_) => return None,
        };

        let redeem_script = Script::parse(redeem_bytes).ok()?;
        if redeem_script.is_pay_to_script_hash() {
            return None;
        }

        return args_required_at_depth(&redeem_script, None, config, depth + 1).map(|n| n + 1);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::*;

    fn config() -> PolicyConfig {
        PolicyConfig::default()
    }

    fn parse(bytes: &[u8]) -> Script {
        Script::parse(bytes).unwrap()
    }

    #[test]
    fn test_data_script_bounds() {
        assert!(is_data_script(&parse(&op_return_script(None)), &config()));
        assert!(is_data_script(&parse(&op_return_script(Some(&[]))), &config()));
        assert!(is_data_script(&parse(&op_return_script(Some(&[0; 80]))), &config()));
        assert!(!is_data_script(&parse(&op_return_script(Some(&[0; 81]))), &config()));
    }

    #[test]
    fn test_data_script_shape() {
        // Opcode after OP_RETURN
        assert!(!is_data_script(&parse(&[OP_RETURN, OP_DUP]), &config()));
        // Two pushes
        assert!(!is_data_script(&parse(&[OP_RETURN, 0x01, 0x00, 0x01, 0x00]), &config()));
        // Not starting with OP_RETURN
        assert!(!is_data_script(&parse(&[0x01, 0x00]), &config()));
        assert!(!is_data_script(&parse(&[]), &config()));
    }

    #[test]
    fn test_pay_to_pubkey_bounds() {
        assert!(!is_standard_pay_to_pubkey(&parse(&p2pk_script(&[2; 32])), &config()));
        assert!(is_standard_pay_to_pubkey(&parse(&p2pk_script(&[2; 33])), &config()));
        assert!(is_standard_pay_to_pubkey(&parse(&p2pk_script(&[4; 65])), &config()));
        assert!(is_standard_pay_to_pubkey(&parse(&p2pk_script(&[4; 120])), &config()));
        assert!(!is_standard_pay_to_pubkey(&parse(&p2pk_script(&[4; 121])), &config()));
    }

    #[test]
    fn test_valid_multisig() {
        let keys = vec![vec![2; 33], vec![3; 65]];
        let script = parse(&multisig_script(1, &keys).unwrap());
        assert_eq!(valid_multisig(&script, &config()), Some((1, 2)));

        let script = parse(&multisig_script(3, &keys).unwrap());
        assert_eq!(valid_multisig(&script, &config()), Some((3, 2)));
    }

    #[test]
    fn test_valid_multisig_rejects_verify_variant() {
        let mut bytes = multisig_script(1, &[vec![2; 33]]).unwrap();
        *bytes.last_mut().unwrap() = OP_CHECKMULTISIGVERIFY;
        let script = parse(&bytes);
        assert!(script.is_sent_to_multisig());
        assert_eq!(valid_multisig(&script, &config()), None);
    }

    #[test]
    fn test_valid_multisig_rejects_short_key() {
        let keys = vec![vec![2; 33], vec![3; 20]];
        let script = parse(&multisig_script(1, &keys).unwrap());
        assert_eq!(valid_multisig(&script, &config()), None);
    }

    #[test]
    fn test_classify_script_pubkey() {
        let c = config();
        assert_eq!(
            classify_script_pubkey(&parse(&p2pkh_script(&[1; 20])), &c),
            Some(StandardScript::PayToAddress)
        );
        assert_eq!(
            classify_script_pubkey(&parse(&p2sh_script(&[OP_1])), &c),
            Some(StandardScript::PayToScriptHash)
        );
        assert_eq!(
            classify_script_pubkey(&parse(&p2pk_script(&[2; 33])), &c),
            Some(StandardScript::PayToPubKey)
        );
        assert_eq!(
            classify_script_pubkey(&parse(&multisig_script(2, &[vec![2; 33], vec![3; 33]]).unwrap()), &c),
            Some(StandardScript::Multisig { n: 2, m: 2 })
        );
        assert_eq!(
            classify_script_pubkey(&parse(&multisig_script(3, &[vec![2; 33]]).unwrap()), &c),
            Some(StandardScript::Multisig { n: 3, m: 1 })
        );
        assert_eq!(
            classify_script_pubkey(&parse(&op_return_script(Some(b"hello"))), &c),
            Some(StandardScript::NullData)
        );
        assert_eq!(classify_script_pubkey(&parse(&[OP_1]), &c), None);
        assert_eq!(classify_script_pubkey(&parse(&[]), &c), None);
    }

    #[test]
    fn test_args_required_simple_shapes() {
        let c = config();
        assert_eq!(script_args_required(&parse(&p2pkh_script(&[1; 20])), None, &c), Some(2));
        assert_eq!(script_args_required(&parse(&p2pk_script(&[2; 33])), None, &c), Some(1));
        assert_eq!(script_args_required(&parse(&op_return_script(None)), None, &c), None);
        assert_eq!(script_args_required(&parse(&[OP_1]), None, &c), None);
    }

    #[test]
    fn test_args_required_multisig_uses_second_small_int() {
        let c = config();
        // OP_1 <k> <k> OP_2 CHECKMULTISIG: m = 2
        let multisig = multisig_script(1, &[vec![2; 33], vec![3; 33]]).unwrap();
        assert_eq!(script_args_required(&parse(&multisig), None, &c), Some(3));

        // OP_3 <k> OP_1 CHECKMULTISIG: m = 1
        let multisig = multisig_script(3, &[vec![2; 33]]).unwrap();
        assert_eq!(script_args_required(&parse(&multisig), None, &c), Some(2));
    }

    #[test]
    fn test_args_required_p2sh_multisig() {
        let c = config();
        // OP_2 <k> <k> <k> OP_3 CHECKMULTISIG: m = 3
        let redeem = multisig_script(2, &[vec![2; 33], vec![3; 33], vec![4; 33]]).unwrap();
        let script_pubkey = parse(&p2sh_script(&redeem));

        let mut sig = Vec::new();
        push_data(&mut sig, &redeem);

        // m + 1 for the redeem script's own arguments, plus the redeem script push
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&sig)), &c), Some(5));
    }

    #[test]
    fn test_args_required_p2sh_pay_to_address() {
        let c = config();
        let redeem = p2pkh_script(&[9; 20]);
        let script_pubkey = parse(&p2sh_script(&redeem));
        let mut sig = Vec::new();
        push_data(&mut sig, &[0x30; 71]);
        push_data(&mut sig, &[2; 33]);
        push_data(&mut sig, &redeem);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&sig)), &c), Some(3));
    }

    #[test]
    fn test_args_required_nested_p2sh_is_indeterminate() {
        let c = config();
        let inner = p2sh_script(&p2pkh_script(&[9; 20]));
        let script_pubkey = parse(&p2sh_script(&inner));
        let mut sig = Vec::new();
        push_data(&mut sig, &inner);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&sig)), &c), None);
    }

    #[test]
    fn test_args_required_p2sh_missing_or_opcode_redeem() {
        let c = config();
        let script_pubkey = parse(&p2sh_script(&[OP_1]));
        assert_eq!(script_args_required(&script_pubkey, None, &c), None);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&[])), &c), None);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&[OP_1])), &c), None);
    }

    #[test]
    fn test_args_required_p2sh_unparseable_redeem() {
        let c = config();
        let redeem = vec![0x05, 0x01];
        let script_pubkey = parse(&p2sh_script(&redeem));
        let mut sig = Vec::new();
        push_data(&mut sig, &redeem);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&sig)), &c), None);
    }

    #[test]
    fn test_args_required_p2sh_non_standard_redeem() {
        let c = config();
        let redeem = vec![OP_1];
        let script_pubkey = parse(&p2sh_script(&redeem));
        let mut sig = Vec::new();
        push_data(&mut sig, &redeem);
        assert_eq!(script_args_required(&script_pubkey, Some(&parse(&sig)), &c), None);
    }

    #[test]
    fn test_depth_cap_holds_for_direct_call() {
        let c = config();
        let script_pubkey = parse(&p2sh_script(&p2pkh_script(&[9; 20])));
        let mut sig = Vec::new();
        push_data(&mut sig, &p2pkh_script(&[9; 20]));
        assert_eq!(args_required_at_depth(&script_pubkey, Some(&parse(&sig)), &c, 1), None);
        assert_eq!(args_required_at_depth(&script_pubkey, Some(&parse(&sig)), &c, 0), Some(3));
    }
}
