//! Script object model: chunk decomposition, shape recognizers and builders
//!
//! A script is an ordered sequence of chunks. A chunk is either a data push
//! (opcodes 0x00..=0x4e, carrying a payload) or a bare opcode. Nothing here
//! executes scripts; only their shape is inspected.

use crate::error::{PolicyError, Result};
use crate::opcodes::*;
use crate::types::ByteString;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// A single parsed script element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptChunk {
    /// Data push (OP_0 is an empty push)
    Push(ByteString),
    /// Any opcode that does not carry a payload
    Op(u8),
}

impl ScriptChunk {
    pub fn is_push(&self) -> bool {
        matches!(self, ScriptChunk::Push(_))
    }

    pub fn is_op(&self, opcode: u8) -> bool {
        matches!(self, ScriptChunk::Op(op) if *op == opcode)
    }

    /// Payload of a push, `None` for opcodes
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            ScriptChunk::Push(data) => Some(data),
            ScriptChunk::Op(_) => None,
        }
    }
}

/// Decompose raw script bytes into chunks
///
/// Fails when a push announces more bytes than the script holds.
pub fn parse_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>> {
    let mut chunks = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let opcode = bytes[offset];
        offset += 1;

        let push_len = match opcode {
            OP_0 => Some(0),
            0x01..=OP_PUSHBYTES_75 => Some(opcode as usize),
            OP_PUSHDATA1 => Some(read_push_length(bytes, &mut offset, 1)?),
            OP_PUSHDATA2 => Some(read_push_length(bytes, &mut offset, 2)?),
            OP_PUSHDATA4 => Some(read_push_length(bytes, &mut offset, 4)?),
            _ => None,
        };

        match push_len {
            Some(len) => {
                let end = offset.checked_add(len).filter(|end| *end <= bytes.len()).ok_or_else(|| {
                    PolicyError::ScriptParse(format!(
                        "push of {} bytes at offset {} runs past end of script",
                        len, offset
                    ))
                })?;
                chunks.push(ScriptChunk::Push(bytes[offset..end].to_vec()));
                offset = end;
            }
            None => chunks.push(ScriptChunk::Op(opcode)),
        }
    }

    Ok(chunks)
}

/// Read a little-endian PUSHDATA length prefix of `width` bytes
fn read_push_length(bytes: &[u8], offset: &mut usize, width: usize) -> Result<usize> {
    if bytes.len() < *offset + width {
        return Err(PolicyError::ScriptParse(format!(
            "truncated PUSHDATA length at offset {}",
            offset
        )));
    }
    let len = bytes[*offset..*offset + width]
        .iter()
        .rev()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    *offset += width;
    Ok(len)
}

/// Decode a small-integer chunk: OP_0 → 0, OP_1..OP_16 → 1..16
pub fn decode_small_int(chunk: &ScriptChunk) -> Option<u8> {
    match chunk {
        ScriptChunk::Push(data) if data.is_empty() => Some(0),
        ScriptChunk::Op(op) if (OP_1..=OP_16).contains(op) => Some(op - OP_1 + 1),
        _ => None,
    }
}

/// Parsed, immutable script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    bytes: ByteString,
    chunks: Vec<ScriptChunk>,
}

impl Script {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            bytes: bytes.to_vec(),
            chunks: parse_script(bytes)?,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    /// Serialized length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// DUP HASH160 <20 bytes> EQUALVERIFY CHECKSIG
    pub fn is_pay_to_address(&self) -> bool {
        match self.chunks.as_slice() {
            [dup, hash160, ScriptChunk::Push(hash), equal_verify, checksig] => {
                dup.is_op(OP_DUP)
                    && hash160.is_op(OP_HASH160)
                    && hash.len() == 20
                    && equal_verify.is_op(OP_EQUALVERIFY)
                    && checksig.is_op(OP_CHECKSIG)
            }
            _ => false,
        }
    }

    /// HASH160 <20 bytes> EQUAL, matched on the exact byte form
    pub fn is_pay_to_script_hash(&self) -> bool {
        self.bytes.len() == 23
            && self.bytes[0] == OP_HASH160
            && self.bytes[1] == 0x14
            && self.bytes[22] == OP_EQUAL
    }

    /// <pubkey> CHECKSIG, no bounds on the key length
    pub fn is_sent_to_raw_pubkey(&self) -> bool {
        match self.chunks.as_slice() {
            [ScriptChunk::Push(key), checksig] => key.len() > 1 && checksig.is_op(OP_CHECKSIG),
            _ => false,
        }
    }

    /// OP_n <key>... OP_m CHECKMULTISIG, also accepting CHECKMULTISIGVERIFY
    pub fn is_sent_to_multisig(&self) -> bool {
        let chunks = &self.chunks;
        if chunks.len() < 4 {
            return false;
        }
        let last = &chunks[chunks.len() - 1];
        if !(last.is_op(OP_CHECKMULTISIG) || last.is_op(OP_CHECKMULTISIGVERIFY)) {
            return false;
        }
        let key_count = match &chunks[chunks.len() - 2] {
            chunk @ ScriptChunk::Op(_) => decode_small_int(chunk),
            ScriptChunk::Push(_) => None,
        };
        let key_count = match key_count {
            Some(m) if m >= 1 => m as usize,
            _ => return false,
        };
        if chunks.len() != key_count + 3 {
            return false;
        }
        if chunks[1..chunks.len() - 2].iter().any(|c| !c.is_push()) {
            return false;
        }
        matches!(decode_small_int(&chunks[0]), Some(n) if n >= 1)
    }

    /// Any opcode above OP_16 (push-only scripts may use OP_0..OP_16)
    pub fn has_non_push_opcodes(&self) -> bool {
        self.chunks
            .iter()
            .any(|chunk| matches!(chunk, ScriptChunk::Op(op) if *op > OP_16))
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(&sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd160_hash);
    out
}

/// Append `data` using the smallest push encoding
pub fn push_data(script: &mut ByteString, data: &[u8]) {
    let len = data.len();
    if len <= OP_PUSHBYTES_75 as usize {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xffff {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

/// Pay-to-address locking script for a 20-byte key hash
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> ByteString {
    let mut script = vec![OP_DUP, OP_HASH160];
    push_data(&mut script, pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Pay-to-script-hash locking script committing to `redeem_script`
pub fn p2sh_script(redeem_script: &[u8]) -> ByteString {
    let mut script = vec![OP_HASH160];
    push_data(&mut script, &hash160(redeem_script));
    script.push(OP_EQUAL);
    script
}

/// Pay-to-pubkey locking script
pub fn p2pk_script(pubkey: &[u8]) -> ByteString {
    let mut script = Vec::with_capacity(pubkey.len() + 2);
    push_data(&mut script, pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// Bare `OP_n <keys...> OP_m CHECKMULTISIG` script, where `m` is `keys.len()`
pub fn multisig_script(n: u8, keys: &[ByteString]) -> Result<ByteString> {
    let key_count = u8::try_from(keys.len())
        .ok()
        .and_then(encode_to_op_n)
        .ok_or_else(|| PolicyError::ScriptParse(format!("cannot encode {} keys", keys.len())))?;
    let first = encode_to_op_n(n)
        .ok_or_else(|| PolicyError::ScriptParse(format!("cannot encode small integer {}", n)))?;

    let mut script = vec![first];
    for key in keys {
        push_data(&mut script, key);
    }
    script.push(key_count);
    script.push(OP_CHECKMULTISIG);
    Ok(script)
}

/// OP_RETURN followed by an optional data push
pub fn op_return_script(data: Option<&[u8]>) -> ByteString {
    let mut script = vec![OP_RETURN];
    if let Some(data) = data {
        push_data(&mut script, data);
    }
    script
}
