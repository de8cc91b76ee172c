//! Canonical transaction wire format
//!
//! Legacy (non-witness) layout, little-endian throughout:
//! - Version (4 bytes, signed)
//! - Input count (VarInt), then per input: prevout hash (32), prevout index (4),
//!   script length (VarInt), script bytes, sequence (4)
//! - Output count (VarInt), then per output: value (8), script length (VarInt), script bytes
//! - Lock time (4 bytes)

use crate::error::{PolicyError, Result};
use crate::types::*;

/// Encode a u64 value as a Bitcoin VarInt (CompactSize)
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

/// Decode a Bitcoin VarInt, returning the value and the number of bytes consumed
///
/// Non-minimal encodings are rejected: a value must use the shortest form.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| PolicyError::Serialization("Insufficient bytes to decode VarInt".to_string()))?;

    let (value, len, min) = match first {
        0xfd => (read_le(data, 1, 2)?, 3, 0xfd),
        0xfe => (read_le(data, 1, 4)?, 5, 0x1_0000),
        0xff => (read_le(data, 1, 8)?, 9, 0x1_0000_0000),
        byte => return Ok((byte as u64, 1)),
    };

    if value < min {
        return Err(PolicyError::Serialization(format!(
            "Non-canonical VarInt encoding of {}",
            value
        )));
    }
    Ok((value, len))
}

fn read_le(data: &[u8], offset: usize, width: usize) -> Result<u64> {
    if data.len() < offset + width {
        return Err(PolicyError::Serialization(
            "Insufficient bytes to decode integer".to_string(),
        ));
    }
    Ok(data[offset..offset + width]
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

/// Serialize a transaction to wire format
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let estimated_size = 4
        + 1
        + tx.inputs.iter().map(|i| 41 + i.script_sig.len()).sum::<usize>()
        + 1
        + tx.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum::<usize>()
        + 4;
    let mut result = Vec::with_capacity(estimated_size);

    result.extend_from_slice(&(tx.version as i32).to_le_bytes());

    result.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        result.extend_from_slice(&input.prevout.hash);
        result.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
        result.extend_from_slice(&encode_varint(input.script_sig.len() as u64));
        result.extend_from_slice(&input.script_sig);
        result.extend_from_slice(&(input.sequence as u32).to_le_bytes());
    }

    result.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        serialize_output_into(output, &mut result);
    }

    result.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    result
}

fn serialize_output_into(output: &TransactionOutput, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&output.value.to_le_bytes());
    buf.extend_from_slice(&encode_varint(output.script_pubkey.len() as u64));
    buf.extend_from_slice(&output.script_pubkey);
}

/// Serialized size of a single output
pub fn serialized_output_size(output: &TransactionOutput) -> usize {
    8 + encode_varint(output.script_pubkey.len() as u64).len() + output.script_pubkey.len()
}

/// Byte cursor over a wire-format buffer
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                PolicyError::Serialization(format!(
                    "Insufficient bytes to parse transaction at offset {}",
                    self.offset
                ))
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(buf))
    }

    fn read_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(&self.data[self.offset..])?;
        self.offset += len;
        Ok(value)
    }

    /// Read a VarInt length prefix bounded by the bytes left in the buffer
    fn read_length(&mut self, what: &str) -> Result<usize> {
        let len = self.read_varint()?;
        let remaining = (self.data.len() - self.offset) as u64;
        if len > remaining {
            return Err(PolicyError::Serialization(format!(
                "Invalid {}: {} exceeds remaining {} bytes",
                what, len, remaining
            )));
        }
        Ok(len as usize)
    }
}

/// Deserialize a transaction from wire format
///
/// The whole buffer must be consumed; trailing bytes are an error.
pub fn deserialize_transaction(data: &[u8]) -> Result<Transaction> {
    let mut reader = Reader { data, offset: 0 };

    let version = i32::from_le_bytes({
        let bytes = reader.take(4)?;
        [bytes[0], bytes[1], bytes[2], bytes[3]]
    }) as i64 as u64;

    let input_count = reader.read_length("input count")?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(reader.take(32)?);
        let index = reader.read_u32()? as u64;
        let script_len = reader.read_length("script length")?;
        let script_sig = reader.take(script_len)?.to_vec();
        let sequence = reader.read_u32()? as u64;
        inputs.push(TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            sequence,
        });
    }

    let output_count = reader.read_length("output count")?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let value = reader.read_i64()?;
        let script_len = reader.read_length("script length")?;
        let script_pubkey = reader.take(script_len)?.to_vec();
        outputs.push(TransactionOutput {
            value,
            script_pubkey,
        });
    }

    let lock_time = reader.read_u32()? as u64;

    if reader.offset != data.len() {
        return Err(PolicyError::Serialization(format!(
            "{} trailing bytes after transaction",
            data.len() - reader.offset
        )));
    }

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}
