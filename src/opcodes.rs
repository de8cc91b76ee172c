//! Script opcode constants used by the recognizers and builders

// ============================================================================
// PUSH DATA OPCODES (0x00 - 0x4e)
// ============================================================================

/// OP_0 / OP_FALSE - Push empty array
pub const OP_0: u8 = 0x00;

/// Largest direct push opcode (pushes the next 75 bytes)
pub const OP_PUSHBYTES_75: u8 = 0x4b;

/// OP_PUSHDATA1 - Push next byte as data length
pub const OP_PUSHDATA1: u8 = 0x4c;

/// OP_PUSHDATA2 - Push next 2 bytes (little-endian) as data length
pub const OP_PUSHDATA2: u8 = 0x4d;

/// OP_PUSHDATA4 - Push next 4 bytes (little-endian) as data length
pub const OP_PUSHDATA4: u8 = 0x4e;

// ============================================================================
// PUSH VALUE OPCODES (0x4f - 0x60)
// ============================================================================

/// OP_1NEGATE - Push -1 onto stack
pub const OP_1NEGATE: u8 = 0x4f;

/// OP_RESERVED
pub const OP_RESERVED: u8 = 0x50;

/// OP_1 / OP_TRUE
pub const OP_1: u8 = 0x51;

pub const OP_2: u8 = 0x52;
pub const OP_3: u8 = 0x53;
pub const OP_4: u8 = 0x54;

/// OP_16 - the last small-integer opcode
pub const OP_16: u8 = 0x60;

// ============================================================================
// FLOW CONTROL / STACK / BITWISE
// ============================================================================

pub const OP_NOP: u8 = 0x61;
pub const OP_VERIFY: u8 = 0x69;

/// OP_RETURN - marks an output as provably unspendable data carrier
pub const OP_RETURN: u8 = 0x6a;

pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;

// ============================================================================
// CRYPTO
// ============================================================================

pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Encode a small integer (0..=16) as its push-value opcode
pub fn encode_to_op_n(value: u8) -> Option<u8> {
    match value {
        0 => Some(OP_0),
        1..=16 => Some(OP_1 + value - 1),
        _ => None,
    }
}
