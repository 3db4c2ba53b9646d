//! Wire-format encoding helpers shared by the unit tests.
//!
//! The crate itself never encodes; tests build their own inputs with these.

use crate::wire::{make_tag, WireType};

/// Append the base-128 varint encoding of `n`.
pub fn append_varint(mut n: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (n & 0x7f) as u8;
        n >>= 7;
        if n != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if n == 0 {
            break;
        }
    }
}

/// Zig-zag encode a 32-bit signed value.
pub fn encode_zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Zig-zag encode a 64-bit signed value.
pub fn encode_zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// One varint field: tag plus value.
pub fn encode_varint_field(field_number: u32, n: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(make_tag(field_number, WireType::Varint)), &mut buf);
    append_varint(n, &mut buf);
    buf
}

/// One length-delimited field: tag, length prefix, payload.
pub fn encode_len_field(field_number: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(make_tag(field_number, WireType::Len)), &mut buf);
    append_varint(payload.len() as u64, &mut buf);
    buf.extend_from_slice(payload);
    buf
}

/// One I64 field holding a double.
pub fn encode_double_field(field_number: u32, n: f64) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(make_tag(field_number, WireType::I64)), &mut buf);
    buf.extend_from_slice(&n.to_le_bytes());
    buf
}

/// One I32 field holding a float.
pub fn encode_float_field(field_number: u32, n: f32) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(make_tag(field_number, WireType::I32)), &mut buf);
    buf.extend_from_slice(&n.to_le_bytes());
    buf
}

/// One deprecated group: start tag, enclosed encoding, end tag.
pub fn encode_group_field(field_number: u32, inner: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(make_tag(field_number, WireType::SGroup)), &mut buf);
    buf.extend_from_slice(inner);
    append_varint(u64::from(make_tag(field_number, WireType::EGroup)), &mut buf);
    buf
}
