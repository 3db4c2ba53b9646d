//! Typed scalar extraction from raw value slices.
//!
//! Accessors take the payload bytes of a decoded field and a logical
//! interpretation, and produce a native scalar. They also accept an element
//! index so a packed repeated payload can be addressed directly: varint
//! payloads are walked to count elements, fixed-width payloads divide
//! evenly or fail. A negative index counts from the back (`-1` is the last
//! element). Every accessor reports failure as `None`.

use std::str::FromStr;

use crate::error::TypeError;
use crate::varint::{
    decode_zigzag32, decode_zigzag64, read_varint, MAX_VARINT_LEN_32, MAX_VARINT_LEN_64,
};
use crate::wire::WireType;

/// Caller-supplied interpretation of a value slice.
///
/// Each variant maps to exactly one wire type, except `Buffer`, which
/// accepts any field and yields its raw payload. Unknown names are rejected
/// at parse time ([`TypeError`]); there is no in-band unknown variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Raw payload bytes, wire type unknown (the empty type string).
    Buffer,
    String,
    Bytes,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Bool,
    Enum,
    Fixed64,
    SFixed64,
    Double,
    Fixed32,
    SFixed32,
    Float,
}

impl LogicalType {
    /// Wire types a path's final step tries for this interpretation, in
    /// order.
    pub fn wire_types(self) -> &'static [WireType] {
        use LogicalType::*;
        match self {
            Buffer => &[
                WireType::Len,
                WireType::SGroup,
                WireType::Varint,
                WireType::I64,
                WireType::I32,
            ],
            String | Bytes => &[WireType::Len],
            Int32 | Int64 | UInt32 | UInt64 | SInt32 | SInt64 | Bool | Enum => {
                &[WireType::Varint]
            }
            Fixed64 | SFixed64 | Double => &[WireType::I64],
            Fixed32 | SFixed32 | Float => &[WireType::I32],
        }
    }
}

impl FromStr for LogicalType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, TypeError> {
        Ok(match s {
            "" => LogicalType::Buffer,
            "string" => LogicalType::String,
            "bytes" => LogicalType::Bytes,
            "int32" => LogicalType::Int32,
            "int64" => LogicalType::Int64,
            "uint32" => LogicalType::UInt32,
            "uint64" => LogicalType::UInt64,
            "sint32" => LogicalType::SInt32,
            "sint64" => LogicalType::SInt64,
            "bool" => LogicalType::Bool,
            "enum" => LogicalType::Enum,
            "fixed64" => LogicalType::Fixed64,
            "sfixed64" => LogicalType::SFixed64,
            "double" => LogicalType::Double,
            "fixed32" => LogicalType::Fixed32,
            "sfixed32" => LogicalType::SFixed32,
            "float" => LogicalType::Float,
            other => return Err(TypeError::Unknown(other.to_owned())),
        })
    }
}

/// Select the `index`-th varint in `value`, bounded per element by
/// `max_bytes`.
///
/// The whole payload is walked first to count elements, which both
/// bounds-checks positive indices and resolves negative ones.
fn varint_at(value: &[u8], index: i64, max_bytes: usize) -> Option<u64> {
    let mut count: i64 = 0;
    let mut pos = 0;
    while pos < value.len() {
        let (_, len) = read_varint(&value[pos..], max_bytes)?;
        pos += len;
        count += 1;
    }

    let index = if index < 0 {
        index.checked_add(count)?
    } else {
        index
    };
    if index < 0 || index >= count {
        return None;
    }

    let mut pos = 0;
    let mut remaining = index;
    loop {
        let (number, len) = read_varint(&value[pos..], max_bytes)?;
        if remaining == 0 {
            return Some(number);
        }
        pos += len;
        remaining -= 1;
    }
}

/// Byte offset of the `index`-th `width`-sized element, with negative wrap.
fn fixed_offset(len: usize, index: i64, width: usize) -> Option<usize> {
    if len % width != 0 {
        return None;
    }
    let scaled = index.checked_mul(width as i64)?;
    let offset = if index < 0 {
        scaled.checked_add(i64::try_from(len).ok()?)?
    } else {
        scaled
    };
    if offset < 0 || offset as usize >= len {
        return None;
    }
    Some(offset as usize)
}

fn fixed64_bits(value: &[u8], index: i64) -> Option<u64> {
    let offset = fixed_offset(value.len(), index, 8)?;
    let bytes = value.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

fn fixed32_bits(value: &[u8], index: i64) -> Option<u32> {
    let offset = fixed_offset(value.len(), index, 4)?;
    let bytes = value.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// `int32`: varint bounded at 5 bytes, truncated to 32 bits, sign kept.
pub fn get_int32(value: &[u8], index: i64) -> Option<i32> {
    varint_at(value, index, MAX_VARINT_LEN_32).map(|n| n as u32 as i32)
}

/// `int64`: varint bounded at 10 bytes, two's-complement 64-bit.
pub fn get_int64(value: &[u8], index: i64) -> Option<i64> {
    varint_at(value, index, MAX_VARINT_LEN_64).map(|n| n as i64)
}

/// `uint32`: varint bounded at 5 bytes, truncated to 32 bits.
pub fn get_uint32(value: &[u8], index: i64) -> Option<u32> {
    varint_at(value, index, MAX_VARINT_LEN_32).map(|n| n as u32)
}

/// `uint64`: varint bounded at 10 bytes.
pub fn get_uint64(value: &[u8], index: i64) -> Option<u64> {
    varint_at(value, index, MAX_VARINT_LEN_64)
}

/// `sint32`: zig-zag decoded 32-bit varint.
pub fn get_sint32(value: &[u8], index: i64) -> Option<i32> {
    varint_at(value, index, MAX_VARINT_LEN_32).map(|n| decode_zigzag32(n as u32))
}

/// `sint64`: zig-zag decoded 64-bit varint.
pub fn get_sint64(value: &[u8], index: i64) -> Option<i64> {
    varint_at(value, index, MAX_VARINT_LEN_64).map(decode_zigzag64)
}

/// `bool`: any non-zero varint is true.
pub fn get_bool(value: &[u8], index: i64) -> Option<bool> {
    varint_at(value, index, MAX_VARINT_LEN_32).map(|n| n != 0)
}

/// `fixed64`: 8 little-endian bytes, unsigned.
pub fn get_fixed64(value: &[u8], index: i64) -> Option<u64> {
    fixed64_bits(value, index)
}

/// `sfixed64`: 8 little-endian bytes, signed.
pub fn get_sfixed64(value: &[u8], index: i64) -> Option<i64> {
    fixed64_bits(value, index).map(|n| n as i64)
}

/// `double`: 8 little-endian bytes, IEEE 754.
pub fn get_double(value: &[u8], index: i64) -> Option<f64> {
    fixed64_bits(value, index).map(f64::from_bits)
}

/// `fixed32`: 4 little-endian bytes, unsigned.
pub fn get_fixed32(value: &[u8], index: i64) -> Option<u32> {
    fixed32_bits(value, index)
}

/// `sfixed32`: 4 little-endian bytes, signed.
pub fn get_sfixed32(value: &[u8], index: i64) -> Option<i32> {
    fixed32_bits(value, index).map(|n| n as i32)
}

/// `float`: 4 little-endian bytes, IEEE 754.
pub fn get_float(value: &[u8], index: i64) -> Option<f32> {
    fixed32_bits(value, index).map(f32::from_bits)
}
