//! Wire-format tag primitives.
//!
//! Every field in an encoded message is introduced by a tag varint packing
//! `(field_number << 3) | wire_type`. This module provides the closed
//! [`WireType`] enumeration and the pack/unpack helpers used throughout the
//! decoder.

/// Number of low tag bits used for the wire type.
const TAG_BITS: u32 = 3;

/// Denotes how a field's payload is laid out on the wire.
///
/// The numeric values are fixed by the encoding; tag values with a low-3-bit
/// pattern of 6 or 7 are invalid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`,
    /// `bool`, `enum`.
    Varint = 0,
    /// 64-bit little-endian integer.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Length-delimited payload.
    ///
    /// Used for: `string`, `bytes`, embedded messages, packed repeated fields.
    Len = 2,
    /// Group start (deprecated encoding).
    SGroup = 3,
    /// Group end (deprecated encoding).
    EGroup = 4,
    /// 32-bit little-endian integer.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

impl WireType {
    /// Try to decode a wire type from its raw 3-bit value.
    pub const fn try_from_val(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::I64),
            2 => Some(WireType::Len),
            3 => Some(WireType::SGroup),
            4 => Some(WireType::EGroup),
            5 => Some(WireType::I32),
            _ => None,
        }
    }

    /// Raw numeric value of this wire type.
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

/// Pack a field number and wire type into a raw tag.
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << TAG_BITS) | wire_type as u32
}

/// Field number of a raw tag. Field number 0 is reserved and marks
/// malformed input.
pub const fn tag_field_number(tag: u32) -> u32 {
    tag >> TAG_BITS
}

/// Wire type of a raw tag, if the low bits name a valid one.
pub const fn tag_wire_type(tag: u32) -> Option<WireType> {
    WireType::try_from_val((tag & ((1 << TAG_BITS) - 1)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_raw_values() {
        for i in 0..=u8::MAX {
            match (i, WireType::try_from_val(i)) {
                (0, Some(WireType::Varint))
                | (1, Some(WireType::I64))
                | (2, Some(WireType::Len))
                | (3, Some(WireType::SGroup))
                | (4, Some(WireType::EGroup))
                | (5, Some(WireType::I32)) => (),
                (6.., None) => (),
                other => panic!("unexpected mapping {other:?}"),
            }
        }
    }

    #[test]
    fn test_tag_roundtrip() {
        for wt in [
            WireType::Varint,
            WireType::I64,
            WireType::Len,
            WireType::SGroup,
            WireType::EGroup,
            WireType::I32,
        ] {
            for field_number in [1u32, 2, 15, 16, 1000, (1 << 29) - 1] {
                let tag = make_tag(field_number, wt);
                assert_eq!(tag_field_number(tag), field_number);
                assert_eq!(tag_wire_type(tag), Some(wt));
            }
        }
    }

    #[test]
    fn test_invalid_wire_bits() {
        assert_eq!(tag_wire_type(0x0e), None); // field 1, wire 6
        assert_eq!(tag_wire_type(0x0f), None); // field 1, wire 7
    }
}
