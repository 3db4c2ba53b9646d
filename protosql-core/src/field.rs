//! Decoded field trees.
//!
//! [`Field`] is a zero-copy view: every node's `value` borrows a contiguous
//! sub-range of the bytes handed to the decoder, and the tree as a whole
//! never outlives them. [`OwnedField`] is the owned mirror used for caching:
//! it records byte ranges instead of slices so it can be stored next to an
//! owned copy of the message and later re-based onto any caller buffer with
//! equal contents.

use std::ops::Range;

use crate::wire::{self, WireType};

/// A node of a decoded message tree.
///
/// Children are kept in wire order; duplicate `(field_number, wire_type)`
/// pairs are expected and are distinguished only by position, which is what
/// makes repeated fields addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// Raw tag as parsed (0 for the synthetic root).
    pub tag: u32,
    /// Field number derived from the tag.
    pub field_number: u32,
    /// Wire type derived from the tag.
    pub wire_type: WireType,
    /// 0 for the synthetic root; children are one greater.
    pub depth: u32,
    /// Exactly the payload bytes of this field.
    ///
    /// For `Varint` the varint bytes themselves, for `I32`/`I64` the 4/8
    /// little-endian bytes, for `Len` the payload without its length prefix,
    /// for `SGroup` the enclosed encoding without the terminating group-end
    /// tag.
    pub value: &'a [u8],
    /// Children in the order they appeared on the wire.
    pub sub_fields: Vec<Field<'a>>,
}

impl<'a> Field<'a> {
    /// Synthetic root covering the whole input message.
    pub fn root(input: &'a [u8]) -> Self {
        Field {
            tag: 0,
            field_number: 0,
            wire_type: WireType::Len,
            depth: 0,
            value: input,
            sub_fields: Vec::new(),
        }
    }

    /// Select the `index`-th direct child matching `field_number` and
    /// `wire_type`.
    ///
    /// A non-negative index counts occurrences from the front; a negative
    /// index counts from the back (`-1` is the last occurrence). Out of
    /// range yields `None`.
    pub fn get_sub_field(
        &self,
        field_number: u32,
        wire_type: WireType,
        index: i64,
    ) -> Option<&Field<'a>> {
        let tag = wire::make_tag(field_number, wire_type);
        select_by_tag(self.sub_fields.iter(), |f| f.tag, tag, index)
    }

    /// Owned mirror of this tree with `value` slices replaced by offset
    /// ranges into `base`. `base` must be the buffer this tree was decoded
    /// from (or any slice enclosing every node's `value`).
    pub fn to_owned_tree(&self, base: &[u8]) -> OwnedField {
        let start = offset_in(base, self.value);
        OwnedField {
            tag: self.tag,
            field_number: self.field_number,
            wire_type: self.wire_type,
            depth: self.depth,
            value: start..start + self.value.len(),
            sub_fields: self
                .sub_fields
                .iter()
                .map(|f| f.to_owned_tree(base))
                .collect(),
        }
    }
}

/// Offset of `slice` within `base`. `slice` must lie inside `base`.
fn offset_in(base: &[u8], slice: &[u8]) -> usize {
    slice.as_ptr() as usize - base.as_ptr() as usize
}

/// Owned, offset-based mirror of [`Field`].
///
/// Stored by the decode cache alongside an owned copy of the message bytes;
/// also what virtual-table cursors hold, since they outlive the transient
/// filter arguments they decode from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedField {
    pub tag: u32,
    pub field_number: u32,
    pub wire_type: WireType,
    pub depth: u32,
    /// Byte range of the payload within the message buffer.
    pub value: Range<usize>,
    pub sub_fields: Vec<OwnedField>,
}

impl OwnedField {
    /// Re-base this tree onto `base`, producing a borrowed view.
    ///
    /// `base` must have the same length and contents as the buffer the tree
    /// was built from; the decode cache upholds this by comparing bytes
    /// before serving a hit.
    pub fn view<'a>(&self, base: &'a [u8]) -> Field<'a> {
        Field {
            tag: self.tag,
            field_number: self.field_number,
            wire_type: self.wire_type,
            depth: self.depth,
            value: &base[self.value.clone()],
            sub_fields: self.sub_fields.iter().map(|f| f.view(base)).collect(),
        }
    }

    /// Same selection rule as [`Field::get_sub_field`].
    pub fn get_sub_field(
        &self,
        field_number: u32,
        wire_type: WireType,
        index: i64,
    ) -> Option<&OwnedField> {
        let tag = wire::make_tag(field_number, wire_type);
        select_by_tag(self.sub_fields.iter(), |f| f.tag, tag, index)
    }
}

/// Repetition-indexed selection over an ordered child list.
///
/// `-1` is the last matching occurrence, `-k` the k-th from the back.
fn select_by_tag<T>(
    children: impl DoubleEndedIterator<Item = T>,
    tag_of: impl Fn(&T) -> u32,
    tag: u32,
    index: i64,
) -> Option<T> {
    if index >= 0 {
        children
            .filter(|f| tag_of(f) == tag)
            .nth(index as usize)
    } else {
        let back = index.checked_neg()?.checked_sub(1)? as usize;
        children
            .rev()
            .filter(|f| tag_of(f) == tag)
            .nth(back)
    }
}
