//! Recursive wire-format walker.
//!
//! The decoder is total: it never fails outright. Malformed input truncates
//! the affected level of the tree (the level's children are cleared and the
//! walk stops there), and the caller still gets a root it can query. The
//! interesting policy decision lives in the `Len` arm: a length-delimited
//! payload is optimistically parsed as a nested message, and only if that
//! fails end-to-end is it kept as opaque bytes. Schema-less decoding cannot
//! tell "string that looks like a message" from "message"; the caller picks
//! the interpretation at extraction time.

use crate::field::Field;
use crate::varint::{read_varint, MAX_VARINT_LEN_32, MAX_VARINT_LEN_64};
use crate::wire::{self, WireType};

/// Nesting bound for the optimistic sub-message attempt and for groups.
/// Past this depth a length-delimited payload stays an opaque leaf.
const RECURSION_LIMIT: u32 = 100;

/// Decode `input` into a field tree.
///
/// The returned root is synthetic: tag 0, wire type `Len`, `value` covering
/// the whole input. With `packed` set, length-delimited payloads that fail
/// the sub-message attempt are additionally reinterpreted as packed repeated
/// scalars (see [`Field::get_sub_field`] for how the synthesized siblings
/// are addressed).
pub fn decode(input: &[u8], packed: bool) -> Field<'_> {
    let mut root = Field::root(input);
    decode_sub_fields(&mut root, packed);
    root
}

/// Byte cursor over one message level. Slices handed out borrow the
/// original input, never the cursor.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn read_varint(&mut self, max_bytes: usize) -> Option<(u64, &'a [u8])> {
        let (value, len) = read_varint(self.remaining(), max_bytes)?;
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Some((value, bytes))
    }
}

/// Walk `parent.value` as a sequence of tagged fields, populating
/// `parent.sub_fields`.
///
/// Returns `false` on the first malformed field, with the children list
/// cleared. For a group parent, an encountered group-end tag terminates the
/// walk successfully and truncates `parent.value` to just before that tag;
/// the caller is expected to consume and verify the tag itself.
fn decode_sub_fields<'a>(parent: &mut Field<'a>, packed: bool) -> bool {
    if parent.depth >= RECURSION_LIMIT {
        return false;
    }
    let mut cur = Cursor::new(parent.value);
    while !cur.is_empty() {
        let tag_start = cur.pos;
        let Some((tag, _)) = cur.read_varint(MAX_VARINT_LEN_32) else {
            parent.sub_fields.clear();
            return false;
        };
        let tag = tag as u32;
        let field_number = wire::tag_field_number(tag);
        if field_number == 0 {
            // Field number 0 is reserved: this is not a message level.
            parent.sub_fields.clear();
            return false;
        }
        let Some(wire_type) = wire::tag_wire_type(tag) else {
            parent.sub_fields.clear();
            return false;
        };
        if parent.wire_type == WireType::SGroup && wire_type == WireType::EGroup {
            parent.value = &parent.value[..tag_start];
            return true;
        }
        let mut sub = Field {
            tag,
            field_number,
            wire_type,
            depth: parent.depth + 1,
            value: &[],
            sub_fields: Vec::new(),
        };
        if !decode_value(&mut sub, &mut cur, packed, &mut parent.sub_fields) {
            parent.sub_fields.clear();
            return false;
        }
        parent.sub_fields.push(sub);
    }
    true
}

/// Decode one field's payload from the cursor into `field.value`.
///
/// `siblings` is the parent's in-construction child list; a successful
/// packed reinterpretation appends the synthesized scalar fields there,
/// ahead of the length-delimited wrapper itself.
fn decode_value<'a>(
    field: &mut Field<'a>,
    cur: &mut Cursor<'a>,
    packed: bool,
    siblings: &mut Vec<Field<'a>>,
) -> bool {
    match field.wire_type {
        WireType::Varint => match cur.read_varint(MAX_VARINT_LEN_64) {
            Some((_, bytes)) => {
                field.value = bytes;
                true
            }
            None => false,
        },
        WireType::I64 => match cur.take(8) {
            Some(bytes) => {
                field.value = bytes;
                true
            }
            None => false,
        },
        WireType::I32 => match cur.take(4) {
            Some(bytes) => {
                field.value = bytes;
                true
            }
            None => false,
        },
        WireType::Len => {
            let Some((len, _)) = cur.read_varint(MAX_VARINT_LEN_32) else {
                return false;
            };
            if len > i32::MAX as u64 {
                return false;
            }
            let Some(payload) = cur.take(len as usize) else {
                return false;
            };
            field.value = payload;
            if decode_sub_fields(field, packed) {
                return true;
            }
            if packed {
                // Each reinterpretation is all-or-nothing and independent.
                decode_packed(field, WireType::Varint, siblings);
                decode_packed(field, WireType::I64, siblings);
                decode_packed(field, WireType::I32, siblings);
            }
            true
        }
        WireType::SGroup => decode_group(field, cur, packed),
        // A group end without a matching group start.
        WireType::EGroup => false,
    }
}

/// Decode a deprecated group: sub-fields up to the matching group-end tag.
///
/// `field.value` ends up spanning the enclosed encoding, excluding the
/// group-end tag, which is consumed from the cursor and checked against the
/// group's field number.
fn decode_group<'a>(field: &mut Field<'a>, cur: &mut Cursor<'a>, packed: bool) -> bool {
    field.value = cur.remaining();
    if !decode_sub_fields(field, packed) {
        return false;
    }
    cur.pos += field.value.len();
    let Some((end_tag, _)) = cur.read_varint(MAX_VARINT_LEN_32) else {
        return false;
    };
    end_tag == u64::from(wire::make_tag(field.field_number, WireType::EGroup))
}

/// Reinterpret a length-delimited payload as a packed sequence of
/// `wire_type` scalars, appending one synthesized sibling per element.
///
/// Rejection leaves `siblings` exactly as found.
fn decode_packed<'a>(field: &Field<'a>, wire_type: WireType, siblings: &mut Vec<Field<'a>>) {
    match wire_type {
        WireType::Varint => {}
        WireType::I32 if field.value.len() % 4 == 0 => {}
        WireType::I64 if field.value.len() % 8 == 0 => {}
        _ => return,
    }
    let before = siblings.len();
    let mut cur = Cursor::new(field.value);
    while !cur.is_empty() {
        let element = match wire_type {
            WireType::Varint => cur.read_varint(MAX_VARINT_LEN_64).map(|(_, bytes)| bytes),
            WireType::I64 => cur.take(8),
            WireType::I32 => cur.take(4),
            _ => None,
        };
        let Some(value) = element else {
            siblings.truncate(before);
            return;
        };
        siblings.push(Field {
            tag: wire::make_tag(field.field_number, wire_type),
            field_number: field.field_number,
            wire_type,
            depth: field.depth,
            value,
            sub_fields: Vec::new(),
        });
    }
}
