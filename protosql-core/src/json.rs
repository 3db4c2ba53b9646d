//! Best-effort JSON rendering of a decoded tree.
//!
//! Without a schema the printer can only guess: varints print as signed
//! decimals, fixed-width values as floats, and length-delimited leaves as
//! quoted strings when every byte is printable ASCII, base64 otherwise.
//! Keys are bare field numbers, or `<field>_<wiretype>` when type display
//! is requested. Repetitions of a tag render as a JSON array.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::access;
use crate::field::Field;
use crate::wire::{tag_field_number, tag_wire_type, WireType};

/// Render `field` (usually a decode root) as JSON text.
pub fn to_json(field: &Field<'_>, show_type: bool) -> String {
    let mut out = String::new();
    write_field(&mut out, field, show_type);
    out
}

fn write_field(out: &mut String, field: &Field<'_>, show_type: bool) {
    if !field.sub_fields.is_empty() {
        write_object(out, field, show_type);
    } else {
        match field.wire_type {
            WireType::Varint => {
                out.push_str(&access::get_int64(field.value, 0).unwrap_or(0).to_string());
            }
            WireType::I64 => {
                out.push_str(&access::get_double(field.value, 0).unwrap_or(0.0).to_string());
            }
            WireType::I32 => {
                out.push_str(&access::get_float(field.value, 0).unwrap_or(0.0).to_string());
            }
            WireType::SGroup => out.push_str("{}"),
            WireType::Len | WireType::EGroup => write_string(out, field.value),
        }
    }
}

fn write_object(out: &mut String, field: &Field<'_>, show_type: bool) {
    // Group repetitions by tag, keeping first-appearance order.
    let mut groups: Vec<(u32, Vec<&Field<'_>>)> = Vec::new();
    for child in &field.sub_fields {
        match groups.iter_mut().find(|(tag, _)| *tag == child.tag) {
            Some((_, members)) => members.push(child),
            None => groups.push((child.tag, vec![child])),
        }
    }

    out.push('{');
    for (i, (tag, members)) in groups.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&tag_field_number(*tag).to_string());
        if show_type {
            out.push('_');
            let wire = tag_wire_type(*tag).map_or(0, WireType::into_val);
            out.push_str(&wire.to_string());
        }
        out.push_str("\":");
        if members.len() > 1 {
            out.push('[');
        }
        for (j, member) in members.iter().enumerate() {
            if j > 0 {
                out.push(',');
            }
            write_field(out, member, show_type);
        }
        if members.len() > 1 {
            out.push(']');
        }
    }
    out.push('}');
}

fn write_string(out: &mut String, value: &[u8]) {
    out.push('"');
    if value.iter().all(|b| (0x20..=0x7e).contains(b)) {
        for &b in value {
            if b == b'"' || b == b'\\' {
                out.push('\\');
            }
            out.push(b as char);
        }
    } else {
        out.push_str(&STANDARD.encode(value));
    }
    out.push('"');
}
