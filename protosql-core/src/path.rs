//! Path expressions: parsing and evaluation.
//!
//! A path addresses a field without a schema: `$` is the message root and
//! each `.<number>[<index>]` step selects the index-th repetition of a
//! field number, `[0]` when the index is omitted. Negative indices count
//! from the back.
//!
//! ```text
//! path   := '$' step*
//! step   := '.' number index?
//! index  := '[' signed ']'
//! ```

use std::str::FromStr;

use smallvec::SmallVec;

use crate::access::LogicalType;
use crate::error::PathError;
use crate::field::{Field, OwnedField};
use crate::wire::WireType;

/// One `(field_number, repetition_index)` step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub field_number: u32,
    pub index: i64,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    steps: SmallVec<[PathStep; 4]>,
}

impl Path {
    /// Steps in root-to-leaf order. Empty for the bare root path `$`.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Whether this is the bare root path `$`.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, PathError> {
        let rest = s.strip_prefix('$').ok_or(PathError::MissingRoot)?;
        let bytes = rest.as_bytes();
        let mut steps = SmallVec::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'.' {
                return Err(PathError::ExpectedDot(i + 1));
            }
            i += 1;

            let number_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let field_number: u32 = rest[number_start..i]
                .parse()
                .map_err(|_| PathError::InvalidFieldNumber(number_start + 1))?;

            let mut index: i64 = 0;
            if i < bytes.len() && bytes[i] == b'[' {
                i += 1;
                let index_start = i;
                if i < bytes.len() && bytes[i] == b'-' {
                    i += 1;
                }
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                index = rest[index_start..i]
                    .parse()
                    .map_err(|_| PathError::InvalidIndex(index_start + 1))?;
                if i >= bytes.len() || bytes[i] != b']' {
                    return Err(PathError::UnterminatedIndex(index_start + 1));
                }
                i += 1;
            }

            steps.push(PathStep {
                field_number,
                index,
            });
        }

        Ok(Path { steps })
    }
}

/// Select a message-valued child: length-delimited first, then a group.
fn message_step<'t, 'a>(field: &'t Field<'a>, step: &PathStep) -> Option<&'t Field<'a>> {
    field
        .get_sub_field(step.field_number, WireType::Len, step.index)
        .or_else(|| field.get_sub_field(step.field_number, WireType::SGroup, step.index))
}

/// Resolve `path` against a decoded tree, interpreting the final step
/// through `ty`'s wire-type candidates.
///
/// Intermediate steps traverse nested messages (and deprecated groups);
/// the last step tries each wire type the logical type maps to, in order.
/// `None` means the path does not resolve, which callers surface as the
/// missing-field signal rather than an error. The bare root path has no
/// final step to interpret and never resolves here.
pub fn resolve<'t, 'a>(
    root: &'t Field<'a>,
    path: &Path,
    ty: LogicalType,
) -> Option<&'t Field<'a>> {
    let (last, init) = path.steps().split_last()?;
    let mut field = root;
    for step in init {
        field = message_step(field, step)?;
    }
    ty.wire_types()
        .iter()
        .find_map(|wt| field.get_sub_field(last.field_number, *wt, last.index))
}

/// Resolve every step of `path` as a message step against an owned tree.
///
/// This is the virtual table's root lookup: the selected field's children
/// become the rows. The bare root path resolves to the tree itself.
pub fn resolve_root<'t>(root: &'t OwnedField, path: &Path) -> Option<&'t OwnedField> {
    let mut field = root;
    for step in path.steps() {
        field = field
            .get_sub_field(step.field_number, WireType::Len, step.index)
            .or_else(|| field.get_sub_field(step.field_number, WireType::SGroup, step.index))?;
    }
    Some(field)
}
