//! `protobuf_foreach(buffer, root)` eponymous virtual table.
//!
//! Decodes a message and emits one row per direct child of the resolved
//! root field, in wire order. The query planner must provide an equality
//! constraint on the hidden `buffer` column; the hidden `root` column
//! optionally narrows the walk to a nested field.
//!
//! ```sql
//! SELECT field, wiretype, value FROM protobuf_foreach(?1);
//! SELECT * FROM protobuf_each(?1, '$.2');
//! ```

use std::marker::PhantomData;
use std::os::raw::c_int;

use rusqlite::ffi;
use rusqlite::vtab::{
    eponymous_only_module, Context, IndexConstraintOp, IndexInfo, VTab, VTabConnection,
    VTabCursor, Values,
};
use rusqlite::{Connection, Error, Result};

use protosql_core::{decode, path, OwnedField, Path};

const COL_TAG: c_int = 0;
const COL_FIELD: c_int = 1;
const COL_WIRETYPE: c_int = 2;
const COL_VALUE: c_int = 3;
const COL_PARENT: c_int = 4;
/// First hidden column: the message argument.
const COL_BUFFER: c_int = 5;
/// Second hidden column: the root path argument.
const COL_ROOT: c_int = 6;

/// Plan numbers, mirrored in `filter`: bit 0 = buffer constrained,
/// bit 1 = root constrained.
const PLAN_NONE: c_int = 0;
const PLAN_BUFFER: c_int = 1;
const PLAN_BUFFER_AND_ROOT: c_int = 3;

pub fn register(conn: &Connection) -> Result<()> {
    conn.create_module(
        "protobuf_foreach",
        eponymous_only_module::<ProtobufForeachTab>(),
        None,
    )?;
    conn.create_module(
        "protobuf_each",
        eponymous_only_module::<ProtobufForeachTab>(),
        None,
    )
}

/// The virtual table is stateless; everything lives in the cursor.
#[repr(C)]
pub struct ProtobufForeachTab {
    base: ffi::sqlite3_vtab,
}

unsafe impl<'vtab> VTab<'vtab> for ProtobufForeachTab {
    type Aux = ();
    type Cursor = ProtobufForeachCursor<'vtab>;

    fn connect(
        _: &mut VTabConnection,
        _aux: Option<&()>,
        _args: &[&[u8]],
    ) -> Result<(String, Self)> {
        let vtab = ProtobufForeachTab {
            base: ffi::sqlite3_vtab::default(),
        };
        Ok((
            "CREATE TABLE x(tag,field,wiretype,value,parent,buffer HIDDEN,root HIDDEN)".to_owned(),
            vtab,
        ))
    }

    fn best_index(&self, info: &mut IndexInfo) -> Result<()> {
        let mut buffer_constraint = None;
        let mut root_constraint = None;
        let mut unusable_mask = 0u32;
        let mut usable_mask = 0u32;

        for (i, constraint) in info.constraints().enumerate() {
            let col = constraint.column();
            if col < COL_BUFFER {
                // Constraints on visible columns are not consumable.
                continue;
            }
            let mask = 1u32 << (col - COL_BUFFER);
            if !constraint.is_usable() {
                unusable_mask |= mask;
            } else if constraint.operator() == IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_EQ {
                usable_mask |= mask;
                if col == COL_BUFFER {
                    buffer_constraint = Some(i);
                } else {
                    root_constraint = Some(i);
                }
            }
        }

        if unusable_mask & !usable_mask != 0 {
            // A hidden-column constraint exists but cannot be used in this
            // plan; reject the whole plan rather than run unconstrained.
            return Err(Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_CONSTRAINT),
                None,
            ));
        }

        if let Some(buffer_idx) = buffer_constraint {
            info.set_estimated_cost(1.0);
            {
                let mut usage = info.constraint_usage(buffer_idx);
                usage.set_argv_index(1);
                usage.set_omit(true);
            }
            if let Some(root_idx) = root_constraint {
                let mut usage = info.constraint_usage(root_idx);
                usage.set_argv_index(2);
                usage.set_omit(true);
                info.set_idx_num(PLAN_BUFFER_AND_ROOT);
            } else {
                info.set_idx_num(PLAN_BUFFER);
            }
        } else {
            // Without a buffer the table has nothing to walk; leave the
            // estimated cost at its huge default to steer the planner away.
            info.set_idx_num(PLAN_NONE);
        }

        // Rows come out in rowid order already.
        if info.num_of_order_by() == 1 {
            let rowid_asc = info
                .order_bys()
                .next()
                .is_some_and(|ob| ob.column() < 0 && !ob.is_order_by_desc());
            if rowid_asc {
                info.set_order_by_consumed(true);
            }
        }

        Ok(())
    }

    fn open(&'vtab mut self) -> Result<ProtobufForeachCursor<'vtab>> {
        Ok(ProtobufForeachCursor::new())
    }
}

/// Cursor over the resolved root's children.
///
/// Owns the message bytes: filter arguments do not outlive the filter
/// call, so the decoded tree is kept in offset form next to its buffer.
#[repr(C)]
pub struct ProtobufForeachCursor<'vtab> {
    base: ffi::sqlite3_vtab_cursor,
    row_id: i64,
    buffer: Vec<u8>,
    root_path: String,
    root: Option<OwnedField>,
    phantom: PhantomData<&'vtab ProtobufForeachTab>,
}

impl ProtobufForeachCursor<'_> {
    fn new() -> Self {
        ProtobufForeachCursor {
            base: ffi::sqlite3_vtab_cursor::default(),
            row_id: 0,
            buffer: Vec::new(),
            root_path: "$".to_owned(),
            root: None,
            phantom: PhantomData,
        }
    }

    fn current(&self) -> Option<(&OwnedField, &OwnedField)> {
        let root = self.root.as_ref()?;
        let child = root.sub_fields.get(usize::try_from(self.row_id).ok()?)?;
        Some((root, child))
    }
}

unsafe impl VTabCursor for ProtobufForeachCursor<'_> {
    fn filter(
        &mut self,
        idx_num: c_int,
        _idx_str: Option<&str>,
        args: &Values<'_>,
    ) -> Result<()> {
        self.row_id = 0;
        self.root = None;
        self.root_path = "$".to_owned();

        if idx_num == PLAN_NONE {
            return Ok(());
        }

        let Some(buffer) = args.get::<Option<Vec<u8>>>(0)? else {
            return Ok(());
        };
        self.buffer = buffer;
        let tree = decode(&self.buffer, true).to_owned_tree(&self.buffer);

        if idx_num != PLAN_BUFFER_AND_ROOT {
            self.root = Some(tree);
            return Ok(());
        }

        let text = args.get::<Option<String>>(1)?.unwrap_or_default();
        if text.is_empty() {
            // An empty root behaves like `$`: the whole message.
            self.root = Some(tree);
            return Ok(());
        }
        let parsed: Path = text
            .parse()
            .map_err(|e: protosql_core::PathError| Error::ModuleError(e.to_string()))?;
        self.root_path = text;
        // Silent when the root does not resolve: no rows, no error.
        self.root = path::resolve_root(&tree, &parsed).cloned();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.row_id += 1;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.current().is_none()
    }

    fn column(&self, ctx: &mut Context, col: c_int) -> Result<()> {
        let Some((root, child)) = self.current() else {
            return Ok(());
        };
        match col {
            COL_TAG => ctx.set_result(&i64::from(child.tag)),
            COL_FIELD => ctx.set_result(&i64::from(child.field_number)),
            COL_WIRETYPE => ctx.set_result(&i64::from(child.wire_type.into_val())),
            COL_VALUE => {
                let value: &[u8] = &self.buffer[child.value.clone()];
                ctx.set_result(&value)
            }
            COL_PARENT => {
                let value: &[u8] = &self.buffer[root.value.clone()];
                ctx.set_result(&value)
            }
            COL_BUFFER => ctx.set_result(&self.buffer),
            COL_ROOT => ctx.set_result(&self.root_path),
            _ => Ok(()),
        }
    }

    fn rowid(&self) -> Result<i64> {
        Ok(self.row_id)
    }
}
