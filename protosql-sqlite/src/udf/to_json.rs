//! `protobuf_to_json(data [, mode])` scalar function.
//!
//! Mode is a bit set: bit 0 renders keys as `<field>_<wiretype>`, bit 1
//! also attempts packed-repeated disambiguation while decoding.

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

use protosql_core::{cache, json};

use crate::error::ProtoSqlError;

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "protobuf_to_json",
        -1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        to_json,
    )
}

fn to_json(ctx: &Context<'_>) -> rusqlite::Result<Value> {
    if ctx.len() < 1 || ctx.len() > 2 {
        return Err(ProtoSqlError::Arity.into());
    }

    let mode = if ctx.len() > 1 {
        ctx.get_raw(1).as_i64().unwrap_or(0)
    } else {
        0
    };
    let show_type = mode & 1 != 0;
    let packed = mode & 2 != 0;

    let data = match ctx.get_raw(0) {
        ValueRef::Blob(bytes) => bytes,
        ValueRef::Text(bytes) => bytes,
        _ => &[],
    };

    let root = cache::decode_cached(data, packed);
    Ok(Value::Text(json::to_json(&root, show_type)))
}
