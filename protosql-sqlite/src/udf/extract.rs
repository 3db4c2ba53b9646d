//! `protobuf_extract(data, path, type)` scalar function.
//!
//! Locates one field in an opaque message and converts it to a SQL value.
//! A path that parses but does not resolve, or a payload the requested
//! type cannot read, yields NULL; only bad path syntax and unknown type
//! names raise.

use std::os::raw::c_int;
use std::sync::Arc;

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

use protosql_core::{access, cache, path, LogicalType, Path, PathError};

use crate::error::ProtoSqlError;

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "protobuf_extract",
        3,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        extract,
    )
}

fn extract(ctx: &Context<'_>) -> rusqlite::Result<Value> {
    let path = cached_path(ctx, 1)?;
    let ty = *cached_type(ctx, 2)?;

    let data = match ctx.get_raw(0) {
        ValueRef::Blob(bytes) => bytes,
        ValueRef::Text(bytes) => bytes,
        _ => return Ok(Value::Null),
    };

    let root = cache::decode_cached(data, true);
    let Some(field) = path::resolve(&root, &path, ty) else {
        return Ok(Value::Null);
    };
    Ok(to_sql_value(ty, field.value))
}

/// Parse the path argument, memoised per call site.
fn cached_path(ctx: &Context<'_>, arg: usize) -> rusqlite::Result<Arc<Path>> {
    if let Some(path) = ctx.get_aux::<Path>(arg as c_int)? {
        return Ok(path);
    }
    let text: String = ctx.get(arg)?;
    let path: Path = text.parse().map_err(ProtoSqlError::from)?;
    if path.is_root() {
        // Extraction needs a final step to select a wire type with
        return Err(ProtoSqlError::from(PathError::EmptyPath).into());
    }
    ctx.set_aux(arg as c_int, path)
}

/// Parse the type argument, memoised per call site.
fn cached_type(ctx: &Context<'_>, arg: usize) -> rusqlite::Result<Arc<LogicalType>> {
    if let Some(ty) = ctx.get_aux::<LogicalType>(arg as c_int)? {
        return Ok(ty);
    }
    let text: String = ctx.get(arg)?;
    let ty: LogicalType = text.parse().map_err(ProtoSqlError::from)?;
    ctx.set_aux(arg as c_int, ty)
}

/// Convert a resolved payload to the SQL datatype the logical type calls
/// for. Accessor failure is the NULL (missing field) signal.
fn to_sql_value(ty: LogicalType, value: &[u8]) -> Value {
    match ty {
        LogicalType::Buffer | LogicalType::Bytes => Value::Blob(value.to_vec()),
        LogicalType::String => Value::Text(String::from_utf8_lossy(value).into_owned()),
        LogicalType::Int32 | LogicalType::Enum => integer(access::get_int32(value, 0)),
        LogicalType::Int64 => integer(access::get_int64(value, 0)),
        LogicalType::UInt32 => integer(access::get_uint32(value, 0)),
        LogicalType::UInt64 => unsigned(access::get_uint64(value, 0)),
        LogicalType::SInt32 => integer(access::get_sint32(value, 0)),
        LogicalType::SInt64 => integer(access::get_sint64(value, 0)),
        LogicalType::Bool => integer(access::get_bool(value, 0).map(i64::from)),
        LogicalType::Fixed64 => unsigned(access::get_fixed64(value, 0)),
        LogicalType::SFixed64 => integer(access::get_sfixed64(value, 0)),
        LogicalType::Double => real(access::get_double(value, 0)),
        LogicalType::Fixed32 => integer(access::get_fixed32(value, 0)),
        LogicalType::SFixed32 => integer(access::get_sfixed32(value, 0)),
        LogicalType::Float => real(access::get_float(value, 0).map(f64::from)),
    }
}

fn integer<T: Into<i64>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, |v| Value::Integer(v.into()))
}

fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

/// SQLite integers are signed; values past `i64::MAX` keep their bit
/// pattern and are reported through the log.
fn unsigned(value: Option<u64>) -> Value {
    match value {
        Some(v) => {
            if v > i64::MAX as u64 {
                tracing::warn!(value = v, "unsigned value does not fit in signed 64-bit");
            }
            Value::Integer(v as i64)
        }
        None => Value::Null,
    }
}
