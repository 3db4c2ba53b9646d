//! # protosql-sqlite
//!
//! SQLite surface for schema-less protobuf querying.
//!
//! Registers two scalar functions and one virtual-table module on a
//! connection:
//!
//! ```sql
//! -- Pull one field out of a message, typed
//! SELECT protobuf_extract(data, '$.1.2[0].3', 'int64') FROM events;
//!
//! -- Render a whole message as JSON
//! SELECT protobuf_to_json(data) FROM events;
//!
//! -- Walk a message one wire-level field per row
//! SELECT field, wiretype, value FROM protobuf_foreach(x'082a');
//!
//! -- protobuf_each is an alias, and accepts a root path
//! SELECT * FROM protobuf_each(x'0a02082a', '$.1');
//! ```
//!
//! Paths address fields by number because there is no schema: `$.1.2[0]`
//! is "field 2's first repetition inside field 1". Missing fields are
//! NULL (or zero rows), never errors; only malformed paths and unknown
//! type names raise.

mod udf;
mod vtab;

pub mod error;

pub use error::ProtoSqlError;
pub use protosql_core;
pub use vtab::ProtobufForeachTab;

use rusqlite::Connection;

/// Extension name.
pub const EXTENSION_NAME: &str = "protosql";

/// Extension version.
pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Register all functions and modules on a connection.
///
/// The Rust analogue of a SQLite extension's init entry point; call once
/// per connection before using any of the SQL surface.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    tracing::debug!(
        "registering {} v{} SQL surface",
        EXTENSION_NAME,
        EXTENSION_VERSION
    );
    udf::register_udfs(conn)?;
    vtab::register_modules(conn)
}
