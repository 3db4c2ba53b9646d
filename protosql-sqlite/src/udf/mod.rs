//! Scalar functions.

mod extract;
mod to_json;

use rusqlite::Connection;

/// Register every scalar function on the connection.
pub fn register_udfs(conn: &Connection) -> rusqlite::Result<()> {
    extract::register(conn)?;
    to_json::register(conn)
}
