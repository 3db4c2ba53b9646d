//! Virtual-table modules.

mod foreach;

use rusqlite::Connection;

pub use foreach::ProtobufForeachTab;

/// Register every virtual-table module on the connection.
pub fn register_modules(conn: &Connection) -> rusqlite::Result<()> {
    foreach::register(conn)
}
