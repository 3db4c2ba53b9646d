//! # protosql-core
//!
//! Schema-less Protocol Buffers wire-format decoder and query core.
//!
//! This crate decodes an opaque protobuf message into a tree of fields
//! without any compiled `.proto` schema, addresses fields with a small path
//! language, converts raw payloads to typed scalars, and renders trees as
//! JSON. It has no SQL dependencies; it is the foundation the SQLite
//! bindings (`protosql-sqlite`) are built on.
//!
//! ## Quick start
//!
//! ```rust
//! use protosql_core::{access, decode, LogicalType, Path, WireType};
//!
//! // field 1 = varint 42, field 2 = "hi"
//! let message = [0x08, 0x2a, 0x12, 0x02, 0x68, 0x69];
//!
//! let root = decode(&message, false);
//! let field = root.get_sub_field(1, WireType::Varint, 0).unwrap();
//! assert_eq!(access::get_int64(field.value, 0), Some(42));
//!
//! let path: Path = "$.2".parse().unwrap();
//! let field = protosql_core::path::resolve(&root, &path, LogicalType::String).unwrap();
//! assert_eq!(field.value, b"hi");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                       protosql-core                          |
//! +--------------------------------------------------------------+
//! |  wire/    - WireType, tag pack/unpack                        |
//! |  varint/  - bounded base-128 reader, zig-zag                 |
//! |  field/   - Field<'a> tree, OwnedField cache mirror          |
//! |  decode/  - recursive walker, packed expansion, groups       |
//! |  access/  - LogicalType, typed accessors                     |
//! |  path/    - $.1.2[0] parsing and evaluation                  |
//! |  cache/   - thread-local single-slot decode cache            |
//! |  json/    - best-effort JSON printer                         |
//! |  error/   - path / type errors                               |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Design notes
//!
//! - Decoding is total: malformed bytes truncate the tree, they never
//!   raise. Absence (`Option`) is the only in-band failure signal.
//! - Every decoded field borrows from the caller's input; nothing is
//!   copied except by the decode cache, which owns its copy precisely so
//!   the cached tree has something stable to point into.

pub mod access;
pub mod cache;
pub mod decode;
pub mod error;
pub mod field;
pub mod json;
pub mod path;
pub mod varint;
pub mod wire;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at crate root for convenience
pub use access::LogicalType;
pub use cache::{cache_stats, decode_cached, reset_cache, CacheStats, DECODE_CACHE_WINDOW};
pub use decode::decode;
pub use error::{Error, PathError, Result, TypeError};
pub use field::{Field, OwnedField};
pub use json::to_json;
pub use path::{Path, PathStep};
pub use wire::WireType;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
