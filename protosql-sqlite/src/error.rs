//! Error shim between the core and the SQLite host.
//!
//! Only path syntax, type names, and arity surface as SQL errors;
//! everything else is a NULL result or an empty row set.

use protosql_core::{PathError, TypeError};
use thiserror::Error;

/// User-visible errors raised by the SQL entry points.
#[derive(Error, Debug)]
pub enum ProtoSqlError {
    /// Malformed path expression
    #[error(transparent)]
    Path(#[from] PathError),

    /// Unknown logical type name
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Bad argument count on a variadic function
    #[error("Wrong number of arguments")]
    Arity,
}

impl From<ProtoSqlError> for rusqlite::Error {
    fn from(err: ProtoSqlError) -> Self {
        rusqlite::Error::UserFunctionError(Box::new(err))
    }
}
