use displaydoc::Display;
use thiserror::Error;

/// database result
pub type DatabaseResult<T, E = DatabaseError> = core::result::Result<T, E>;

/// Errors of the ledger store and its connection pool
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum DatabaseError {
    /// timeout after waiting {waited_ms}ms for a database connection ({current}/{max} in use)
    PoolTimeout {
        /// milliseconds spent waiting
        waited_ms: u64,
        /// open connections
        current: usize,
        /// configured cap
        max: usize,
    },
    /// connection pool was closed while waiting for a connection
    PoolClosed,
    /// sqlite error: {0}
    Sqlite(#[from] rusqlite::Error),
    /// integrity check failed: {0}
    IntegrityCheck(String),
    /// foreign key check failed: {0}
    ForeignKeyCheck(String),
    /// unknown ledger table: {0}
    UnknownTable(String),
    /// unknown column {column} in table {table}
    UnknownColumn {
        /// table
        table: String,
        /// column
        column: String,
    },
    /// invalid row: {0}
    InvalidRow(String),
    /// models error: {0}
    Models(#[from] cairn_models::ModelsError),
}
