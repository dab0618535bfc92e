use cairn_db_exports::DatabaseError;
use displaydoc::Display;
use thiserror::Error;

/// Cache errors
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum CacheError {
    /// database error: {0}
    Database(#[from] DatabaseError),
    /// sqlite error: {0}
    Sqlite(#[from] rusqlite::Error),
    /// invalid order update: {0}
    InvalidOrderUpdate(String),
}
