// Copyright (c) 2022 MASSA LABS <info@massa.net>
use cairn_caches::CacheError;
use cairn_consensus::{ConsensusError, VersionError};
use cairn_db_exports::DatabaseError;
use cairn_models::ModelsError;
use cairn_time::TimeError;
use displaydoc::Display;
use thiserror::Error;

/// Chain source failures
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainSourceError {
    /// block height {0} is out of range
    OutOfRange(u64),
    /// not found: {0}
    NotFound(String),
    /// cannot decode: {0}
    Decode(String),
    /// chain source unavailable: {0}
    Unavailable(String),
}

/// Failures of an interpreter. Always fatal for the block.
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum InterpreterError {
    /// {0}
    Invalid(String),
    /// database error: {0}
    Database(#[from] DatabaseError),
    /// sqlite error: {0}
    Sqlite(#[from] rusqlite::Error),
    /// cache error: {0}
    Cache(#[from] CacheError),
}

/// Block processor errors
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ParserError {
    /// consensus error: {0}
    Consensus(#[from] ConsensusError),
    /// Error while parsing transaction {tx_hash}: {source}
    ParseTransaction {
        /// failing transaction
        tx_hash: String,
        /// interpreter error
        source: InterpreterError,
    },
    /// database error: {0}
    Database(#[from] DatabaseError),
    /// sqlite error: {0}
    Sqlite(#[from] rusqlite::Error),
    /// cache error: {0}
    Cache(#[from] CacheError),
    /// chain source error: {0}
    ChainSource(#[from] ChainSourceError),
    /// models error: {0}
    Models(#[from] ModelsError),
    /// version error: {0}
    Version(#[from] VersionError),
    /// Block {block_index} does not extend block {parent_index} although both match the chain source
    InconsistentParent {
        /// rejected block
        block_index: u64,
        /// local tip
        parent_index: u64,
    },
    /// time error: {0}
    Time(#[from] TimeError),
    /// invalid event: {0}
    InvalidEvent(String),
}
