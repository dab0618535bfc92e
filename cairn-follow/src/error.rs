use cairn_db_exports::DatabaseError;
use cairn_parser_exports::{ChainSourceError, ParserError};
use cairn_time::TimeError;
use displaydoc::Display;
use thiserror::Error;

/// Notification channel failures
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// no message available
    NoMessage,
    /// subscription closed: {0}
    Closed(String),
    /// connection failed: {0}
    Connect(String),
    /// malformed notification: {0}
    Malformed(String),
}

impl TransportError {
    /// Whether the subscription must be established again
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::NoMessage | TransportError::Malformed(_))
    }
}

/// Chain follower errors
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum FollowError {
    /// parser error: {0}
    Parser(#[from] ParserError),
    /// database error: {0}
    Database(#[from] DatabaseError),
    /// chain source error: {0}
    ChainSource(#[from] ChainSourceError),
    /// transport error: {0}
    Transport(#[from] TransportError),
    /// io error: {0}
    Io(#[from] std::io::Error),
    /// time error: {0}
    Time(#[from] TimeError),
    /// Notification endpoints are incorrectly configured: {0}
    Endpoints(String),
    /// runtime error: {0}
    Runtime(String),
}
