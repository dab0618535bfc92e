use displaydoc::Display;
use thiserror::Error;

/// Hash error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum HashError {
    /// parsing error: {0}
    ParsingError(String),
    /// wrong digest length: expected {expected} bytes, got {got}
    WrongLength {
        /// expected length
        expected: usize,
        /// received length
        got: usize,
    },
}
