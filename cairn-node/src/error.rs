use cairn_db_exports::DatabaseError;
use cairn_follow::FollowError;
use cairn_models::ModelsError;
use cairn_parser_exports::ParserError;
use displaydoc::Display;
use thiserror::Error;

/// Settings and logging setup errors
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum SettingsError {
    /// configuration error: {0}
    Config(#[from] config::ConfigError),
    /// invalid checkpoint height: {0}
    InvalidCheckpoint(String),
    /// cannot initialise logging: {0}
    Logging(String),
}

/// Node start and stop errors
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum NodeError {
    /// settings error: {0}
    Settings(#[from] SettingsError),
    /// database error: {0}
    Database(#[from] DatabaseError),
    /// parser error: {0}
    Parser(#[from] ParserError),
    /// follower error: {0}
    Follow(#[from] FollowError),
    /// models error: {0}
    Models(#[from] ModelsError),
}
