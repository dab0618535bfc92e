// Copyright (c) 2022 MASSA LABS <info@massa.net>
use displaydoc::Display;
use thiserror::Error;

/// models result
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// models error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ModelsError {
    /// Deserialization error: {0}
    DeserializeError(String),
    /// invalid version identifier: {0}
    InvalidVersionError(String),
    /// invalid utxos info: {0}
    InvalidUtxosInfo(String),
    /// unknown network: {0}
    UnknownNetwork(String),
    /// unknown order status: {0}
    UnknownOrderStatus(String),
    /// unknown event command: {0}
    UnknownEventCommand(String),
    /// hash error: {0}
    HashError(#[from] cairn_hash::HashError),
    /// json error: {0}
    JsonError(#[from] serde_json::Error),
}
