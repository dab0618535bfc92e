// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Data types shared by every ledger crate: blocks, transactions, ledger
//! events, asset and order rows, network parameters and versions.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

pub use asset::{AssetRecord, Destruction};
pub use block::{Block, BlockRecord, HashField, RawBlock};
pub use error::ModelsError;
pub use event::{canonical_json, EventCommand, LedgerEvent, MessageRecord};
pub use network::{Network, NetworkParams};
pub use order::{Order, OrderStatus};
pub use transaction::{RawTransaction, Transaction, TransactionType, UtxosInfo};
pub use version::Version;

mod asset;
mod block;
/// models error
pub mod error;
mod event;
mod network;
mod order;
mod transaction;
mod version;

/// Expose constants
pub mod config;

#[cfg(test)]
use assert_matches as _;
