// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # Chain follower
//!
//! Keeps the ledger at the tip of the chain source. The follower first catches
//! up block by block, then subscribes to the notifications of the source:
//!
//! * `rawblock`: the block is handed to [`BlockProcessor::parse_new_block`],
//!   which detects reorganizations; a block skipping ahead restarts catch-up
//! * `hashtx` / `rawtx`: paired by sequence number, the payload is kept until
//!   the transaction is announced
//! * `sequence`: `A` queues the transaction in the mempool batch, `R` removes its
//!   mempool events
//!
//! The mempool batch is parsed once full or idle for long enough. Transactions
//! no interpreter supports are remembered in a file so they are not parsed again.
//!
//! Everything runs on one thread, the only one writing to the ledger; the
//! notification loop uses a current-thread runtime.
//!
//! [`BlockProcessor::parse_new_block`]: cairn_parser_worker::BlockProcessor::parse_new_block
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod follower;
mod manager;
mod mempool_batch;
mod not_supported;
mod notification;

pub use config::FollowerConfig;
pub use error::{FollowError, TransportError};
pub use follower::{ChainFollower, FollowerMode, FollowerStatus};
pub use manager::{start_chain_follower, ChainFollowerManager};
pub use mempool_batch::{MempoolBatch, MempoolCorrelator};
pub use not_supported::NotSupportedTransactionsCache;
pub use notification::{
    validate_endpoints, Notification, NotificationEndpoint, NotificationSubscriber,
    SequenceEvent, SequenceLabel, Topic,
};

#[cfg(any(test, feature = "test-exports"))]
pub use notification::MockNotificationSubscriber;

#[cfg(test)]
mod tests;
