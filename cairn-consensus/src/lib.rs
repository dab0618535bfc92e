// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Hash chain verification of the ledger.
//!
//! Three chains are folded block after block: the transaction list, the
//! state-mutating events and the event hashes. Each link is
//! `hex(SHA256(SHA256(previous ‖ consensus_hash_version ‖ chunk₁ ‖ … ‖ chunkₙ)))`.
//! A recomputed link must match the value already stored for the block, and the
//! value of the network checkpoint table when one exists.
//!
//! The crate also holds the software version check against the published
//! protocol changes.
#![warn(missing_docs)]

mod checkpoints;
mod error;
mod verifier;
mod version_check;

pub use checkpoints::{network_checkpoints, Checkpoint};
pub use error::{ConsensusError, VersionError};
pub use verifier::{ConsensusVerifier, StoredHashes};
pub use version_check::{
    check_change, check_software_version, parse_requirements, ProtocolChange, ProtocolChanges,
    VersionSource,
};

#[cfg(any(test, feature = "test-exports"))]
pub use version_check::MockVersionSource;

#[cfg(test)]
mod tests;
