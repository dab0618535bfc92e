// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Digest primitives shared by the ledger hash chain and the event log.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
mod hash;
mod settings;

pub use error::HashError;
pub use hash::{dhash_hex, sha256_hex, Hash};
pub use settings::HASH_SIZE_BYTES;
