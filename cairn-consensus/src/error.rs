// Copyright (c) 2022 MASSA LABS <info@massa.net>
use cairn_db_exports::DatabaseError;
use cairn_models::{HashField, Version};
use displaydoc::Display;
use thiserror::Error;

/// Hash chain failures. All of them halt ingestion.
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ConsensusError {
    /// Empty previous {field} for block {block_index}. Please launch a `reparse`.
    EmptyPreviousHash {
        /// chain
        field: HashField,
        /// block being hashed
        block_index: u64,
    },
    /// Inconsistent {field} for block {block_index} (calculated: {calculated}, stored: {stored})
    InconsistentHash {
        /// chain
        field: HashField,
        /// block being hashed
        block_index: u64,
        /// recomputed value
        calculated: String,
        /// value found in the store
        stored: String,
    },
    /// Incorrect {field} hash for block {block_index}. Calculated {calculated} but expected {expected}
    IncorrectHash {
        /// chain
        field: HashField,
        /// block being hashed
        block_index: u64,
        /// recomputed value
        calculated: String,
        /// checkpoint value
        expected: String,
    },
    /// database error: {0}
    Database(#[from] DatabaseError),
}

/// Software version check failures
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum VersionError {
    /// Version of the software is {current}, protocol change `{name}` requires at least {required} from block {block_index}. Please upgrade.
    VersionUpdateRequired {
        /// change name
        name: String,
        /// minimum version
        required: Version,
        /// running version
        current: Version,
        /// activation height
        block_index: u64,
    },
    /// Unable to check the software version: {0}
    VersionCheck(String),
}
