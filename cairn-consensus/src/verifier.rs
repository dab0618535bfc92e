use crate::checkpoints::{network_checkpoints, Checkpoint};
use crate::error::ConsensusError;
use cairn_db_exports::DatabaseError;
use cairn_db_worker::queries;
use cairn_hash::dhash_hex;
use cairn_models::config::CONSENSUS_HASH_SEED;
use cairn_models::{HashField, Network};
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::trace;

/// Read access to the hashes already stored for a block
pub trait StoredHashes {
    /// Stored value of `field` at `block_index`, `None` if missing or empty
    fn stored_hash(&self, block_index: u64, field: HashField)
        -> Result<Option<String>, DatabaseError>;
}

impl StoredHashes for Connection {
    fn stored_hash(
        &self,
        block_index: u64,
        field: HashField,
    ) -> Result<Option<String>, DatabaseError> {
        queries::stored_hash(self, block_index, field)
    }
}

impl StoredHashes for BTreeMap<(u64, HashField), String> {
    fn stored_hash(
        &self,
        block_index: u64,
        field: HashField,
    ) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .get(&(block_index, field))
            .filter(|hash| !hash.is_empty())
            .cloned())
    }
}

/// Computes and checks the hash chains of a network
#[derive(Debug, Clone)]
pub struct ConsensusVerifier {
    network: Network,
    block_first: u64,
    consensus_hash_version: u32,
    checkpoints: BTreeMap<u64, Checkpoint>,
}

impl ConsensusVerifier {
    /// Verifier using the built-in checkpoints of `network`
    pub fn new(network: Network) -> Self {
        let params = network.params();
        ConsensusVerifier {
            network,
            block_first: params.block_first,
            consensus_hash_version: params.consensus_hash_version,
            checkpoints: network_checkpoints(network),
        }
    }

    /// Adds (or overrides) checkpoints
    pub fn with_checkpoints(mut self, checkpoints: BTreeMap<u64, Checkpoint>) -> Self {
        self.checkpoints.extend(checkpoints);
        self
    }

    /// Network verified
    pub fn network(&self) -> Network {
        self.network
    }

    /// Prior hash of the first block of the network
    pub fn initial_hash() -> String {
        dhash_hex(CONSENSUS_HASH_SEED)
    }

    /// Folds `chunks` into the `field` chain at `block_index`.
    ///
    /// Without `previous_hash`, the hash of the previous block is read from `store`.
    /// Returns the new hash and the value already stored for the block, if any.
    pub fn consensus_hash<S: StoredHashes + ?Sized>(
        &self,
        store: &S,
        block_index: u64,
        field: HashField,
        previous_hash: Option<&str>,
        chunks: &[String],
    ) -> Result<(String, Option<String>), ConsensusError> {
        let previous_hash = match previous_hash {
            Some(hash) if !hash.is_empty() => hash.to_string(),
            Some(_) => {
                return Err(ConsensusError::EmptyPreviousHash { field, block_index });
            }
            None if block_index <= self.block_first => Self::initial_hash(),
            None => store
                .stored_hash(block_index - 1, field)?
                .ok_or(ConsensusError::EmptyPreviousHash { field, block_index })?,
        };

        let mut content = previous_hash;
        content.push_str(&self.consensus_hash_version.to_string());
        for chunk in chunks {
            content.push_str(chunk);
        }
        let calculated = dhash_hex(&content);

        let stored = store.stored_hash(block_index, field)?;
        if let Some(stored) = &stored {
            if *stored != calculated {
                return Err(ConsensusError::InconsistentHash {
                    field,
                    block_index,
                    calculated,
                    stored: stored.clone(),
                });
            }
        }

        if let Some(expected) = self
            .checkpoints
            .get(&block_index)
            .and_then(|checkpoint| checkpoint.hash(field))
        {
            if expected != calculated {
                return Err(ConsensusError::IncorrectHash {
                    field,
                    block_index,
                    calculated,
                    expected: expected.to_string(),
                });
            }
            trace!("{} of block {} matches its checkpoint", field, block_index);
        }

        Ok((calculated, stored))
    }
}
