use crate::error::ChainSourceError;
use cairn_models::{Block, RawBlock, RawTransaction, Transaction};

/// The node the ledger follows
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait ChainSource: Send + Sync {
    /// Height of the source tip
    fn get_block_count(&self) -> Result<u64, ChainSourceError>;

    /// Id of the block at `height`, `ChainSourceError::OutOfRange` above the tip
    fn get_block_hash(&self, height: u64) -> Result<String, ChainSourceError>;

    /// Undecoded block
    fn get_block(&self, block_hash: &str) -> Result<RawBlock, ChainSourceError>;

    /// Undecoded transaction, confirmed or in the mempool
    fn get_raw_transaction(&self, tx_hash: &str) -> Result<RawTransaction, ChainSourceError>;

    /// Ids of the transactions currently in the mempool
    fn get_raw_mempool(&self) -> Result<Vec<String>, ChainSourceError>;

    /// Decodes a block, `block_index` being the height it is expected at
    fn deserialize_block(
        &self,
        raw: &RawBlock,
        block_index: u64,
    ) -> Result<Block, ChainSourceError>;

    /// Decodes a transaction
    fn deserialize_transaction(&self, raw: &RawTransaction)
        -> Result<Transaction, ChainSourceError>;
}
