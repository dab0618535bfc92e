use cairn_hash::sha256_hex;
use cairn_models::{Block, RawBlock, RawTransaction, Transaction};
use cairn_parser_exports::{ChainSource, ChainSourceError};
use parking_lot::RwLock;

#[derive(Default)]
struct ChainState {
    blocks: Vec<Block>,
    mempool: Vec<Transaction>,
    // changes the hashes of the blocks mined after a reorg
    fork: u64,
}

/// A chain source holding blocks in memory, encoded as JSON.
///
/// Blocks are numbered from `first_index`.
pub struct InMemoryChain {
    first_index: u64,
    state: RwLock<ChainState>,
}

impl InMemoryChain {
    pub fn new(first_index: u64) -> Self {
        InMemoryChain {
            first_index,
            state: RwLock::new(ChainState::default()),
        }
    }

    /// Appends a block, removing its transactions from the mempool
    pub fn mine(&self, transactions: Vec<Transaction>) -> Block {
        let mut state = self.state.write();
        let block_index = self.first_index + state.blocks.len() as u64;
        let previous_block_hash = state
            .blocks
            .last()
            .map(|block| block.block_hash.clone())
            .unwrap_or_else(|| "0".repeat(64));
        let block_hash = sha256_hex(&format!(
            "{}:{}:{}",
            previous_block_hash, block_index, state.fork
        ));
        state
            .mempool
            .retain(|tx| !transactions.iter().any(|mined| mined.tx_hash == tx.tx_hash));
        let block = Block {
            block_index,
            block_hash,
            previous_block_hash,
            block_time: 1_700_000_000 + block_index * 600,
            transactions,
        };
        state.blocks.push(block.clone());
        block
    }

    /// Appends `count` empty blocks
    pub fn mine_empty(&self, count: usize) {
        for _ in 0..count {
            self.mine(Vec::new());
        }
    }

    /// Drops the blocks from `block_index` on. Blocks mined afterwards get new hashes.
    pub fn reorg(&self, block_index: u64) {
        let mut state = self.state.write();
        let keep = block_index.saturating_sub(self.first_index) as usize;
        state.blocks.truncate(keep);
        state.fork += 1;
    }

    pub fn add_to_mempool(&self, tx: Transaction) {
        self.state.write().mempool.push(tx);
    }

    pub fn remove_from_mempool(&self, tx_hash: &str) {
        self.state.write().mempool.retain(|tx| tx.tx_hash != tx_hash);
    }

    pub fn block(&self, block_index: u64) -> Option<Block> {
        let index = block_index.checked_sub(self.first_index)? as usize;
        self.state.read().blocks.get(index).cloned()
    }

    pub fn tip(&self) -> Option<Block> {
        self.state.read().blocks.last().cloned()
    }

    pub fn raw_block(block: &Block) -> RawBlock {
        RawBlock(serde_json::to_vec(block).expect("block serialization"))
    }
}

impl ChainSource for InMemoryChain {
    fn get_block_count(&self) -> Result<u64, ChainSourceError> {
        let state = self.state.read();
        Ok(state
            .blocks
            .last()
            .map(|block| block.block_index)
            .unwrap_or(self.first_index))
    }

    fn get_block_hash(&self, height: u64) -> Result<String, ChainSourceError> {
        self.block(height)
            .map(|block| block.block_hash)
            .ok_or(ChainSourceError::OutOfRange(height))
    }

    fn get_block(&self, block_hash: &str) -> Result<RawBlock, ChainSourceError> {
        self.state
            .read()
            .blocks
            .iter()
            .find(|block| block.block_hash == block_hash)
            .map(InMemoryChain::raw_block)
            .ok_or_else(|| ChainSourceError::NotFound(block_hash.to_string()))
    }

    fn get_raw_transaction(&self, tx_hash: &str) -> Result<RawTransaction, ChainSourceError> {
        let state = self.state.read();
        state
            .mempool
            .iter()
            .chain(state.blocks.iter().flat_map(|block| block.transactions.iter()))
            .find(|tx| tx.tx_hash == tx_hash)
            .map(crate::raw_transaction)
            .ok_or_else(|| ChainSourceError::NotFound(tx_hash.to_string()))
    }

    fn get_raw_mempool(&self) -> Result<Vec<String>, ChainSourceError> {
        Ok(self
            .state
            .read()
            .mempool
            .iter()
            .map(|tx| tx.tx_hash.clone())
            .collect())
    }

    // the height is a hint, the JSON encoding carries the real one
    fn deserialize_block(
        &self,
        raw: &RawBlock,
        _block_index: u64,
    ) -> Result<Block, ChainSourceError> {
        serde_json::from_slice(&raw.0).map_err(|err| ChainSourceError::Decode(err.to_string()))
    }

    fn deserialize_transaction(
        &self,
        raw: &RawTransaction,
    ) -> Result<Transaction, ChainSourceError> {
        serde_json::from_slice(&raw.0).map_err(|err| ChainSourceError::Decode(err.to_string()))
    }
}
