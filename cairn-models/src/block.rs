use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Undecoded block as delivered by the chain source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock(pub Vec<u8>);

/// A decoded block with its transactions in chain order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// height
    pub block_index: u64,
    /// block id
    pub block_hash: String,
    /// parent block id
    pub previous_block_hash: String,
    /// UNIX timestamp in seconds
    pub block_time: u64,
    /// transactions in block order
    pub transactions: Vec<Transaction>,
}

/// A `blocks` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// height
    pub block_index: u64,
    /// block id
    pub block_hash: String,
    /// parent block id
    pub previous_block_hash: String,
    /// UNIX timestamp in seconds
    pub block_time: u64,
    /// hash chain over state changes, `None` until the block is fully applied
    pub ledger_hash: Option<String>,
    /// hash chain over transactions
    pub txlist_hash: Option<String>,
    /// hash chain over emitted events
    pub messages_hash: Option<String>,
    /// number of transactions stored for the block
    pub transaction_count: u64,
}

/// The three hash chains stored on every block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashField {
    /// state changes
    LedgerHash,
    /// transactions
    TxlistHash,
    /// emitted events
    MessagesHash,
}

impl HashField {
    /// All chains, in the order they are computed
    pub const ALL: [HashField; 3] = [
        HashField::TxlistHash,
        HashField::LedgerHash,
        HashField::MessagesHash,
    ];

    /// Column of the `blocks` table
    pub const fn column(&self) -> &'static str {
        match self {
            HashField::LedgerHash => "ledger_hash",
            HashField::TxlistHash => "txlist_hash",
            HashField::MessagesHash => "messages_hash",
        }
    }
}

impl fmt::Display for HashField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl BlockRecord {
    /// Stored value of one hash chain
    pub fn hash(&self, field: HashField) -> Option<&str> {
        match field {
            HashField::LedgerHash => self.ledger_hash.as_deref(),
            HashField::TxlistHash => self.txlist_hash.as_deref(),
            HashField::MessagesHash => self.messages_hash.as_deref(),
        }
    }
}
