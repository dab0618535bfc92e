// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # Block processor
//!
//! Applies blocks to the ledger, one write transaction per block:
//!
//! 1. the block row is inserted without hashes
//! 2. every transaction gets the next `tx_index`, its message is unpacked and
//!    handed to the interpreter of its type id, and the resulting events are
//!    applied at once (ledger tables, `messages`, caches) so the next
//!    transaction sees them
//! 3. the three hash chains are folded and checked by the `ConsensusVerifier`
//! 4. the hashes are stored and the transaction is committed
//!
//! Readers therefore never observe a block without its hashes.
//!
//! A rollback deletes every row from a block index on, and resets the caches.
//! A reparse keeps the blocks and transactions, deletes the state derived from
//! them, and applies them again: every recomputed hash must equal the stored one.
//!
//! Unconfirmed transactions are interpreted in a write transaction that is rolled
//! back; only their events are kept, in the `mempool` table.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod apply;
mod mempool;
mod processor;

pub use processor::BlockProcessor;

#[cfg(test)]
mod tests;
