use cairn_models::RawTransaction;
use cairn_time::CairnTime;
use schnellru::{ByLength, LruMap};
use std::collections::BTreeMap;

/// Unconfirmed transactions waiting to be parsed together
#[derive(Debug)]
pub struct MempoolBatch {
    max_size: usize,
    idle_timeout: CairnTime,
    last_flush: CairnTime,
    pending: Vec<(String, RawTransaction)>,
}

impl MempoolBatch {
    /// Empty batch, the idle timeout counting from `now`
    pub fn new(max_size: usize, idle_timeout: CairnTime, now: CairnTime) -> Self {
        MempoolBatch {
            max_size,
            idle_timeout,
            last_flush: now,
            pending: Vec::new(),
        }
    }

    /// Queues a transaction. A hash already queued is ignored.
    pub fn push(&mut self, tx_hash: String, raw: RawTransaction) {
        if self.contains(&tx_hash) {
            return;
        }
        self.pending.push((tx_hash, raw));
    }

    /// Drops a queued transaction, returns whether it was queued
    pub fn remove(&mut self, tx_hash: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(hash, _)| hash != tx_hash);
        self.pending.len() != before
    }

    /// Whether `tx_hash` is queued
    pub fn contains(&self, tx_hash: &str) -> bool {
        self.pending.iter().any(|(hash, _)| hash == tx_hash)
    }

    /// A non-empty batch is parsed once full, or once `idle_timeout` passed since the last parse
    pub fn should_flush(&self, now: CairnTime) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.pending.len() >= self.max_size
            || now.saturating_sub(self.last_flush) >= self.idle_timeout
    }

    /// Empties the batch and restarts the idle timeout
    pub fn take(&mut self, now: CairnTime) -> Vec<RawTransaction> {
        self.last_flush = now;
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(_, raw)| raw)
            .collect()
    }

    /// Number of queued transactions
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// entries waiting for their counterpart, oldest dropped first
const MAX_PENDING_SEQUENCES: usize = 10_000;
// held payloads and announced hashes, least recently used dropped first
const MAX_HELD_TRANSACTIONS: u32 = 10_000;

#[derive(Debug)]
enum Pending {
    Hash(String),
    Raw(RawTransaction),
}

/// Pairs `hashtx` and `rawtx` notifications and holds the payloads until the
/// `sequence` notification announcing the transaction.
///
/// Both topics count their publications the same way, so the notification
/// arriving first waits under its sequence number for the other one.
/// A payload seen twice is a confirmation and is forgotten, and so is any
/// payload of an already announced transaction.
pub struct MempoolCorrelator {
    by_sequence: BTreeMap<u32, Pending>,
    raw_tx_cache: LruMap<String, RawTransaction>,
    announced: LruMap<String, ()>,
}

impl std::fmt::Debug for MempoolCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MempoolCorrelator")
            .field("pending", &self.by_sequence.len())
            .field("held", &self.raw_tx_cache.len())
            .field("announced", &self.announced.len())
            .finish()
    }
}

impl Default for MempoolCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl MempoolCorrelator {
    /// Empty correlator
    pub fn new() -> Self {
        MempoolCorrelator {
            by_sequence: BTreeMap::new(),
            raw_tx_cache: LruMap::new(ByLength::new(MAX_HELD_TRANSACTIONS)),
            announced: LruMap::new(ByLength::new(MAX_HELD_TRANSACTIONS)),
        }
    }

    /// Records a `hashtx` notification
    pub fn on_hashtx(&mut self, sequence: u32, tx_hash: String) {
        match self.by_sequence.remove(&sequence) {
            Some(Pending::Raw(raw)) => self.store_raw(tx_hash, raw),
            _ => self.insert_pending(sequence, Pending::Hash(tx_hash)),
        }
    }

    /// Records a `rawtx` notification.
    ///
    /// Without a matching `hashtx`, `decode_hash` is tried; `None` leaves the
    /// payload waiting for its `hashtx`.
    pub fn on_rawtx<F>(&mut self, sequence: u32, raw: RawTransaction, decode_hash: F)
    where
        F: FnOnce(&RawTransaction) -> Option<String>,
    {
        match self.by_sequence.remove(&sequence) {
            Some(Pending::Hash(tx_hash)) => self.store_raw(tx_hash, raw),
            _ => match decode_hash(&raw) {
                Some(tx_hash) => self.store_raw(tx_hash, raw),
                None => self.insert_pending(sequence, Pending::Raw(raw)),
            },
        }
    }

    fn insert_pending(&mut self, sequence: u32, pending: Pending) {
        self.by_sequence.insert(sequence, pending);
        while self.by_sequence.len() > MAX_PENDING_SEQUENCES {
            self.by_sequence.pop_first();
        }
    }

    fn store_raw(&mut self, tx_hash: String, raw: RawTransaction) {
        if self.announced.peek(&tx_hash).is_some() {
            return;
        }
        if self.raw_tx_cache.remove(&tx_hash).is_none() {
            self.raw_tx_cache.insert(tx_hash, raw);
        }
    }

    /// Payload of an announced transaction, if it arrived.
    ///
    /// Later payloads of `tx_hash` are dropped until [`MempoolCorrelator::forget`].
    pub fn take_raw(&mut self, tx_hash: &str) -> Option<RawTransaction> {
        self.announced.insert(tx_hash.to_string(), ());
        self.raw_tx_cache.remove(tx_hash)
    }

    /// Drops everything known about a confirmed transaction
    pub fn forget(&mut self, tx_hash: &str) {
        self.raw_tx_cache.remove(tx_hash);
        self.announced.remove(tx_hash);
    }

    /// Whether the payload of `tx_hash` is held
    pub fn has_raw(&self, tx_hash: &str) -> bool {
        self.raw_tx_cache.peek(tx_hash).is_some()
    }

    /// Payloads waiting for their announcement
    pub fn held_len(&self) -> usize {
        self.raw_tx_cache.len()
    }

    /// Notifications waiting for their counterpart
    pub fn pending_len(&self) -> usize {
        self.by_sequence.len()
    }
}
