// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::apply::{insert_transaction_row, parse_tx, ApplyEnv, BlockChunks, TxPosition};
use cairn_caches::CacheRegistry;
use cairn_consensus::{check_software_version, ConsensusVerifier, VersionSource};
use cairn_db_worker::{queries, LedgerDb};
use cairn_logging::cairn_trace;
use cairn_models::config::VERSION_CONFIG_KEY;
use cairn_models::{Block, BlockRecord, HashField, RawBlock, Transaction, Version};
use cairn_parser_exports::{
    ChainSource, ChainSourceError, InterpreterRegistry, NewBlockOutcome, ParserConfig,
    ParserError, ProcessorState, StopSignal,
};
use cairn_time::CairnTime;
use parking_lot::RwLock;
use rusqlite::params;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Applies, rolls back and reparses blocks. Owns the single writable ledger handle.
pub struct BlockProcessor {
    pub(crate) db: LedgerDb,
    pub(crate) caches: Arc<CacheRegistry>,
    pub(crate) source: Arc<dyn ChainSource>,
    pub(crate) interpreters: Arc<InterpreterRegistry>,
    verifier: ConsensusVerifier,
    config: ParserConfig,
    stop: StopSignal,
    state: Arc<RwLock<ProcessorState>>,
}

/// Blocks are either parsed for the first time or replayed from their stored rows
enum BlockSource<'a> {
    New(&'a Block),
    Stored(BlockRecord, Vec<(u64, Transaction)>),
}

impl BlockProcessor {
    /// Creates a processor over an opened ledger
    pub fn new(
        db: LedgerDb,
        caches: Arc<CacheRegistry>,
        source: Arc<dyn ChainSource>,
        interpreters: Arc<InterpreterRegistry>,
        config: ParserConfig,
        stop: StopSignal,
    ) -> Self {
        let verifier =
            ConsensusVerifier::new(config.network).with_checkpoints(config.extra_checkpoints.clone());
        BlockProcessor {
            db,
            caches,
            source,
            interpreters,
            verifier,
            config,
            stop,
            state: Arc::new(RwLock::new(ProcessorState::Idle)),
        }
    }

    /// Current activity
    pub fn state(&self) -> ProcessorState {
        *self.state.read()
    }

    /// Shared view of [`BlockProcessor::state`]
    pub fn state_handle(&self) -> Arc<RwLock<ProcessorState>> {
        self.state.clone()
    }

    fn set_state(&self, state: ProcessorState) {
        *self.state.write() = state;
    }

    /// Processor configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The ledger handle
    pub fn db(&self) -> &LedgerDb {
        &self.db
    }

    /// The ledger caches
    pub fn caches(&self) -> &Arc<CacheRegistry> {
        &self.caches
    }

    /// The chain source
    pub fn source(&self) -> &Arc<dyn ChainSource> {
        &self.source
    }

    /// Stop signal polled between blocks and transactions
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    fn block_first(&self) -> u64 {
        self.config.network.params().block_first
    }

    /// Most recent block
    pub fn last_block(&self) -> Result<Option<BlockRecord>, ParserError> {
        Ok(self.db.last_block()?)
    }

    /// Index of the most recent block, `None` on an empty ledger
    pub fn current_block_index(&self) -> Result<Option<u64>, ParserError> {
        Ok(self.last_block()?.map(|block| block.block_index))
    }

    /// Index of the next block to apply
    pub fn next_block_index(&self) -> Result<u64, ParserError> {
        Ok(match self.current_block_index()? {
            Some(block_index) => block_index + 1,
            None => self.block_first(),
        })
    }

    /// Index the next transaction will get, 0 on an empty ledger
    pub fn get_next_tx_index(&self) -> Result<u64, ParserError> {
        Ok(queries::next_tx_index(self.db.conn())?)
    }

    /// Stamps the software version in a new ledger, logs the stamped version otherwise
    pub fn check_database_version(&self) -> Result<(), ParserError> {
        let current = self.config.software_version;
        match self.db.get_config_value(VERSION_CONFIG_KEY)? {
            None => {
                self.db
                    .set_config_value(VERSION_CONFIG_KEY, &current.to_string())?;
                info!("Ledger database version set to {}.", current);
            }
            Some(stored) => {
                let stored = Version::from_str(&stored)?;
                if (stored.major, stored.minor) == (current.major, current.minor) {
                    info!("Ledger database is up to date ({}).", stored);
                } else {
                    warn!(
                        "Ledger database version {} differs from software version {}. A reparse may be required.",
                        stored, current
                    );
                }
            }
        }
        Ok(())
    }

    /// Checks the published protocol changes against the running version
    pub fn check_software_version(&self, source: &dyn VersionSource) -> Result<(), ParserError> {
        let current_block = self.current_block_index()?.unwrap_or(0);
        check_software_version(
            source,
            &self.config.software_version,
            current_block,
            self.config.force,
        )?;
        Ok(())
    }

    /// Fetches and decodes the source block at `block_index`
    pub fn fetch_block(&self, block_index: u64) -> Result<Block, ParserError> {
        let block_hash = self.source.get_block_hash(block_index)?;
        let raw = self.source.get_block(&block_hash)?;
        Ok(self.source.deserialize_block(&raw, block_index)?)
    }

    /// Applies the blocks the source has and the ledger has not, until the source
    /// tip is reached or the processor is stopped
    pub fn catch_up(&mut self) -> Result<(), ParserError> {
        self.set_state(ProcessorState::CatchingUp);
        let result = self.catch_up_loop();
        self.set_state(ProcessorState::Idle);
        result
    }

    fn catch_up_loop(&mut self) -> Result<(), ParserError> {
        if self.last_block()?.is_none() {
            info!("New database.");
        }
        let start = Instant::now();
        let first_block = self.next_block_index()?;
        let mut block_count = self.source.get_block_count()?;
        let mut parsed = 0u64;
        info!("Catching up from block {} to block {}...", first_block, block_count);

        loop {
            if self.stop.is_stopped() {
                info!("Catch up interrupted.");
                return Ok(());
            }
            let next = self.next_block_index()?;
            if next > block_count {
                block_count = self.source.get_block_count()?;
                if next > block_count {
                    break;
                }
            }
            let block = match self.fetch_block(next) {
                Ok(block) => block,
                Err(ParserError::ChainSource(ChainSourceError::OutOfRange(_))) => break,
                Err(err) => return Err(err),
            };
            if let Some(tip) = self.last_block()? {
                if block.previous_block_hash != tip.block_hash {
                    self.handle_reorg()?;
                    if self.current_block_index()? == Some(tip.block_index) {
                        return Err(ParserError::InconsistentParent {
                            block_index: next,
                            parent_index: tip.block_index,
                        });
                    }
                    continue;
                }
            }
            if self.parse_block(&block)?.is_none() {
                info!("Catch up interrupted.");
                return Ok(());
            }
            parsed += 1;
            if self.config.progress_interval > 0 && parsed % self.config.progress_interval == 0 {
                let elapsed = start.elapsed().as_secs_f64();
                info!(
                    "Block {} - {}/{} blocks parsed - {:.2}s - {:.2} blocks/sec - tx_index: {}",
                    block.block_index,
                    parsed,
                    block_count.saturating_sub(first_block) + 1,
                    elapsed,
                    parsed as f64 / elapsed.max(f64::EPSILON),
                    self.get_next_tx_index()?
                );
            }
        }
        info!(
            "Catch up complete: {} blocks parsed in {:.2}s.",
            parsed,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Applies a new block on top of the ledger.
    ///
    /// Returns the stored block, or `None` if the processor was stopped before the
    /// block was complete, in which case nothing was written.
    pub fn parse_block(&mut self, block: &Block) -> Result<Option<BlockRecord>, ParserError> {
        self.apply_block(BlockSource::New(block))
    }

    /// Applies a block announced by the notification channel.
    ///
    /// Blocks the ledger already holds are ignored, a block replacing a stored one
    /// or not extending the tip triggers [`BlockProcessor::handle_reorg`], and a
    /// block above the next expected index is left to catch-up.
    pub fn parse_new_block(&mut self, raw: &RawBlock) -> Result<NewBlockOutcome, ParserError> {
        let expected = self.next_block_index()?;
        let block = match self.source.deserialize_block(raw, expected) {
            Ok(block) => block,
            Err(err) => {
                warn!("Cannot decode new block, deferred to catch-up: {}", err);
                return Ok(NewBlockOutcome::Deferred);
            }
        };
        if queries::block_exists(self.db.conn(), &block.block_hash)? {
            debug!("Block {} already in the ledger.", block.block_index);
            return Ok(NewBlockOutcome::AlreadyStored);
        }
        if block.block_index > expected {
            debug!(
                "Block {} received while expecting block {}.",
                block.block_index, expected
            );
            return Ok(NewBlockOutcome::Late);
        }
        let parent_matches = block.block_index <= self.block_first()
            || queries::block_hash_at(self.db.conn(), block.block_index - 1)?.as_deref()
                == Some(block.previous_block_hash.as_str());
        if block.block_index < expected || !parent_matches {
            self.handle_reorg()?;
            if self.next_block_index()? != block.block_index {
                return Ok(NewBlockOutcome::Late);
            }
        }
        Ok(match self.parse_block(&block)? {
            Some(record) => NewBlockOutcome::Applied(record),
            None => NewBlockOutcome::Interrupted,
        })
    }

    fn apply_block(&mut self, source: BlockSource<'_>) -> Result<Option<BlockRecord>, ParserError> {
        let previous_state = self.state();
        self.set_state(ProcessorState::ApplyingBlock);
        let result = self.apply_block_inner(source);
        self.set_state(previous_state);
        match result {
            Ok(Some(record)) => {
                self.caches.cleanup_utxos_if_exists();
                Ok(Some(record))
            }
            other => {
                // the caches followed events that were never committed
                self.caches.reset();
                other
            }
        }
    }

    fn apply_block_inner(
        &mut self,
        source: BlockSource<'_>,
    ) -> Result<Option<BlockRecord>, ParserError> {
        let block_index = match &source {
            BlockSource::New(block) => block.block_index,
            BlockSource::Stored(record, _) => record.block_index,
        };
        // built from committed state, before the write transaction starts
        self.caches.set_current_block_index(block_index);
        self.caches.assets()?;
        self.caches.orders()?;
        self.caches.utxos()?;

        let env = ApplyEnv {
            interpreters: &self.interpreters,
            caches: &self.caches,
        };
        let verifier = &self.verifier;
        let stop = &self.stop;
        let tx = self.db.conn_mut().transaction()?;

        let (mut record, transactions, is_new) = match source {
            BlockSource::New(block) => {
                tx.execute(
                    "INSERT INTO blocks (block_index, block_hash, previous_block_hash, block_time, transaction_count)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        block.block_index,
                        block.block_hash,
                        block.previous_block_hash,
                        block.block_time,
                        block.transactions.len() as u64,
                    ],
                )?;
                let first_tx_index = queries::next_tx_index(&tx)?;
                let transactions: Vec<(u64, Transaction)> = block
                    .transactions
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(offset, transaction)| (first_tx_index + offset as u64, transaction))
                    .collect();
                let record = BlockRecord {
                    block_index: block.block_index,
                    block_hash: block.block_hash.clone(),
                    previous_block_hash: block.previous_block_hash.clone(),
                    block_time: block.block_time,
                    ledger_hash: None,
                    txlist_hash: None,
                    messages_hash: None,
                    transaction_count: block.transactions.len() as u64,
                };
                (record, transactions, true)
            }
            BlockSource::Stored(record, transactions) => (record, transactions, false),
        };

        let mut message_index = queries::next_message_index(&tx)?;
        let mut chunks = BlockChunks::default();
        for (tx_index, transaction) in &transactions {
            if stop.is_stopped() {
                debug!("Stopped while applying block {}", block_index);
                return Ok(None);
            }
            let position = TxPosition {
                block_index,
                block_time: record.block_time,
                tx_index: *tx_index,
                mempool: false,
            };
            if is_new {
                insert_transaction_row(&tx, &position, &record.block_hash, transaction)?;
            }
            chunks.add_transaction(transaction);
            let (_, events) = parse_tx(&env, &tx, &position, transaction, &mut message_index)?;
            chunks.add_events(&events);
        }
        queries::delete_mempool_for_block(&tx, block_index)?;

        for field in HashField::ALL {
            let content = match field {
                HashField::TxlistHash => &chunks.txlist,
                HashField::LedgerHash => &chunks.ledger,
                HashField::MessagesHash => &chunks.messages,
            };
            let (hash, _) = verifier.consensus_hash(&*tx, block_index, field, None, content)?;
            match field {
                HashField::TxlistHash => record.txlist_hash = Some(hash),
                HashField::LedgerHash => record.ledger_hash = Some(hash),
                HashField::MessagesHash => record.messages_hash = Some(hash),
            }
        }
        tx.execute(
            "UPDATE blocks SET txlist_hash = ?, ledger_hash = ?, messages_hash = ? WHERE block_index = ?",
            params![
                record.txlist_hash,
                record.ledger_hash,
                record.messages_hash,
                block_index
            ],
        )?;
        tx.commit()?;

        let block_time = CairnTime::format_unix_secs(record.block_time)
            .unwrap_or_else(|_| record.block_time.to_string());
        debug!(
            "Block {} ({}) parsed ({} transactions, ledger hash {})",
            block_index,
            block_time,
            transactions.len(),
            record.ledger_hash.as_deref().unwrap_or_default()
        );
        cairn_trace!("parser.block_parsed", {
            "block_index": block_index,
            "block_time": block_time,
            "ledger_hash": record.ledger_hash,
            "txlist_hash": record.txlist_hash,
            "messages_hash": record.messages_hash,
        });
        Ok(Some(record))
    }

    /// Deletes every block from `block_index` on and resets the caches.
    ///
    /// Does nothing if `block_index` is above the tip, unless `force` is set.
    /// Rolling back to the first block of the network rebuilds the whole store.
    pub fn rollback(&mut self, block_index: u64, force: bool) -> Result<(), ParserError> {
        let tip = self.current_block_index()?;
        if !force && tip.map_or(true, |tip| block_index > tip) {
            debug!(
                "Block {} is beyond the last block, nothing to roll back.",
                block_index
            );
            return Ok(());
        }
        let previous_state = self.state();
        self.set_state(ProcessorState::Rollback);
        let result = self.rollback_inner(block_index);
        self.caches.reset();
        self.set_state(previous_state);
        result?;
        info!("Ledger DB rolled back to block {}", block_index);
        cairn_trace!("parser.rollback", { "block_index": block_index });
        Ok(())
    }

    fn rollback_inner(&mut self, block_index: u64) -> Result<(), ParserError> {
        if block_index <= self.block_first() {
            self.db.rebuild()?;
            return self.check_database_version();
        }
        let tx = self.db.conn_mut().transaction()?;
        queries::delete_from_block_index(&tx, block_index)?;
        // provisional events were computed on the deleted state
        tx.execute("DELETE FROM mempool", [])?;
        tx.commit()?;
        Ok(())
    }

    /// Applies again the stored blocks from `block_index` on.
    ///
    /// Every recomputed hash must equal the stored one. Does nothing if
    /// `block_index` is above the tip.
    pub fn reparse(&mut self, block_index: u64) -> Result<(), ParserError> {
        let Some(tip) = self.current_block_index()? else {
            return Ok(());
        };
        if block_index > tip {
            debug!("Block {} is beyond the last block, nothing to reparse.", block_index);
            return Ok(());
        }
        let previous_state = self.state();
        self.set_state(ProcessorState::Reparse);
        let result = self.reparse_inner(block_index, tip);
        self.set_state(previous_state);
        result
    }

    fn reparse_inner(&mut self, block_index: u64, tip: u64) -> Result<(), ParserError> {
        info!("Reparsing blocks {} to {}...", block_index, tip);
        let start = Instant::now();
        {
            let tx = self.db.conn_mut().transaction()?;
            queries::delete_derived_state_from(&tx, block_index)?;
            tx.execute("DELETE FROM mempool", [])?;
            tx.commit()?;
        }
        self.caches.reset();

        for current in block_index..=tip {
            if self.stop.is_stopped() {
                info!("Reparse interrupted at block {}.", current);
                return Ok(());
            }
            let record = queries::get_block(self.db.conn(), current)?.ok_or_else(|| {
                ParserError::InvalidEvent(format!("block {} is missing", current))
            })?;
            let transactions = queries::block_transactions(self.db.conn(), current)?;
            if self
                .apply_block(BlockSource::Stored(record, transactions))?
                .is_none()
            {
                info!("Reparse interrupted at block {}.", current);
                return Ok(());
            }
        }
        info!(
            "Reparse complete: {} blocks in {:.2}s.",
            tip - block_index + 1,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Finds the last block shared with the chain source, rolls back everything
    /// above it and returns the source block that follows it, if available.
    ///
    /// A shared block whose successor is out of range on the source is not a
    /// resume point, the search goes on below it.
    pub fn handle_reorg(&mut self) -> Result<Option<Block>, ParserError> {
        let Some(tip) = self.current_block_index()? else {
            return Ok(None);
        };
        let block_first = self.block_first();
        let mut height = tip;
        let common = loop {
            let local = queries::block_hash_at(self.db.conn(), height)?;
            let matches = match self.source.get_block_hash(height) {
                Ok(remote) => local.as_deref() == Some(remote.as_str()),
                Err(ChainSourceError::OutOfRange(_)) => false,
                Err(err) => return Err(err.into()),
            };
            // a shared block only counts if the source has a successor to resume from
            if matches && self.source_has_block(height + 1)? {
                break Some(height);
            }
            if height <= block_first {
                break None;
            }
            height -= 1;
        };

        let rollback_to = common.map_or(block_first, |common| common + 1);
        if rollback_to <= tip {
            warn!(
                "Blockchain reorganization detected, last common block: {:?}. Rolling back to block {}.",
                common, rollback_to
            );
            self.rollback(rollback_to, false)?;
        }
        match self.fetch_block(rollback_to) {
            Ok(block) => Ok(Some(block)),
            Err(ParserError::ChainSource(err)) => {
                debug!("Block {} not available yet: {}", rollback_to, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn source_has_block(&self, height: u64) -> Result<bool, ParserError> {
        match self.source.get_block_hash(height) {
            Ok(_) => Ok(true),
            Err(ChainSourceError::OutOfRange(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Rolls back the last block if it has no ledger hash
    pub fn rollback_empty_block(&mut self) -> Result<(), ParserError> {
        if let Some(last) = self.last_block()? {
            if last.ledger_hash.is_none() {
                warn!(
                    "Ledger hash missing for block {}, rolling it back.",
                    last.block_index
                );
                self.rollback(last.block_index, false)?;
            }
        }
        Ok(())
    }
}
