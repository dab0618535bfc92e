// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::config::FollowerConfig;
use crate::error::{FollowError, TransportError};
use crate::mempool_batch::{MempoolBatch, MempoolCorrelator};
use crate::not_supported::NotSupportedTransactionsCache;
use crate::notification::{
    Notification, NotificationSubscriber, SequenceEvent, SequenceLabel, Topic,
};
use cairn_consensus::{VersionError, VersionSource};
use cairn_db_worker::{queries, ConnectionPool};
use cairn_logging::cairn_trace;
use cairn_models::{RawBlock, RawTransaction};
use cairn_parser_exports::{ChainSource, NewBlockOutcome, ParserError, ProcessorState, StopSignal};
use cairn_parser_worker::BlockProcessor;
use cairn_time::CairnTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What the follower is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowerMode {
    /// applying the blocks the source has and the ledger has not
    #[default]
    CatchUp,
    /// applying notified blocks and mempool transactions
    Follow,
    /// the follower thread returned
    Stopped,
}

/// Cloneable view of a running follower
#[derive(Clone)]
pub struct FollowerStatus {
    mode: Arc<RwLock<FollowerMode>>,
    processor_state: Arc<RwLock<ProcessorState>>,
    stop: StopSignal,
    pool: Arc<ConnectionPool>,
    source: Arc<dyn ChainSource>,
}

impl std::fmt::Debug for FollowerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowerStatus")
            .field("mode", &self.mode())
            .field("processor_state", &self.processor_state())
            .field("stopping", &self.is_stopping())
            .finish()
    }
}

impl FollowerStatus {
    /// Current mode
    pub fn mode(&self) -> FollowerMode {
        *self.mode.read()
    }

    /// Current activity of the block processor
    pub fn processor_state(&self) -> ProcessorState {
        *self.processor_state.read()
    }

    /// Whether a stop was requested
    pub fn is_stopping(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Whether the ledger tip is below the source block count. An empty ledger is never late.
    pub fn is_late(&self) -> Result<bool, FollowError> {
        let last_block = {
            let conn = self.pool.acquire()?;
            queries::last_block(&conn)?
        };
        match last_block {
            None => Ok(false),
            Some(block) => Ok(block.block_index < self.source.get_block_count()?),
        }
    }

    fn set_mode(&self, mode: FollowerMode) {
        *self.mode.write() = mode;
    }
}

enum FollowEvent {
    CancelChanged { sender_alive: bool },
    Received(Result<Notification, TransportError>),
    Tick,
}

/// Drives a [`BlockProcessor`]: catch-up first, then the notifications of the
/// chain source on a current-thread runtime
pub struct ChainFollower {
    processor: BlockProcessor,
    source: Arc<dyn ChainSource>,
    subscriber: Box<dyn NotificationSubscriber>,
    version_source: Option<Box<dyn VersionSource>>,
    config: FollowerConfig,
    batch: MempoolBatch,
    correlator: MempoolCorrelator,
    not_supported: NotSupportedTransactionsCache,
    status: FollowerStatus,
    cancel: watch::Receiver<bool>,
    last_version_check: Option<CairnTime>,
}

impl ChainFollower {
    /// Wraps a processor. `cancel` interrupts the follow loop once it holds `true`.
    pub fn new(
        processor: BlockProcessor,
        subscriber: Box<dyn NotificationSubscriber>,
        version_source: Option<Box<dyn VersionSource>>,
        config: FollowerConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self, FollowError> {
        let network = processor.config().network;
        let params = network.params();
        let not_supported = NotSupportedTransactionsCache::new(&config.cache_dir, network)?;
        let source = processor.source().clone();
        let status = FollowerStatus {
            mode: Arc::new(RwLock::new(FollowerMode::CatchUp)),
            processor_state: processor.state_handle(),
            stop: processor.stop_signal().clone(),
            pool: processor.caches().pool().clone(),
            source: source.clone(),
        };
        Ok(ChainFollower {
            batch: MempoolBatch::new(
                params.mempool_max_batch_size,
                params.mempool_idle_timeout,
                CairnTime::now()?,
            ),
            processor,
            source,
            subscriber,
            version_source,
            config,
            correlator: MempoolCorrelator::new(),
            not_supported,
            status,
            cancel,
            last_version_check: None,
        })
    }

    /// Shared status handle
    pub fn status(&self) -> FollowerStatus {
        self.status.clone()
    }

    /// The driven processor
    pub fn processor(&self) -> &BlockProcessor {
        &self.processor
    }

    /// Transactions skipped by the mempool
    pub fn not_supported(&self) -> &NotSupportedTransactionsCache {
        &self.not_supported
    }

    /// Payloads waiting for their announcement
    pub fn correlator(&self) -> &MempoolCorrelator {
        &self.correlator
    }

    /// Unconfirmed transactions waiting to be parsed
    pub fn mempool_batch(&self) -> &MempoolBatch {
        &self.batch
    }

    /// Whether the ledger tip is below the source block count
    pub fn is_late(&self) -> Result<bool, FollowError> {
        self.status.is_late()
    }

    /// Whether a stop was requested
    pub fn is_stopping(&self) -> bool {
        self.status.is_stopping() || *self.cancel.borrow()
    }

    /// Runs until stopped or until a fatal error
    pub fn run(&mut self) -> Result<(), FollowError> {
        let result = self.run_inner();
        if let Err(err) = self.not_supported.backup() {
            warn!("cannot save the not supported transactions: {}", err);
        }
        self.status.set_mode(FollowerMode::Stopped);
        result
    }

    fn run_inner(&mut self) -> Result<(), FollowError> {
        self.processor.rollback_empty_block()?;
        self.catch_up()?;
        if self.is_stopping() {
            return Ok(());
        }
        if !self.config.no_mempool {
            self.load_raw_mempool()?;
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.follow())
    }

    /// Catches up until the ledger reaches the source tip
    pub fn catch_up(&mut self) -> Result<(), FollowError> {
        self.status.set_mode(FollowerMode::CatchUp);
        while !self.is_stopping() {
            let tip_before = self.processor.current_block_index()?;
            self.processor.catch_up()?;
            if !self.is_late()? {
                break;
            }
            // the source announced blocks it cannot serve yet
            if self.processor.current_block_index()? == tip_before {
                self.processor
                    .stop_signal()
                    .wait(self.config.reconnect_delay);
            }
        }
        self.status.set_mode(FollowerMode::Follow);
        Ok(())
    }

    /// Parses the source mempool, except the transactions already parsed or
    /// known to be unsupported
    pub fn load_raw_mempool(&mut self) -> Result<(), FollowError> {
        let known = self.processor.mempool_tx_hashes()?;
        let hashes: Vec<String> = self
            .source
            .get_raw_mempool()?
            .into_iter()
            .filter(|tx_hash| {
                !known.contains(tx_hash) && !self.not_supported.is_not_supported(tx_hash)
            })
            .collect();
        info!("Loading {} raw mempool transactions...", hashes.len());
        for chunk in hashes.chunks(self.config.mempool_chunk_size.max(1)) {
            if self.is_stopping() {
                return Ok(());
            }
            let raws: Vec<RawTransaction> = chunk
                .iter()
                .filter_map(|tx_hash| match self.source.get_raw_transaction(tx_hash) {
                    Ok(raw) => Some(raw),
                    Err(err) => {
                        warn!("cannot fetch mempool transaction {}: {}", tx_hash, err);
                        None
                    }
                })
                .collect();
            self.parse_mempool(&raws)?;
        }
        info!("Raw mempool loaded.");
        Ok(())
    }

    fn parse_mempool(&mut self, raws: &[RawTransaction]) -> Result<(), FollowError> {
        if raws.is_empty() {
            return Ok(());
        }
        let unsupported = self.processor.parse_mempool_transactions(raws)?;
        if unsupported.is_empty() {
            return Ok(());
        }
        for tx_hash in &unsupported {
            self.not_supported.add(tx_hash);
        }
        if let Err(err) = self.not_supported.backup() {
            warn!("cannot save the not supported transactions: {}", err);
        }
        Ok(())
    }

    async fn follow(&mut self) -> Result<(), FollowError> {
        info!("Following the chain source...");
        if let Err(err) = self.subscriber.connect().await {
            self.handle_transport_error(err).await;
        }
        let mut tick = tokio::time::interval(self.config.tick_interval.to_duration());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while !self.is_stopping() {
            let event = tokio::select! {
                changed = self.cancel.changed() => FollowEvent::CancelChanged {
                    sender_alive: changed.is_ok(),
                },
                received = self.subscriber.recv() => FollowEvent::Received(received),
                _ = tick.tick() => FollowEvent::Tick,
            };
            match event {
                FollowEvent::CancelChanged { sender_alive } => {
                    if !sender_alive {
                        break;
                    }
                }
                FollowEvent::Received(Ok(notification)) => self.handle_notification(notification)?,
                FollowEvent::Received(Err(err)) => self.handle_transport_error(err).await,
                FollowEvent::Tick => self.on_tick()?,
            }
        }
        self.subscriber.disconnect().await;
        info!("Stopped following the chain source.");
        Ok(())
    }

    /// Ignores the errors that leave the subscription usable, subscribes again otherwise
    pub async fn handle_transport_error(&mut self, err: TransportError) {
        if !err.is_fatal() {
            if err != TransportError::NoMessage {
                warn!("ignoring notification: {}", err);
            }
            return;
        }
        warn!("notification subscription failed: {}, reconnecting...", err);
        loop {
            self.subscriber.disconnect().await;
            tokio::time::sleep(self.config.reconnect_delay.to_duration()).await;
            if self.is_stopping() {
                return;
            }
            match self.subscriber.connect().await {
                Ok(()) => {
                    info!("Notification subscription restored.");
                    cairn_trace!("follow.reconnected", {});
                    return;
                }
                Err(err) => warn!("cannot subscribe to notifications: {}", err),
            }
        }
    }

    /// Dispatches a notification by topic
    pub fn handle_notification(&mut self, notification: Notification) -> Result<(), FollowError> {
        match notification.topic {
            Topic::HashTx if !self.config.no_mempool => {
                self.correlator
                    .on_hashtx(notification.sequence, hex::encode(&notification.payload));
            }
            Topic::RawTx if !self.config.no_mempool => {
                let source = &self.source;
                self.correlator.on_rawtx(
                    notification.sequence,
                    RawTransaction(notification.payload),
                    |raw| {
                        source
                            .deserialize_transaction(raw)
                            .ok()
                            .map(|tx| tx.tx_hash)
                    },
                );
            }
            Topic::Sequence => self.on_sequence(&notification.payload)?,
            Topic::RawBlock => self.on_rawblock(RawBlock(notification.payload))?,
            Topic::HashTx | Topic::RawTx => {}
        }
        Ok(())
    }

    fn on_sequence(&mut self, body: &[u8]) -> Result<(), FollowError> {
        let event = match SequenceEvent::parse(body) {
            Ok(event) => event,
            Err(err) => {
                warn!("ignoring sequence notification: {}", err);
                return Ok(());
            }
        };
        match event.label {
            SequenceLabel::MempoolAdd if !self.config.no_mempool => {
                if self.not_supported.is_not_supported(&event.hash) {
                    return Ok(());
                }
                let raw = match self.correlator.take_raw(&event.hash) {
                    Some(raw) => raw,
                    None => match self.source.get_raw_transaction(&event.hash) {
                        Ok(raw) => raw,
                        Err(err) => {
                            warn!("cannot fetch mempool transaction {}: {}", event.hash, err);
                            return Ok(());
                        }
                    },
                };
                self.batch.push(event.hash, raw);
                let now = CairnTime::now()?;
                if self.batch.should_flush(now) {
                    self.flush_mempool(now)?;
                }
            }
            SequenceLabel::MempoolRemove if !self.config.no_mempool => {
                self.batch.remove(&event.hash);
                self.processor.clean_transaction_from_mempool(&event.hash)?;
            }
            SequenceLabel::BlockConnect | SequenceLabel::BlockDisconnect => {
                debug!("block {} {:?}", event.hash, event.label);
            }
            SequenceLabel::MempoolAdd | SequenceLabel::MempoolRemove => {}
        }
        Ok(())
    }

    fn on_rawblock(&mut self, raw: RawBlock) -> Result<(), FollowError> {
        match self.processor.parse_new_block(&raw)? {
            NewBlockOutcome::Applied(block) => {
                debug!("notified block {} applied", block.block_index);
                for (_, transaction) in
                    queries::block_transactions(self.processor.db().conn(), block.block_index)?
                {
                    self.correlator.forget(&transaction.tx_hash);
                    self.batch.remove(&transaction.tx_hash);
                }
            }
            NewBlockOutcome::AlreadyStored => debug!("notified block already stored"),
            NewBlockOutcome::Deferred => debug!("notified block deferred to catch-up"),
            NewBlockOutcome::Interrupted => {}
            NewBlockOutcome::Late => {
                info!("Ledger is late, catching up...");
                self.catch_up()?;
            }
        }
        Ok(())
    }

    fn flush_mempool(&mut self, now: CairnTime) -> Result<(), FollowError> {
        let raws = self.batch.take(now);
        debug!("parsing {} mempool transactions", raws.len());
        self.parse_mempool(&raws)
    }

    /// Parses an idle mempool batch and runs the due version check
    pub fn on_tick(&mut self) -> Result<(), FollowError> {
        let now = CairnTime::now()?;
        if self.batch.should_flush(now) {
            self.flush_mempool(now)?;
        }
        self.check_version_if_due(now)
    }

    fn check_version_if_due(&mut self, now: CairnTime) -> Result<(), FollowError> {
        let Some(version_source) = &self.version_source else {
            return Ok(());
        };
        if let Some(last) = self.last_version_check {
            if now.saturating_sub(last) < self.config.version_check_interval {
                return Ok(());
            }
        }
        self.last_version_check = Some(now);
        match self.processor.check_software_version(version_source.as_ref()) {
            Err(ParserError::Version(VersionError::VersionCheck(msg))) => {
                warn!("Unable to check the software version: {}", msg);
                Ok(())
            }
            result => Ok(result?),
        }
    }
}
