// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::asset_cache::AssetCache;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::orders_cache::OrdersCache;
use crate::utxo_cache::UtxoBalancesCache;
use cairn_db_worker::ConnectionPool;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Owner of the three ledger caches.
///
/// Each cache is built from the store the first time it is requested, and dropped
/// by [`CacheRegistry::reset`].
pub struct CacheRegistry {
    pool: Arc<ConnectionPool>,
    config: CacheConfig,
    current_block_index: AtomicU64,
    assets: Mutex<Option<Arc<Mutex<AssetCache>>>>,
    orders: Mutex<Option<Arc<Mutex<OrdersCache>>>>,
    utxos: Mutex<Option<Arc<Mutex<UtxoBalancesCache>>>>,
}

impl CacheRegistry {
    /// Creates an empty registry
    pub fn new(pool: Arc<ConnectionPool>, config: CacheConfig) -> Self {
        CacheRegistry {
            pool,
            config,
            current_block_index: AtomicU64::new(0),
            assets: Mutex::new(None),
            orders: Mutex::new(None),
            utxos: Mutex::new(None),
        }
    }

    /// Pool the caches read from
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Block being applied, used when the orders cache is built
    pub fn set_current_block_index(&self, block_index: u64) {
        self.current_block_index.store(block_index, Ordering::SeqCst);
    }

    /// See [`CacheRegistry::set_current_block_index`]
    pub fn current_block_index(&self) -> u64 {
        self.current_block_index.load(Ordering::SeqCst)
    }

    /// The asset cache, built if needed
    pub fn assets(&self) -> Result<Arc<Mutex<AssetCache>>, CacheError> {
        let mut slot = self.assets.lock();
        if let Some(cache) = slot.as_ref() {
            return Ok(cache.clone());
        }
        let cache = Arc::new(Mutex::new(AssetCache::new(self.pool.clone())?));
        *slot = Some(cache.clone());
        Ok(cache)
    }

    /// The orders cache, built if needed
    pub fn orders(&self) -> Result<Arc<Mutex<OrdersCache>>, CacheError> {
        let mut slot = self.orders.lock();
        if let Some(cache) = slot.as_ref() {
            return Ok(cache.clone());
        }
        let cache = Arc::new(Mutex::new(OrdersCache::new(
            &self.pool,
            self.current_block_index(),
        )?));
        *slot = Some(cache.clone());
        Ok(cache)
    }

    /// The UTXO cache, built if needed
    pub fn utxos(&self) -> Result<Arc<Mutex<UtxoBalancesCache>>, CacheError> {
        let mut slot = self.utxos.lock();
        if let Some(cache) = slot.as_ref() {
            return Ok(cache.clone());
        }
        let cache = Arc::new(Mutex::new(UtxoBalancesCache::new(
            self.pool.clone(),
            &self.config.known_sources,
        )?));
        *slot = Some(cache.clone());
        Ok(cache)
    }

    /// The UTXO cache if it was already built
    pub fn utxos_if_exists(&self) -> Option<Arc<Mutex<UtxoBalancesCache>>> {
        self.utxos.lock().clone()
    }

    /// Purges spent UTXOs, without building the cache if it does not exist
    pub fn cleanup_utxos_if_exists(&self) {
        if let Some(cache) = self.utxos_if_exists() {
            cache.lock().cleanup_spent_utxos();
        }
    }

    /// Drops every cache. The next access rebuilds from the store.
    pub fn reset(&self) {
        *self.assets.lock() = None;
        *self.orders.lock() = None;
        *self.utxos.lock() = None;
        debug!("ledger caches reset");
    }
}
