use crate::error::CacheError;
use cairn_db_worker::ConnectionPool;
use cairn_models::{TransactionType, UtxosInfo};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// What the cache knows about an UTXO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoPresence {
    /// holds assets
    Present,
    /// was spent during the current block, purged by `cleanup_spent_utxos`
    KnownAbsent,
    /// not cached, the store decides
    Unknown,
}

/// Presence map of the UTXOs holding assets
pub struct UtxoBalancesCache {
    pool: Arc<ConnectionPool>,
    utxos: HashMap<String, UtxoPresence>,
}

impl UtxoBalancesCache {
    /// Loads UTXOs with a positive balance, destinations of invalid attaches, and the
    /// descendants of the known-source transactions
    pub fn new(
        pool: Arc<ConnectionPool>,
        known_sources: &BTreeMap<String, String>,
    ) -> Result<Self, CacheError> {
        debug!("Initialising utxo balances cache...");
        let mut cache = UtxoBalancesCache {
            pool,
            utxos: HashMap::new(),
        };
        {
            let pool = cache.pool.clone();
            let conn = pool.acquire()?;
            cache.load_balances(&conn)?;
            cache.load_invalid_attaches(&conn)?;
            cache.add_known_sources_descendants(&conn, known_sources)?;
        }
        debug!(
            "UTXO balances cache initialised (loaded={})",
            cache.utxos.len()
        );
        Ok(cache)
    }

    fn load_balances(&mut self, conn: &Connection) -> Result<(), CacheError> {
        let mut stmt = conn.prepare(
            "SELECT utxo, asset, quantity, MAX(rowid) FROM balances
             WHERE utxo IS NOT NULL GROUP BY utxo, asset",
        )?;
        for balance in stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(2)?))
        })? {
            let (utxo, quantity) = balance?;
            if quantity.unwrap_or(0) > 0 {
                self.utxos.insert(utxo, UtxoPresence::Present);
            }
        }
        Ok(())
    }

    // invalid attaches never credit the UTXO in `balances`, but it was marked during parsing
    fn load_invalid_attaches(&mut self, conn: &Connection) -> Result<(), CacheError> {
        let mut stmt = conn.prepare(
            "SELECT utxos_info FROM transactions_with_status
             WHERE valid IS FALSE AND transaction_type = ?",
        )?;
        for utxos_info in stmt.query_map(params![TransactionType::Attach.as_str()], |row| {
            row.get::<_, Option<String>>(0)
        })? {
            if let Some(destination) = UtxosInfo::parse(&utxos_info?.unwrap_or_default()).destination
            {
                self.utxos.insert(destination, UtxoPresence::Present);
            }
        }
        Ok(())
    }

    fn add_known_sources_descendants(
        &mut self,
        conn: &Connection,
        known_sources: &BTreeMap<String, String>,
    ) -> Result<(), CacheError> {
        let mut pending: Vec<String> = Vec::new();
        for (tx_hash, source) in known_sources {
            if source.is_empty() {
                continue;
            }
            let utxos_info: Option<Option<String>> = conn
                .query_row(
                    "SELECT utxos_info FROM transactions WHERE tx_hash = ?",
                    params![tx_hash],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(destination) =
                UtxosInfo::parse(&utxos_info.flatten().unwrap_or_default()).destination
            {
                self.utxos
                    .insert(destination.clone(), UtxoPresence::Present);
                pending.push(destination);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT utxos_info, transaction_type FROM transactions
             WHERE transaction_type IN ('utxomove', 'attach', 'detach')
             AND utxos_info LIKE ?
             ORDER BY tx_index",
        )?;
        let mut processed = HashSet::new();
        while let Some(utxo) = pending.pop() {
            if !processed.insert(utxo.clone()) {
                continue;
            }
            // prefix match, confirmed against the parsed source list below
            let consumers = stmt
                .query_map(params![format!("{}%", utxo)], |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (utxos_info, transaction_type) in consumers {
                let info = UtxosInfo::parse(&utxos_info);
                if !info.spends(&utxo) {
                    continue;
                }
                self.utxos.remove(&utxo);
                if transaction_type == TransactionType::Detach.as_str() {
                    continue;
                }
                if let Some(destination) = info.destination {
                    self.utxos
                        .insert(destination.clone(), UtxoPresence::Present);
                    if !processed.contains(&destination) {
                        pending.push(destination);
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether `utxo` holds assets.
    ///
    /// A miss falls back to the store. Only positive answers are cached.
    pub fn has_balance(&mut self, utxo: &str) -> Result<bool, CacheError> {
        match self.presence(utxo) {
            UtxoPresence::Present => return Ok(true),
            UtxoPresence::KnownAbsent => return Ok(false),
            UtxoPresence::Unknown => {}
        }
        let found = {
            let conn = self.pool.acquire()?;
            conn.query_row(
                "SELECT 1 FROM (
                    SELECT quantity, MAX(rowid) FROM balances WHERE utxo = ? GROUP BY asset
                 ) WHERE quantity > 0 LIMIT 1",
                params![utxo],
                |_| Ok(()),
            )
            .optional()?
            .is_some()
        };
        if found {
            self.utxos.insert(utxo.to_string(), UtxoPresence::Present);
        }
        Ok(found)
    }

    /// Cached knowledge about `utxo`, without touching the store
    pub fn presence(&self, utxo: &str) -> UtxoPresence {
        self.utxos
            .get(utxo)
            .copied()
            .unwrap_or(UtxoPresence::Unknown)
    }

    /// Marks `utxo` as holding assets
    pub fn add_balance(&mut self, utxo: &str) {
        self.utxos.insert(utxo.to_string(), UtxoPresence::Present);
    }

    /// Marks `utxo` as spent, ahead of the store write
    pub fn remove_balance(&mut self, utxo: &str) {
        self.utxos
            .insert(utxo.to_string(), UtxoPresence::KnownAbsent);
    }

    /// Forgets the spent UTXOs. Run after each block.
    pub fn cleanup_spent_utxos(&mut self) {
        let before = self.utxos.len();
        self.utxos
            .retain(|_, presence| *presence == UtxoPresence::Present);
        let removed = before - self.utxos.len();
        if removed > 0 {
            trace!("Cleaned up {} spent UTXOs from cache", removed);
        }
    }

    /// Number of cached UTXOs, spent ones included
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}
