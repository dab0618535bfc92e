use crate::error::CacheError;
use cairn_db_worker::ConnectionPool;
use cairn_models::config::SUBASSET_SEPARATOR;
use cairn_models::{AssetRecord, Destruction};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const ISSUANCE_COLUMNS: &str = "tx_index, tx_hash, block_index, asset, asset_longname, quantity, \
     divisible, source, issuer, description, status";

fn asset_from_row(row: &Row) -> rusqlite::Result<AssetRecord> {
    Ok(AssetRecord {
        tx_index: row.get(0)?,
        tx_hash: row.get(1)?,
        block_index: row.get(2)?,
        asset: row.get(3)?,
        asset_longname: row.get(4)?,
        quantity: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        divisible: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
        source: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        issuer: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        status: row.get(10)?,
    })
}

/// Latest valid issuance of every asset, by short name and by longname
pub struct AssetCache {
    pool: Arc<ConnectionPool>,
    assets: HashMap<String, AssetRecord>,
    assets_total_issued: HashMap<String, i64>,
    assets_total_destroyed: HashMap<String, i64>,
}

impl AssetCache {
    /// Loads every asset and the issued and destroyed totals
    pub fn new(pool: Arc<ConnectionPool>) -> Result<Self, CacheError> {
        debug!("Initialising asset cache...");
        let mut assets = HashMap::new();
        let mut assets_total_issued = HashMap::new();
        let mut assets_total_destroyed = HashMap::new();
        {
            let conn = pool.acquire()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, MAX(rowid) FROM issuances WHERE status = 'valid' GROUP BY asset",
                ISSUANCE_COLUMNS
            ))?;
            for record in stmt.query_map([], asset_from_row)? {
                let record = record?;
                if let Some(longname) = &record.asset_longname {
                    assets.insert(longname.clone(), record.clone());
                }
                assets.insert(record.asset.clone(), record);
            }

            let mut stmt = conn.prepare(
                "SELECT asset, SUM(quantity) FROM issuances WHERE status = 'valid' GROUP BY asset",
            )?;
            for total in stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
            })? {
                let (asset, total) = total?;
                assets_total_issued.insert(asset, total.unwrap_or(0));
            }

            let mut stmt = conn.prepare(
                "SELECT asset, SUM(quantity) FROM destructions WHERE status = 'valid' GROUP BY asset",
            )?;
            for total in stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
            })? {
                let (asset, total) = total?;
                assets_total_destroyed.insert(asset, total.unwrap_or(0));
            }
        }
        debug!("Asset cache initialised ({} names)", assets.len());
        Ok(AssetCache {
            pool,
            assets,
            assets_total_issued,
            assets_total_destroyed,
        })
    }

    /// Latest valid issuance of `name`, a short name or a `PARENT.child` longname.
    ///
    /// A miss falls back to the store. Only found assets are cached.
    pub fn get(&mut self, name: &str) -> Result<Option<AssetRecord>, CacheError> {
        if let Some(record) = self.assets.get(name) {
            return Ok(Some(record.clone()));
        }
        let column = if name.contains(SUBASSET_SEPARATOR) {
            "asset_longname"
        } else {
            "asset"
        };
        let sql = format!(
            "SELECT {} FROM issuances WHERE {} = ? AND status = 'valid' ORDER BY tx_index DESC LIMIT 1",
            ISSUANCE_COLUMNS, column
        );
        let found = {
            let conn = self.pool.acquire()?;
            conn.query_row(&sql, params![name], asset_from_row)
                .optional()?
        };
        if let Some(record) = &found {
            self.assets.insert(name.to_string(), record.clone());
        }
        Ok(found)
    }

    /// Records an issuance. Ignored unless valid.
    pub fn add_issuance(&mut self, issuance: &AssetRecord) {
        if !issuance.is_valid() {
            return;
        }
        if let Some(longname) = &issuance.asset_longname {
            self.assets.insert(longname.clone(), issuance.clone());
        }
        self.assets
            .insert(issuance.asset.clone(), issuance.clone());
        *self
            .assets_total_issued
            .entry(issuance.asset.clone())
            .or_insert(0) += issuance.quantity;
    }

    /// Records a destruction. Ignored unless valid.
    pub fn add_destroyed(&mut self, destroyed: &Destruction) {
        if !destroyed.is_valid() {
            return;
        }
        *self
            .assets_total_destroyed
            .entry(destroyed.asset.clone())
            .or_insert(0) += destroyed.quantity;
    }

    /// Sum of the valid issuances of `asset`
    pub fn total_issued(&self, asset: &str) -> i64 {
        self.assets_total_issued.get(asset).copied().unwrap_or(0)
    }

    /// Sum of the valid destructions of `asset`
    pub fn total_destroyed(&self, asset: &str) -> i64 {
        self.assets_total_destroyed.get(asset).copied().unwrap_or(0)
    }

    /// Issued minus destroyed
    pub fn supply(&self, asset: &str) -> i64 {
        self.total_issued(asset) - self.total_destroyed(asset)
    }

    /// Number of cached names, longnames included
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether no name is cached
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
