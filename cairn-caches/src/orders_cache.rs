use crate::error::CacheError;
use cairn_db_exports::ORDERS;
use cairn_db_worker::sql_value::json_to_sql;
use cairn_db_worker::ConnectionPool;
use cairn_models::config::{FILLED_ORDERS_RETENTION, MEMPOOL_BLOCK_INDEX};
use cairn_models::{Order, OrderStatus};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, trace};

const CREATE_ORDERS: &str = "CREATE TABLE IF NOT EXISTS orders(
    tx_index INTEGER,
    tx_hash TEXT,
    block_index INTEGER,
    source TEXT,
    give_asset TEXT,
    give_quantity INTEGER,
    give_remaining INTEGER,
    get_asset TEXT,
    get_quantity INTEGER,
    get_remaining INTEGER,
    expiration INTEGER,
    expire_index INTEGER,
    fee_required INTEGER,
    fee_required_remaining INTEGER,
    fee_provided INTEGER,
    fee_provided_remaining INTEGER,
    status TEXT
);
CREATE INDEX IF NOT EXISTS orders_tx_hash_idx ON orders (tx_hash);
CREATE INDEX IF NOT EXISTS orders_get_asset_give_asset_idx ON orders (get_asset, give_asset, status);";

fn order_columns() -> String {
    Order::COLUMNS.join(", ")
}

/// Reads an order from a row starting with `Order::COLUMNS`
fn order_from_row(row: &Row) -> rusqlite::Result<Order> {
    let status: String = row.get(16)?;
    Ok(Order {
        tx_index: row.get(0)?,
        tx_hash: row.get(1)?,
        block_index: row.get(2)?,
        source: row.get(3)?,
        give_asset: row.get(4)?,
        give_quantity: row.get(5)?,
        give_remaining: row.get(6)?,
        get_asset: row.get(7)?,
        get_quantity: row.get(8)?,
        get_remaining: row.get(9)?,
        expiration: row.get(10)?,
        expire_index: row.get(11)?,
        fee_required: row.get(12)?,
        fee_required_remaining: row.get(13)?,
        fee_provided: row.get(14)?,
        fee_provided_remaining: row.get(15)?,
        status: OrderStatus::from_str(&status).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                16,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })?,
    })
}

/// Open, filled and cancelled orders, in a private in-memory table
pub struct OrdersCache {
    cache_db: Connection,
    last_cleaning_block_index: u64,
}

impl std::fmt::Debug for OrdersCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersCache")
            .field("last_cleaning_block_index", &self.last_cleaning_block_index)
            .finish()
    }
}

impl OrdersCache {
    /// Loads the latest version of every non-expired order
    pub fn new(pool: &ConnectionPool, current_block_index: u64) -> Result<Self, CacheError> {
        debug!("Initialising orders cache...");
        let cache_db = Connection::open_in_memory()?;
        cache_db.execute_batch(CREATE_ORDERS)?;
        let mut cache = OrdersCache {
            cache_db,
            last_cleaning_block_index: 0,
        };
        {
            let conn = pool.acquire()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM (
                    SELECT *, MAX(rowid) FROM orders GROUP BY tx_hash
                ) WHERE status != 'expired'",
                order_columns()
            ))?;
            for order in stmt.query_map([], order_from_row)? {
                cache.insert_row(&order?)?;
            }
        }
        cache.clean_filled_orders(current_block_index)?;
        debug!("Orders cache initialised ({} orders)", cache.order_count()?);
        Ok(cache)
    }

    fn insert_row(&self, order: &Order) -> Result<(), CacheError> {
        let placeholders = vec!["?"; Order::COLUMNS.len()].join(", ");
        self.cache_db.execute(
            &format!(
                "INSERT INTO orders ({}) VALUES ({})",
                order_columns(),
                placeholders
            ),
            params![
                order.tx_index,
                order.tx_hash,
                order.block_index,
                order.source,
                order.give_asset,
                order.give_quantity,
                order.give_remaining,
                order.get_asset,
                order.get_quantity,
                order.get_remaining,
                order.expiration,
                order.expire_index,
                order.fee_required,
                order.fee_required_remaining,
                order.fee_provided,
                order.fee_provided_remaining,
                order.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Deletes filled orders older than the retention window, at most once per window
    pub fn clean_filled_orders(&mut self, current_block_index: u64) -> Result<(), CacheError> {
        if current_block_index.saturating_sub(self.last_cleaning_block_index)
            < FILLED_ORDERS_RETENTION
        {
            return Ok(());
        }
        self.last_cleaning_block_index = current_block_index;
        let deleted = self.cache_db.execute(
            "DELETE FROM orders WHERE status = 'filled' AND block_index < ?",
            params![current_block_index.saturating_sub(FILLED_ORDERS_RETENTION)],
        )?;
        trace!("{} filled orders removed from cache", deleted);
        Ok(())
    }

    /// Adds a new order. Provisional (mempool) orders are ignored.
    pub fn insert_order(&mut self, order: &Order, current_block_index: u64) -> Result<(), CacheError> {
        if order.block_index == MEMPOOL_BLOCK_INDEX {
            return Ok(());
        }
        self.insert_row(order)?;
        self.clean_filled_orders(current_block_index)
    }

    /// Applies a field-level update to the order `tx_hash`, dropping it when it expires.
    ///
    /// `block_index` is always set to `current_block_index`.
    pub fn update_order(
        &mut self,
        tx_hash: &str,
        fields: &Map<String, Value>,
        current_block_index: u64,
    ) -> Result<(), CacheError> {
        if fields.get("status").and_then(Value::as_str) == Some(OrderStatus::Expired.as_str()) {
            self.cache_db
                .execute("DELETE FROM orders WHERE tx_hash = ?", params![tx_hash])?;
            return Ok(());
        }
        let mut assignments = Vec::with_capacity(fields.len() + 1);
        let mut values: Vec<SqlValue> = Vec::with_capacity(fields.len() + 2);
        for (column, value) in fields {
            if column == "tx_hash" || column == "block_index" {
                continue;
            }
            ORDERS
                .check_column(column)
                .map_err(|err| CacheError::InvalidOrderUpdate(err.to_string()))?;
            assignments.push(format!("{} = ?", column));
            values.push(json_to_sql(value));
        }
        assignments.push("block_index = ?".to_string());
        values.push(SqlValue::Integer(current_block_index as i64));
        values.push(SqlValue::Text(tx_hash.to_string()));
        self.cache_db.execute(
            &format!(
                "UPDATE orders SET {} WHERE tx_hash = ?",
                assignments.join(", ")
            ),
            params_from_iter(values),
        )?;
        self.clean_filled_orders(current_block_index)
    }

    /// Counter-orders of the order `tx_hash`: open orders giving `get_asset` and
    /// getting `give_asset`, in `(tx_index, tx_hash)` order.
    pub fn get_matching_orders(
        &self,
        tx_hash: &str,
        give_asset: &str,
        get_asset: &str,
    ) -> Result<Vec<Order>, CacheError> {
        let mut stmt = self.cache_db.prepare(&format!(
            "SELECT {} FROM orders
             WHERE tx_hash != ?1 AND give_asset = ?2 AND get_asset = ?3 AND status = ?4
             ORDER BY tx_index, tx_hash",
            order_columns()
        ))?;
        let orders = stmt
            .query_map(
                params![tx_hash, get_asset, give_asset, OrderStatus::Open.as_str()],
                order_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// Cached version of the order `tx_hash`
    pub fn get_order(&self, tx_hash: &str) -> Result<Option<Order>, CacheError> {
        Ok(self
            .cache_db
            .query_row(
                &format!("SELECT {} FROM orders WHERE tx_hash = ?", order_columns()),
                params![tx_hash],
                order_from_row,
            )
            .optional()?)
    }

    /// Number of cached orders
    pub fn order_count(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .cache_db
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
