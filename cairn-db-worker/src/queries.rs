//! Read and maintenance helpers shared by the writer, write transactions and pooled readers.

use cairn_db_exports::{DatabaseError, BLOCK_INDEXED_TABLES};
use cairn_models::{BlockRecord, HashField, Transaction, TransactionType};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::str::FromStr;

const BLOCK_COLUMNS: &str = "block_index, block_hash, previous_block_hash, block_time, \
     ledger_hash, txlist_hash, messages_hash, transaction_count";

fn block_from_row(row: &Row) -> rusqlite::Result<BlockRecord> {
    Ok(BlockRecord {
        block_index: row.get(0)?,
        block_hash: row.get(1)?,
        previous_block_hash: row.get(2)?,
        block_time: row.get(3)?,
        ledger_hash: row.get(4)?,
        txlist_hash: row.get(5)?,
        messages_hash: row.get(6)?,
        transaction_count: row.get::<_, Option<u64>>(7)?.unwrap_or(0),
    })
}

/// Block with the highest index, `None` on an empty ledger
pub fn last_block(conn: &Connection) -> Result<Option<BlockRecord>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM blocks ORDER BY block_index DESC LIMIT 1",
        BLOCK_COLUMNS
    );
    Ok(conn.query_row(&sql, [], block_from_row).optional()?)
}

/// Block at `block_index`
pub fn get_block(conn: &Connection, block_index: u64) -> Result<Option<BlockRecord>, DatabaseError> {
    let sql = format!("SELECT {} FROM blocks WHERE block_index = ?", BLOCK_COLUMNS);
    Ok(conn
        .query_row(&sql, params![block_index], block_from_row)
        .optional()?)
}

/// Hash of the block at `block_index`
pub fn block_hash_at(conn: &Connection, block_index: u64) -> Result<Option<String>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT block_hash FROM blocks WHERE block_index = ?",
            params![block_index],
            |row| row.get(0),
        )
        .optional()?)
}

/// Whether a block with this hash is stored
pub fn block_exists(conn: &Connection, block_hash: &str) -> Result<bool, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM blocks WHERE block_hash = ?",
            params![block_hash],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Stored value of a hash chain at `block_index`, `None` if the block or the hash is missing
pub fn stored_hash(
    conn: &Connection,
    block_index: u64,
    field: HashField,
) -> Result<Option<String>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM blocks WHERE block_index = ?",
        field.column()
    );
    Ok(conn
        .query_row(&sql, params![block_index], |row| row.get::<_, Option<String>>(0))
        .optional()?
        .flatten()
        .filter(|hash| !hash.is_empty()))
}

/// Index given to the next applied transaction, 0 on an empty ledger
pub fn next_tx_index(conn: &Connection) -> Result<u64, DatabaseError> {
    let max: Option<u64> =
        conn.query_row("SELECT MAX(tx_index) FROM transactions", [], |row| row.get(0))?;
    Ok(max.map(|index| index + 1).unwrap_or(0))
}

/// Index given to the next applied event, 0 on an empty ledger
pub fn next_message_index(conn: &Connection) -> Result<u64, DatabaseError> {
    let max: Option<u64> =
        conn.query_row("SELECT MAX(message_index) FROM messages", [], |row| row.get(0))?;
    Ok(max.map(|index| index + 1).unwrap_or(0))
}

/// Whether a confirmed transaction with this hash is stored
pub fn transaction_exists(conn: &Connection, tx_hash: &str) -> Result<bool, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM transactions WHERE tx_hash = ?",
            params![tx_hash],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Transactions of a block with their `tx_index`, in application order
pub fn block_transactions(
    conn: &Connection,
    block_index: u64,
) -> Result<Vec<(u64, Transaction)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT tx_index, tx_hash, source, destination, btc_amount, fee, data, utxos_info, transaction_type
         FROM transactions WHERE block_index = ? ORDER BY tx_index",
    )?;
    let rows = stmt.query_map(params![block_index], |row| {
        let transaction_type: Option<String> = row.get(8)?;
        Ok((
            row.get::<_, u64>(0)?,
            Transaction {
                tx_hash: row.get(1)?,
                source: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                destination: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                btc_amount: row.get::<_, Option<u64>>(4)?.unwrap_or(0),
                fee: row.get::<_, Option<u64>>(5)?.unwrap_or(0),
                data: row.get::<_, Option<Vec<u8>>>(6)?.unwrap_or_default(),
                utxos_info: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                transaction_type: transaction_type
                    .and_then(|name| TransactionType::from_str(&name).ok())
                    .unwrap_or_default(),
            },
        ))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Hashes of the transactions that have provisional events
pub fn mempool_tx_hashes(conn: &Connection) -> Result<HashSet<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT DISTINCT tx_hash FROM mempool")?;
    let hashes = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(hashes)
}

/// Drops the provisional events of the transactions confirmed in `block_index`
pub fn delete_mempool_for_block(conn: &Connection, block_index: u64) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM mempool WHERE tx_hash IN (SELECT tx_hash FROM transactions WHERE block_index = ?)",
        params![block_index],
    )?)
}

/// Deletes every block, transaction, event and ledger row at or after `block_index`
pub fn delete_from_block_index(conn: &Connection, block_index: u64) -> Result<(), DatabaseError> {
    for table in BLOCK_INDEXED_TABLES {
        conn.execute(
            &format!("DELETE FROM {} WHERE block_index >= ?", table),
            params![block_index],
        )?;
    }
    Ok(())
}

/// Deletes the state derived from transactions at or after `block_index`, keeping
/// the transactions and blocks themselves
pub fn delete_derived_state_from(conn: &Connection, block_index: u64) -> Result<(), DatabaseError> {
    for table in BLOCK_INDEXED_TABLES
        .iter()
        .filter(|table| !matches!(**table, "transactions" | "blocks"))
    {
        conn.execute(
            &format!("DELETE FROM {} WHERE block_index >= ?", table),
            params![block_index],
        )?;
    }
    conn.execute(
        "UPDATE transactions SET supported = 1 WHERE block_index >= ?",
        params![block_index],
    )?;
    Ok(())
}

/// Value of a `config` row
pub fn get_config_value(conn: &Connection, name: &str) -> Result<Option<String>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT value FROM config WHERE name = ?",
            params![name],
            |row| row.get(0),
        )
        .optional()?)
}

/// Inserts or replaces a `config` row
pub fn set_config_value(conn: &Connection, name: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO config (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = ?2",
        params![name, value],
    )?;
    Ok(())
}

/// Runs `PRAGMA integrity_check`
pub fn integrity_check(conn: &Connection) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let messages = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if messages.len() == 1 && messages[0] == "ok" {
        Ok(())
    } else {
        Err(DatabaseError::IntegrityCheck(messages.join("; ")))
    }
}

/// Runs `PRAGMA foreign_key_check`
pub fn check_foreign_keys(conn: &Connection) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let violations = stmt
        .query_map([], |row| {
            Ok(format!(
                "{} row {} references {}",
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                row.get::<_, String>(2)?
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DatabaseError::ForeignKeyCheck(violations.join("; ")))
    }
}
