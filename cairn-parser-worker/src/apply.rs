//! Transaction interpretation and event application, shared by block parsing,
//! reparse and provisional mempool parsing.

use cairn_caches::CacheRegistry;
use cairn_db_exports::LedgerTable;
use cairn_db_worker::sql_value::json_to_sql;
use cairn_models::config::ADDRESS_SEPARATOR;
use cairn_models::{
    AssetRecord, Destruction, EventCommand, LedgerEvent, ModelsError, Order, Transaction,
    TransactionType,
};
use cairn_parser_exports::{InterpreterRegistry, ParseContext, ParseOutcome, ParserError};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use tracing::{debug, trace};

/// Everything event application needs besides the write transaction
pub(crate) struct ApplyEnv<'a> {
    pub interpreters: &'a InterpreterRegistry,
    pub caches: &'a CacheRegistry,
}

/// Position of a transaction in the ledger
#[derive(Debug, Clone, Copy)]
pub(crate) struct TxPosition {
    pub block_index: u64,
    pub block_time: u64,
    pub tx_index: u64,
    pub mempool: bool,
}

/// An event applied to the ledger with its hash
pub(crate) struct AppliedEvent {
    pub event: LedgerEvent,
    pub event_hash: String,
}

pub(crate) fn insert_transaction_row(
    conn: &Connection,
    position: &TxPosition,
    block_hash: &str,
    tx: &Transaction,
) -> Result<(), ParserError> {
    conn.execute(
        "INSERT INTO transactions (tx_index, tx_hash, block_index, block_hash, block_time,
         source, destination, btc_amount, fee, data, utxos_info, transaction_type)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            position.tx_index,
            tx.tx_hash,
            position.block_index,
            block_hash,
            position.block_time,
            tx.source,
            tx.destination,
            tx.btc_amount,
            tx.fee,
            tx.data,
            tx.utxos_info,
            tx.transaction_type.as_str(),
        ],
    )?;
    Ok(())
}

fn unsupported_reason(env: &ApplyEnv<'_>, tx: &Transaction) -> Option<String> {
    if tx.has_separator_collision() {
        return Some(format!(
            "source or destination contains `{}`",
            ADDRESS_SEPARATOR
        ));
    }
    if tx.source.is_empty() {
        return Some("no source".to_string());
    }
    match InterpreterRegistry::unpack(&tx.data) {
        None => Some("cannot unpack message type".to_string()),
        Some((message_type_id, _)) if env.interpreters.get(message_type_id).is_none() => {
            Some(format!("unknown message type {}", message_type_id))
        }
        Some(_) => None,
    }
}

/// Interprets `tx`, whose row is already stored at `position`, and applies its events.
///
/// `message_index` is advanced by the number of applied events.
pub(crate) fn parse_tx(
    env: &ApplyEnv<'_>,
    conn: &Connection,
    position: &TxPosition,
    tx: &Transaction,
    message_index: &mut u64,
) -> Result<(ParseOutcome, Vec<AppliedEvent>), ParserError> {
    if let Some(reason) = unsupported_reason(env, tx) {
        if !position.mempool {
            debug!("Unsupported transaction: hash {}; {}", tx.tx_hash, reason);
        }
        conn.execute(
            "UPDATE transactions SET supported = 0 WHERE tx_index = ?",
            params![position.tx_index],
        )?;
        return Ok((ParseOutcome::Unsupported, Vec::new()));
    }
    let (message_type_id, payload) =
        InterpreterRegistry::unpack(&tx.data).ok_or_else(|| {
            ParserError::InvalidEvent(format!("cannot unpack {}", tx.tx_hash))
        })?;
    let interpreter = env.interpreters.get(message_type_id).ok_or_else(|| {
        ParserError::InvalidEvent(format!("no interpreter for {}", message_type_id))
    })?;

    let ctx = ParseContext {
        block_index: position.block_index,
        block_time: position.block_time,
        tx_index: position.tx_index,
        tx,
        conn,
        caches: env.caches,
        mempool: position.mempool,
    };
    let events = interpreter
        .parse(&ctx, payload)
        .map_err(|source| ParserError::ParseTransaction {
            tx_hash: tx.tx_hash.clone(),
            source,
        })?;
    trace!(
        "{} emitted {} events for {}",
        interpreter.name(),
        events.len(),
        tx.tx_hash
    );

    let mut applied = Vec::with_capacity(events.len());
    for event in events {
        applied.push(apply_event(
            env,
            conn,
            position,
            Some(&tx.tx_hash),
            *message_index,
            event,
        )?);
        *message_index += 1;
    }

    let valid = !applied.iter().any(|applied| applied.event.is_invalid());
    conn.execute(
        "INSERT INTO transactions_status (tx_index, block_index, valid) VALUES (?, ?, ?)",
        params![position.tx_index, position.block_index, valid],
    )?;
    // an invalid attach still marks its output, later transactions may spend it
    if !valid && !position.mempool && tx.transaction_type == TransactionType::Attach {
        if let Some(destination) = tx.utxos().destination {
            env.caches.utxos()?.lock().add_balance(&destination);
        }
    }

    Ok((
        ParseOutcome::Supported {
            events: applied.len(),
            valid,
        },
        applied,
    ))
}

/// Writes `event` to its table and to `messages`, then mirrors it in the caches
pub(crate) fn apply_event(
    env: &ApplyEnv<'_>,
    conn: &Connection,
    position: &TxPosition,
    tx_hash: Option<&str>,
    message_index: u64,
    mut event: LedgerEvent,
) -> Result<AppliedEvent, ParserError> {
    match event.command {
        EventCommand::Insert => {
            let table = LedgerTable::by_name(&event.category)?;
            event
                .bindings
                .insert("block_index".into(), Value::from(position.block_index));
            insert_row(conn, &table, &event)?;
        }
        EventCommand::Update => {
            let table = LedgerTable::by_name(&event.category)?;
            event
                .bindings
                .insert("block_index".into(), Value::from(position.block_index));
            update_row(conn, &table, &event)?;
        }
        EventCommand::Parse => {}
    }

    let event_hash = event.event_hash(position.block_index, tx_hash);
    conn.execute(
        "INSERT INTO messages (message_index, block_index, command, category, bindings,
         timestamp, event, tx_hash, event_hash)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            message_index,
            position.block_index,
            event.command.as_str(),
            event.category,
            Value::Object(event.bindings.clone()).to_string(),
            position.block_time,
            event.event,
            tx_hash,
            event_hash,
        ],
    )?;

    if !position.mempool {
        update_caches(env.caches, position.block_index, &event)?;
    }
    Ok(AppliedEvent { event, event_hash })
}

fn insert_row(conn: &Connection, table: &LedgerTable, event: &LedgerEvent) -> Result<(), ParserError> {
    let mut columns = Vec::with_capacity(event.bindings.len());
    let mut values = Vec::with_capacity(event.bindings.len());
    for (column, value) in &event.bindings {
        table.check_column(column)?;
        columns.push(column.as_str());
        values.push(json_to_sql(value));
    }
    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        ),
        params_from_iter(values),
    )?;
    Ok(())
}

// appends a new version of the keyed row, merged with the bindings
fn update_row(conn: &Connection, table: &LedgerTable, event: &LedgerEvent) -> Result<(), ParserError> {
    let key = table.key.ok_or_else(|| {
        ParserError::InvalidEvent(format!("{} rows cannot be updated", table.name))
    })?;
    let key_value = event.bindings.get(key).ok_or_else(|| {
        ParserError::InvalidEvent(format!("{} update without `{}`", table.name, key))
    })?;
    let columns = table.columns.join(", ");
    let latest: Option<Vec<SqlValue>> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY rowid DESC LIMIT 1",
            columns, table.name, key
        ))?;
        let mut rows = stmt.query(params![json_to_sql(key_value)])?;
        match rows.next()? {
            Some(row) => Some(
                (0..table.columns.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        }
    };
    let mut merged = latest.ok_or_else(|| {
        ParserError::InvalidEvent(format!(
            "no {} row with {} = {}",
            table.name, key, key_value
        ))
    })?;
    for (column, value) in &event.bindings {
        table.check_column(column)?;
        if let Some(position) = table.columns.iter().position(|name| name == column) {
            merged[position] = json_to_sql(value);
        }
    }
    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns,
            vec!["?"; table.columns.len()].join(", ")
        ),
        params_from_iter(merged),
    )?;
    Ok(())
}

fn update_caches(caches: &CacheRegistry, block_index: u64, event: &LedgerEvent) -> Result<(), ParserError> {
    let bindings = || Value::Object(event.bindings.clone());
    match (event.category.as_str(), event.command) {
        ("issuances", EventCommand::Insert) => {
            let issuance: AssetRecord =
                serde_json::from_value(bindings()).map_err(ModelsError::from)?;
            caches.assets()?.lock().add_issuance(&issuance);
        }
        ("destructions", EventCommand::Insert) => {
            let destroyed: Destruction =
                serde_json::from_value(bindings()).map_err(ModelsError::from)?;
            caches.assets()?.lock().add_destroyed(&destroyed);
        }
        ("orders", EventCommand::Insert) => {
            let order: Order = serde_json::from_value(bindings()).map_err(ModelsError::from)?;
            caches.orders()?.lock().insert_order(&order, block_index)?;
        }
        ("orders", EventCommand::Update) => {
            if let Some(tx_hash) = event.binding_str("tx_hash") {
                caches
                    .orders()?
                    .lock()
                    .update_order(tx_hash, &event.bindings, block_index)?;
            }
        }
        ("balances", EventCommand::Insert) => {
            if let Some(utxo) = event.binding_str("utxo") {
                let utxos = caches.utxos()?;
                let mut utxos = utxos.lock();
                if event.binding_i64("quantity").unwrap_or(0) > 0 {
                    utxos.add_balance(utxo);
                } else {
                    utxos.remove_balance(utxo);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Content folded into each hash chain for one block
#[derive(Default)]
pub(crate) struct BlockChunks {
    pub txlist: Vec<String>,
    pub ledger: Vec<String>,
    pub messages: Vec<String>,
}

impl BlockChunks {
    pub fn add_transaction(&mut self, tx: &Transaction) {
        self.txlist.push(tx.txlist_chunk());
    }

    pub fn add_events(&mut self, events: &[AppliedEvent]) {
        for applied in events {
            if applied.event.command.mutates_state() {
                self.ledger.push(applied.event.ledger_chunk());
            }
            self.messages.push(applied.event_hash.clone());
        }
    }
}
