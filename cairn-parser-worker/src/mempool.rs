use crate::apply::{insert_transaction_row, parse_tx, ApplyEnv, TxPosition};
use crate::processor::BlockProcessor;
use cairn_db_worker::queries;
use cairn_models::config::{MEMPOOL_BLOCK_HASH, MEMPOOL_BLOCK_INDEX};
use cairn_models::RawTransaction;
use cairn_parser_exports::{ParseOutcome, ParserError};
use cairn_time::CairnTime;
use rusqlite::params;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

impl BlockProcessor {
    /// Interprets unconfirmed transactions against the current ledger and stores
    /// their events in `mempool`. The ledger itself is left untouched.
    ///
    /// Returns the hashes of the transactions no interpreter supports.
    pub fn parse_mempool_transactions(
        &mut self,
        raw_txs: &[RawTransaction],
    ) -> Result<Vec<String>, ParserError> {
        self.caches.assets()?;
        self.caches.orders()?;
        self.caches.utxos()?;

        let block_time = CairnTime::now()?.to_duration().as_secs();
        let mut not_supported = Vec::new();
        let mut provisional = Vec::new();
        {
            let env = ApplyEnv {
                interpreters: &self.interpreters,
                caches: &self.caches,
            };
            let source = &self.source;
            let tx = self.db.conn_mut().transaction()?;
            // pseudo-block owning the provisional transaction rows
            let previous_block_hash = queries::last_block(&tx)?.map(|block| block.block_hash);
            tx.execute(
                "INSERT INTO blocks (block_index, block_hash, previous_block_hash, block_time)
                 VALUES (?, ?, ?, ?)",
                params![
                    MEMPOOL_BLOCK_INDEX,
                    MEMPOOL_BLOCK_HASH,
                    previous_block_hash,
                    block_time
                ],
            )?;
            let mut tx_index = queries::next_tx_index(&tx)?;
            let mut message_index = queries::next_message_index(&tx)?;
            for raw in raw_txs {
                let transaction = match source.deserialize_transaction(raw) {
                    Ok(transaction) => transaction,
                    Err(err) => {
                        warn!("Skipping undecodable mempool transaction: {}", err);
                        continue;
                    }
                };
                if queries::transaction_exists(&tx, &transaction.tx_hash)? {
                    continue;
                }
                let position = TxPosition {
                    block_index: MEMPOOL_BLOCK_INDEX,
                    block_time,
                    tx_index,
                    mempool: true,
                };
                insert_transaction_row(&tx, &position, MEMPOOL_BLOCK_HASH, &transaction)?;
                tx_index += 1;
                let (outcome, events) =
                    match parse_tx(&env, &tx, &position, &transaction, &mut message_index) {
                        Ok(parsed) => parsed,
                        // fatal in a block, only skipped here
                        Err(err @ ParserError::ParseTransaction { .. }) => {
                            warn!("Skipping mempool transaction: {}", err);
                            continue;
                        }
                        Err(err) => return Err(err),
                    };
                match outcome {
                    ParseOutcome::Unsupported => not_supported.push(transaction.tx_hash),
                    ParseOutcome::Supported { .. } => provisional.extend(
                        events
                            .into_iter()
                            .map(|applied| (transaction.tx_hash.clone(), applied.event)),
                    ),
                }
            }
            // dropping the transaction discards every ledger write
            tx.rollback()?;
        }

        let tx = self.db.conn_mut().transaction()?;
        let mut cleaned = HashSet::new();
        for (tx_hash, event) in &provisional {
            if cleaned.insert(tx_hash.as_str()) {
                tx.execute("DELETE FROM mempool WHERE tx_hash = ?", params![tx_hash])?;
            }
            tx.execute(
                "INSERT INTO mempool (tx_hash, command, category, bindings, timestamp, event)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    tx_hash,
                    event.command.as_str(),
                    event.category,
                    Value::Object(event.bindings.clone()).to_string(),
                    block_time,
                    event.event,
                ],
            )?;
        }
        tx.commit()?;
        debug!(
            "{} mempool transactions parsed, {} events stored, {} not supported",
            raw_txs.len(),
            provisional.len(),
            not_supported.len()
        );
        Ok(not_supported)
    }

    /// Drops the provisional events of `tx_hash`
    pub fn clean_transaction_from_mempool(&self, tx_hash: &str) -> Result<(), ParserError> {
        self.db
            .conn()
            .execute("DELETE FROM mempool WHERE tx_hash = ?", params![tx_hash])?;
        Ok(())
    }

    /// Drops the provisional events of the transactions confirmed in `block_index`
    pub fn clean_mempool_for_block(&self, block_index: u64) -> Result<(), ParserError> {
        let deleted = queries::delete_mempool_for_block(self.db.conn(), block_index)?;
        if deleted > 0 {
            debug!("{} mempool events confirmed in block {}", deleted, block_index);
        }
        Ok(())
    }

    /// Hashes of the transactions that have provisional events
    pub fn mempool_tx_hashes(&self) -> Result<HashSet<String>, ParserError> {
        Ok(queries::mempool_tx_hashes(self.db.conn())?)
    }
}
