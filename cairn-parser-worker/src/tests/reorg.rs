use super::tools::{test_processor, TestProcessor};
use assert_matches::assert_matches;
use cairn_consensus::ConsensusError;
use cairn_models::config::VERSION_CONFIG_KEY;
use cairn_models::{BlockRecord, RawBlock};
use cairn_parser_exports::{NewBlockOutcome, ParserError};
use cairn_test_framework::{
    attach_tx, destroy_tx, issuance_tx, order_tx, utxo_move_tx, InMemoryChain,
};
use rusqlite::params;

/// Blocks 0 to 4 with issuances, orders and UTXO movements
fn busy_ledger() -> TestProcessor {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.chain.mine(vec![
        issuance_tx("i1", "alice", "PEPE", 1_000),
        issuance_tx("i2", "bob", "XCP", 500),
    ]);
    t.chain.mine(vec![
        order_tx("o1", "alice", ("PEPE", 100), ("XCP", 50)),
        attach_tx("a1", "alice", "PEPE", 400),
    ]);
    t.chain.mine(vec![
        order_tx("o2", "bob", ("XCP", 50), ("PEPE", 100)),
        utxo_move_tx("m1", "alice", "a1:0"),
    ]);
    t.chain.mine(vec![destroy_tx("d1", "alice", "PEPE", 100)]);
    t.processor.catch_up().unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(4));
    t
}

fn hashes(blocks: &[BlockRecord]) -> Vec<(Option<String>, Option<String>, Option<String>)> {
    blocks
        .iter()
        .map(|block| {
            (
                block.ledger_hash.clone(),
                block.txlist_hash.clone(),
                block.messages_hash.clone(),
            )
        })
        .collect()
}

#[test]
fn test_busy_ledger_state() {
    let t = busy_ledger();
    assert_eq!(t.balance("alice", "PEPE"), 500);
    assert_eq!(t.utxo_balance("a1:0", "PEPE"), 0);
    assert_eq!(t.utxo_balance("m1:0", "PEPE"), 400);
    assert_eq!(t.order_status("o1").as_deref(), Some("filled"));
    let utxos = t.processor.caches().utxos().unwrap();
    let mut utxos = utxos.lock();
    assert!(utxos.has_balance("m1:0").unwrap());
    assert!(!utxos.has_balance("a1:0").unwrap());
}

#[test]
fn test_reparse_reproduces_hashes() {
    let mut t = busy_ledger();
    let before = t.blocks();
    let messages = t.count("messages");

    t.processor.reparse(1).unwrap();

    let after = t.blocks();
    assert_eq!(hashes(&before), hashes(&after));
    assert_eq!(t.count("messages"), messages);
    assert_eq!(t.count("transactions"), 7);
    assert_eq!(t.balance("alice", "PEPE"), 500);
    assert_eq!(t.utxo_balance("m1:0", "PEPE"), 400);
}

#[test]
fn test_reparse_detects_tampered_hash() {
    let mut t = busy_ledger();
    t.processor
        .db()
        .conn()
        .execute(
            "UPDATE blocks SET ledger_hash = ? WHERE block_index = 3",
            params!["0".repeat(64)],
        )
        .unwrap();
    assert_matches!(
        t.processor.reparse(3),
        Err(ParserError::Consensus(ConsensusError::InconsistentHash { block_index: 3, .. }))
    );
}

#[test]
fn test_reparse_beyond_tip_is_noop() {
    let mut t = busy_ledger();
    let messages = t.count("messages");
    t.processor.reparse(10).unwrap();
    assert_eq!(t.count("messages"), messages);
}

#[test]
fn test_rollback_then_catch_up_is_deterministic() {
    let mut t = busy_ledger();
    let before = t.blocks();

    t.processor.rollback(2, false).unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(1));
    assert_eq!(t.balance("alice", "PEPE"), 1_000);
    assert!(t.order_status("o1").is_none());
    assert_eq!(
        t.processor.caches().assets().unwrap().lock().total_destroyed("PEPE"),
        0
    );

    t.processor.catch_up().unwrap();
    assert_eq!(hashes(&before), hashes(&t.blocks()));
    assert_eq!(t.balance("alice", "PEPE"), 500);
}

#[test]
fn test_rollback_beyond_tip_is_noop() {
    let mut t = busy_ledger();
    let before = t.blocks();
    t.processor.rollback(5, false).unwrap();
    assert_eq!(hashes(&before), hashes(&t.blocks()));
}

#[test]
fn test_rollback_to_first_block_rebuilds() {
    let mut t = busy_ledger();
    t.processor.rollback(0, false).unwrap();
    assert!(t.processor.last_block().unwrap().is_none());
    assert_eq!(t.count("transactions"), 0);
    assert_eq!(t.count("balances"), 0);
    assert!(t
        .processor
        .db()
        .get_config_value(VERSION_CONFIG_KEY)
        .unwrap()
        .is_some());

    t.processor.catch_up().unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(4));
}

#[test]
fn test_rollback_clears_mempool() {
    let mut t = busy_ledger();
    let raw = cairn_test_framework::raw_transaction(&destroy_tx("p1", "alice", "PEPE", 1));
    t.processor.parse_mempool_transactions(&[raw]).unwrap();
    assert_eq!(t.count("mempool"), 2);
    t.processor.rollback(4, false).unwrap();
    assert_eq!(t.count("mempool"), 0);
}

#[test]
fn test_reorg_recovery() {
    let mut t = busy_ledger();
    let common = t.chain.block(2).unwrap();

    // the source replaces blocks 3 and 4
    t.chain.reorg(3);
    t.chain
        .mine(vec![destroy_tx("d2", "alice", "PEPE", 50)]);
    t.chain.mine_empty(2);

    t.processor.catch_up().unwrap();

    assert_eq!(t.processor.current_block_index().unwrap(), Some(5));
    let blocks = t.blocks();
    assert_eq!(blocks[2].block_hash, common.block_hash);
    for block_index in 3..=5 {
        assert_eq!(
            blocks[block_index as usize].block_hash,
            t.chain.block(block_index).unwrap().block_hash
        );
    }
    // m1, o2 and d1 are gone, d2 applies to the block 2 state
    assert!(t.transaction_status("m1").is_none());
    assert_eq!(t.order_status("o1").as_deref(), Some("open"));
    assert_eq!(t.balance("alice", "PEPE"), 550);
    assert_eq!(t.utxo_balance("a1:0", "PEPE"), 400);
}

#[test]
fn test_handle_reorg_returns_next_block() {
    let mut t = busy_ledger();
    t.chain.reorg(4);
    t.chain.mine_empty(1);

    let next = t.processor.handle_reorg().unwrap().unwrap();
    assert_eq!(next.block_index, 4);
    assert_eq!(next.block_hash, t.chain.tip().unwrap().block_hash);
    assert_eq!(t.processor.current_block_index().unwrap(), Some(3));
}

#[test]
fn test_handle_reorg_when_source_is_shorter() {
    let mut t = busy_ledger();
    // the source drops block 4, block 3 is still shared but has no successor
    t.chain.reorg(4);

    let next = t.processor.handle_reorg().unwrap().unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(2));
    assert_eq!(next.block_index, 3);
    assert_eq!(next.block_hash, t.chain.block(3).unwrap().block_hash);
}

#[test]
fn test_handle_reorg_without_replacement_block() {
    let mut t = test_processor();
    t.chain.mine_empty(2);
    t.processor.catch_up().unwrap();
    t.chain.reorg(0);

    assert!(t.processor.handle_reorg().unwrap().is_none());
    assert!(t.processor.last_block().unwrap().is_none());
}

#[test]
fn test_rollback_empty_block() {
    let mut t = busy_ledger();
    t.processor.rollback_empty_block().unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(4));

    t.processor
        .db()
        .conn()
        .execute(
            "UPDATE blocks SET ledger_hash = NULL WHERE block_index = 4",
            [],
        )
        .unwrap();
    t.processor.rollback_empty_block().unwrap();
    assert_eq!(t.processor.current_block_index().unwrap(), Some(3));
}

#[test]
fn test_new_block_outcomes() {
    let mut t = busy_ledger();
    let stored = InMemoryChain::raw_block(&t.chain.block(2).unwrap());
    assert_eq!(
        t.processor.parse_new_block(&stored).unwrap(),
        NewBlockOutcome::AlreadyStored
    );
    assert_eq!(
        t.processor
            .parse_new_block(&RawBlock(b"garbage".to_vec()))
            .unwrap(),
        NewBlockOutcome::Deferred
    );

    let next = t.chain.mine(vec![issuance_tx("i3", "carol", "PEPE", 5)]);
    let after_next = t.chain.mine(Vec::new());
    assert_eq!(
        t.processor
            .parse_new_block(&InMemoryChain::raw_block(&after_next))
            .unwrap(),
        NewBlockOutcome::Late
    );
    assert_matches!(
        t.processor.parse_new_block(&InMemoryChain::raw_block(&next)),
        Ok(NewBlockOutcome::Applied(record)) if record.block_index == 5
    );
    assert_eq!(t.balance("carol", "PEPE"), 5);
}

#[test]
fn test_new_block_replacing_tip() {
    let mut t = busy_ledger();
    t.chain.reorg(4);
    let replacement = t.chain.mine(Vec::new());

    assert_matches!(
        t.processor.parse_new_block(&InMemoryChain::raw_block(&replacement)),
        Ok(NewBlockOutcome::Applied(record)) if record.block_hash == replacement.block_hash
    );
    assert_eq!(t.processor.current_block_index().unwrap(), Some(4));
    // d1 was in the replaced block
    assert_eq!(t.balance("alice", "PEPE"), 600);
}
