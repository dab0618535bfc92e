use super::tools::test_processor;
use cairn_models::RawTransaction;
use cairn_test_framework::{
    destroy_tx, failing_tx, issuance_tx, message_data, raw_transaction, send_tx,
};
use serde_json::json;

#[test]
fn test_mempool_events_leave_ledger_untouched() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.chain
        .mine(vec![issuance_tx("i1", "alice", "PEPE", 1_000)]);
    t.processor.catch_up().unwrap();
    let messages = t.count("messages");

    let not_supported = t
        .processor
        .parse_mempool_transactions(&[
            raw_transaction(&destroy_tx("m1", "alice", "PEPE", 100)),
            raw_transaction(&send_tx("m2", "bob", message_data(4_242, &json!({})))),
            raw_transaction(&failing_tx("m3", "carol")),
            RawTransaction(b"not a transaction".to_vec()),
        ])
        .unwrap();

    assert_eq!(not_supported, vec!["m2".to_string()]);
    let hashes = t.processor.mempool_tx_hashes().unwrap();
    assert_eq!(hashes.len(), 1);
    assert!(hashes.contains("m1"));
    assert_eq!(t.count("mempool"), 2);
    assert_eq!(t.count("messages"), messages);
    assert!(t.transaction_status("m1").is_none());
    assert_eq!(t.balance("alice", "PEPE"), 1_000);
    assert_eq!(
        t.processor.caches().assets().unwrap().lock().total_destroyed("PEPE"),
        0
    );
}

#[test]
fn test_mempool_reparse_replaces_events() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.processor.catch_up().unwrap();
    let raw = raw_transaction(&issuance_tx("m1", "alice", "PEPE", 10));
    t.processor
        .parse_mempool_transactions(&[raw.clone()])
        .unwrap();
    t.processor.parse_mempool_transactions(&[raw]).unwrap();
    assert_eq!(t.count("mempool"), 2);

    t.processor.clean_transaction_from_mempool("m1").unwrap();
    assert_eq!(t.count("mempool"), 0);
}

#[test]
fn test_confirmed_transactions_leave_mempool() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.processor.catch_up().unwrap();
    let issuance = issuance_tx("m1", "alice", "PEPE", 10);
    t.chain.add_to_mempool(issuance.clone());
    t.processor
        .parse_mempool_transactions(&[raw_transaction(&issuance)])
        .unwrap();
    assert_eq!(t.count("mempool"), 2);

    t.chain.mine(vec![issuance.clone()]);
    t.processor.catch_up().unwrap();
    assert_eq!(t.count("mempool"), 0);
    assert_eq!(t.balance("alice", "PEPE"), 10);

    // already confirmed, not parsed again
    t.processor
        .parse_mempool_transactions(&[raw_transaction(&issuance)])
        .unwrap();
    assert_eq!(t.count("mempool"), 0);
}

#[test]
fn test_mempool_parse_keeps_ledger_row_counts() {
    let mut t = test_processor();
    t.chain.mine_empty(2);
    t.processor.catch_up().unwrap();
    let tables = [
        "blocks",
        "transactions",
        "messages",
        "issuances",
        "balances",
    ];
    let before: Vec<i64> = tables.iter().map(|table| t.count(table)).collect();
    let tip = t.processor.last_block().unwrap().unwrap();

    let not_supported = t
        .processor
        .parse_mempool_transactions(&[raw_transaction(&issuance_tx(
            "m1", "alice", "PEPE", 50,
        ))])
        .unwrap();

    assert!(not_supported.is_empty());
    assert_eq!(t.count("mempool"), 2);
    let after: Vec<i64> = tables.iter().map(|table| t.count(table)).collect();
    assert_eq!(after, before);
    assert_eq!(t.processor.last_block().unwrap().unwrap(), tip);
    assert!(t.transaction_status("m1").is_none());
}

#[test]
fn test_mempool_parse_after_committed_block() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.processor.catch_up().unwrap();
    t.processor
        .parse_mempool_transactions(&[raw_transaction(&issuance_tx(
            "m1", "alice", "PEPE", 10,
        ))])
        .unwrap();

    t.chain
        .mine(vec![issuance_tx("i1", "bob", "WOJAK", 5)]);
    t.processor.catch_up().unwrap();
    assert_eq!(t.balance("bob", "WOJAK"), 5);

    let not_supported = t
        .processor
        .parse_mempool_transactions(&[raw_transaction(&destroy_tx("m2", "bob", "WOJAK", 1))])
        .unwrap();
    assert!(not_supported.is_empty());
    let hashes = t.processor.mempool_tx_hashes().unwrap();
    assert!(hashes.contains("m1"));
    assert!(hashes.contains("m2"));
    assert_eq!(t.balance("bob", "WOJAK"), 5);
}
