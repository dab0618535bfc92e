use super::tools::test_processor;
use crate::apply::{parse_tx, ApplyEnv, BlockChunks, TxPosition};
use cairn_caches::UtxoPresence;
use cairn_models::{EventCommand, LedgerEvent};
use cairn_parser_exports::ParseOutcome;
use cairn_test_framework::{attach_tx, issuance_tx, message_data, send_tx};
use serde_json::json;

#[test]
fn test_events_are_visible_to_later_transactions() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    // the attach reads the balance credited earlier in the same block
    t.chain.mine(vec![
        issuance_tx("i1", "alice", "PEPE", 1_000),
        attach_tx("a1", "alice", "PEPE", 600),
        attach_tx("a2", "alice", "PEPE", 600),
    ]);
    t.processor.catch_up().unwrap();
    assert_eq!(t.transaction_status("a1"), Some((true, Some(true))));
    assert_eq!(t.transaction_status("a2"), Some((true, Some(false))));
    assert_eq!(t.balance("alice", "PEPE"), 400);
    assert_eq!(t.utxo_balance("a1:0", "PEPE"), 600);
}

#[test]
fn test_invalid_attach_marks_destination() {
    let mut t = test_processor();
    t.chain.mine_empty(1);
    t.chain.mine(vec![attach_tx("a1", "alice", "PEPE", 10)]);
    t.processor.catch_up().unwrap();

    assert_eq!(t.transaction_status("a1"), Some((true, Some(false))));
    assert_eq!(t.utxo_balance("a1:0", "PEPE"), 0);
    let utxos = t.processor.caches().utxos().unwrap();
    assert_eq!(utxos.lock().presence("a1:0"), UtxoPresence::Present);

    // and so does a cache rebuilt from the store
    t.processor.caches().reset();
    let utxos = t.processor.caches().utxos().unwrap();
    assert_eq!(utxos.lock().presence("a1:0"), UtxoPresence::Present);
}

#[test]
fn test_parse_tx_outcomes() {
    let t = test_processor();
    let mut message_index = 0;
    let env = ApplyEnv {
        interpreters: &t.processor.interpreters,
        caches: &t.processor.caches,
    };
    let conn = t.processor.db().conn();
    let position = TxPosition {
        block_index: 1,
        block_time: 1_700_000_600,
        tx_index: 0,
        mempool: true,
    };

    let unknown = send_tx("u1", "alice", message_data(4_242, &json!({})));
    let (outcome, events) = parse_tx(&env, conn, &position, &unknown, &mut message_index).unwrap();
    assert_eq!(outcome, ParseOutcome::Unsupported);
    assert!(events.is_empty());

    let truncated = send_tx("u2", "alice", vec![0, 0]);
    let (outcome, _) = parse_tx(&env, conn, &position, &truncated, &mut message_index).unwrap();
    assert!(!outcome.is_supported());
    assert_eq!(message_index, 0);

    let issuance = issuance_tx("i1", "alice", "PEPE", 5);
    let (outcome, events) =
        parse_tx(&env, conn, &position, &issuance, &mut message_index).unwrap();
    assert_eq!(
        outcome,
        ParseOutcome::Supported {
            events: 2,
            valid: true
        }
    );
    assert_eq!(message_index, 2);
    assert_eq!(events[0].event.event, "ASSET_ISSUANCE");
    assert_eq!(events[0].event.binding_i64("block_index"), Some(1));
}

#[test]
fn test_block_chunks() {
    let mut chunks = BlockChunks::default();
    chunks.add_transaction(&issuance_tx("i1", "alice", "PEPE", 5));
    let insert = LedgerEvent::insert(
        "balances",
        "BALANCE_CHANGE",
        json!({"address": "alice", "asset": "PEPE", "quantity": 5})
            .as_object()
            .cloned()
            .unwrap_or_default(),
    );
    let parse = LedgerEvent::parse(
        "transactions",
        "UTXO_MOVE",
        json!({"status": "valid"}).as_object().cloned().unwrap_or_default(),
    );
    assert_eq!(parse.command, EventCommand::Parse);
    let applied = [insert, parse]
        .into_iter()
        .map(|event| crate::apply::AppliedEvent {
            event_hash: event.event_hash(1, Some("i1")),
            event,
        })
        .collect::<Vec<_>>();
    chunks.add_events(&applied);

    assert_eq!(chunks.txlist.len(), 1);
    // parse events are hashed in the messages chain only
    assert_eq!(chunks.ledger.len(), 1);
    assert_eq!(chunks.messages.len(), 2);
}
