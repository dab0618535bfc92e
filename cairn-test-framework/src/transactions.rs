use crate::interpreters::{ATTACH_ID, DESTROY_ID, FAILING_ID, ISSUANCE_ID, ORDER_ID, UTXO_MOVE_ID};
use cairn_models::{RawTransaction, Transaction, TransactionType};
use serde_json::{json, Value};

/// Message data: big-endian type id followed by a JSON payload
pub fn message_data(message_type_id: u32, payload: &Value) -> Vec<u8> {
    let mut data = message_type_id.to_be_bytes().to_vec();
    data.extend(payload.to_string().into_bytes());
    data
}

/// JSON encoding understood by [`crate::InMemoryChain`]
pub fn raw_transaction(tx: &Transaction) -> RawTransaction {
    RawTransaction(serde_json::to_vec(tx).expect("transaction serialization"))
}

/// A transaction without UTXO movements
pub fn send_tx(tx_hash: &str, source: &str, data: Vec<u8>) -> Transaction {
    Transaction {
        tx_hash: tx_hash.to_string(),
        source: source.to_string(),
        destination: String::new(),
        btc_amount: 0,
        fee: 1_000,
        data,
        utxos_info: format!(" {}:1 2 0", tx_hash),
        transaction_type: TransactionType::Send,
    }
}

pub fn issuance_tx(tx_hash: &str, source: &str, asset: &str, quantity: i64) -> Transaction {
    send_tx(
        tx_hash,
        source,
        message_data(
            ISSUANCE_ID,
            &json!({"asset": asset, "quantity": quantity, "divisible": true, "description": ""}),
        ),
    )
}

pub fn destroy_tx(tx_hash: &str, source: &str, asset: &str, quantity: i64) -> Transaction {
    send_tx(
        tx_hash,
        source,
        message_data(
            DESTROY_ID,
            &json!({"asset": asset, "quantity": quantity, "tag": ""}),
        ),
    )
}

pub fn order_tx(
    tx_hash: &str,
    source: &str,
    give: (&str, i64),
    get: (&str, i64),
) -> Transaction {
    send_tx(
        tx_hash,
        source,
        message_data(
            ORDER_ID,
            &json!({
                "give_asset": give.0,
                "give_quantity": give.1,
                "get_asset": get.0,
                "get_quantity": get.1,
                "expiration": 100,
            }),
        ),
    )
}

/// Attaches `quantity` of `asset` to the output `<tx_hash>:0`
pub fn attach_tx(tx_hash: &str, source: &str, asset: &str, quantity: i64) -> Transaction {
    let mut tx = send_tx(
        tx_hash,
        source,
        message_data(ATTACH_ID, &json!({"asset": asset, "quantity": quantity})),
    );
    tx.utxos_info = format!("funding:{} {}:0 2 1", tx_hash, tx_hash);
    tx.transaction_type = TransactionType::Attach;
    tx
}

/// Moves every asset of `source_utxo` to `<tx_hash>:0`
pub fn utxo_move_tx(tx_hash: &str, source: &str, source_utxo: &str) -> Transaction {
    let mut tx = send_tx(tx_hash, source, message_data(UTXO_MOVE_ID, &json!({})));
    tx.utxos_info = format!("{} {}:0 1", source_utxo, tx_hash);
    tx.transaction_type = TransactionType::Utxomove;
    tx
}

/// A transaction whose interpreter always fails
pub fn failing_tx(tx_hash: &str, source: &str) -> Transaction {
    send_tx(tx_hash, source, message_data(FAILING_ID, &json!({})))
}
