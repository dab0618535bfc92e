use cairn_models::config::VALID_STATUS;
use cairn_models::{LedgerEvent, OrderStatus};
use cairn_parser_exports::{Interpreter, InterpreterError, InterpreterRegistry, ParseContext};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{json, Map, Value};

pub const ORDER_ID: u32 = 10;
pub const ISSUANCE_ID: u32 = 20;
pub const ATTACH_ID: u32 = 101;
pub const UTXO_MOVE_ID: u32 = 102;
pub const DESTROY_ID: u32 = 110;
pub const FAILING_ID: u32 = 255;

/// Registry with every sample interpreter
pub fn test_interpreters() -> InterpreterRegistry {
    InterpreterRegistry::new()
        .with(ORDER_ID, Box::new(OrderInterpreter))
        .with(ISSUANCE_ID, Box::new(IssuanceInterpreter))
        .with(ATTACH_ID, Box::new(AttachInterpreter))
        .with(UTXO_MOVE_ID, Box::new(UtxoMoveInterpreter))
        .with(DESTROY_ID, Box::new(DestroyInterpreter))
        .with(FAILING_ID, Box::new(FailingInterpreter))
}

fn bindings(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn decode_payload(payload: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(payload).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn malformed(ctx: &ParseContext<'_>, event: &str) -> Vec<LedgerEvent> {
    vec![LedgerEvent::parse(
        "transactions",
        event,
        bindings(json!({
            "tx_hash": ctx.tx.tx_hash,
            "status": "invalid: malformed payload",
        })),
    )]
}

fn address_balance(conn: &Connection, address: &str, asset: &str) -> rusqlite::Result<i64> {
    Ok(conn
        .query_row(
            "SELECT quantity FROM balances WHERE address = ? AND asset = ? ORDER BY rowid DESC LIMIT 1",
            params![address, asset],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0))
}

fn utxo_balances(conn: &Connection, utxo: &str) -> rusqlite::Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT asset, quantity, MAX(rowid) FROM balances WHERE utxo = ? GROUP BY asset ORDER BY asset",
    )?;
    let balances = stmt
        .query_map(params![utxo], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<(String, i64)>, _>>()?;
    Ok(balances
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0)
        .collect())
}

fn address_balance_event(ctx: &ParseContext<'_>, address: &str, asset: &str, quantity: i64) -> LedgerEvent {
    LedgerEvent::insert(
        "balances",
        "BALANCE_CHANGE",
        bindings(json!({
            "address": address,
            "asset": asset,
            "quantity": quantity,
            "block_index": ctx.block_index,
            "tx_index": ctx.tx_index,
        })),
    )
}

fn utxo_balance_event(ctx: &ParseContext<'_>, utxo: &str, asset: &str, quantity: i64) -> LedgerEvent {
    LedgerEvent::insert(
        "balances",
        "UTXO_BALANCE_CHANGE",
        bindings(json!({
            "utxo": utxo,
            "asset": asset,
            "quantity": quantity,
            "block_index": ctx.block_index,
            "tx_index": ctx.tx_index,
        })),
    )
}

/// `{"asset", "quantity", "divisible", "description", "longname"?}`: creates or
/// increases the supply of an asset, credited to the source
pub struct IssuanceInterpreter;

impl Interpreter for IssuanceInterpreter {
    fn name(&self) -> &'static str {
        "issuance"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        let Some(payload) = decode_payload(payload) else {
            return Ok(malformed(ctx, "ASSET_ISSUANCE"));
        };
        let asset = payload.get("asset").and_then(Value::as_str).unwrap_or("");
        let quantity = payload.get("quantity").and_then(Value::as_i64).unwrap_or(0);
        let status = if asset.is_empty() || quantity <= 0 {
            "invalid: bad quantity".to_string()
        } else {
            VALID_STATUS.to_string()
        };
        let mut events = vec![LedgerEvent::insert(
            "issuances",
            "ASSET_ISSUANCE",
            bindings(json!({
                "tx_index": ctx.tx_index,
                "tx_hash": ctx.tx.tx_hash,
                "block_index": ctx.block_index,
                "asset": asset,
                "asset_longname": payload.get("longname").cloned().unwrap_or(Value::Null),
                "quantity": quantity,
                "divisible": payload.get("divisible").and_then(Value::as_bool).unwrap_or(true),
                "source": ctx.tx.source,
                "issuer": ctx.tx.source,
                "description": payload.get("description").and_then(Value::as_str).unwrap_or(""),
                "status": status,
            })),
        )];
        if status == VALID_STATUS {
            let balance = address_balance(ctx.conn, &ctx.tx.source, asset)?;
            events.push(address_balance_event(ctx, &ctx.tx.source, asset, balance + quantity));
        }
        Ok(events)
    }
}

/// `{"asset", "quantity", "tag"}`: burns part of the source balance
pub struct DestroyInterpreter;

impl Interpreter for DestroyInterpreter {
    fn name(&self) -> &'static str {
        "destroy"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        let Some(payload) = decode_payload(payload) else {
            return Ok(malformed(ctx, "ASSET_DESTRUCTION"));
        };
        let asset = payload.get("asset").and_then(Value::as_str).unwrap_or("");
        let quantity = payload.get("quantity").and_then(Value::as_i64).unwrap_or(0);
        let balance = address_balance(ctx.conn, &ctx.tx.source, asset)?;
        let status = if quantity <= 0 || balance < quantity {
            "invalid: insufficient balance".to_string()
        } else {
            VALID_STATUS.to_string()
        };
        let mut events = vec![LedgerEvent::insert(
            "destructions",
            "ASSET_DESTRUCTION",
            bindings(json!({
                "tx_index": ctx.tx_index,
                "tx_hash": ctx.tx.tx_hash,
                "block_index": ctx.block_index,
                "source": ctx.tx.source,
                "asset": asset,
                "quantity": quantity,
                "tag": payload.get("tag").and_then(Value::as_str).unwrap_or(""),
                "status": status,
            })),
        )];
        if status == VALID_STATUS {
            events.push(address_balance_event(ctx, &ctx.tx.source, asset, balance - quantity));
        }
        Ok(events)
    }
}

/// `{"give_asset", "give_quantity", "get_asset", "get_quantity", "expiration"}`:
/// opens an order, filled at once against an open counter-order with the exact
/// opposite quantities
pub struct OrderInterpreter;

impl Interpreter for OrderInterpreter {
    fn name(&self) -> &'static str {
        "order"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        let Some(payload) = decode_payload(payload) else {
            return Ok(malformed(ctx, "OPEN_ORDER"));
        };
        let give_asset = payload.get("give_asset").and_then(Value::as_str).unwrap_or("");
        let get_asset = payload.get("get_asset").and_then(Value::as_str).unwrap_or("");
        let give_quantity = payload.get("give_quantity").and_then(Value::as_i64).unwrap_or(0);
        let get_quantity = payload.get("get_quantity").and_then(Value::as_i64).unwrap_or(0);
        let expiration = payload.get("expiration").and_then(Value::as_u64).unwrap_or(0);
        let mut events = vec![LedgerEvent::insert(
            "orders",
            "OPEN_ORDER",
            bindings(json!({
                "tx_index": ctx.tx_index,
                "tx_hash": ctx.tx.tx_hash,
                "block_index": ctx.block_index,
                "source": ctx.tx.source,
                "give_asset": give_asset,
                "give_quantity": give_quantity,
                "give_remaining": give_quantity,
                "get_asset": get_asset,
                "get_quantity": get_quantity,
                "get_remaining": get_quantity,
                "expiration": expiration,
                "expire_index": ctx.block_index + expiration,
                "fee_required": 0,
                "fee_required_remaining": 0,
                "fee_provided": 0,
                "fee_provided_remaining": 0,
                "status": OrderStatus::Open.as_str(),
            })),
        )];
        let counter = ctx
            .caches
            .orders()?
            .lock()
            .get_matching_orders(&ctx.tx.tx_hash, give_asset, get_asset)?
            .into_iter()
            .find(|order| {
                order.give_remaining == get_quantity && order.get_remaining == give_quantity
            });
        if let Some(counter) = counter {
            for tx_hash in [counter.tx_hash.as_str(), ctx.tx.tx_hash.as_str()] {
                events.push(LedgerEvent::update(
                    "orders",
                    "ORDER_FILLED",
                    bindings(json!({
                        "tx_hash": tx_hash,
                        "give_remaining": 0,
                        "get_remaining": 0,
                        "status": OrderStatus::Filled.as_str(),
                    })),
                ));
            }
        }
        Ok(events)
    }
}

/// `{"asset", "quantity"}`: moves part of the source balance to the transaction
/// destination UTXO
pub struct AttachInterpreter;

impl Interpreter for AttachInterpreter {
    fn name(&self) -> &'static str {
        "attach"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        let Some(payload) = decode_payload(payload) else {
            return Ok(malformed(ctx, "ATTACH_TO_UTXO"));
        };
        let asset = payload.get("asset").and_then(Value::as_str).unwrap_or("");
        let quantity = payload.get("quantity").and_then(Value::as_i64).unwrap_or(0);
        let destination = ctx.tx.utxos().destination.unwrap_or_default();
        let balance = address_balance(ctx.conn, &ctx.tx.source, asset)?;
        let status = if destination.is_empty() || quantity <= 0 || balance < quantity {
            "invalid: insufficient balance".to_string()
        } else {
            VALID_STATUS.to_string()
        };
        let mut events = vec![LedgerEvent::parse(
            "transactions",
            "ATTACH_TO_UTXO",
            bindings(json!({
                "tx_hash": ctx.tx.tx_hash,
                "asset": asset,
                "quantity": quantity,
                "destination": destination,
                "status": status,
            })),
        )];
        if status == VALID_STATUS {
            let attached = utxo_balances(ctx.conn, &destination)?
                .into_iter()
                .find(|(held, _)| held == asset)
                .map(|(_, quantity)| quantity)
                .unwrap_or(0);
            events.push(address_balance_event(ctx, &ctx.tx.source, asset, balance - quantity));
            events.push(utxo_balance_event(ctx, &destination, asset, attached + quantity));
        }
        Ok(events)
    }
}

/// Moves every asset held by the spent UTXOs to the destination UTXO
pub struct UtxoMoveInterpreter;

impl Interpreter for UtxoMoveInterpreter {
    fn name(&self) -> &'static str {
        "utxo move"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        _payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        let info = ctx.tx.utxos();
        let Some(destination) = info.destination else {
            return Ok(malformed(ctx, "UTXO_MOVE"));
        };
        let mut events = Vec::new();
        let mut moved: Vec<(String, i64)> = utxo_balances(ctx.conn, &destination)?;
        for source in &info.sources {
            for (asset, quantity) in utxo_balances(ctx.conn, source)? {
                events.push(utxo_balance_event(ctx, source, &asset, 0));
                match moved.iter_mut().find(|(held, _)| *held == asset) {
                    Some((_, total)) => *total += quantity,
                    None => moved.push((asset, quantity)),
                }
            }
        }
        let status = if events.is_empty() {
            "invalid: nothing to move"
        } else {
            VALID_STATUS
        };
        if status == VALID_STATUS {
            for (asset, quantity) in &moved {
                events.push(utxo_balance_event(ctx, &destination, asset, *quantity));
            }
        }
        events.push(LedgerEvent::parse(
            "transactions",
            "UTXO_MOVE",
            bindings(json!({
                "tx_hash": ctx.tx.tx_hash,
                "sources": info.sources,
                "destination": destination,
                "status": status,
            })),
        ));
        Ok(events)
    }
}

/// Always fails
pub struct FailingInterpreter;

impl Interpreter for FailingInterpreter {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        _payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        Err(InterpreterError::Invalid(format!(
            "cannot interpret {}",
            ctx.tx.tx_hash
        )))
    }
}
