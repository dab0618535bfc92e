use crate::error::ModelsError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// What an event does to its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCommand {
    /// appends a row to `category`
    Insert,
    /// appends a new version of the row keyed in the bindings
    Update,
    /// informational, no table change
    Parse,
}

impl EventCommand {
    /// Name stored in the `command` column
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventCommand::Insert => "insert",
            EventCommand::Update => "update",
            EventCommand::Parse => "parse",
        }
    }

    /// Whether the event changes a ledger table
    pub const fn mutates_state(&self) -> bool {
        !matches!(self, EventCommand::Parse)
    }
}

impl FromStr for EventCommand {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(EventCommand::Insert),
            "update" => Ok(EventCommand::Update),
            "parse" => Ok(EventCommand::Parse),
            other => Err(ModelsError::UnknownEventCommand(other.to_string())),
        }
    }
}

/// A state change emitted by an interpreter, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// event name, e.g. `ASSET_ISSUANCE`
    pub event: String,
    /// table operation
    pub command: EventCommand,
    /// table the event applies to
    pub category: String,
    /// column values
    pub bindings: Map<String, Value>,
}

impl LedgerEvent {
    /// Row insertion into `category`
    pub fn insert(category: &str, event: &str, bindings: Map<String, Value>) -> Self {
        LedgerEvent {
            event: event.to_string(),
            command: EventCommand::Insert,
            category: category.to_string(),
            bindings,
        }
    }

    /// Row update in `category`, the bindings carry the row key
    pub fn update(category: &str, event: &str, bindings: Map<String, Value>) -> Self {
        LedgerEvent {
            event: event.to_string(),
            command: EventCommand::Update,
            category: category.to_string(),
            bindings,
        }
    }

    /// Informational event
    pub fn parse(category: &str, event: &str, bindings: Map<String, Value>) -> Self {
        LedgerEvent {
            event: event.to_string(),
            command: EventCommand::Parse,
            category: category.to_string(),
            bindings,
        }
    }

    /// String binding
    pub fn binding_str(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).and_then(Value::as_str)
    }

    /// Integer binding
    pub fn binding_i64(&self, name: &str) -> Option<i64> {
        self.bindings.get(name).and_then(Value::as_i64)
    }

    /// Whether the bindings carry a status that is not `valid`
    pub fn is_invalid(&self) -> bool {
        self.binding_str("status")
            .map(|status| status.starts_with("invalid"))
            .unwrap_or(false)
    }

    /// Canonical form folded into the ledger hash
    pub fn ledger_chunk(&self) -> String {
        let mut value = Map::new();
        value.insert("bindings".into(), Value::Object(self.bindings.clone()));
        value.insert("category".into(), Value::String(self.category.clone()));
        value.insert("command".into(), Value::String(self.command.as_str().into()));
        canonical_json(&Value::Object(value))
    }

    /// Hash identifying the event once it is applied
    pub fn event_hash(&self, block_index: u64, tx_hash: Option<&str>) -> String {
        let mut value = Map::new();
        value.insert("block_index".into(), Value::from(block_index));
        value.insert("bindings".into(), Value::Object(self.bindings.clone()));
        value.insert("category".into(), Value::String(self.category.clone()));
        value.insert("command".into(), Value::String(self.command.as_str().into()));
        value.insert("event".into(), Value::String(self.event.clone()));
        value.insert(
            "tx_hash".into(),
            tx_hash.map(|h| Value::String(h.into())).unwrap_or(Value::Null),
        );
        cairn_hash::sha256_hex(&canonical_json(&Value::Object(value)))
    }
}

/// A `messages` row: an applied event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// global position in the event log
    pub message_index: u64,
    /// block the event was applied in
    pub block_index: u64,
    /// transaction that emitted the event
    pub tx_hash: Option<String>,
    /// the event
    #[serde(flatten)]
    pub event: LedgerEvent,
    /// see [`LedgerEvent::event_hash`]
    pub event_hash: String,
}

/// JSON with object keys sorted at every level, independent of how the map was built.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|key| format!("{}:{}", Value::String(key.clone()), canonical_json(&map[key])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_ledger_chunk_is_canonical() {
        let event = LedgerEvent::insert(
            "issuances",
            "ASSET_ISSUANCE",
            bindings(json!({"quantity": 10, "asset": "PEPE", "status": "valid"})),
        );
        assert_eq!(
            event.ledger_chunk(),
            r#"{"bindings":{"asset":"PEPE","quantity":10,"status":"valid"},"category":"issuances","command":"insert"}"#
        );
    }

    #[test]
    fn test_event_hash_depends_on_block() {
        let event = LedgerEvent::parse("transactions", "TRANSACTION_PARSED", Map::new());
        assert_ne!(event.event_hash(1, Some("aa")), event.event_hash(2, Some("aa")));
        assert_eq!(event.event_hash(1, None).len(), 64);
    }

    #[test]
    fn test_invalid_status() {
        let invalid = LedgerEvent::insert(
            "issuances",
            "ASSET_ISSUANCE",
            bindings(json!({"status": "invalid: bad quantity"})),
        );
        assert!(invalid.is_invalid());
        assert!(!LedgerEvent::insert("issuances", "ASSET_ISSUANCE", Map::new()).is_invalid());
        assert!(!EventCommand::Parse.mutates_state());
    }
}
