use crate::error::InterpreterError;
use cairn_caches::CacheRegistry;
use cairn_models::config::MESSAGE_TYPE_ID_LENGTH;
use cairn_models::{LedgerEvent, Transaction};
use rusqlite::Connection;
use std::collections::BTreeMap;

/// What an interpreter sees of the ledger while parsing one transaction
pub struct ParseContext<'a> {
    /// block being applied, the mempool sentinel for provisional parsing
    pub block_index: u64,
    /// block timestamp in seconds
    pub block_time: u64,
    /// index given to the transaction
    pub tx_index: u64,
    /// the transaction
    pub tx: &'a Transaction,
    /// write transaction of the block, with the events of earlier transactions applied
    pub conn: &'a Connection,
    /// ledger caches, reflecting the earlier transactions too
    pub caches: &'a CacheRegistry,
    /// provisional parsing of an unconfirmed transaction
    pub mempool: bool,
}

/// Protocol logic of one message type
pub trait Interpreter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Events resulting from `payload`, the message data after the type id.
    ///
    /// Rejections are expressed as events with an `invalid: ...` status. An error
    /// stops the parser.
    fn parse(
        &self,
        ctx: &ParseContext<'_>,
        payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError>;
}

/// Result of parsing one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// interpreted, its events were applied
    Supported {
        /// emitted events
        events: usize,
        /// no event carried an invalid status
        valid: bool,
    },
    /// no ledger change: separator collision, missing source, malformed payload
    /// or unknown message type
    Unsupported,
}

impl ParseOutcome {
    /// Whether the transaction was interpreted
    pub fn is_supported(&self) -> bool {
        matches!(self, ParseOutcome::Supported { .. })
    }
}

/// Interpreters by message type id
#[derive(Default)]
pub struct InterpreterRegistry {
    interpreters: BTreeMap<u32, Box<dyn Interpreter>>,
}

impl std::fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.interpreters
                    .iter()
                    .map(|(id, interpreter)| (id, interpreter.name())),
            )
            .finish()
    }
}

impl InterpreterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `interpreter` for `message_type_id`, replacing any previous one
    pub fn register(&mut self, message_type_id: u32, interpreter: Box<dyn Interpreter>) {
        self.interpreters.insert(message_type_id, interpreter);
    }

    /// Builder form of [`InterpreterRegistry::register`]
    pub fn with(mut self, message_type_id: u32, interpreter: Box<dyn Interpreter>) -> Self {
        self.register(message_type_id, interpreter);
        self
    }

    /// Interpreter of `message_type_id`
    pub fn get(&self, message_type_id: u32) -> Option<&dyn Interpreter> {
        self.interpreters
            .get(&message_type_id)
            .map(|interpreter| interpreter.as_ref())
    }

    /// Splits message data into its big-endian type id and payload
    ///
    /// ```
    /// # use cairn_parser_exports::InterpreterRegistry;
    /// assert_eq!(
    ///     InterpreterRegistry::unpack(&[0, 0, 0, 20, 7]),
    ///     Some((20, &[7u8][..]))
    /// );
    /// assert_eq!(InterpreterRegistry::unpack(&[0, 1]), None);
    /// ```
    pub fn unpack(data: &[u8]) -> Option<(u32, &[u8])> {
        if data.len() < MESSAGE_TYPE_ID_LENGTH {
            return None;
        }
        let (id, payload) = data.split_at(MESSAGE_TYPE_ID_LENGTH);
        let id: [u8; 4] = id.try_into().ok()?;
        Some((u32::from_be_bytes(id), payload))
    }

    /// Number of registered message types
    pub fn len(&self) -> usize {
        self.interpreters.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.interpreters.is_empty()
    }
}
