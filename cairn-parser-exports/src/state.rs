use cairn_models::BlockRecord;
use std::fmt;

/// What the block processor is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessorState {
    /// waiting for work
    #[default]
    Idle,
    /// applying the blocks the source has and the ledger has not
    CatchingUp,
    /// applying one block
    ApplyingBlock,
    /// deleting blocks
    Rollback,
    /// re-applying stored blocks
    Reparse,
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorState::Idle => "idle",
            ProcessorState::CatchingUp => "catching up",
            ProcessorState::ApplyingBlock => "applying block",
            ProcessorState::Rollback => "rollback",
            ProcessorState::Reparse => "reparse",
        };
        f.write_str(name)
    }
}

/// What became of a block announced by the notification channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewBlockOutcome {
    /// applied on top of the ledger
    Applied(BlockRecord),
    /// the ledger already holds it
    AlreadyStored,
    /// the ledger is behind, catch-up must run first
    Late,
    /// undecodable for now, catch-up will fetch it again
    Deferred,
    /// the processor was stopped before the block was complete
    Interrupted,
}
