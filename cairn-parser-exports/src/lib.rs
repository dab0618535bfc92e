// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Interfaces of the block processor: where blocks come from, how message
//! payloads are interpreted, how the processor is configured and stopped, and
//! the errors it reports.
#![warn(missing_docs)]

mod chain_source;
mod error;
mod interpreter;
mod settings;
mod state;
mod stop;

pub use chain_source::ChainSource;
pub use error::{ChainSourceError, InterpreterError, ParserError};
pub use interpreter::{Interpreter, InterpreterRegistry, ParseContext, ParseOutcome};
pub use settings::ParserConfig;
pub use state::{NewBlockOutcome, ProcessorState};
pub use stop::StopSignal;

#[cfg(any(test, feature = "test-exports"))]
pub use chain_source::MockChainSource;

#[cfg(test)]
mod tests;
