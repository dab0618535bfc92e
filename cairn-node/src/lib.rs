//! # Cairn node
//!
//! Loads the layered settings, installs logging, and wires the ledger store,
//! the caches, the block processor and the chain follower together.
//! The chain source, its notifications and the interpreters are provided by
//! the embedding binary.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
mod logging;
mod node;
pub mod settings;

pub use error::{NodeError, SettingsError};
pub use logging::init_logging;
pub use node::{software_version, CairnNode, NodeCollaborators};
pub use settings::{build_settings, load_settings, LoggingSettings, ParserSettings, Settings};

#[cfg(test)]
mod tests;
