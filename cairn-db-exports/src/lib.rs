//! Shared definitions of the ledger store: configuration, schema, the
//! whitelist of ledger tables events may touch, errors and pool statistics.
#![warn(unused_crate_dependencies)]

mod constants;
mod error;
mod settings;
mod stats;
mod tables;

pub use constants::*;
pub use error::*;
pub use settings::*;
pub use stats::*;
pub use tables::*;
