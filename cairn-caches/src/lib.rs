// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! In-memory projections of the ledger used while applying blocks.
//!
//! * [`AssetCache`]: latest valid issuance per asset name and longname, with issued
//!   and destroyed totals
//! * [`OrdersCache`]: non-expired orders mirrored in a private in-memory SQLite table,
//!   queried for matching counter-orders
//! * [`UtxoBalancesCache`]: whether an UTXO currently holds assets
//!
//! All three are owned by a [`CacheRegistry`], built lazily and dropped as a whole
//! after a rollback or a reparse, since they only describe the state at the tip.

mod asset_cache;
mod config;
mod error;
mod orders_cache;
mod registry;
mod utxo_cache;

pub use asset_cache::AssetCache;
pub use config::CacheConfig;
pub use error::CacheError;
pub use orders_cache::OrdersCache;
pub use registry::CacheRegistry;
pub use utxo_cache::{UtxoBalancesCache, UtxoPresence};

#[cfg(test)]
mod tests;
