use serde::Deserialize;
use std::collections::BTreeMap;

/// Cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Transactions whose source is forced at decoding time (tx_hash to source).
    /// Their destinations hold assets that never appear in `balances`.
    #[serde(default)]
    pub known_sources: BTreeMap<String, String>,
}
