use cairn_time::CairnTime;
use serde::Deserialize;
use std::path::PathBuf;

/// Chain follower configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FollowerConfig {
    /// directory of the not-supported transactions cache file
    pub cache_dir: PathBuf,
    /// ignore unconfirmed transactions
    #[serde(default)]
    pub no_mempool: bool,
    /// raw mempool transactions parsed together at startup
    pub mempool_chunk_size: usize,
    /// minimum time between two software version checks
    pub version_check_interval: CairnTime,
    /// pause before subscribing again after a transport failure
    pub reconnect_delay: CairnTime,
    /// period of the mempool batch and version check timer
    pub tick_interval: CairnTime,
}

impl FollowerConfig {
    /// Defaults for a cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        FollowerConfig {
            cache_dir: cache_dir.into(),
            no_mempool: false,
            mempool_chunk_size: 1_000,
            version_check_interval: CairnTime::from_secs(3_600),
            reconnect_delay: CairnTime::from_secs(5),
            tick_interval: CairnTime::from_secs(1),
        }
    }
}
