use cairn_time::CairnTime;
use serde::Deserialize;
use std::path::PathBuf;

/// Config structure of the ledger store
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    /// Path of the SQLite ledger file
    pub path: PathBuf,
    /// Read-only connection pool
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Config structure of the `ConnectionPool`
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections open at the same time across all threads, 0 for no limit
    pub max_connections: usize,
    /// Idle connections kept per thread for reuse
    pub thread_pool_size: usize,
    /// How long `acquire` waits for a free slot before failing
    pub wait_timeout: CairnTime,
    /// SQLite busy timeout of each connection
    pub busy_timeout: CairnTime,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            thread_pool_size: DEFAULT_THREAD_POOL_SIZE,
            wait_timeout: CairnTime::from_secs(30),
            busy_timeout: CairnTime::from_secs(5),
        }
    }
}

/// Default cap on open connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 50;
/// Default number of idle connections kept per thread
pub const DEFAULT_THREAD_POOL_SIZE: usize = 10;
