use cairn_db_exports::{DbConfig, PoolConfig};
use cairn_db_worker::{ConnectionPool, LedgerDb};
use cairn_time::CairnTime;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Ledger file in a temporary directory, deleted on drop
pub struct TestLedger {
    dir: TempDir,
    config: DbConfig,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("cannot create temp dir");
        let config = DbConfig {
            path: dir.path().join("ledger.db"),
            pool: PoolConfig {
                max_connections: 8,
                thread_pool_size: 2,
                wait_timeout: CairnTime::from_millis(5_000),
                busy_timeout: CairnTime::from_millis(1_000),
            },
        };
        TestLedger { dir, config }
    }

    pub fn config(&self) -> DbConfig {
        self.config.clone()
    }

    /// Directory usable for side files (caches, settings)
    pub fn dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Opens the writable handle, creating the schema
    pub fn open(&self) -> LedgerDb {
        LedgerDb::open(self.config()).expect("cannot open ledger")
    }

    /// Read-only pool over the ledger. The file must exist, see [`TestLedger::open`].
    pub fn pool(&self) -> Arc<ConnectionPool> {
        Arc::new(ConnectionPool::new(
            &self.config.path,
            self.config.pool.clone(),
        ))
    }
}
