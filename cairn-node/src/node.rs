use crate::error::NodeError;
use crate::settings::Settings;
use cairn_caches::CacheRegistry;
use cairn_consensus::VersionSource;
use cairn_db_worker::{ConnectionPool, LedgerDb};
use cairn_follow::{start_chain_follower, ChainFollowerManager, FollowerStatus, NotificationSubscriber};
use cairn_models::Version;
use cairn_parser_exports::{ChainSource, InterpreterRegistry, StopSignal};
use cairn_parser_worker::BlockProcessor;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Version stamped in new ledgers and checked against the published protocol changes
pub fn software_version() -> Result<Version, NodeError> {
    Ok(Version::from_str(env!("CARGO_PKG_VERSION"))?)
}

/// What the node talks to
pub struct NodeCollaborators {
    /// the followed chain node
    pub source: Arc<dyn ChainSource>,
    /// interpreters by message type id
    pub interpreters: InterpreterRegistry,
    /// notifications of the chain node
    pub subscriber: Box<dyn NotificationSubscriber>,
    /// published protocol changes, `None` to never check
    pub version_source: Option<Box<dyn VersionSource>>,
}

/// A running ledger: the follower thread writing, and a pool for readers
pub struct CairnNode {
    manager: ChainFollowerManager,
    status: FollowerStatus,
    pool: Arc<ConnectionPool>,
}

impl CairnNode {
    /// Opens the ledger, checks it and starts the follower
    pub fn start(
        settings: &Settings,
        software_version: Version,
        collaborators: NodeCollaborators,
    ) -> Result<Self, NodeError> {
        info!(
            "Starting cairn node {} on {}...",
            software_version, settings.network
        );
        let db = LedgerDb::open(settings.database.clone())?;
        if settings.parser.check_integrity {
            db.integrity_check()?;
            db.check_foreign_keys()?;
        }
        let pool = Arc::new(ConnectionPool::new(
            &settings.database.path,
            settings.database.pool.clone(),
        ));
        let parser_config = settings.parser_config(software_version)?;
        let caches = Arc::new(CacheRegistry::new(pool.clone(), parser_config.caches.clone()));
        let processor = BlockProcessor::new(
            db,
            caches,
            collaborators.source,
            Arc::new(collaborators.interpreters),
            parser_config,
            StopSignal::new(),
        );
        processor.check_database_version()?;
        if let Some(version_source) = &collaborators.version_source {
            processor.check_software_version(version_source.as_ref())?;
        }
        let (manager, status) = start_chain_follower(
            processor,
            collaborators.subscriber,
            collaborators.version_source,
            settings.follower.clone(),
        )?;
        info!("Cairn node started.");
        Ok(CairnNode {
            manager,
            status,
            pool,
        })
    }

    /// Follower status
    pub fn status(&self) -> &FollowerStatus {
        &self.status
    }

    /// Read-only connections to the ledger
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Whether the follower returned on its own, after an error
    pub fn is_finished(&self) -> bool {
        self.manager.is_finished()
    }

    /// Stops the follower and closes the pool
    pub fn stop(mut self) -> Result<(), NodeError> {
        info!("Stopping cairn node...");
        let result = self.manager.stop();
        self.pool.close();
        info!("Cairn node stopped.");
        Ok(result?)
    }
}
