use crate::queries;
use cairn_db_exports::{
    DatabaseError, DbConfig, CONNECTION_PRAGMAS, CREATE_BLOCKS, CREATE_CONFIG,
    CREATE_LEDGER_TABLES, CREATE_MESSAGES, CREATE_TRANSACTIONS, REBUILT_TABLES, WRITER_PRAGMAS,
};
use cairn_logging::cairn_trace;
use cairn_models::BlockRecord;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

/// The single writable handle of the ledger store
pub struct LedgerDb {
    conn: Connection,
    config: DbConfig,
}

impl std::fmt::Debug for LedgerDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerDb")
            .field("config", &self.config)
            .finish()
    }
}

impl LedgerDb {
    /// Opens (or creates) the ledger file and makes sure the schema exists
    pub fn open(config: DbConfig) -> Result<Self, DatabaseError> {
        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(config.pool.busy_timeout.to_duration())?;
        // auto_vacuum only applies if set before the first table is created
        conn.execute_batch(WRITER_PRAGMAS)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        let db = LedgerDb { conn, config };
        db.initialise_schema()?;
        debug!("ledger database opened at {}", db.path().display());
        Ok(db)
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Store configuration
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Read access to the writable connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed to open write transactions
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Creates the missing tables, views and indexes
    pub fn initialise_schema(&self) -> Result<(), DatabaseError> {
        for sql in [
            CREATE_BLOCKS,
            CREATE_TRANSACTIONS,
            CREATE_MESSAGES,
            CREATE_LEDGER_TABLES,
            CREATE_CONFIG,
        ] {
            self.conn.execute_batch(sql)?;
        }
        Ok(())
    }

    /// Drops every table and recreates an empty schema
    pub fn rebuild(&self) -> Result<(), DatabaseError> {
        info!("Rebuilding ledger database...");
        self.conn
            .execute_batch("DROP VIEW IF EXISTS transactions_with_status;")?;
        for table in REBUILT_TABLES {
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {};", table))?;
        }
        self.initialise_schema()?;
        cairn_trace!("db.rebuild", { "path": self.path().display().to_string() });
        Ok(())
    }

    /// Block with the highest index
    pub fn last_block(&self) -> Result<Option<BlockRecord>, DatabaseError> {
        queries::last_block(&self.conn)
    }

    /// Value of a `config` row
    pub fn get_config_value(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        queries::get_config_value(&self.conn, name)
    }

    /// Inserts or replaces a `config` row
    pub fn set_config_value(&self, name: &str, value: &str) -> Result<(), DatabaseError> {
        queries::set_config_value(&self.conn, name, value)
    }

    /// Fails with `DatabaseError::IntegrityCheck` unless SQLite reports `ok`
    pub fn integrity_check(&self) -> Result<(), DatabaseError> {
        info!("Checking database integrity...");
        queries::integrity_check(&self.conn)?;
        info!("Integrity check passed.");
        Ok(())
    }

    /// Fails with `DatabaseError::ForeignKeyCheck` on any dangling reference
    pub fn check_foreign_keys(&self) -> Result<(), DatabaseError> {
        info!("Checking database foreign keys...");
        queries::check_foreign_keys(&self.conn)?;
        info!("Foreign key check passed.");
        Ok(())
    }

    /// Rewrites the file to reclaim free pages
    pub fn vacuum(&self) -> Result<(), DatabaseError> {
        info!("Vacuuming database...");
        self.conn.execute_batch("VACUUM;")?;
        Ok(())
    }

    /// Refreshes the query planner statistics
    pub fn optimize(&self) -> Result<(), DatabaseError> {
        info!("Optimizing database...");
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}
