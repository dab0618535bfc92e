use cairn_db_exports::{DatabaseError, PoolConfig, PoolStats, CONNECTION_PRAGMAS};
use parking_lot::{Condvar, Mutex};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct PoolCounter {
    current: usize,
    peak: usize,
}

/// Bounded pool of read-only connections with per-thread arenas
pub struct ConnectionPool {
    path: PathBuf,
    config: PoolConfig,
    arenas: Mutex<HashMap<ThreadId, Vec<Connection>>>,
    counter: Mutex<PoolCounter>,
    slot_freed: Condvar,
    closed: AtomicBool,
    contention_logged: AtomicBool,
}

enum Lease {
    Pooled,
    Ephemeral,
}

/// A connection borrowed from the pool, given back when dropped.
///
/// Bound to the thread that acquired it.
pub struct PooledConnection<'p> {
    conn: Option<Connection>,
    pool: &'p ConnectionPool,
    lease: Lease,
    _not_send: PhantomData<*const ()>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // only taken in drop
        self.conn.as_ref().expect("pooled connection used after release")
    }
}

impl std::fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("path", &self.pool.path)
            .field(
                "lease",
                &match self.lease {
                    Lease::Pooled => "pooled",
                    Lease::Ephemeral => "ephemeral",
                },
            )
            .finish()
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match self.lease {
            Lease::Ephemeral => drop(conn),
            Lease::Pooled => self.pool.release(conn),
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionPool {
    /// Creates a pool over the ledger file at `path`. No connection is opened yet.
    pub fn new(path: impl AsRef<Path>, config: PoolConfig) -> Self {
        ConnectionPool {
            path: path.as_ref().to_path_buf(),
            config,
            arenas: Mutex::new(HashMap::new()),
            counter: Mutex::new(PoolCounter::default()),
            slot_freed: Condvar::new(),
            closed: AtomicBool::new(false),
            contention_logged: AtomicBool::new(false),
        }
    }

    /// Borrows a read-only connection for the current thread.
    ///
    /// Blocks while `max_connections` are open, up to `wait_timeout`.
    pub fn acquire(&self) -> Result<PooledConnection<'_>, DatabaseError> {
        if self.is_closed() {
            self.drain_current_thread();
            return Ok(PooledConnection {
                conn: Some(self.open_connection()?),
                pool: self,
                lease: Lease::Ephemeral,
                _not_send: PhantomData,
            });
        }

        let thread_id = thread::current().id();
        let reused = self
            .arenas
            .lock()
            .get_mut(&thread_id)
            .and_then(|arena| arena.pop());

        let conn = match reused {
            Some(conn) => self.validate_or_replace(conn)?,
            None => self.create_connection_with_limit()?,
        };
        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            lease: Lease::Pooled,
            _not_send: PhantomData,
        })
    }

    /// Marks the pool closed, wakes every waiter and closes the calling thread's idle connections.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.slot_freed.notify_all();
        let count = self.drain_current_thread();
        debug!("connection pool closed, {} idle connections released", count);
    }

    fn drain_current_thread(&self) -> usize {
        let drained = self
            .arenas
            .lock()
            .remove(&thread::current().id())
            .unwrap_or_default();
        let count = drained.len();
        drop(drained);
        self.release_slots(count);
        count
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Current, max, peak and utilization of the pool
    pub fn stats(&self) -> PoolStats {
        let counter = self.counter.lock();
        PoolStats::new(counter.current, self.config.max_connections, counter.peak)
    }

    /// Connections currently open, idle or in use
    pub fn connection_count(&self) -> usize {
        self.counter.lock().current
    }

    fn open_connection(&self) -> Result<Connection, DatabaseError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(self.config.busy_timeout.to_duration())?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn)
    }

    fn validate_or_replace(&self, conn: Connection) -> Result<Connection, DatabaseError> {
        match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => Ok(conn),
            Err(err) if is_replaceable(&err) => {
                debug!("replacing invalid pooled connection: {}", err);
                drop(conn);
                // the slot of the dropped connection goes to its replacement
                self.open_connection().map_err(|err| {
                    self.release_slots(1);
                    err
                })
            }
            Err(err) => {
                drop(conn);
                self.release_slots(1);
                Err(err.into())
            }
        }
    }

    fn create_connection_with_limit(&self) -> Result<Connection, DatabaseError> {
        let max = self.config.max_connections;
        let mut counter = self.counter.lock();
        if max > 0 && counter.current >= max && self.evict_idle_connection() {
            counter.current -= 1;
        }
        if max > 0 && counter.current >= max {
            if !self.contention_logged.swap(true, Ordering::SeqCst) {
                warn!(
                    "database connection pool CONTENTION: {}/{} connections in use, waiting for a free one",
                    counter.current, max
                );
            }
            let start = Instant::now();
            let deadline = start + self.config.wait_timeout.to_duration();
            while counter.current >= max {
                if self.is_closed() {
                    return Err(DatabaseError::PoolClosed);
                }
                if self.evict_idle_connection() {
                    counter.current -= 1;
                    continue;
                }
                let now = Instant::now();
                if now >= deadline {
                    return Err(DatabaseError::PoolTimeout {
                        waited_ms: start.elapsed().as_millis() as u64,
                        current: counter.current,
                        max,
                    });
                }
                self.slot_freed.wait_for(&mut counter, deadline - now);
            }
            if self.is_closed() {
                return Err(DatabaseError::PoolClosed);
            }
            warn!(
                "waited {}ms for a database connection",
                start.elapsed().as_millis()
            );
        }
        counter.current += 1;
        counter.peak = counter.peak.max(counter.current);
        drop(counter);

        self.open_connection().map_err(|err| {
            self.release_slots(1);
            err
        })
    }

    fn release(&self, conn: Connection) {
        if !self.is_closed() {
            let mut arenas = self.arenas.lock();
            let arena = arenas.entry(thread::current().id()).or_default();
            if arena.len() < self.config.thread_pool_size {
                arena.push(conn);
                drop(arenas);
                // waiters may evict it
                self.slot_freed.notify_all();
                return;
            }
        }
        drop(conn);
        self.release_slots(1);
    }

    /// Closes one idle connection of any thread. The caller accounts for the freed slot.
    fn evict_idle_connection(&self) -> bool {
        let mut arenas = self.arenas.lock();
        let evicted = arenas.values_mut().find_map(|arena| arena.pop());
        arenas.retain(|_, arena| !arena.is_empty());
        evicted.is_some()
    }

    fn release_slots(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut counter = self.counter.lock();
        counter.current = counter.current.saturating_sub(count);
        drop(counter);
        self.slot_freed.notify_all();
    }
}

fn is_replaceable(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) | Some(ErrorCode::ApiMisuse)
    )
}
