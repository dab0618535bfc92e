// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The ledger store is a single SQLite file accessed through:
//! * exactly one writable handle, [`LedgerDb`], owned by the thread that advances the chain tip
//! * any number of read-only handles, borrowed from a [`ConnectionPool`] by reader threads
//!
//! # ConnectionPool
//!
//! Each thread owns an arena of idle connections (at most `thread_pool_size`).
//! A connection is never handed to another thread: `acquire` pops from the caller's
//! arena and the returned guard pushes the connection back on drop, or closes it when
//! the arena is full.
//!
//! A global counter bounds the number of open connections (`max_connections`, 0 for
//! no limit), idle ones included. When the bound is reached, `acquire` first closes an
//! idle connection of any thread, otherwise it waits on a condition variable until a
//! connection is released or the pool is closed, failing after `wait_timeout`.
//!
//! Reused connections are checked with `SELECT 1`. A connection that is busy or misused
//! is replaced by a fresh one, keeping its slot.
//!
//! Once closed, the pool hands out unpooled connections that are closed on drop. `close`
//! only drains the arena of the calling thread: other threads drain theirs the next time
//! they touch the pool.
//!
//! # LedgerDb
//!
//! Wraps the writable connection: schema creation and full rebuild, the `config` key/value
//! table, health checks (`integrity_check`, `foreign_key_check`), `VACUUM` and `optimize`.
//! The read helpers of [`queries`] take any `&Connection`, so they work the same on the
//! writer, inside a write transaction, or on a pooled reader.

mod ledger_db;
mod pool;
pub mod queries;
pub mod sql_value;

pub use crate::ledger_db::*;
pub use crate::pool::*;
