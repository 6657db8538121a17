//! Relational store for the coordinator
//!
//! A single SQLite file holds universities, courses, their join table and
//! students. [`Database`] owns the connection and hands out one transaction
//! per logical operation; the per-entity modules hold the SQL.
//!
//! # Usage
//!
//! ```no_run
//! use campusnet::storage::{universities, Database};
//!
//! # fn example() -> campusnet::error::Result<()> {
//! let db = Database::open("university.sqlite")?;
//! let all = db.transaction(|tx| universities::list(tx))?;
//! println!("{} universities", all.len());
//! # Ok(())
//! # }
//! ```

pub mod courses;
pub mod schema;
pub mod stats;
pub mod students;
pub mod universities;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, Transaction};

use crate::error::{Error, Result};

/// Database management wrapper
///
/// Uses `Mutex` so one request at a time holds the connection for the
/// duration of a single transaction.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file and initialize it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.init()?;

        tracing::info!(path = %path.display(), "SQLite store initialized");
        Ok(db)
    }

    /// Create in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.init()?;
        Ok(db)
    }

    /// Create tables if absent and insert the reference rows
    ///
    /// Idempotent: running it again neither fails nor duplicates seeds.
    pub fn init(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.execute_batch(schema::CREATE_TABLES)?;
            schema::seed(tx)?;
            Ok(())
        })
    }

    /// Run `f` inside one transaction
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is dropped
    /// uncommitted, which rolls it back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| Error::other("Database connection lock poisoned"))?;

        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Cheap liveness probe
    pub fn ping(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    /// File backing the store, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
