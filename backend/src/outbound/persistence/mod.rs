//! SQLite persistence adapters.
//!
//! One embedded database holds the whole single-tenant state. The connection
//! is shared behind a mutex; every repository is a thin adapter over it with
//! a typed row mapper applied immediately after fetch, so nothing downstream
//! ever sees a raw row.

pub mod activity;
pub mod apps;
pub mod contacts;
pub mod districts;
pub mod migrations;
pub mod requests;
pub mod setup;
pub mod users;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::domain::ports::PersistenceError;

/// Errors raised while opening or migrating the database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),
}

/// Shared handle to the embedded database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    ///
    /// Configures WAL mode and foreign keys, then runs pending migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::database("connection mutex poisoned"))
    }
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Map an execution error, routing unique violations to `Conflict`.
pub(crate) fn map_sqlite(err: rusqlite::Error, conflict_message: &str) -> PersistenceError {
    if is_unique_violation(&err) {
        PersistenceError::conflict(conflict_message)
    } else {
        PersistenceError::database(err.to_string())
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub(crate) fn db_err(err: rusqlite::Error) -> PersistenceError {
    PersistenceError::database(err.to_string())
}

/// Parse a `CURRENT_TIMESTAMP` column (`YYYY-MM-DD HH:MM:SS`, UTC).
pub(crate) fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
