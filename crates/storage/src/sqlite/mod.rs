use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::repository::{PersistentStore, StorageError};

/// Errors raised while opening the backing database.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("failed to open database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("failed to prepare schema: {0}")]
    Schema(#[source] rusqlite::Error),
}

/// Durable key-value store backed by a single `SQLite` table.
///
/// The table mirrors the string-keyed medium the trackers expect: one row
/// per key, upsert on write.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteInitError> {
        let conn = Connection::open(path).map_err(SqliteInitError::Open)?;
        Self::with_connection(conn)
    }

    /// Open a store that lives only in memory, for tests and prototyping.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open_in_memory() -> Result<Self, SqliteInitError> {
        let conn = Connection::open_in_memory().map_err(SqliteInitError::Open)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, SqliteInitError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            (),
        )
        .map_err(SqliteInitError::Schema)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PersistentStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        conn.query_row(
            "SELECT value FROM kv_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        conn.execute(
            "INSERT INTO kv_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
