//! Client-local persistent key/value store.
//!
//! This tier plays the role of browser-local storage for the desktop shell:
//! a simple string key/value facility scoped to the client device. It is a
//! fallback hint, not the authoritative cache: the coordinator treats every
//! failure here as a miss.

use crate::error::{EsGazeError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Key/value persistence consumed by the coordinator.
///
/// Operations are synchronous to match rusqlite's API.
pub trait LocalStore: Send + Sync {
    /// Get a value by key. Returns `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, overwriting any existing entry.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed local store.
///
/// Thread-safe via internal mutex on the connection.
pub struct SqliteLocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocalStore {
    /// Open (or create) the store at the given database path.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EsGazeError::Io {
                message: format!("Failed to create local store directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| EsGazeError::Database {
            message: format!("Failed to open local store database: {}", e),
            source: Some(e),
        })?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| EsGazeError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| EsGazeError::Database {
            message: format!("Failed to initialize local store schema: {}", e),
            source: Some(e),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| EsGazeError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| EsGazeError::Database {
                message: format!("Failed to query local store entry: {}", e),
                source: Some(e),
            })?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )
        .map_err(|e| EsGazeError::Database {
            message: format!("Failed to set local store entry: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let deleted = conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(|e| EsGazeError::Database {
                message: format!("Failed to remove local store entry: {}", e),
                source: Some(e),
            })?;
        if deleted > 0 {
            debug!("Removed local store entry '{}'", key);
        }
        Ok(())
    }
}
