//! SQLite-backed snapshot store.
//!
//! The single session is kept as a JSON snapshot in a key-value table and
//! rewritten after every mutation. A crash may lose the last unsaved change;
//! nothing stronger is promised.

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::StorageError;
use crate::session::Session;
use crate::storage::Config;

const SESSION_KEY: &str = "session";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/nexus/nexus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> crate::error::Result<Self> {
        let path = data_dir()?.join("nexus.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Reload the session snapshot written by the previous process.
    ///
    /// A missing snapshot yields a fresh idle session. So does a snapshot
    /// that no longer decodes; that case is logged and the fresh session is
    /// written back so the next load is clean.
    pub fn load_session(&self, config: &Config) -> Result<Session, StorageError> {
        match self.kv_get(SESSION_KEY)? {
            Some(json) => match serde_json::from_str::<Session>(&json) {
                Ok(session) => Ok(session),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable session snapshot");
                    let session = Session::idle(config);
                    self.save_session(&session)?;
                    Ok(session)
                }
            },
            None => Ok(Session::idle(config)),
        }
    }

    /// Overwrite the session snapshot.
    pub fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        let json = serde_json::to_string(session)?;
        self.kv_set(SESSION_KEY, &json)
    }
}
