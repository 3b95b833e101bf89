//! SQLite-backed state store.
//!
//! One `app_state` row per store key; saves upsert the row so the state is
//! always replaced as a unit.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::StateStore;
use crate::error::NotesResult;

pub struct SqliteStateStore {
    conn: Connection,
    key: String,
}

impl SqliteStateStore {
    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &Path, key: &str) -> NotesResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, key)
    }

    #[cfg(test)]
    pub fn open_in_memory(key: &str) -> NotesResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, key)
    }

    fn with_connection(conn: Connection, key: &str) -> NotesResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self) -> NotesResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, raw: &str) -> NotesResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO app_state (key, value, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, saved_at = excluded.saved_at",
            params![self.key, raw, now],
        )?;
        log::debug!("[STORE] Saved {} bytes under '{}'", raw.len(), self.key);
        Ok(())
    }
}
