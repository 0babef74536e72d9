//! SQLite-backed key-value preferences store.
//!
//! Holds small durable values, most importantly the serialized gallery list
//! under the `"photos"` key. Values are plain strings; callers decide the
//! encoding.

use rusqlite::Connection;
use std::path::Path;

use crate::error::PrefsError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS prefs (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub struct Preferences {
    conn: Connection,
}

impl Preferences {
    /// Open or create the store at the given path. Parent directories are
    /// created as needed.
    pub fn open(path: &Path) -> Result<Self, PrefsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Volatile store for tests and throwaway sessions.
    pub fn in_memory() -> Result<Self, PrefsError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let result = self.conn.query_row(
            "SELECT value FROM prefs WHERE key = ?",
            [key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.conn.execute(
            r#"
            INSERT INTO prefs (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), PrefsError> {
        self.conn.execute("DELETE FROM prefs WHERE key = ?", [key])?;
        Ok(())
    }
}
