//! SQLite-backed key-value storage.
//!
//! A single `kv` table holds each durable record as a JSON string under its
//! own key. Writes replace the whole value, so readers never observe a
//! partially updated record.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValue;
use crate::error::{DatabaseError, StoreError};

/// File name of the store inside the data directory.
pub const DB_FILENAME: &str = "tasklite.db";

/// SQLite database for durable records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::DirectoryUnavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Removing an absent key is not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl KeyValue for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.kv_get(key)
            .map_err(|e| StoreError::from(DatabaseError::from(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv_set(key, value)
            .map_err(|e| StoreError::from(DatabaseError::from(e)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.kv_delete(key)
            .map_err(|e| StoreError::from(DatabaseError::from(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn kv_delete_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.kv_set("k", "v").unwrap();
        db.kv_delete("k").unwrap();
        db.kv_delete("k").unwrap();
        assert!(db.kv_get("k").unwrap().is_none());
    }

    #[test]
    fn unusable_parent_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let err = Database::open_at(&blocker.join(DB_FILENAME)).err().unwrap();
        match err {
            DatabaseError::DirectoryUnavailable { path, .. } => assert_eq!(path, blocker),
            other => panic!("Expected DirectoryUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DB_FILENAME);
        {
            let db = Database::open_at(&path).unwrap();
            KeyValue::set(&db, "pomodoro_session", "{\"active\":true}").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(
            KeyValue::get(&db, "pomodoro_session").unwrap().as_deref(),
            Some("{\"active\":true}")
        );
    }
}
