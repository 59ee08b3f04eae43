use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

/// Default per-value capacity, matching what browsers grant local storage
pub const DEFAULT_STORAGE_LIMIT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Value for '{key}' is {size} bytes, over the {limit} byte storage limit")]
    CapacityExceeded {
        key: String,
        size: usize,
        limit: usize,
    },
}

/// Durable key-value storage backed by a single SQLite table
pub struct Database {
    conn: Connection,
    limit_bytes: usize,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let db = Database {
            conn,
            limit_bytes: DEFAULT_STORAGE_LIMIT_BYTES,
        };
        db.initialize_schema()?;

        tracing::debug!(path = %db_path.display(), "database opened");
        Ok(db)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
            limit_bytes: DEFAULT_STORAGE_LIMIT_BYTES,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn with_limit(mut self, limit_bytes: usize) -> Self {
        self.limit_bytes = limit_bytes;
        self
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS collections (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read the raw value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace the value under `key`
    pub fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        if value.len() > self.limit_bytes {
            return Err(DatabaseError::CapacityExceeded {
                key: key.to_string(),
                size: value.len(),
                limit: self.limit_bytes,
            });
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO collections (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                key,
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_existing_value() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("cs_todos").unwrap(), None);

        db.put("cs_todos", "[]").unwrap();
        db.put("cs_todos", "[1]").unwrap();

        assert_eq!(db.get("cs_todos").unwrap().as_deref(), Some("[1]"));
        assert_eq!(db.get("cs_logs").unwrap(), None);
    }

    #[test]
    fn oversized_value_is_rejected_and_previous_kept() {
        let db = Database::open_in_memory().unwrap().with_limit(8);
        db.put("cs_events", "[]").unwrap();

        let err = db.put("cs_events", "[\"0123456789\"]").unwrap_err();
        assert!(matches!(err, DatabaseError::CapacityExceeded { limit: 8, .. }));
        assert_eq!(db.get("cs_events").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("studio.db");
        let path = path.to_str().unwrap();

        Database::new(path).unwrap().put("cs_logs", "[]").unwrap();
        let reopened = Database::new(path).unwrap();
        assert_eq!(reopened.get("cs_logs").unwrap().as_deref(), Some("[]"));
    }
}
