//! SQLite-backed key-value store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::{check_quota, KeyValueStore, StorageError};

/// Key-value store persisted in a single SQLite table.
pub struct SqliteStore {
  conn: Connection,
  quota: usize,
}

impl SqliteStore {
  /// Open or create the store at `path` (or the default location).
  pub fn open(path: Option<&Path>, quota: usize) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create storage directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open storage at {}: {}", path.display(), e))?;

    let store = Self { conn, quota };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("holocron").join("storage.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    self
      .conn
      .execute_batch(STORAGE_SCHEMA)
      .map_err(|e| eyre!("Failed to run storage migrations: {}", e))?;
    Ok(())
  }

  fn used_except(&self, key: &str) -> Result<usize, StorageError> {
    let used: i64 = self
      .conn
      .query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
         FROM local_storage WHERE key != ?",
        params![key],
        |row| row.get(0),
      )
      .map_err(backend_error)?;
    Ok(used.max(0) as usize)
  }
}

const STORAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

fn backend_error(e: rusqlite::Error) -> StorageError {
  StorageError::Backend(e.to_string())
}

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    self
      .conn
      .query_row(
        "SELECT value FROM local_storage WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(backend_error)
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
    check_quota(key, value, self.used_except(key)?, self.quota)?;

    self
      .conn
      .execute(
        "INSERT OR REPLACE INTO local_storage (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(backend_error)?;
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StorageError> {
    self
      .conn
      .execute("DELETE FROM local_storage WHERE key = ?", params![key])
      .map_err(backend_error)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::{DEFAULT_QUOTA_BYTES, FAVORITES_KEY};

  #[test]
  fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.db");

    {
      let mut store = SqliteStore::open(Some(&path), DEFAULT_QUOTA_BYTES).unwrap();
      store.set(FAVORITES_KEY, "[]").unwrap();
      store.set(FAVORITES_KEY, r#"[{"uid":"1"}]"#).unwrap();
    }

    let store = SqliteStore::open(Some(&path), DEFAULT_QUOTA_BYTES).unwrap();
    assert_eq!(
      store.get(FAVORITES_KEY).unwrap().as_deref(),
      Some(r#"[{"uid":"1"}]"#)
    );
  }

  #[test]
  fn test_remove_missing_key_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::open(Some(&dir.path().join("s.db")), DEFAULT_QUOTA_BYTES).unwrap();
    store.remove("nope").unwrap();
    assert_eq!(store.get("nope").unwrap(), None);
  }

  #[test]
  fn test_quota_exceeded() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::open(Some(&dir.path().join("s.db")), 16).unwrap();
    store.set("k", "0123456789").unwrap();

    let err = store.set("other", "0123456789").unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    assert_eq!(store.get("other").unwrap(), None);
  }
}
