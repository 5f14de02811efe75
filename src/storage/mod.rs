//! Persistent key-value storage for favorites, snapshots and preferences.
//!
//! Values are JSON text under string keys. Every backend enforces a total
//! byte quota so that oversized writes fail the same way everywhere.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key holding the favorites array
pub const FAVORITES_KEY: &str = "starwars-favorites";
/// Key holding the entity snapshot with its fetch time
pub const DATA_KEY: &str = "starwars-data";
/// Key holding user preferences
pub const PREFERENCES_KEY: &str = "starwars-preferences";

/// Default total quota, matching common browser storage limits
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
  #[error("storage quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
  QuotaExceeded {
    key: String,
    needed: usize,
    quota: usize,
  },

  #[error("storage backend error: {0}")]
  Backend(String),
}

/// Synchronous string key-value store.
pub trait KeyValueStore: Send {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

  fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Quota check shared by the backends: `others` is the size of all values
/// except the one being replaced.
fn check_quota(key: &str, value: &str, others: usize, quota: usize) -> Result<(), StorageError> {
  let needed = others + key.len() + value.len();
  if needed > quota {
    return Err(StorageError::QuotaExceeded {
      key: key.to_string(),
      needed,
      quota,
    });
  }
  Ok(())
}
