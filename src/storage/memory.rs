use std::collections::HashMap;

use super::{check_quota, KeyValueStore, StorageError, DEFAULT_QUOTA_BYTES};

/// Non-persistent store used by `--ephemeral` sessions and tests.
#[derive(Debug, Clone)]
pub struct MemoryStore {
  values: HashMap<String, String>,
  quota: usize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::with_quota(DEFAULT_QUOTA_BYTES)
  }

  pub fn with_quota(quota: usize) -> Self {
    Self {
      values: HashMap::new(),
      quota,
    }
  }

  fn used_except(&self, key: &str) -> usize {
    self
      .values
      .iter()
      .filter(|(k, _)| k.as_str() != key)
      .map(|(k, v)| k.len() + v.len())
      .sum()
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.values.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
    check_quota(key, value, self.used_except(key), self.quota)?;
    self.values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StorageError> {
    self.values.remove(key);
    Ok(())
  }
}
