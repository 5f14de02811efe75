//! In-memory TTL map of responses keyed by request URL.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::traits::CacheStats;

/// A single cached response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub data: Value,
  pub timestamp: DateTime<Utc>,
}

/// Response cache with lazy TTL expiry.
///
/// Entries are only ever evicted when they are read after expiring, or by
/// an explicit `clear`. There is no size bound.
pub struct ResponseCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
  ttl: Duration,
}

impl ResponseCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      ttl,
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Return the entry for `key` if it is still within the TTL at `now`.
  /// An expired entry is removed.
  pub fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
    let mut entries = self.entries();
    match entries.get(key) {
      Some(entry) if now - entry.timestamp <= self.ttl => Some(entry.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  pub fn insert(&self, key: &str, data: Value, timestamp: DateTime<Utc>) {
    self
      .entries()
      .insert(key.to_string(), CacheEntry { data, timestamp });
  }

  pub fn clear(&self) {
    self.entries().clear();
  }

  pub fn stats(&self) -> CacheStats {
    let entries = self.entries();
    let mut keys: Vec<String> = entries.keys().cloned().collect();
    keys.sort();
    CacheStats {
      size: entries.len(),
      keys,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn test_fresh_entry_is_returned() {
    let cache = ResponseCache::new(Duration::minutes(30));
    cache.insert("a", json!({"results": []}), start());

    let entry = cache.get_fresh("a", start() + Duration::minutes(10)).unwrap();
    assert_eq!(entry.data, json!({"results": []}));
  }

  #[test]
  fn test_entry_at_exact_ttl_is_fresh() {
    let cache = ResponseCache::new(Duration::minutes(30));
    cache.insert("a", json!(1), start());
    assert!(cache.get_fresh("a", start() + Duration::minutes(30)).is_some());
  }

  #[test]
  fn test_expired_entry_is_evicted_on_read() {
    let cache = ResponseCache::new(Duration::minutes(30));
    cache.insert("a", json!(1), start());

    assert!(cache.get_fresh("a", start() + Duration::minutes(31)).is_none());
    assert_eq!(cache.stats().size, 0);
  }

  #[test]
  fn test_stats_and_clear() {
    let cache = ResponseCache::new(Duration::minutes(30));
    cache.insert("b", json!(1), start());
    cache.insert("a", json!(2), start());

    let stats = cache.stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);

    cache.clear();
    assert_eq!(cache.stats(), CacheStats::default());
  }
}
