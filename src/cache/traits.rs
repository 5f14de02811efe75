//! Core types shared by the response cache and the request queue.

use chrono::{DateTime, Utc};

/// Result of a queued request, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was stored (if served from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Cache
  }
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched over the network by the queue
  Network,
  /// Served from an unexpired cache entry
  Cache,
}

/// Snapshot of the response cache contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub size: usize,
  pub keys: Vec<String>,
}
