//! Request queue that orchestrates the response cache with network fetching.

use chrono::Duration as TtlDuration;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::storage::ResponseCache;
use super::traits::{CacheResult, CacheStats};
use crate::clock::Clock;
use crate::connectivity::ConnectivityFlag;
use crate::swapi::transport::{FetchError, Transport};

/// Timing knobs for the queue
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
  /// How long a cached response may be served
  pub ttl: TtlDuration,
  /// Pause between two dispatched requests
  pub delay: Duration,
  /// Upper bound for a single network call
  pub timeout: Duration,
}

impl Default for QueueSettings {
  fn default() -> Self {
    Self {
      ttl: TtlDuration::minutes(30),
      delay: Duration::from_millis(10),
      timeout: Duration::from_secs(10),
    }
  }
}

/// Cache-first, single-flight request queue.
///
/// Fresh cache hits are answered immediately. Misses are appended to a FIFO
/// queue that a single processor task drains one request at a time, pausing
/// `delay` between dispatches so the content API never sees a burst.
///
/// Cloning yields another handle to the same cache and queue.
#[derive(Clone)]
pub struct RequestQueue {
  inner: Arc<Inner>,
}

struct Inner {
  transport: Arc<dyn Transport>,
  cache: ResponseCache,
  clock: Arc<dyn Clock>,
  connectivity: ConnectivityFlag,
  pending: Mutex<Pending>,
  delay: Duration,
  timeout: Duration,
}

#[derive(Default)]
struct Pending {
  requests: VecDeque<PendingRequest>,
  /// Set while a processor task is draining `requests`
  busy: bool,
}

struct PendingRequest {
  url: String,
  responder: oneshot::Sender<Result<Value, FetchError>>,
}

impl RequestQueue {
  pub fn new(
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    connectivity: ConnectivityFlag,
    settings: QueueSettings,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        transport,
        cache: ResponseCache::new(settings.ttl),
        clock,
        connectivity,
        pending: Mutex::new(Pending::default()),
        delay: settings.delay,
        timeout: settings.timeout,
      }),
    }
  }

  /// Fetch `url`, serving an unexpired cached response when there is one.
  pub async fn get(&self, url: &str) -> Result<CacheResult<Value>, FetchError> {
    let now = self.inner.clock.now();
    if let Some(entry) = self.inner.cache.get_fresh(url, now) {
      debug!(url, "cache hit");
      return Ok(CacheResult::from_cache(entry.data, entry.timestamp));
    }

    let receiver = self.enqueue(url);
    match receiver.await {
      Ok(result) => result.map(CacheResult::from_network),
      Err(_) => Err(FetchError::Cancelled {
        url: url.to_string(),
      }),
    }
  }

  /// Issue a request outside the queue and cache; true on success.
  pub async fn is_reachable(&self, url: &str) -> bool {
    matches!(self.inner.dispatch(url).await, Ok(_))
  }

  pub fn clear_cache(&self) {
    self.inner.cache.clear();
    debug!("response cache cleared");
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.inner.cache.stats()
  }

  fn enqueue(&self, url: &str) -> oneshot::Receiver<Result<Value, FetchError>> {
    let (responder, receiver) = oneshot::channel();

    let start_processor = {
      let mut pending = self.inner.pending();
      pending.requests.push_back(PendingRequest {
        url: url.to_string(),
        responder,
      });
      // Only the caller that flips the flag spawns a processor
      !std::mem::replace(&mut pending.busy, true)
    };

    if start_processor {
      let inner = Arc::clone(&self.inner);
      tokio::spawn(inner.process());
    }

    receiver
  }
}

impl Inner {
  fn pending(&self) -> MutexGuard<'_, Pending> {
    self.pending.lock().unwrap_or_else(PoisonError::into_inner)
  }

  async fn process(self: Arc<Self>) {
    loop {
      let request = {
        let mut pending = self.pending();
        match pending.requests.pop_front() {
          Some(request) => request,
          None => {
            pending.busy = false;
            return;
          }
        }
      };

      let result = self.dispatch(&request.url).await;
      if let Ok(data) = &result {
        self
          .cache
          .insert(&request.url, data.clone(), self.clock.now());
      }
      // The caller may have gone away; the response is cached regardless
      let _ = request.responder.send(result);

      let more = !self.pending().requests.is_empty();
      if more {
        tokio::time::sleep(self.delay).await;
      }
    }
  }

  async fn dispatch(&self, url: &str) -> Result<Value, FetchError> {
    debug!(url, "dispatching request");
    let result = match tokio::time::timeout(self.timeout, self.transport.get_json(url)).await {
      Ok(result) => result,
      Err(_) => Err(FetchError::Timeout {
        url: url.to_string(),
        after: self.timeout,
      }),
    };

    match &result {
      Ok(_) => self.connectivity.set_online(true),
      Err(e) if e.is_network() => {
        warn!(url, error = %e, "request failed");
        self.connectivity.set_online(false);
      }
      Err(e) => {
        // The server answered, so the host is reachable
        warn!(url, error = %e, "request failed");
        self.connectivity.set_online(true);
      }
    }

    result
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::ManualClock;
  use crate::connectivity::Connectivity;
  use crate::testing::{start_time, FakeTransport};
  use serde_json::json;

  fn queue_with(transport: Arc<FakeTransport>, clock: ManualClock) -> RequestQueue {
    RequestQueue::new(
      transport,
      Arc::new(clock),
      ConnectivityFlag::default(),
      QueueSettings::default(),
    )
  }

  #[tokio::test(start_paused = true)]
  async fn test_second_request_within_ttl_is_cached() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond("https://api/people", json!({"results": []}));
    let clock = ManualClock::new(start_time());
    let queue = queue_with(transport.clone(), clock.clone());

    let first = queue.get("https://api/people").await.unwrap();
    assert!(!first.is_cached());

    clock.advance(chrono::Duration::minutes(29));
    let second = queue.get("https://api/people").await.unwrap();
    assert!(second.is_cached());
    assert_eq!(second.data, json!({"results": []}));
    assert_eq!(transport.calls(), vec!["https://api/people".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_request_after_ttl_refetches_and_updates_timestamp() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond("https://api/planets", json!({"results": []}));
    let clock = ManualClock::new(start_time());
    let queue = queue_with(transport.clone(), clock.clone());

    queue.get("https://api/planets").await.unwrap();
    clock.advance(chrono::Duration::minutes(1));
    let hit = queue.get("https://api/planets").await.unwrap();
    assert_eq!(hit.cached_at, Some(start_time()));

    clock.advance(chrono::Duration::minutes(30));
    let again = queue.get("https://api/planets").await.unwrap();

    assert!(!again.is_cached());
    assert_eq!(transport.calls().len(), 2);

    // The refetched entry carries the new timestamp
    let refreshed = queue.get("https://api/planets").await.unwrap();
    assert!(refreshed.is_cached());
    assert_eq!(
      refreshed.cached_at,
      Some(start_time() + chrono::Duration::minutes(31))
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_requests_run_one_at_a_time_in_submission_order() {
    let transport = Arc::new(FakeTransport::new().with_latency(Duration::from_millis(50)));
    let urls: Vec<String> = (1..=5).map(|i| format!("https://api/people/{}", i)).collect();
    for url in &urls {
      transport.respond(url, json!({"result": {}}));
    }
    let queue = queue_with(transport.clone(), ManualClock::new(start_time()));

    let results = futures::future::join_all(urls.iter().map(|u| queue.get(u))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(transport.calls(), urls);
    assert_eq!(transport.max_in_flight(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_rejects_caller_and_is_not_cached() {
    let transport = Arc::new(FakeTransport::new());
    transport.fail(
      "https://api/vehicles",
      FetchError::RateLimited {
        url: "https://api/vehicles".to_string(),
      },
    );
    let queue = queue_with(transport.clone(), ManualClock::new(start_time()));

    let err = queue.get("https://api/vehicles").await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { .. }));
    assert_eq!(queue.cache_stats().size, 0);

    // A failed request does not stall the queue
    transport.respond("https://api/vehicles", json!({"results": []}));
    assert!(queue.get("https://api/vehicles").await.is_ok());
  }

  #[tokio::test(start_paused = true)]
  async fn test_slow_request_times_out() {
    let transport = Arc::new(FakeTransport::new().with_latency(Duration::from_secs(20)));
    transport.respond("https://api/films", json!({"results": []}));
    let connectivity = ConnectivityFlag::default();
    let queue = RequestQueue::new(
      transport,
      Arc::new(ManualClock::new(start_time())),
      connectivity.clone(),
      QueueSettings::default(),
    );

    let err = queue.get("https://api/films").await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
    assert!(!connectivity.is_online());
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_cache_forces_refetch() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond("https://api/species", json!({"results": []}));
    let queue = queue_with(transport.clone(), ManualClock::new(start_time()));

    queue.get("https://api/species").await.unwrap();
    assert_eq!(queue.cache_stats().keys, vec!["https://api/species"]);

    queue.clear_cache();
    queue.get("https://api/species").await.unwrap();
    assert_eq!(transport.calls().len(), 2);
  }
}
