//! Shared fakes for unit tests.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{QueueSettings, RequestQueue};
use crate::clock::ManualClock;
use crate::connectivity::ConnectivityFlag;
use crate::storage::{KeyValueStore, MemoryStore, DATA_KEY};
use crate::store::state::{DataSnapshot, EntityLists};
use crate::store::Store;
use crate::swapi::client::SwapiClient;
use crate::swapi::transport::{FetchError, Transport};
use crate::swapi::types::{Entity, EntityType};
use crate::ui::view::ViewContext;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const BASE_URL: &str = "https://swapi.test/api";

pub fn start_time() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
    .unwrap()
    .with_timezone(&Utc)
}

/// Scripted transport that records the order requests start in and how
/// many run concurrently.
#[derive(Default)]
pub struct FakeTransport {
  responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
  calls: Mutex<Vec<String>>,
  latency: Duration,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl FakeTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn respond(&self, url: &str, body: Value) {
    self
      .responses
      .lock()
      .unwrap()
      .insert(url.to_string(), Ok(body));
  }

  pub fn fail(&self, url: &str, error: FetchError) {
    self
      .responses
      .lock()
      .unwrap()
      .insert(url.to_string(), Err(error));
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }

  async fn serve(&self, url: &str) -> Result<Value, FetchError> {
    self.calls.lock().unwrap().push(url.to_string());
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    let scripted = self.responses.lock().unwrap().get(url).cloned();
    scripted.unwrap_or_else(|| {
      Err(FetchError::Status {
        url: url.to_string(),
        status: 404,
        reason: "Not Found".to_string(),
      })
    })
  }
}

impl Transport for FakeTransport {
  fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
    Box::pin(self.serve(url))
  }
}

/// Content client wired to a fake transport and a manual clock
pub fn fake_client(transport: Arc<FakeTransport>, clock: ManualClock) -> SwapiClient {
  let queue = RequestQueue::new(
    transport,
    Arc::new(clock),
    ConnectivityFlag::default(),
    QueueSettings::default(),
  );
  SwapiClient::new(queue, BASE_URL, 6)
}

/// Storage holding an entity snapshot fetched some minutes before
/// `start_time()`, with one character named "Stored Luke"
pub fn stored_snapshot(fetched_minutes_ago: i64) -> MemoryStore {
  let mut lists = EntityLists::default();
  lists.set(
    EntityType::People,
    vec![Entity::new(EntityType::People, "1", "Stored Luke")],
  );
  let snapshot = DataSnapshot {
    lists,
    last_fetch: Some(start_time() - chrono::Duration::minutes(fetched_minutes_ago)),
  };
  let mut storage = MemoryStore::new();
  storage
    .set(DATA_KEY, &serde_json::to_string(&snapshot).unwrap())
    .unwrap();
  storage
}

/// View context over `storage` and `transport`, not yet hydrated
pub fn view_context_with(storage: MemoryStore, transport: Arc<FakeTransport>) -> ViewContext {
  let clock = ManualClock::new(start_time());
  let client = fake_client(transport, clock.clone());
  let store = Store::new(
    Box::new(storage),
    Arc::new(clock),
    Arc::new(ConnectivityFlag::default()),
    chrono::Duration::minutes(30),
  );
  ViewContext { store, client }
}

/// View context over in-memory storage, with lists already hydrated from
/// the bundled preview data
pub fn view_context() -> ViewContext {
  let mut ctx = view_context_with(MemoryStore::new(), Arc::new(FakeTransport::new()));
  ctx.store.hydrate();
  ctx
}

pub fn key(code: KeyCode) -> KeyEvent {
  KeyEvent::new(code, KeyModifiers::NONE)
}
