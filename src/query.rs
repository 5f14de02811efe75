//! Background work whose result is picked up on the UI tick.
//!
//! A `Query<T>` runs its fetcher on the tokio runtime and hands the value
//! back through a oneshot channel. The UI thread calls `poll` on every tick
//! and applies the result to the store with `take`, so the store itself
//! never crosses a task boundary.
//!
//! ```ignore
//! let client = client.clone();
//! let mut refresh = Query::new(move || {
//!   let client = client.clone();
//!   async move { client.fetch_all_lists().await }
//! });
//!
//! refresh.fetch();
//!
//! // On tick
//! if refresh.poll() {
//!   if let Some(outcomes) = refresh.take() {
//!     store.apply_refresh(outcomes);
//!   }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Not started, or the last result was taken
  Idle,
  Loading,
  Ready(T),
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<oneshot::Receiver<T>>,
  started_at: Option<Instant>,
  finished_in: Option<Duration>,
}

impl<T: Send + 'static> Query<T> {
  /// The fetcher is called again on every `fetch`/`refetch`.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      started_at: None,
      finished_in: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Ready(data) => Some(data),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, QueryState::Loading)
  }

  /// How long the last completed run took
  pub fn finished_in(&self) -> Option<Duration> {
    self.finished_in
  }

  /// Start a run unless one is already in progress.
  pub fn fetch(&mut self) {
    if self.is_loading() {
      return;
    }
    self.start();
  }

  /// Start a new run. A run still in progress keeps going but its result
  /// is ignored.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start();
  }

  /// Check for a finished run. Returns `true` when the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = self.receiver.as_mut() else {
      return false;
    };

    match receiver.try_recv() {
      Ok(data) => {
        self.state = QueryState::Ready(data);
        self.finished_in = self.started_at.map(|t| t.elapsed());
        self.receiver = None;
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        tracing::warn!("background task ended without a result");
        self.state = QueryState::Idle;
        self.receiver = None;
        true
      }
    }
  }

  /// Move a ready result out, leaving the query idle.
  pub fn take(&mut self) -> Option<T> {
    match std::mem::replace(&mut self.state, QueryState::Idle) {
      QueryState::Ready(data) => Some(data),
      other => {
        self.state = other;
        None
      }
    }
  }

  fn start(&mut self) {
    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;
    self.started_at = Some(Instant::now());

    let future = (self.fetcher)();
    tokio::spawn(async move {
      // The receiver may be gone after a refetch
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("finished_in", &self.finished_in)
      .finish_non_exhaustive()
  }
}
