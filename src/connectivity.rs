//! Online/offline signal shared between the request queue and the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Provider of the current connectivity status.
pub trait Connectivity: Send + Sync {
  fn is_online(&self) -> bool;
}

/// Connectivity flag updated from observed request outcomes.
///
/// The request queue marks it offline on network failures and online again
/// whenever a response (of any status) comes back.
#[derive(Debug, Clone)]
pub struct ConnectivityFlag {
  online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
  pub fn new(online: bool) -> Self {
    Self {
      online: Arc::new(AtomicBool::new(online)),
    }
  }

  pub fn set_online(&self, online: bool) {
    let previous = self.online.swap(online, Ordering::SeqCst);
    if previous != online {
      tracing::info!(online, "connectivity changed");
    }
  }
}

impl Default for ConnectivityFlag {
  fn default() -> Self {
    Self::new(true)
  }
}

impl Connectivity for ConnectivityFlag {
  fn is_online(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }
}
