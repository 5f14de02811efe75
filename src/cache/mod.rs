//! Response caching and request serialisation for the content API.
//!
//! This module provides:
//! - An in-memory response cache keyed by URL with lazy TTL expiry
//! - A single-flight FIFO queue with a fixed pause between dispatches
//! - A per-request timeout that drops the in-flight call

mod layer;
mod storage;
mod traits;

pub use layer::{QueueSettings, RequestQueue};
pub use traits::CacheStats;
