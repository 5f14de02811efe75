//! Outbound HTTP for the content API.

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Failure of a single content API request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
  #[error("network error for {url}: {message}")]
  Network { url: String, message: String },

  #[error("request timeout after {}s for {url}", .after.as_secs())]
  Timeout { url: String, after: Duration },

  #[error("too many requests for {url}, please wait a moment")]
  RateLimited { url: String },

  #[error("HTTP error! status: {status} - {reason} ({url})")]
  Status {
    url: String,
    status: u16,
    reason: String,
  },

  #[error("malformed response from {url}: {message}")]
  Malformed { url: String, message: String },

  #[error("request for {url} was dropped before completing")]
  Cancelled { url: String },
}

impl FetchError {
  /// Whether this failure means the host could not be reached at all
  pub fn is_network(&self) -> bool {
    matches!(self, FetchError::Network { .. } | FetchError::Timeout { .. })
  }
}

/// Performs a GET and decodes the body as JSON.
///
/// Implementations only classify failures; timeouts, caching and ordering
/// are handled by the request queue wrapping them.
pub trait Transport: Send + Sync {
  fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new() -> color_eyre::Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("holocron/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    Ok(Self { client })
  }

  async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
      })?;

    check_status(url, response.status())?;

    let body = response.text().await.map_err(|e| FetchError::Network {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
      url: url.to_string(),
      message: e.to_string(),
    })
  }
}

impl Transport for HttpTransport {
  fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
    Box::pin(self.fetch(url))
  }
}

/// Map a response status to the error taxonomy.
pub fn check_status(url: &str, status: StatusCode) -> Result<(), FetchError> {
  if status.is_success() {
    return Ok(());
  }
  if status == StatusCode::TOO_MANY_REQUESTS {
    return Err(FetchError::RateLimited {
      url: url.to_string(),
    });
  }
  Err(FetchError::Status {
    url: url.to_string(),
    status: status.as_u16(),
    reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
  })
}
