use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::api_types::{
  take_field, AuthPayload, BackendFavorite, BackendRecord, BackendUser, Credentials, Envelope,
  FavoriteCheck, Health, NewFavorite, Page, Pagination, PasswordChange, ProfileUpdate,
  Registration, ResourceKind, UserStats, UserUpdate,
};
use crate::swapi::types::EntityType;

const API_PREFIX: [&str; 2] = ["api", "v1"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
  #[error("invalid backend url: {0}")]
  InvalidUrl(String),

  #[error("backend request failed: {0}")]
  Transport(String),

  #[error("backend returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("backend reported failure: {0}")]
  Unsuccessful(String),

  #[error("could not decode backend response: {0}")]
  Decode(String),

  #[error("not logged in to the backend")]
  Unauthenticated,
}

/// Client for the companion REST backend.
///
/// Protected routes send the bearer token obtained from `login`/`register`
/// or set with `with_token`.
#[derive(Clone)]
pub struct BackendClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl BackendClient {
  pub fn new(base_url: &str) -> Result<Self, BackendError> {
    let base = Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
    if base.cannot_be_a_base() {
      return Err(BackendError::InvalidUrl(base_url.to_string()));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("holocron/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| BackendError::Transport(e.to_string()))?;

    Ok(Self {
      http,
      base,
      token: None,
    })
  }

  pub fn with_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  pub fn token(&self) -> Option<&str> {
    self.token.as_deref()
  }

  /// URL under `/api/v1` with the given path segments appended
  pub fn endpoint(&self, segments: &[&str]) -> Url {
    let mut all = API_PREFIX.to_vec();
    all.extend_from_slice(segments);
    self.url_for(&all)
  }

  fn url_for(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // Checked in `new`
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty();
      for segment in segments {
        path.push(segment);
      }
    }
    url
  }

  /// Build a request, attaching the bearer token on protected routes
  fn build_request(
    &self,
    method: Method,
    url: Url,
    body: Option<&impl Serialize>,
    authenticated: bool,
  ) -> Result<reqwest::Request, BackendError> {
    let mut request = self.http.request(method, url);
    if authenticated {
      let token = self.token.as_deref().ok_or(BackendError::Unauthenticated)?;
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }
    request
      .build()
      .map_err(|e| BackendError::Transport(e.to_string()))
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    url: Url,
    body: Option<&impl Serialize>,
    authenticated: bool,
  ) -> Result<Envelope<T>, BackendError> {
    let request = self.build_request(method, url, body, authenticated)?;
    debug!(method = %request.method(), url = %request.url(), "backend request");

    let response = self
      .http
      .execute(request)
      .await
      .map_err(|e| BackendError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| BackendError::Transport(e.to_string()))?;

    decode_envelope(status, &text)
  }

  /// Send and return `data`, which must be present
  async fn send_data(
    &self,
    method: Method,
    url: Url,
    body: Option<&impl Serialize>,
  ) -> Result<Value, BackendError> {
    let envelope = self.send::<Value>(method, url, body, true).await?;
    envelope
      .data
      .ok_or_else(|| BackendError::Decode("response without data".to_string()))
  }

  async fn get_data(&self, url: Url, authenticated: bool) -> Result<Value, BackendError> {
    let envelope = self
      .send::<Value>(Method::GET, url, None::<&()>, authenticated)
      .await?;
    Ok(envelope.data.unwrap_or(Value::Null))
  }

  /// `GET /health`, outside the versioned API
  pub async fn health(&self) -> Result<Health, BackendError> {
    let url = self.url_for(&["health"]);
    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| BackendError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
      return Err(status_error(status, None));
    }
    response
      .json()
      .await
      .map_err(|e| BackendError::Decode(e.to_string()))
  }

  pub async fn register(&mut self, registration: &Registration) -> Result<BackendUser, BackendError> {
    let url = self.endpoint(&["auth", "register"]);
    let envelope = self
      .send::<AuthPayload>(Method::POST, url, Some(registration), false)
      .await?;
    self.accept_auth(envelope)
  }

  pub async fn login(&mut self, email: &str, password: &str) -> Result<BackendUser, BackendError> {
    let url = self.endpoint(&["auth", "login"]);
    let credentials = Credentials { email, password };
    let envelope = self
      .send::<AuthPayload>(Method::POST, url, Some(&credentials), false)
      .await?;
    self.accept_auth(envelope)
  }

  fn accept_auth(&mut self, envelope: Envelope<AuthPayload>) -> Result<BackendUser, BackendError> {
    let payload = envelope
      .data
      .ok_or_else(|| BackendError::Decode("auth response without data".to_string()))?;
    info!(user = %payload.user.username, "logged in to backend");
    self.token = Some(payload.token);
    Ok(payload.user)
  }

  /// Tokens are stateless on the server. Ours is dropped even when the
  /// server cannot be told.
  pub async fn logout(&mut self) -> Result<(), BackendError> {
    let url = self.endpoint(&["auth", "logout"]);
    let result = self.send::<Value>(Method::POST, url, None::<&()>, true).await;
    self.token = None;
    result.map(|_| ())
  }

  pub async fn me(&self) -> Result<BackendUser, BackendError> {
    let mut data = self.get_data(self.endpoint(&["auth", "me"]), true).await?;
    take_field(&mut data, "user")
  }

  pub async fn update_me(&self, changes: &ProfileUpdate) -> Result<BackendUser, BackendError> {
    let url = self.endpoint(&["auth", "me"]);
    let mut data = self.send_data(Method::PUT, url, Some(changes)).await?;
    take_field(&mut data, "user")
  }

  pub async fn change_password(&self, current: &str, new: &str) -> Result<(), BackendError> {
    let url = self.endpoint(&["auth", "change-password"]);
    let change = PasswordChange {
      current_password: current,
      new_password: new,
    };
    self.send::<Value>(Method::PUT, url, Some(&change), true).await?;
    info!("backend password changed");
    Ok(())
  }

  pub fn resource(&self, kind: ResourceKind) -> ResourceApi<'_> {
    ResourceApi { client: self, kind }
  }

  pub fn favorites(&self) -> FavoritesApi<'_> {
    FavoritesApi { client: self }
  }

  /// Admin-only account routes
  pub fn users(&self) -> UsersApi<'_> {
    UsersApi { client: self }
  }
}

/// CRUD on one content collection
pub struct ResourceApi<'a> {
  client: &'a BackendClient,
  kind: ResourceKind,
}

impl ResourceApi<'_> {
  fn url(&self, rest: &[&str]) -> Url {
    let mut segments = vec![self.kind.collection()];
    segments.extend_from_slice(rest);
    self.client.endpoint(&segments)
  }

  async fn one(&self, url: Url, method: Method, body: Option<&Value>) -> Result<BackendRecord, BackendError> {
    let authenticated = method != Method::GET;
    let envelope = self.client.send::<Value>(method, url, body, authenticated).await?;
    let mut data = envelope
      .data
      .ok_or_else(|| BackendError::Decode("response without data".to_string()))?;
    take_field(&mut data, self.kind.singular())
  }

  pub async fn list(&self, pagination: Pagination) -> Result<Page<BackendRecord>, BackendError> {
    let mut url = self.url(&[]);
    url.query_pairs_mut().extend_pairs(pagination.query_pairs());
    let data = self.client.get_data(url, false).await?;
    Page::from_data(data, self.kind.collection())
  }

  pub async fn search(&self, query: &str, pagination: Pagination) -> Result<Page<BackendRecord>, BackendError> {
    let mut url = self.url(&["search"]);
    url
      .query_pairs_mut()
      .append_pair("q", query)
      .extend_pairs(pagination.query_pairs());
    let data = self.client.get_data(url, false).await?;
    Page::from_data(data, self.kind.collection())
  }

  pub async fn get(&self, id: &str) -> Result<BackendRecord, BackendError> {
    self.one(self.url(&[id]), Method::GET, None).await
  }

  pub async fn get_by_uid(&self, uid: &str) -> Result<BackendRecord, BackendError> {
    self.one(self.url(&["uid", uid]), Method::GET, None).await
  }

  pub async fn create(&self, record: &Value) -> Result<BackendRecord, BackendError> {
    self.one(self.url(&[]), Method::POST, Some(record)).await
  }

  pub async fn update(&self, id: &str, changes: &Value) -> Result<BackendRecord, BackendError> {
    self.one(self.url(&[id]), Method::PUT, Some(changes)).await
  }

  pub async fn delete(&self, id: &str) -> Result<(), BackendError> {
    self
      .client
      .send::<Value>(Method::DELETE, self.url(&[id]), None::<&()>, true)
      .await?;
    Ok(())
  }
}

/// The logged-in user's favorites
pub struct FavoritesApi<'a> {
  client: &'a BackendClient,
}

impl FavoritesApi<'_> {
  fn url(&self, rest: &[&str]) -> Url {
    let mut segments = vec!["favorites"];
    segments.extend_from_slice(rest);
    self.client.endpoint(&segments)
  }

  pub async fn list(&self, pagination: Pagination) -> Result<Page<BackendFavorite>, BackendError> {
    let mut url = self.url(&[]);
    url.query_pairs_mut().extend_pairs(pagination.query_pairs());
    let data = self.client.get_data(url, true).await?;
    Page::from_data(data, "favorites")
  }

  pub async fn list_by_type(
    &self,
    entity_type: EntityType,
    pagination: Pagination,
  ) -> Result<Page<BackendFavorite>, BackendError> {
    let mut url = self.url(&["type", entity_type.resource()]);
    url.query_pairs_mut().extend_pairs(pagination.query_pairs());
    let data = self.client.get_data(url, true).await?;
    Page::from_data(data, "favorites")
  }

  pub async fn add(&self, favorite: &NewFavorite) -> Result<BackendFavorite, BackendError> {
    let mut data = self
      .client
      .send_data(Method::POST, self.url(&[]), Some(favorite))
      .await?;
    take_field(&mut data, "favorite")
  }

  pub async fn remove(&self, id: &str) -> Result<(), BackendError> {
    self
      .client
      .send::<Value>(Method::DELETE, self.url(&[id]), None::<&()>, true)
      .await?;
    Ok(())
  }

  pub async fn remove_entity(&self, entity_type: EntityType, uid: &str) -> Result<(), BackendError> {
    let url = self.url(&["entity", entity_type.resource(), uid]);
    self
      .client
      .send::<Value>(Method::DELETE, url, None::<&()>, true)
      .await?;
    Ok(())
  }

  pub async fn check(&self, entity_type: EntityType, uid: &str) -> Result<FavoriteCheck, BackendError> {
    let url = self.url(&["check", entity_type.resource(), uid]);
    let data = self.client.get_data(url, true).await?;
    serde_json::from_value(data).map_err(|e| BackendError::Decode(e.to_string()))
  }

  pub async fn clear(&self) -> Result<(), BackendError> {
    self
      .client
      .send::<Value>(Method::DELETE, self.url(&[]), None::<&()>, true)
      .await?;
    Ok(())
  }
}

pub struct UsersApi<'a> {
  client: &'a BackendClient,
}

impl UsersApi<'_> {
  fn url(&self, rest: &[&str]) -> Url {
    let mut segments = vec!["users"];
    segments.extend_from_slice(rest);
    self.client.endpoint(&segments)
  }

  pub async fn list(&self, pagination: Pagination) -> Result<Page<BackendUser>, BackendError> {
    let mut url = self.url(&[]);
    url.query_pairs_mut().extend_pairs(pagination.query_pairs());
    let data = self.client.get_data(url, true).await?;
    Page::from_data(data, "users")
  }

  pub async fn get(&self, id: &str) -> Result<BackendUser, BackendError> {
    let mut data = self.client.get_data(self.url(&[id]), true).await?;
    take_field(&mut data, "user")
  }

  pub async fn update(&self, id: &str, changes: &UserUpdate) -> Result<BackendUser, BackendError> {
    let mut data = self
      .client
      .send_data(Method::PUT, self.url(&[id]), Some(changes))
      .await?;
    take_field(&mut data, "user")
  }

  /// Deactivates the account; the server keeps the row.
  pub async fn delete(&self, id: &str) -> Result<(), BackendError> {
    self
      .client
      .send::<Value>(Method::DELETE, self.url(&[id]), None::<&()>, true)
      .await?;
    Ok(())
  }

  pub async fn stats(&self) -> Result<UserStats, BackendError> {
    let data = self.client.get_data(self.url(&["stats"]), true).await?;
    serde_json::from_value(data).map_err(|e| BackendError::Decode(e.to_string()))
  }
}

fn status_error(status: StatusCode, message: Option<String>) -> BackendError {
  BackendError::Status {
    status: status.as_u16(),
    message: message
      .or_else(|| status.canonical_reason().map(str::to_string))
      .unwrap_or_default(),
  }
}

/// Turn a raw response into its envelope, mapping HTTP and envelope
/// failures to errors that carry the server's message.
pub fn decode_envelope<T: DeserializeOwned>(
  status: StatusCode,
  body: &str,
) -> Result<Envelope<T>, BackendError> {
  if !status.is_success() {
    let message = serde_json::from_str::<Envelope<Value>>(body)
      .ok()
      .and_then(|e| e.message);
    return Err(status_error(status, message));
  }

  let envelope: Envelope<T> =
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
  if !envelope.success {
    return Err(BackendError::Unsuccessful(
      envelope.message.unwrap_or_else(|| "no message".to_string()),
    ));
  }
  Ok(envelope)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoints() {
    let client = BackendClient::new("http://localhost:3001/").unwrap();
    assert_eq!(
      client.endpoint(&["characters", "uid", "1"]).as_str(),
      "http://localhost:3001/api/v1/characters/uid/1"
    );
    assert_eq!(client.url_for(&["health"]).as_str(), "http://localhost:3001/health");
  }

  #[test]
  fn test_endpoint_keeps_base_path_and_escapes_segments() {
    let client = BackendClient::new("https://example.test/holocron").unwrap();
    let favorites = client.favorites();
    assert_eq!(
      favorites.url(&["entity", "people", "a/b"]).as_str(),
      "https://example.test/holocron/api/v1/favorites/entity/people/a%2Fb"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(matches!(
      BackendClient::new("not a url"),
      Err(BackendError::InvalidUrl(_))
    ));
    assert!(matches!(
      BackendClient::new("mailto:someone@example.test"),
      Err(BackendError::InvalidUrl(_))
    ));
  }

  #[test]
  fn test_decode_success() {
    let envelope: Envelope<Value> = decode_envelope(
      StatusCode::OK,
      r#"{"success": true, "data": {"isFavorite": false, "favorite": null}}"#,
    )
    .unwrap();
    let check: FavoriteCheck = serde_json::from_value(envelope.data.unwrap()).unwrap();
    assert!(!check.is_favorite);
  }

  #[test]
  fn test_decode_status_carries_server_message() {
    let err = decode_envelope::<Value>(
      StatusCode::CONFLICT,
      r#"{"success": false, "message": "Item already in favorites"}"#,
    )
    .unwrap_err();
    assert_eq!(
      err,
      BackendError::Status {
        status: 409,
        message: "Item already in favorites".to_string()
      }
    );
  }

  #[test]
  fn test_decode_status_without_body() {
    let err = decode_envelope::<Value>(StatusCode::NOT_FOUND, "<html>").unwrap_err();
    assert_eq!(
      err,
      BackendError::Status {
        status: 404,
        message: "Not Found".to_string()
      }
    );
  }

  #[test]
  fn test_decode_unsuccessful_envelope() {
    let err = decode_envelope::<Value>(StatusCode::OK, r#"{"success": false, "message": "nope"}"#)
      .unwrap_err();
    assert_eq!(err, BackendError::Unsuccessful("nope".to_string()));
  }

  #[tokio::test]
  async fn test_protected_route_needs_token() {
    let client = BackendClient::new("http://127.0.0.1:9").unwrap();
    let err = client.me().await.unwrap_err();
    assert_eq!(err, BackendError::Unauthenticated);

    let err = client.users().stats().await.unwrap_err();
    assert_eq!(err, BackendError::Unauthenticated);
  }

  fn body_json(request: &reqwest::Request) -> Value {
    let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
    serde_json::from_slice(bytes).unwrap()
  }

  #[test]
  fn test_protected_request_carries_bearer_and_json() {
    let client = BackendClient::new("http://localhost:3001").unwrap().with_token("tok-123");
    let changes = UserUpdate {
      is_active: Some(false),
      ..Default::default()
    };
    let request = client
      .build_request(Method::PUT, client.users().url(&["u1"]), Some(&changes), true)
      .unwrap();

    assert_eq!(request.method(), Method::PUT);
    assert_eq!(request.url().as_str(), "http://localhost:3001/api/v1/users/u1");
    assert_eq!(request.headers()["authorization"], "Bearer tok-123");
    assert_eq!(request.headers()["content-type"], "application/json");
    assert_eq!(body_json(&request), serde_json::json!({"isActive": false}));
  }

  #[test]
  fn test_public_request_has_no_auth_header() {
    let client = BackendClient::new("http://localhost:3001").unwrap().with_token("tok-123");
    let credentials = Credentials {
      email: "leia@alderaan.test",
      password: "hope",
    };
    let request = client
      .build_request(
        Method::POST,
        client.endpoint(&["auth", "login"]),
        Some(&credentials),
        false,
      )
      .unwrap();

    assert!(request.headers().get("authorization").is_none());
    assert_eq!(
      body_json(&request),
      serde_json::json!({"email": "leia@alderaan.test", "password": "hope"})
    );
  }

  #[test]
  fn test_list_request_has_pagination_query() {
    let client = BackendClient::new("http://localhost:3001").unwrap().with_token("t");
    let mut url = client.users().url(&[]);
    url
      .query_pairs_mut()
      .extend_pairs(Pagination::new(2, 5).query_pairs());
    let request = client
      .build_request(Method::GET, url, None::<&()>, true)
      .unwrap();

    assert_eq!(
      request.url().as_str(),
      "http://localhost:3001/api/v1/users?page=2&limit=5"
    );
    assert!(request.body().is_none());
  }

  #[test]
  fn test_accept_auth_stores_token() {
    let mut client = BackendClient::new("http://localhost:3001").unwrap();
    let envelope = decode_envelope::<AuthPayload>(
      StatusCode::CREATED,
      r#"{"success": true, "message": "User registered successfully", "data": {
        "user": {"id": "u1", "username": "leia", "email": "leia@alderaan.test", "role": "user"},
        "token": "jwt-abc"
      }}"#,
    )
    .unwrap();

    let user = client.accept_auth(envelope).unwrap();
    assert_eq!(user.username, "leia");
    assert_eq!(client.token(), Some("jwt-abc"));
  }

  #[test]
  fn test_accept_auth_without_data_keeps_old_token() {
    let mut client = BackendClient::new("http://localhost:3001").unwrap().with_token("old");
    let envelope = decode_envelope::<AuthPayload>(StatusCode::OK, r#"{"success": true}"#).unwrap();

    assert!(matches!(client.accept_auth(envelope), Err(BackendError::Decode(_))));
    assert_eq!(client.token(), Some("old"));
  }

  #[tokio::test]
  async fn test_logout_clears_token_even_when_unreachable() {
    let mut client = BackendClient::new("http://127.0.0.1:9").unwrap().with_token("jwt-abc");
    let err = client.logout().await.unwrap_err();

    assert!(matches!(err, BackendError::Transport(_)));
    assert_eq!(client.token(), None);
  }
}
