//! Wire types for the companion backend (`/api/v1`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::client::BackendError;
use crate::swapi::types::{Entity, EntityType};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// `{success, data?, message?}` wrapper around every `/api/v1` response
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub success: bool,
  pub data: Option<T>,
  pub message: Option<String>,
}

/// Requested page, always within server limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  page: u32,
  limit: u32,
}

impl Pagination {
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page: page.max(1),
      limit: limit.clamp(1, MAX_LIMIT),
    }
  }

  pub fn query_pairs(&self) -> [(&'static str, String); 2] {
    [("page", self.page.to_string()), ("limit", self.limit.to_string())]
  }
}

impl Default for Pagination {
  fn default() -> Self {
    Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub page: u32,
  pub limit: u32,
  pub total: u64,
  pub total_pages: u64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub pagination: PageInfo,
}

impl<T: DeserializeOwned> Page<T> {
  /// Read `data.{collection}` and `data.pagination`.
  pub fn from_data(mut data: Value, collection: &str) -> Result<Self, BackendError> {
    let items = take_field(&mut data, collection)?;
    let pagination = take_field(&mut data, "pagination")?;
    Ok(Self { items, pagination })
  }
}

/// Remove and decode one field of a `data` object.
pub fn take_field<T: DeserializeOwned>(data: &mut Value, key: &str) -> Result<T, BackendError> {
  let field = data
    .get_mut(key)
    .map(Value::take)
    .ok_or_else(|| BackendError::Decode(format!("missing field `{}`", key)))?;
  serde_json::from_value(field).map_err(|e| BackendError::Decode(format!("field `{}`: {}", key, e)))
}

/// Content collections the backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
  Characters,
  Planets,
  Starships,
  Vehicles,
}

impl ResourceKind {
  /// Path segment, also the key of list payloads
  pub fn collection(&self) -> &'static str {
    match self {
      ResourceKind::Characters => "characters",
      ResourceKind::Planets => "planets",
      ResourceKind::Starships => "starships",
      ResourceKind::Vehicles => "vehicles",
    }
  }

  /// Key of single-record payloads
  pub fn singular(&self) -> &'static str {
    match self {
      ResourceKind::Characters => "character",
      ResourceKind::Planets => "planet",
      ResourceKind::Starships => "starship",
      ResourceKind::Vehicles => "vehicle",
    }
  }

  pub fn entity_type(&self) -> EntityType {
    match self {
      ResourceKind::Characters => EntityType::People,
      ResourceKind::Planets => EntityType::Planets,
      ResourceKind::Starships => EntityType::Starships,
      ResourceKind::Vehicles => EntityType::Vehicles,
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.collection())
  }
}

impl FromStr for ResourceKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.parse::<EntityType>()? {
      EntityType::People => Ok(ResourceKind::Characters),
      EntityType::Planets => Ok(ResourceKind::Planets),
      EntityType::Starships => Ok(ResourceKind::Starships),
      EntityType::Vehicles => Ok(ResourceKind::Vehicles),
      other => Err(format!("the backend does not serve {}", other)),
    }
  }
}

/// Stored content record. Columns beyond the identity vary per resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRecord {
  pub id: String,
  pub uid: String,
  pub name: String,
  #[serde(flatten)]
  pub fields: BTreeMap<String, Value>,
}

impl BackendRecord {
  pub fn into_entity(self, kind: ResourceKind) -> Entity {
    let mut fields = self.fields;
    let description = match fields.remove("description") {
      Some(Value::String(text)) => Some(text),
      _ => None,
    };
    fields.retain(|key, value| !value.is_null() && key != "createdAt" && key != "updatedAt");

    Entity {
      uid: self.uid,
      name: self.name,
      entity_type: kind.entity_type(),
      properties: fields,
      description,
    }
  }
}

/// Account as the backend returns it; passwords are never included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
  pub id: String,
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name: Option<String>,
  #[serde(default)]
  pub avatar: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub is_active: Option<bool>,
}

/// Own-profile changes for `PUT /auth/me`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange<'a> {
  pub current_password: &'a str,
  pub new_password: &'a str,
}

/// Admin changes to any account for `PUT /users/:id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

/// `GET /users/stats` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
  pub total_users: u64,
  pub active_users: u64,
  pub admin_users: u64,
  pub recent_users: u64,
  pub inactive_users: u64,
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
  pub user: BackendUser,
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub username: String,
  pub email: String,
  pub password: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
  pub entity_type: EntityType,
  pub entity_uid: String,
  pub entity_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub entity_data: Option<Value>,
}

impl NewFavorite {
  pub fn from_entity(entity: &Entity) -> Self {
    Self {
      entity_type: entity.entity_type,
      entity_uid: entity.uid.clone(),
      entity_name: entity.name.clone(),
      entity_data: serde_json::to_value(&entity.properties).ok(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFavorite {
  pub id: String,
  pub entity_type: EntityType,
  pub entity_uid: String,
  pub entity_name: String,
  #[serde(default)]
  pub entity_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCheck {
  pub is_favorite: bool,
  #[serde(default)]
  pub favorite: Option<BackendFavorite>,
}

/// `GET /health` body; not wrapped in an envelope
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
  pub status: String,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub timestamp: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
}
