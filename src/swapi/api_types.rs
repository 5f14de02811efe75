//! Serde-deserializable types matching content API responses.
//!
//! These types are separate from domain types to allow lenient
//! deserialization while keeping `Entity` focused on application needs.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::{Entity, EntityType};

// ============================================================================
// List endpoint: GET {base}/{resource}
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse {
  /// Absent on malformed responses (and on endpoints that answer with `result`)
  pub results: Option<Vec<ApiListItem>>,
  #[serde(default)]
  pub total_records: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiListItem {
  #[serde(default)]
  pub uid: String,
  pub name: Option<String>,
  #[serde(default)]
  pub properties: Option<BTreeMap<String, serde_json::Value>>,
  pub description: Option<String>,
}

// ============================================================================
// Detail endpoint: GET {base}/{resource}/{id}
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDetailResponse {
  pub result: Option<ApiDetail>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiDetail {
  #[serde(default)]
  pub uid: String,
  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,
  pub description: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiListItem {
  pub fn into_entity(self, entity_type: EntityType) -> Entity {
    let properties = self.properties.unwrap_or_default();
    let name = self
      .name
      .filter(|n| !n.is_empty())
      .or_else(|| string_property(&properties, "title"))
      .unwrap_or_else(|| "Unknown".to_string());

    Entity {
      uid: self.uid,
      name,
      entity_type,
      properties,
      description: self.description.filter(|d| !d.is_empty()),
    }
  }
}

impl ApiDetail {
  /// Films carry their name under `title`, everything else under `name`.
  pub fn into_entity(self, entity_type: EntityType, requested_id: &str) -> Entity {
    let primary = if entity_type == EntityType::Films {
      "title"
    } else {
      "name"
    };
    let name = string_property(&self.properties, primary)
      .or_else(|| string_property(&self.properties, "name"))
      .or_else(|| string_property(&self.properties, "title"))
      .unwrap_or_else(|| "Unknown".to_string());
    let uid = if self.uid.is_empty() {
      requested_id.to_string()
    } else {
      self.uid
    };

    Entity {
      uid,
      name,
      entity_type,
      properties: self.properties,
      description: self.description.filter(|d| !d.is_empty()),
    }
  }
}

fn string_property(properties: &BTreeMap<String, serde_json::Value>, key: &str) -> Option<String> {
  properties
    .get(key)
    .and_then(|v| v.as_str())
    .filter(|s| !s.is_empty())
    .map(String::from)
}
