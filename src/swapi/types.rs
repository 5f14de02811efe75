use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of content record served by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
  People,
  Planets,
  Starships,
  Vehicles,
  Films,
  Species,
  Transports,
}

impl EntityType {
  /// Types fetched on startup, in the order the home view shows them
  pub const BROWSABLE: [EntityType; 6] = [
    EntityType::Films,
    EntityType::People,
    EntityType::Planets,
    EntityType::Species,
    EntityType::Starships,
    EntityType::Vehicles,
  ];

  /// Path segment of the resource on the content API
  pub fn resource(&self) -> &'static str {
    match self {
      EntityType::People => "people",
      EntityType::Planets => "planets",
      EntityType::Starships => "starships",
      EntityType::Vehicles => "vehicles",
      EntityType::Films => "films",
      EntityType::Species => "species",
      EntityType::Transports => "transports",
    }
  }

  /// Human-readable section title
  pub fn display_name(&self) -> &'static str {
    match self {
      EntityType::People => "Characters",
      EntityType::Planets => "Planets",
      EntityType::Starships => "Starships",
      EntityType::Vehicles => "Vehicles",
      EntityType::Films => "Films",
      EntityType::Species => "Species",
      EntityType::Transports => "Transports",
    }
  }
}

impl fmt::Display for EntityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.resource())
  }
}

impl FromStr for EntityType {
  type Err = String;

  /// Accepts resource names plus the "characters" alias used by the UI.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "people" | "characters" | "character" => Ok(EntityType::People),
      "planets" | "planet" => Ok(EntityType::Planets),
      "starships" | "starship" => Ok(EntityType::Starships),
      "vehicles" | "vehicle" => Ok(EntityType::Vehicles),
      "films" | "film" => Ok(EntityType::Films),
      "species" => Ok(EntityType::Species),
      "transports" | "transport" => Ok(EntityType::Transports),
      other => Err(format!("unknown entity type: {}", other)),
    }
  }
}

/// A content record. Identity is (entity_type, uid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
  pub uid: String,
  pub name: String,
  #[serde(rename = "type")]
  pub entity_type: EntityType,
  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Entity {
  pub fn new(entity_type: EntityType, uid: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      uid: uid.into(),
      name: name.into(),
      entity_type,
      properties: BTreeMap::new(),
      description: None,
    }
  }

  pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
    self.properties.insert(key.to_string(), value.into());
    self
  }

  /// True when both entities refer to the same record
  pub fn same_identity(&self, other: &Entity) -> bool {
    self.matches(&other.uid, other.entity_type)
  }

  pub fn matches(&self, uid: &str, entity_type: EntityType) -> bool {
    self.uid == uid && self.entity_type == entity_type
  }

  /// Property value rendered as plain text
  pub fn property_text(&self, key: &str) -> Option<String> {
    self.properties.get(key).map(|v| match v {
      serde_json::Value::String(s) => s.clone(),
      serde_json::Value::Null => String::new(),
      other => other.to_string(),
    })
  }
}

/// Why an entity cannot be stored as a favorite
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEntity {
  #[error("entity has an empty uid")]
  MissingUid,
  #[error("entity has an empty name")]
  MissingName,
}

/// Check that the identifying fields of an entity are populated.
pub fn validate_entity(entity: &Entity) -> Result<(), InvalidEntity> {
  if entity.uid.is_empty() {
    return Err(InvalidEntity::MissingUid);
  }
  if entity.name.is_empty() {
    return Err(InvalidEntity::MissingName);
  }
  Ok(())
}
