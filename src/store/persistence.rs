//! Best-effort JSON persistence on top of a key-value store.
//!
//! Nothing here fails the caller. Unreadable values are dropped and failed
//! writes remove the key so a half-written value never outlives a session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::preferences::Preferences;
use super::state::DataSnapshot;
use crate::storage::{KeyValueStore, DATA_KEY, FAVORITES_KEY, PREFERENCES_KEY};
use crate::swapi::types::{validate_entity, Entity};

fn read_json<T: DeserializeOwned>(store: &mut dyn KeyValueStore, key: &str) -> Option<T> {
  let raw = match store.get(key) {
    Ok(Some(raw)) => raw,
    Ok(None) => return None,
    Err(e) => {
      warn!(key, error = %e, "failed to read stored value");
      return None;
    }
  };

  match serde_json::from_str(&raw) {
    Ok(value) => Some(value),
    Err(e) => {
      warn!(key, error = %e, "discarding unreadable stored value");
      remove_key(store, key);
      None
    }
  }
}

pub fn write_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
  let result = serde_json::to_string(value)
    .map_err(|e| e.to_string())
    .and_then(|raw| store.set(key, &raw).map_err(|e| e.to_string()));

  match result {
    Ok(()) => debug!(key, "stored value"),
    Err(error) => {
      warn!(key, %error, "failed to store value, clearing it");
      remove_key(store, key);
    }
  }
}

pub fn remove_key(store: &mut dyn KeyValueStore, key: &str) {
  if let Err(e) = store.remove(key) {
    warn!(key, error = %e, "failed to remove stored value");
  }
}

/// Stored favorites, skipping records without identity and duplicates.
pub fn load_favorites(store: &mut dyn KeyValueStore) -> Vec<Entity> {
  let stored: Vec<Entity> = read_json(store, FAVORITES_KEY).unwrap_or_default();
  let mut favorites: Vec<Entity> = Vec::with_capacity(stored.len());

  for entity in stored {
    if let Err(e) = validate_entity(&entity) {
      warn!(uid = %entity.uid, error = %e, "skipping stored favorite");
      continue;
    }
    if !favorites.iter().any(|f| f.same_identity(&entity)) {
      favorites.push(entity);
    }
  }
  favorites
}

pub fn load_snapshot(store: &mut dyn KeyValueStore) -> Option<DataSnapshot> {
  read_json(store, DATA_KEY)
}

pub fn load_preferences(store: &mut dyn KeyValueStore) -> Preferences {
  read_json(store, PREFERENCES_KEY).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStore;
  use crate::swapi::types::EntityType;

  #[test]
  fn test_corrupt_value_is_removed() {
    let mut store = MemoryStore::new();
    store.set(FAVORITES_KEY, "{not json").unwrap();

    assert!(load_favorites(&mut store).is_empty());
    assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
  }

  #[test]
  fn test_invalid_and_duplicate_favorites_are_skipped() {
    let mut store = MemoryStore::new();
    store
      .set(
        FAVORITES_KEY,
        r#"[
          {"uid": "1", "name": "Luke Skywalker", "type": "people"},
          {"uid": "", "name": "Nobody", "type": "people"},
          {"uid": "1", "name": "Luke Skywalker", "type": "people"},
          {"uid": "1", "name": "Tatooine", "type": "planets"}
        ]"#,
      )
      .unwrap();

    let favorites = load_favorites(&mut store);
    assert_eq!(favorites.len(), 2);
    assert_eq!(favorites[1].entity_type, EntityType::Planets);
  }

  #[test]
  fn test_write_over_quota_clears_key() {
    let mut store = MemoryStore::with_quota(64);
    store.set(FAVORITES_KEY, "[]").unwrap();

    let big: Vec<Entity> = (0..10)
      .map(|i| Entity::new(EntityType::People, i.to_string(), "A long enough name"))
      .collect();
    write_json(&mut store, FAVORITES_KEY, &big);

    assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
  }

  #[test]
  fn test_missing_preferences_use_defaults() {
    let mut store = MemoryStore::new();
    assert_eq!(load_preferences(&mut store), Preferences::default());
  }
}
