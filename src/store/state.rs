//! Application state and its pure transition function.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::swapi::types::{Entity, EntityType};

/// One list of entities per browsable type.
///
/// Field names double as the persisted snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityLists {
  pub characters: Vec<Entity>,
  pub films: Vec<Entity>,
  pub planets: Vec<Entity>,
  pub species: Vec<Entity>,
  pub starships: Vec<Entity>,
  pub vehicles: Vec<Entity>,
}

impl EntityLists {
  pub fn get(&self, entity_type: EntityType) -> &[Entity] {
    match entity_type {
      EntityType::People => &self.characters,
      EntityType::Films => &self.films,
      EntityType::Planets => &self.planets,
      EntityType::Species => &self.species,
      EntityType::Starships => &self.starships,
      EntityType::Vehicles => &self.vehicles,
      EntityType::Transports => &[],
    }
  }

  /// Replace the list for a type. Transports have no slot and are dropped.
  pub fn set(&mut self, entity_type: EntityType, entities: Vec<Entity>) {
    let slot = match entity_type {
      EntityType::People => &mut self.characters,
      EntityType::Films => &mut self.films,
      EntityType::Planets => &mut self.planets,
      EntityType::Species => &mut self.species,
      EntityType::Starships => &mut self.starships,
      EntityType::Vehicles => &mut self.vehicles,
      EntityType::Transports => return,
    };
    *slot = entities;
  }

  /// All entities, in home view section order
  pub fn iter(&self) -> impl Iterator<Item = &Entity> {
    EntityType::BROWSABLE
      .into_iter()
      .flat_map(move |t| self.get(t).iter())
  }

  pub fn total(&self) -> usize {
    EntityType::BROWSABLE.iter().map(|t| self.get(*t).len()).sum()
  }

  /// Whether there is anything worth persisting
  pub fn has_core_data(&self) -> bool {
    !self.characters.is_empty() || !self.films.is_empty()
  }
}

/// Persisted entity snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
  #[serde(flatten)]
  pub lists: EntityLists,
  #[serde(
    rename = "lastFetch",
    default,
    with = "chrono::serde::ts_milliseconds_option"
  )]
  pub last_fetch: Option<DateTime<Utc>>,
}

impl DataSnapshot {
  /// A snapshot without a fetch time is never fresh.
  pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
    self
      .last_fetch
      .map(|fetched| now - fetched <= window)
      .unwrap_or(false)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
  pub lists: EntityLists,
  /// Insertion-ordered, unique per (type, uid)
  pub favorites: Vec<Entity>,
  pub loading: bool,
  pub search_term: String,
  pub search_results: Vec<Entity>,
  pub last_fetch: Option<DateTime<Utc>>,
  pub error: Option<String>,
  pub retry_count: u32,
  pub is_online: bool,
}

impl AppState {
  pub fn new(is_online: bool) -> Self {
    Self {
      lists: EntityLists::default(),
      favorites: Vec::new(),
      loading: false,
      search_term: String::new(),
      search_results: Vec::new(),
      last_fetch: None,
      error: None,
      retry_count: 0,
      is_online,
    }
  }

  pub fn snapshot(&self) -> DataSnapshot {
    DataSnapshot {
      lists: self.lists.clone(),
      last_fetch: self.last_fetch,
    }
  }

  pub fn is_favorite(&self, uid: &str, entity_type: EntityType) -> bool {
    self.favorites.iter().any(|f| f.matches(uid, entity_type))
  }
}

/// Every way the state can change
#[derive(Debug, Clone)]
pub enum Action {
  SetEntities(EntityType, Vec<Entity>),
  AddFavorite(Entity),
  RemoveFavorite {
    uid: String,
    entity_type: EntityType,
  },
  SetFavorites(Vec<Entity>),
  SetLoading(bool),
  SetSearchTerm(String),
  SetSearchResults(Vec<Entity>),
  LoadFromStorage(DataSnapshot),
  SetLastFetch(Option<DateTime<Utc>>),
  SetError(Option<String>),
  SetRetryCount(u32),
  SetOnlineStatus(bool),
  /// Back to the initial state, keeping favorites and the online flag
  Reset,
}

/// Pure state transition.
pub fn reduce(mut state: AppState, action: Action) -> AppState {
  match action {
    Action::SetEntities(entity_type, entities) => state.lists.set(entity_type, entities),
    Action::AddFavorite(entity) => {
      if !state.is_favorite(&entity.uid, entity.entity_type) {
        state.favorites.push(entity);
      }
    }
    Action::RemoveFavorite { uid, entity_type } => {
      state.favorites.retain(|f| !f.matches(&uid, entity_type));
    }
    Action::SetFavorites(favorites) => state.favorites = favorites,
    Action::SetLoading(loading) => state.loading = loading,
    Action::SetSearchTerm(term) => state.search_term = term,
    Action::SetSearchResults(results) => state.search_results = results,
    Action::LoadFromStorage(snapshot) => {
      state.lists = snapshot.lists;
      state.last_fetch = snapshot.last_fetch;
    }
    Action::SetLastFetch(at) => state.last_fetch = at,
    Action::SetError(error) => state.error = error,
    Action::SetRetryCount(count) => state.retry_count = count,
    Action::SetOnlineStatus(online) => state.is_online = online,
    Action::Reset => {
      return AppState {
        favorites: state.favorites,
        ..AppState::new(state.is_online)
      };
    }
  }
  state
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::start_time;

  fn luke() -> Entity {
    Entity::new(EntityType::People, "1", "Luke Skywalker")
  }

  #[test]
  fn test_add_favorite_twice_keeps_one() {
    let state = reduce(AppState::new(true), Action::AddFavorite(luke()));
    let state = reduce(state, Action::AddFavorite(luke()));
    assert_eq!(state.favorites.len(), 1);
  }

  #[test]
  fn test_same_uid_different_type_are_distinct() {
    let tatooine = Entity::new(EntityType::Planets, "1", "Tatooine");
    let state = reduce(AppState::new(true), Action::AddFavorite(luke()));
    let state = reduce(state, Action::AddFavorite(tatooine));
    assert_eq!(state.favorites.len(), 2);

    let state = reduce(
      state,
      Action::RemoveFavorite {
        uid: "1".to_string(),
        entity_type: EntityType::Planets,
      },
    );
    assert_eq!(state.favorites, vec![luke()]);
  }

  #[test]
  fn test_remove_missing_favorite_is_noop() {
    let before = reduce(AppState::new(true), Action::AddFavorite(luke()));
    let after = reduce(
      before.clone(),
      Action::RemoveFavorite {
        uid: "42".to_string(),
        entity_type: EntityType::People,
      },
    );
    assert_eq!(before, after);
  }

  #[test]
  fn test_reset_keeps_favorites_and_online_flag() {
    let mut state = reduce(AppState::new(false), Action::AddFavorite(luke()));
    state = reduce(state, Action::SetEntities(EntityType::Films, vec![luke()]));
    state = reduce(state, Action::SetError(Some("boom".to_string())));
    state = reduce(state, Action::SetLastFetch(Some(start_time())));

    let state = reduce(state, Action::Reset);

    assert_eq!(state.favorites, vec![luke()]);
    assert!(!state.is_online);
    assert_eq!(state.lists.total(), 0);
    assert_eq!(state.error, None);
    assert_eq!(state.last_fetch, None);
  }

  #[test]
  fn test_transports_list_is_ignored() {
    let transport = Entity::new(EntityType::Transports, "1", "Shuttle");
    let state = reduce(
      AppState::new(true),
      Action::SetEntities(EntityType::Transports, vec![transport]),
    );
    assert_eq!(state.lists.total(), 0);
  }

  #[test]
  fn test_load_from_storage_replaces_lists() {
    let mut lists = EntityLists::default();
    lists.set(EntityType::People, vec![luke()]);
    let snapshot = DataSnapshot {
      lists,
      last_fetch: Some(start_time()),
    };

    let state = reduce(AppState::new(true), Action::LoadFromStorage(snapshot));
    assert_eq!(state.lists.characters, vec![luke()]);
    assert_eq!(state.last_fetch, Some(start_time()));
  }

  #[test]
  fn test_snapshot_format() {
    let mut lists = EntityLists::default();
    lists.set(EntityType::People, vec![luke()]);
    let snapshot = DataSnapshot {
      lists,
      last_fetch: Some(start_time()),
    };

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["characters"][0]["name"], "Luke Skywalker");
    assert_eq!(json["lastFetch"], start_time().timestamp_millis());
    assert!(json["vehicles"].as_array().unwrap().is_empty());

    let parsed: DataSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, snapshot);
  }

  #[test]
  fn test_snapshot_null_last_fetch_is_stale() {
    let parsed: DataSnapshot =
      serde_json::from_str(r#"{"characters": [], "lastFetch": null}"#).unwrap();
    assert!(!parsed.is_fresh(start_time(), Duration::minutes(30)));
  }

  #[test]
  fn test_snapshot_freshness_window() {
    let snapshot = DataSnapshot {
      lists: EntityLists::default(),
      last_fetch: Some(start_time()),
    };
    let window = Duration::minutes(30);
    assert!(snapshot.is_fresh(start_time() + Duration::minutes(5), window));
    assert!(!snapshot.is_fresh(start_time() + Duration::minutes(31), window));
  }
}
