//! Application state store.
//!
//! State changes go through `reduce`; persistence follows from the
//! transition via `effects_for`. The `Store` owns both halves plus the
//! storage backend and is driven from the UI thread.

pub mod effects;
pub mod persistence;
pub mod preferences;
pub mod search;
pub mod state;

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::connectivity::Connectivity;
use crate::storage::{KeyValueStore, DATA_KEY, FAVORITES_KEY, PREFERENCES_KEY};
use crate::swapi::client::{ListOutcome, MAX_SEARCH_RESULTS};
use crate::swapi::preview::preview_entities;
use crate::swapi::types::{validate_entity, Entity, EntityType, InvalidEntity};

use effects::{effects_for, Effect};
use preferences::Preferences;
use state::{reduce, Action, AppState};

/// Status shown when a refresh could not reach the content API at all
pub const OFFLINE_MESSAGE: &str = "offline: showing stored data";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FavoriteError {
  #[error("cannot favorite entity: {0}")]
  Invalid(#[from] InvalidEntity),
}

/// What startup hydration found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPlan {
  /// A fresh snapshot was loaded; no network this session
  FromStorage,
  /// Preview data is showing and a background refresh should run
  NeedsRefresh,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
  pub refreshed: usize,
  pub failed: usize,
}

pub struct Store {
  state: AppState,
  preferences: Preferences,
  storage: Box<dyn KeyValueStore>,
  clock: Arc<dyn Clock>,
  connectivity: Arc<dyn Connectivity>,
  freshness: Duration,
}

impl Store {
  pub fn new(
    storage: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    connectivity: Arc<dyn Connectivity>,
    freshness: Duration,
  ) -> Self {
    let state = AppState::new(connectivity.is_online());
    Self {
      state,
      preferences: Preferences::default(),
      storage,
      clock,
      connectivity,
      freshness,
    }
  }

  pub fn state(&self) -> &AppState {
    &self.state
  }

  pub fn preferences(&self) -> &Preferences {
    &self.preferences
  }

  /// Current time as seen by the store's clock
  pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
    self.clock.now()
  }

  /// Apply an action and run the storage effects it implies.
  pub fn dispatch(&mut self, action: Action) {
    let before = self.state.clone();
    self.apply(action.clone());
    for effect in effects_for(&action, &before, &self.state) {
      self.run_effect(effect);
    }
  }

  /// Apply an action without touching storage.
  fn apply(&mut self, action: Action) {
    let state = std::mem::replace(&mut self.state, AppState::new(false));
    self.state = reduce(state, action);
  }

  fn run_effect(&mut self, effect: Effect) {
    let storage = self.storage.as_mut();
    match effect {
      Effect::PersistFavorites => {
        persistence::write_json(storage, FAVORITES_KEY, &self.state.favorites)
      }
      Effect::ClearFavorites => persistence::remove_key(storage, FAVORITES_KEY),
      Effect::PersistSnapshot => persistence::write_json(storage, DATA_KEY, &self.state.snapshot()),
      Effect::ClearSnapshot => persistence::remove_key(storage, DATA_KEY),
    }
  }

  /// Restore favorites, preferences and, when fresh enough, the entity
  /// snapshot. Falls back to bundled preview data otherwise.
  pub fn hydrate(&mut self) -> LoadPlan {
    self.restore_favorites();
    self.preferences = persistence::load_preferences(self.storage.as_mut());

    let now = self.clock.now();
    if let Some(snapshot) = persistence::load_snapshot(self.storage.as_mut()) {
      if snapshot.is_fresh(now, self.freshness) {
        info!(entities = snapshot.lists.total(), "using stored snapshot");
        self.apply(Action::LoadFromStorage(snapshot));
        return LoadPlan::FromStorage;
      }
      debug!(last_fetch = ?snapshot.last_fetch, "stored snapshot is stale");
    }

    for entity_type in EntityType::BROWSABLE {
      self.apply(Action::SetEntities(entity_type, preview_entities(entity_type)));
    }
    LoadPlan::NeedsRefresh
  }

  /// Load stored favorites into state, leaving lists untouched.
  pub fn restore_favorites(&mut self) -> &[Entity] {
    let favorites = persistence::load_favorites(self.storage.as_mut());
    debug!(count = favorites.len(), "loaded favorites");
    self.apply(Action::SetFavorites(favorites));
    &self.state.favorites
  }

  /// Merge refreshed lists. Failed or empty types keep what they had.
  pub fn apply_refresh(&mut self, outcomes: Vec<ListOutcome>) -> RefreshSummary {
    let mut summary = RefreshSummary::default();

    for (entity_type, outcome) in outcomes {
      match outcome {
        Ok(entities) if !entities.is_empty() => {
          self.dispatch(Action::SetEntities(entity_type, entities));
          summary.refreshed += 1;
        }
        Ok(_) => debug!(resource = entity_type.resource(), "empty list, keeping previous"),
        Err(e) => {
          debug!(resource = entity_type.resource(), error = %e, "keeping previous list");
          summary.failed += 1;
        }
      }
    }

    if summary.refreshed > 0 {
      self.dispatch(Action::SetLastFetch(Some(self.clock.now())));
      if self.state.error.is_some() {
        self.dispatch(Action::SetError(None));
      }
    } else if summary.failed > 0 {
      warn!(failed = summary.failed, "refresh reached no content");
      self.dispatch(Action::SetError(Some(OFFLINE_MESSAGE.to_string())));
    }

    self.dispatch(Action::SetLoading(false));
    summary
  }

  /// Returns whether the entity was newly added.
  pub fn add_favorite(&mut self, entity: Entity) -> Result<bool, FavoriteError> {
    validate_entity(&entity)?;
    if self.is_favorite(&entity.uid, entity.entity_type) {
      return Ok(false);
    }
    self.dispatch(Action::AddFavorite(entity));
    Ok(true)
  }

  /// Returns whether anything was removed.
  pub fn remove_favorite(&mut self, uid: &str, entity_type: EntityType) -> bool {
    if !self.is_favorite(uid, entity_type) {
      return false;
    }
    self.dispatch(Action::RemoveFavorite {
      uid: uid.to_string(),
      entity_type,
    });
    true
  }

  /// Returns whether the entity is a favorite afterwards.
  pub fn toggle_favorite(&mut self, entity: &Entity) -> Result<bool, FavoriteError> {
    if self.remove_favorite(&entity.uid, entity.entity_type) {
      return Ok(false);
    }
    self.add_favorite(entity.clone())?;
    Ok(true)
  }

  pub fn is_favorite(&self, uid: &str, entity_type: EntityType) -> bool {
    self.state.is_favorite(uid, entity_type)
  }

  pub fn favorites_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
    self
      .state
      .favorites
      .iter()
      .filter(|f| f.entity_type == entity_type)
      .collect()
  }

  pub fn clear_favorites(&mut self) {
    self.dispatch(Action::SetFavorites(Vec::new()));
  }

  /// Search the loaded lists and record term and results in state.
  pub fn search_entities(&mut self, term: &str) -> Vec<Entity> {
    let results = search::search_entities(&self.state.lists, term, MAX_SEARCH_RESULTS);
    self.dispatch(Action::SetSearchTerm(term.to_string()));
    self.dispatch(Action::SetSearchResults(results.clone()));
    results
  }

  /// Drop the stored snapshot and start over, keeping favorites.
  pub fn clear_cache(&mut self) {
    info!("clearing stored snapshot");
    self.dispatch(Action::Reset);
  }

  pub fn retry_operation(&mut self) {
    self.dispatch(Action::SetRetryCount(self.state.retry_count + 1));
    self.dispatch(Action::SetError(None));
  }

  /// Pull the connectivity status into state. Returns the current status.
  pub fn sync_connectivity(&mut self) -> bool {
    let online = self.connectivity.is_online();
    if online != self.state.is_online {
      self.dispatch(Action::SetOnlineStatus(online));
    }
    online
  }

  pub fn update_preferences(&mut self, update: impl FnOnce(&mut Preferences)) {
    update(&mut self.preferences);
    persistence::write_json(self.storage.as_mut(), PREFERENCES_KEY, &self.preferences);
  }

  pub fn set_error(&mut self, error: Option<String>) {
    self.dispatch(Action::SetError(error));
  }
}
