//! Storage side effects that follow a state transition.

use super::state::{Action, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
  PersistFavorites,
  ClearFavorites,
  PersistSnapshot,
  ClearSnapshot,
}

/// Effects owed after `action` moved the state from `before` to `after`.
///
/// Favorites are written whenever they change and cleared when they become
/// empty. The snapshot is written only once there are characters or films to
/// keep.
pub fn effects_for(action: &Action, before: &AppState, after: &AppState) -> Vec<Effect> {
  if matches!(action, Action::Reset) {
    return vec![Effect::ClearSnapshot];
  }

  let mut effects = Vec::new();

  if before.favorites != after.favorites {
    if after.favorites.is_empty() {
      effects.push(Effect::ClearFavorites);
    } else {
      effects.push(Effect::PersistFavorites);
    }
  }

  let data_changed = before.lists != after.lists || before.last_fetch != after.last_fetch;
  if data_changed && after.lists.has_core_data() {
    effects.push(Effect::PersistSnapshot);
  }

  effects
}
