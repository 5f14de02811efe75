//! Name search and ordering over loaded entity lists.

use super::preferences::SortOrder;
use super::state::EntityLists;
use crate::swapi::types::Entity;

/// Case-insensitive substring match on names across every list, in list
/// order, capped at `limit`. A blank term matches nothing.
pub fn search_entities(lists: &EntityLists, term: &str, limit: usize) -> Vec<Entity> {
  let needle = term.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }

  lists
    .iter()
    .filter(|e| e.name.to_lowercase().contains(&needle))
    .take(limit)
    .cloned()
    .collect()
}

/// Filter by name or type name; a blank term keeps everything.
pub fn filter_entities_by_search<'a>(entities: &'a [Entity], term: &str) -> Vec<&'a Entity> {
  let needle = term.trim().to_lowercase();
  entities
    .iter()
    .filter(|e| {
      needle.is_empty()
        || e.name.to_lowercase().contains(&needle)
        || e.entity_type.resource().contains(&needle)
    })
    .collect()
}

pub fn sort_entities_by_name(entities: &mut [Entity], order: SortOrder) {
  entities.sort_by(|a, b| {
    let ord = a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match order {
      SortOrder::Asc => ord,
      SortOrder::Desc => ord.reverse(),
    }
  });
}
