use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, RequestQueue};
use crate::swapi::api_types::{ApiDetailResponse, ApiListResponse};
use crate::swapi::transport::FetchError;
use crate::swapi::types::{Entity, EntityType};

/// Maximum number of matches returned by character search
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Outcome of one list fetch during a refresh, kept per type
pub type ListOutcome = (EntityType, Result<Vec<Entity>, FetchError>);

/// Content API client. All requests go through the shared request queue.
#[derive(Clone)]
pub struct SwapiClient {
  queue: RequestQueue,
  base_url: String,
  preview_limit: usize,
}

impl SwapiClient {
  pub fn new(queue: RequestQueue, base_url: &str, preview_limit: usize) -> Self {
    Self {
      queue,
      base_url: base_url.trim_end_matches('/').to_string(),
      preview_limit,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Fetch the preview list for a type, failing on transport errors or a
  /// response without a `results` array.
  pub async fn try_fetch_list(&self, entity_type: EntityType) -> Result<Vec<Entity>, FetchError> {
    let url = format!("{}/{}", self.base_url, entity_type.resource());
    debug!(%url, "fetching list");

    let response = self.queue.get(&url).await?;
    let cached = response.is_cached();
    if let Some(at) = response.cached_at {
      debug!(%url, cached_at = %at, "serving cached list");
    }
    let parsed: ApiListResponse =
      serde_json::from_value(response.data).map_err(|e| FetchError::Malformed {
        url: url.clone(),
        message: e.to_string(),
      })?;

    let results = parsed.results.ok_or_else(|| FetchError::Malformed {
      url: url.clone(),
      message: "response has no results array".to_string(),
    })?;

    debug!(
      %url,
      found = results.len(),
      cached,
      total = parsed.total_records.unwrap_or(results.len() as u64),
      "list fetched"
    );

    Ok(
      results
        .into_iter()
        .take(self.preview_limit)
        .map(|item| item.into_entity(entity_type))
        .collect(),
    )
  }

  /// Fetch the preview list for a type, degrading to an empty list.
  pub async fn fetch_list(&self, entity_type: EntityType) -> Vec<Entity> {
    match self.try_fetch_list(entity_type).await {
      Ok(entities) => entities,
      Err(e) => {
        warn!(resource = entity_type.resource(), error = %e, "list fetch failed");
        Vec::new()
      }
    }
  }

  pub async fn fetch_films(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::Films).await
  }

  pub async fn fetch_characters(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::People).await
  }

  pub async fn fetch_planets(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::Planets).await
  }

  pub async fn fetch_species(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::Species).await
  }

  pub async fn fetch_starships(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::Starships).await
  }

  pub async fn fetch_vehicles(&self) -> Vec<Entity> {
    self.fetch_list(EntityType::Vehicles).await
  }

  /// Fetch every browsable list. Requests are submitted together and drain
  /// through the queue in order; each outcome settles independently.
  pub async fn fetch_all_lists(&self) -> Vec<ListOutcome> {
    let fetches = EntityType::BROWSABLE.iter().map(|&entity_type| async move {
      (entity_type, self.try_fetch_list(entity_type).await)
    });
    let outcomes = join_all(fetches).await;

    let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    info!(total = outcomes.len(), failed, "list refresh finished");
    outcomes
  }

  /// Fetch one entity with its full properties; `None` on any failure.
  pub async fn fetch_entity_details(&self, entity_type: EntityType, id: &str) -> Option<Entity> {
    let url = format!("{}/{}/{}", self.base_url, entity_type.resource(), id);

    let data: Value = match self.queue.get(&url).await {
      Ok(response) => response.data,
      Err(e) => {
        warn!(%url, error = %e, "detail fetch failed");
        return None;
      }
    };

    match serde_json::from_value::<ApiDetailResponse>(data) {
      Ok(ApiDetailResponse {
        result: Some(detail),
      }) => Some(detail.into_entity(entity_type, id)),
      Ok(_) => {
        warn!(%url, "no data found");
        None
      }
      Err(e) => {
        warn!(%url, error = %e, "malformed detail response");
        None
      }
    }
  }

  /// Case-insensitive name search over the character preview list.
  pub async fn search_characters(&self, query: &str) -> Vec<Entity> {
    let needle = query.to_lowercase();
    self
      .fetch_characters()
      .await
      .into_iter()
      .filter(|c| c.name.to_lowercase().contains(&needle))
      .take(MAX_SEARCH_RESULTS)
      .collect()
  }

  /// Whether the content API answers at all (bypasses cache and queue).
  pub async fn check_api_health(&self) -> bool {
    let url = format!("{}/people/1", self.base_url);
    self.queue.is_reachable(&url).await
  }

  pub fn clear_cache(&self) {
    self.queue.clear_cache();
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.queue.cache_stats()
  }
}
