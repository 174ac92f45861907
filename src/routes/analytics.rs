use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use crate::cache::{tournament_analytics_key, GLOBAL_ANALYTICS_KEY};
use crate::error::ApiError;
use crate::state::SharedState;

/// Aggregate analytics across all tournaments, served through the cache.
///
/// A hit returns the cached payload as-is; a miss recomputes from the store
/// and caches the result until the TTL or the next invalidation.
pub async fn overview(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    if let Some(cached) = state.cache.get(GLOBAL_ANALYTICS_KEY) {
        debug!("Analytics cache hit: global");
        return Ok(Json(cached));
    }

    let data = state.store.global_analytics().await?;
    let body = json!({ "scope": "global", "data": data });
    state.cache.put(GLOBAL_ANALYTICS_KEY, body.clone());

    Ok(Json(body))
}

/// Aggregate analytics for one tournament, served through the cache.
pub async fn tournament_analytics(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let key = tournament_analytics_key(tournament_id);
    if let Some(cached) = state.cache.get(&key) {
        debug!("Analytics cache hit: tournament {}", tournament_id);
        return Ok(Json(cached));
    }

    let data = state
        .store
        .tournament_analytics(tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;
    let body = json!({ "scope": "tournament", "data": data });
    state.cache.put(&key, body.clone());

    Ok(Json(body))
}
