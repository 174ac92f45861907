use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use crate::cache::{invalidate_global_analytics, invalidate_tournament_analytics};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::store::models::{NewTournament, Tournament};

pub async fn create(
    State(state): State<SharedState>,
    Json(new): Json<NewTournament>,
) -> Result<Json<Tournament>, ApiError> {
    if state.store.tournament_by_slug(&new.slug).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "A tournament with slug '{}' already exists",
            new.slug
        )));
    }

    let created = state.store.create_tournament(new).await?;
    info!("Tournament {} ('{}') created", created.id, created.title);
    invalidate_global_analytics(&state.cache);

    Ok(Json(created))
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Tournament>>, ApiError> {
    Ok(Json(state.store.published_tournaments().await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<Tournament>, ApiError> {
    let tournament = state
        .store
        .tournament(tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;

    Ok(Json(tournament))
}

/// Deletes a tournament; its teams, matches and spirit scores cascade away
/// with it.
pub async fn remove(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_tournament(tournament_id).await? {
        return Err(ApiError::NotFound("Tournament not found".to_string()));
    }

    info!("Tournament {} deleted", tournament_id);
    invalidate_global_analytics(&state.cache);
    invalidate_tournament_analytics(&state.cache, tournament_id);

    Ok(Json(serde_json::json!({ "deleted": tournament_id })))
}
