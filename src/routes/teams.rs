use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::cache::invalidate_tournament_analytics;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::store::models::{Team, TeamStatus};

#[derive(Debug, Deserialize)]
pub struct TeamRegistration {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TeamStatus,
}

/// Registers a team in a tournament with pending status.
///
/// Team names are unique per tournament, case-insensitively.
pub async fn register(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
    Json(registration): Json<TeamRegistration>,
) -> Result<Json<Team>, ApiError> {
    state
        .store
        .tournament(tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;

    if state
        .store
        .find_team_named(tournament_id, &registration.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "A team named '{}' already exists in this tournament",
            registration.name
        )));
    }

    let team = state
        .store
        .create_team(tournament_id, &registration.name)
        .await?;
    info!(
        "Team {} ('{}') registered in tournament {}",
        team.id, team.name, tournament_id
    );
    invalidate_tournament_analytics(&state.cache, tournament_id);

    Ok(Json(team))
}

pub async fn list(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<Vec<Team>>, ApiError> {
    Ok(Json(state.store.teams_in_tournament(tournament_id).await?))
}

/// Moves a team between pending, approved and rejected.
pub async fn set_status(
    State(state): State<SharedState>,
    Path(team_id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Team>, ApiError> {
    let team = state
        .store
        .set_team_status(team_id, update.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    info!("Team {} is now {}", team.id, team.status);
    invalidate_tournament_analytics(&state.cache, team.tournament_id);

    Ok(Json(team))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(team_id): Path<i64>,
) -> Result<Json<Team>, ApiError> {
    let team = state
        .store
        .delete_team(team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    info!("Team {} deleted", team_id);
    invalidate_tournament_analytics(&state.cache, team.tournament_id);

    Ok(Json(team))
}
