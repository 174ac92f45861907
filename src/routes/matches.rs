use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::cache::invalidate_tournament_analytics;
use crate::error::ApiError;
use crate::live;
use crate::schedule::round_robin_fixtures;
use crate::state::SharedState;
use crate::store::models::{Match, MatchStatus, NewMatch, TeamStatus};

/// Score and status write for one match.
#[derive(Debug, Deserialize)]
pub struct ScoreUpdate {
    pub score_a: i32,
    pub score_b: i32,
    pub status: MatchStatus,
}

pub async fn create(
    State(state): State<SharedState>,
    Json(new): Json<NewMatch>,
) -> Result<Json<Match>, ApiError> {
    info!(
        "Creating match: Tournament {}, Team {} vs {}",
        new.tournament_id, new.team_a_id, new.team_b_id
    );

    let tournament = state
        .store
        .tournament(new.tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;

    for team_id in [new.team_a_id, new.team_b_id] {
        let team = state
            .store
            .team(team_id)
            .await?
            .filter(|t| t.tournament_id == tournament.id)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Team {} not found in tournament", team_id))
            })?;
        if team.status != TeamStatus::Approved {
            return Err(ApiError::Validation(format!(
                "Team {} is not approved for matches",
                team_id
            )));
        }
    }

    let created = state.store.create_match(new).await?;
    info!("Match {} created", created.id);
    invalidate_tournament_analytics(&state.cache, created.tournament_id);

    Ok(Json(created))
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Match>>, ApiError> {
    Ok(Json(state.store.all_matches().await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(match_id): Path<i64>,
) -> Result<Json<Match>, ApiError> {
    let row = state
        .store
        .match_by_id(match_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;

    Ok(Json(row))
}

/// Writes both scores and the status, then broadcasts the new state on the
/// match channel and evicts the tournament's analytics cache.
///
/// The broadcast and the eviction are best-effort; the committed update is
/// returned regardless.
pub async fn update_score(
    State(state): State<SharedState>,
    Path(match_id): Path<i64>,
    Json(update): Json<ScoreUpdate>,
) -> Result<Json<Match>, ApiError> {
    info!(
        "Updating score for match {}: {}-{}",
        match_id, update.score_a, update.score_b
    );

    let updated = state
        .store
        .update_score(match_id, update.score_a, update.score_b, update.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;

    state.bus.publish(
        &live::match_channel(match_id),
        &json!({
            "match_id": match_id,
            "score_a": updated.score_a,
            "score_b": updated.score_b,
            "status": updated.status,
        }),
    );

    info!("Match {} score updated and broadcast", match_id);
    invalidate_tournament_analytics(&state.cache, updated.tournament_id);

    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(match_id): Path<i64>,
) -> Result<Json<Match>, ApiError> {
    let deleted = state
        .store
        .delete_match(match_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;

    info!("Match {} deleted", match_id);
    invalidate_tournament_analytics(&state.cache, deleted.tournament_id);

    Ok(Json(deleted))
}

/// Generates the full round-robin fixture list for a tournament.
///
/// One-shot: fails with Conflict once any matches exist, so a re-run never
/// duplicates fixtures.
pub async fn generate(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<Vec<Match>>, ApiError> {
    let tournament = state
        .store
        .tournament(tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;

    let approved: Vec<_> = state
        .store
        .teams_in_tournament(tournament_id)
        .await?
        .into_iter()
        .filter(|t| t.status == TeamStatus::Approved)
        .collect();
    if approved.len() < 2 {
        return Err(ApiError::Validation(
            "At least two approved teams required".to_string(),
        ));
    }

    if state.store.count_matches(tournament_id).await? > 0 {
        return Err(ApiError::Conflict(
            "Matches have already been generated for this tournament".to_string(),
        ));
    }

    let fixtures = round_robin_fixtures(&tournament, &approved)?;
    let created = state.store.create_matches(fixtures).await?;

    info!(
        "Generated {} matches for tournament {}",
        created.len(),
        tournament_id
    );
    invalidate_tournament_analytics(&state.cache, tournament_id);

    Ok(Json(created))
}

/// One match as shown in the schedule view.
#[derive(Debug, Serialize)]
pub struct ScheduleMatch {
    pub match_id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub score_a: i32,
    pub score_b: i32,
    pub status: MatchStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

/// The matches on one field of one day, in start-time order.
#[derive(Debug, Serialize)]
pub struct FieldSchedule {
    pub field_id: String,
    pub matches: Vec<ScheduleMatch>,
}

/// One day of the schedule, fields sorted by name.
#[derive(Debug, Serialize)]
pub struct ScheduleDay {
    pub date: String,
    pub fields: Vec<FieldSchedule>,
}

#[derive(Debug, Serialize)]
pub struct TournamentSchedule {
    pub tournament_id: i64,
    pub tournament_title: String,
    pub schedule: Vec<ScheduleDay>,
}

/// The tournament's matches grouped by date, then by field.
pub async fn tournament_schedule(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<TournamentSchedule>, ApiError> {
    let tournament = state
        .store
        .tournament(tournament_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tournament not found".to_string()))?;

    let matches = state.store.matches_in_tournament(tournament_id).await?;
    if matches.is_empty() {
        return Err(ApiError::NotFound(
            "No matches found for this tournament".to_string(),
        ));
    }

    // BTreeMap keys keep both days and fields sorted; ISO dates order
    // lexicographically.
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<ScheduleMatch>>> = BTreeMap::new();
    for m in matches {
        let date = m
            .start_time
            .map(|t| t.date().to_string())
            .unwrap_or_else(|| "Unknown Date".to_string());
        let field = m
            .field_id
            .clone()
            .unwrap_or_else(|| "Unknown Field".to_string());

        grouped
            .entry(date)
            .or_default()
            .entry(field)
            .or_default()
            .push(ScheduleMatch {
                match_id: m.id,
                team_a_id: m.team_a_id,
                team_b_id: m.team_b_id,
                score_a: m.score_a,
                score_b: m.score_b,
                status: m.status,
                start_time: m.start_time,
                end_time: m.end_time,
            });
    }

    let schedule = grouped
        .into_iter()
        .map(|(date, fields)| ScheduleDay {
            date,
            fields: fields
                .into_iter()
                .map(|(field_id, mut matches)| {
                    matches.sort_by_key(|m| m.start_time);
                    FieldSchedule { field_id, matches }
                })
                .collect(),
        })
        .collect();

    Ok(Json(TournamentSchedule {
        tournament_id,
        tournament_title: tournament.title,
        schedule,
    }))
}
