use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiError;
use crate::leaderboard::{self, LeaderboardEntry};
use crate::live;
use crate::state::SharedState;

/// Computes and returns the ranked standings for a tournament.
///
/// Every read also re-broadcasts the full ranked list on the tournament's
/// leaderboard channel, so viewers get fresh standings whenever anyone looks
/// at them. The read and the broadcast are deliberately one operation.
pub async fn tournament_leaderboard(
    State(state): State<SharedState>,
    Path(tournament_id): Path<i64>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let teams = state.store.teams_in_tournament(tournament_id).await?;
    if teams.is_empty() {
        return Err(ApiError::NotFound(
            "No teams found for this tournament".to_string(),
        ));
    }

    let matches = state.store.matches_in_tournament(tournament_id).await?;

    let mut spirit_avgs = HashMap::new();
    for team in &teams {
        if let Some(avg) = state.store.avg_spirit_received(team.id).await? {
            spirit_avgs.insert(team.id, avg);
        }
    }

    let board = leaderboard::compute(&teams, &matches, &spirit_avgs);

    state.bus.publish(
        &live::leaderboard_channel(tournament_id),
        &json!({ "leaderboard": &board }),
    );

    Ok(Json(board))
}
