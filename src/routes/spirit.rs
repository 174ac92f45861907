use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::live;
use crate::state::SharedState;
use crate::store::models::{NewSpiritScore, SpiritScore};

const SUB_SCORE_MAX: i32 = 4;

/// Spirit score submission for a match.
///
/// A forged `total` in the payload is ignored: the total is always
/// recomputed from the five sub-scores before anything is persisted.
#[derive(Debug, Deserialize)]
pub struct SpiritSubmission {
    pub match_id: i64,
    pub from_team_id: i64,
    pub to_team_id: i64,
    pub rules_knowledge: i32,
    pub fouls_body_contact: i32,
    pub fair_mindedness: i32,
    pub positive_attitude: i32,
    pub communication: i32,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<i64>,
}

impl SpiritSubmission {
    fn sub_scores(&self) -> [(&'static str, i32); 5] {
        [
            ("rules_knowledge", self.rules_knowledge),
            ("fouls_body_contact", self.fouls_body_contact),
            ("fair_mindedness", self.fair_mindedness),
            ("positive_attitude", self.positive_attitude),
            ("communication", self.communication),
        ]
    }
}

/// Persists a spirit score for a match and broadcasts it on the match
/// channel.
pub async fn submit(
    State(state): State<SharedState>,
    Json(submission): Json<SpiritSubmission>,
) -> Result<Json<SpiritScore>, ApiError> {
    for (name, value) in submission.sub_scores() {
        if !(0..=SUB_SCORE_MAX).contains(&value) {
            return Err(ApiError::Validation(format!(
                "{} must be between 0 and {}",
                name, SUB_SCORE_MAX
            )));
        }
    }

    state
        .store
        .match_by_id(submission.match_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))?;

    let total = submission
        .sub_scores()
        .iter()
        .map(|(_, value)| value)
        .sum();

    let spirit = state
        .store
        .create_spirit_score(NewSpiritScore {
            match_id: submission.match_id,
            from_team_id: submission.from_team_id,
            to_team_id: submission.to_team_id,
            rules_knowledge: submission.rules_knowledge,
            fouls_body_contact: submission.fouls_body_contact,
            fair_mindedness: submission.fair_mindedness,
            positive_attitude: submission.positive_attitude,
            communication: submission.communication,
            total,
            comments: submission.comments.clone(),
            submitted_by: submission.submitted_by,
        })
        .await?;

    state.bus.publish(
        &live::match_channel(submission.match_id),
        &json!({
            "type": "spirit_update",
            "match_id": submission.match_id,
            "from_team": submission.from_team_id,
            "to_team": submission.to_team_id,
            "total": total,
            "details": {
                "rules_knowledge": submission.rules_knowledge,
                "fouls_body_contact": submission.fouls_body_contact,
                "fair_mindedness": submission.fair_mindedness,
                "positive_attitude": submission.positive_attitude,
                "communication": submission.communication,
            },
            "comments": submission.comments,
        }),
    );

    info!(
        "Spirit score {} recorded for match {}",
        spirit.id, spirit.match_id
    );

    Ok(Json(spirit))
}
