use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// The registration status of a team. Only approved teams take part in
/// scheduling and matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, Display, Default,
)]
#[sqlx(type_name = "team_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TeamStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// The lifecycle stage of a match.
///
/// Statuses are free-form field writes with no validated transition graph;
/// callers may move a match between any two stages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, Display, Default,
)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

/// A tournament within the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tournament {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: Option<String>,
    pub fields_json: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Field identifiers parsed from the stored JSON list.
    ///
    /// A value that fails to parse as a list is treated as a single field
    /// name rather than discarded.
    pub fn fields(&self) -> Vec<String> {
        match self.fields_json.as_deref() {
            Some(raw) if !raw.is_empty() => {
                serde_json::from_str(raw).unwrap_or_else(|_| vec![raw.to_string()])
            }
            _ => Vec::new(),
        }
    }
}

/// Payload for creating a tournament.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTournament {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// A team registered in a tournament.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    pub tournament_id: i64,
    pub name: String,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
}

/// A fixture between two teams of the same tournament.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i64,
    pub tournament_id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub field_id: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub score_a: i32,
    pub score_b: i32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a match.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMatch {
    pub tournament_id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

/// A sportsmanship rating one team gives another after a match.
///
/// `total` is always the sum of the five sub-scores, recomputed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpiritScore {
    pub id: i64,
    pub match_id: i64,
    pub from_team_id: i64,
    pub to_team_id: i64,
    pub rules_knowledge: i32,
    pub fouls_body_contact: i32,
    pub fair_mindedness: i32,
    pub positive_attitude: i32,
    pub communication: i32,
    pub total: i32,
    pub comments: Option<String>,
    pub submitted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A spirit score ready for insertion, with its total already computed.
#[derive(Debug, Clone)]
pub struct NewSpiritScore {
    pub match_id: i64,
    pub from_team_id: i64,
    pub to_team_id: i64,
    pub rules_knowledge: i32,
    pub fouls_body_contact: i32,
    pub fair_mindedness: i32,
    pub positive_attitude: i32,
    pub communication: i32,
    pub total: i32,
    pub comments: Option<String>,
    pub submitted_by: Option<i64>,
}

/// A personal notification for a user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload_json: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: String,
    pub payload_json: Option<String>,
}

/// Aggregate counters across all tournaments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalAnalytics {
    pub total_tournaments: i64,
    pub total_teams: i64,
    pub total_matches: i64,
    pub completed_matches: i64,
    pub ongoing_matches: i64,
    pub average_spirit_score: f64,
}

/// Aggregate counters for a single tournament.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentAnalytics {
    pub tournament_id: i64,
    pub tournament_title: String,
    pub team_count: i64,
    pub total_matches: i64,
    pub completed_matches: i64,
    pub ongoing_matches: i64,
    pub average_spirit_score: f64,
}
