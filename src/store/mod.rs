use async_trait::async_trait;

use crate::AppError;
use models::*;

/// An in-memory backend used by tests.
pub mod memory;
/// Models for the database.
///
/// These models are specific to the current database design and schema.
/// Most if not all are directly mapped to a table in the database.
pub mod models;
/// The Postgres backend used in production.
pub mod postgres;

/// Any storage backend the server could use to operate tournaments.
///
/// Note that swapping the implementation of this trait only changes which
/// backend you'll be using (e.g. Postgres for production, the in-memory store
/// for tests). Changing the schema itself means changing this trait as well.
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates a tournament. The slug must be unique.
    async fn create_tournament(&self, new: NewTournament) -> Result<Tournament, AppError>;

    /// Retrieves a tournament by id.
    async fn tournament(&self, id: i64) -> Result<Option<Tournament>, AppError>;

    /// Retrieves a tournament by its unique slug.
    async fn tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, AppError>;

    /// Lists the tournaments visible to the public.
    async fn published_tournaments(&self) -> Result<Vec<Tournament>, AppError>;

    /// Deletes a tournament along with its teams, matches and spirit scores.
    /// Returns false when no such tournament exists.
    async fn delete_tournament(&self, id: i64) -> Result<bool, AppError>;

    /// Registers a team in a tournament with pending status.
    async fn create_team(&self, tournament_id: i64, name: &str) -> Result<Team, AppError>;

    /// Retrieves a team by id.
    async fn team(&self, id: i64) -> Result<Option<Team>, AppError>;

    /// Lists every team registered in a tournament.
    async fn teams_in_tournament(&self, tournament_id: i64) -> Result<Vec<Team>, AppError>;

    /// Looks up a team in a tournament by name, case-insensitively.
    async fn find_team_named(
        &self,
        tournament_id: i64,
        name: &str,
    ) -> Result<Option<Team>, AppError>;

    /// Updates a team's registration status, returning the updated row.
    async fn set_team_status(
        &self,
        id: i64,
        status: TeamStatus,
    ) -> Result<Option<Team>, AppError>;

    /// Deletes a team, returning the deleted row so callers can reach its
    /// tournament for cache invalidation.
    async fn delete_team(&self, id: i64) -> Result<Option<Team>, AppError>;

    /// Creates a single match.
    async fn create_match(&self, new: NewMatch) -> Result<Match, AppError>;

    /// Creates a batch of matches atomically, in the given order.
    async fn create_matches(&self, new: Vec<NewMatch>) -> Result<Vec<Match>, AppError>;

    /// Retrieves a match by id.
    async fn match_by_id(&self, id: i64) -> Result<Option<Match>, AppError>;

    /// Lists every match, across all tournaments.
    async fn all_matches(&self) -> Result<Vec<Match>, AppError>;

    /// Lists the matches of one tournament.
    async fn matches_in_tournament(&self, tournament_id: i64) -> Result<Vec<Match>, AppError>;

    /// Counts the matches of one tournament.
    async fn count_matches(&self, tournament_id: i64) -> Result<i64, AppError>;

    /// Writes both scores and the status of a match, returning the updated
    /// row.
    async fn update_score(
        &self,
        id: i64,
        score_a: i32,
        score_b: i32,
        status: MatchStatus,
    ) -> Result<Option<Match>, AppError>;

    /// Deletes a match along with its spirit scores, returning the deleted
    /// row.
    async fn delete_match(&self, id: i64) -> Result<Option<Match>, AppError>;

    /// Persists a spirit score.
    async fn create_spirit_score(&self, new: NewSpiritScore) -> Result<SpiritScore, AppError>;

    /// The average spirit total a team has received, if it has received any.
    async fn avg_spirit_received(&self, team_id: i64) -> Result<Option<f64>, AppError>;

    /// Aggregate counters across all tournaments.
    async fn global_analytics(&self) -> Result<GlobalAnalytics, AppError>;

    /// Aggregate counters for one tournament.
    async fn tournament_analytics(
        &self,
        tournament_id: i64,
    ) -> Result<Option<TournamentAnalytics>, AppError>;

    /// Persists a notification.
    async fn create_notification(&self, new: NewNotification) -> Result<Notification, AppError>;

    /// A user's notifications, newest first.
    async fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, AppError>;

    /// Marks one of a user's notifications as read, returning the updated
    /// row.
    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Notification>, AppError>;
}
