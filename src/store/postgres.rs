use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::leaderboard::round2;
use crate::AppError;

use super::models::*;
use super::Store;

/// The Postgres database used for the tournament system.
#[derive(Debug)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(db_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(db_url).await?;
        info!("Successfully connected to the database.");

        Ok(PgStore { pool })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_tournament(&self, new: NewTournament) -> Result<Tournament, AppError> {
        let fields_json = match &new.fields {
            Some(fields) => Some(serde_json::to_string(fields)?),
            None => None,
        };

        let tournament = sqlx::query_as::<_, Tournament>(
            r#"
            INSERT INTO tournaments (title, slug, description, start_date, end_date, location, fields_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.location)
        .bind(fields_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(tournament)
    }

    async fn tournament(&self, id: i64) -> Result<Option<Tournament>, AppError> {
        let tournament =
            sqlx::query_as::<_, Tournament>("SELECT * FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(tournament)
    }

    async fn tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, AppError> {
        let tournament =
            sqlx::query_as::<_, Tournament>("SELECT * FROM tournaments WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(tournament)
    }

    async fn published_tournaments(&self) -> Result<Vec<Tournament>, AppError> {
        let tournaments = sqlx::query_as::<_, Tournament>(
            "SELECT * FROM tournaments WHERE is_published ORDER BY start_date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tournaments)
    }

    async fn delete_tournament(&self, id: i64) -> Result<bool, AppError> {
        // Teams, matches and spirit scores go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_team(&self, tournament_id: i64, name: &str) -> Result<Team, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (tournament_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(tournament_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    async fn team(&self, id: i64) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(team)
    }

    async fn teams_in_tournament(&self, tournament_id: i64) -> Result<Vec<Team>, AppError> {
        let teams =
            sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE tournament_id = $1 ORDER BY id")
                .bind(tournament_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(teams)
    }

    async fn find_team_named(
        &self,
        tournament_id: i64,
        name: &str,
    ) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE tournament_id = $1 AND LOWER(name) = LOWER($2) LIMIT 1",
        )
        .bind(tournament_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn set_team_status(
        &self,
        id: i64,
        status: TeamStatus,
    ) -> Result<Option<Team>, AppError> {
        let team =
            sqlx::query_as::<_, Team>("UPDATE teams SET status = $2 WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(status)
                .fetch_optional(&self.pool)
                .await?;

        Ok(team)
    }

    async fn delete_team(&self, id: i64) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>("DELETE FROM teams WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(team)
    }

    async fn create_match(&self, new: NewMatch) -> Result<Match, AppError> {
        let row = sqlx::query_as::<_, Match>(
            r#"
            INSERT INTO matches (tournament_id, team_a_id, team_b_id, field_id, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.tournament_id)
        .bind(new.team_a_id)
        .bind(new.team_b_id)
        .bind(&new.field_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create_matches(&self, new: Vec<NewMatch>) -> Result<Vec<Match>, AppError> {
        // One transaction so a partially generated fixture list never lands.
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(new.len());

        for fixture in new {
            let row = sqlx::query_as::<_, Match>(
                r#"
                INSERT INTO matches (tournament_id, team_a_id, team_b_id, field_id, start_time, end_time)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(fixture.tournament_id)
            .bind(fixture.team_a_id)
            .bind(fixture.team_b_id)
            .bind(&fixture.field_id)
            .bind(fixture.start_time)
            .bind(fixture.end_time)
            .fetch_one(&mut *tx)
            .await?;

            created.push(row);
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn match_by_id(&self, id: i64) -> Result<Option<Match>, AppError> {
        let row = sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn all_matches(&self) -> Result<Vec<Match>, AppError> {
        let rows = sqlx::query_as::<_, Match>("SELECT * FROM matches ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn matches_in_tournament(&self, tournament_id: i64) -> Result<Vec<Match>, AppError> {
        let rows = sqlx::query_as::<_, Match>(
            "SELECT * FROM matches WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_matches(&self, tournament_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE tournament_id = $1",
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_score(
        &self,
        id: i64,
        score_a: i32,
        score_b: i32,
        status: MatchStatus,
    ) -> Result<Option<Match>, AppError> {
        let row = sqlx::query_as::<_, Match>(
            r#"
            UPDATE matches
            SET score_a = $2, score_b = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(score_a)
        .bind(score_b)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_match(&self, id: i64) -> Result<Option<Match>, AppError> {
        let row = sqlx::query_as::<_, Match>("DELETE FROM matches WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn create_spirit_score(&self, new: NewSpiritScore) -> Result<SpiritScore, AppError> {
        let spirit = sqlx::query_as::<_, SpiritScore>(
            r#"
            INSERT INTO spirit_scores (
                match_id, from_team_id, to_team_id,
                rules_knowledge, fouls_body_contact, fair_mindedness,
                positive_attitude, communication, total, comments, submitted_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.match_id)
        .bind(new.from_team_id)
        .bind(new.to_team_id)
        .bind(new.rules_knowledge)
        .bind(new.fouls_body_contact)
        .bind(new.fair_mindedness)
        .bind(new.positive_attitude)
        .bind(new.communication)
        .bind(new.total)
        .bind(&new.comments)
        .bind(new.submitted_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(spirit)
    }

    async fn avg_spirit_received(&self, team_id: i64) -> Result<Option<f64>, AppError> {
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(total)::FLOAT8 FROM spirit_scores WHERE to_team_id = $1",
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(avg)
    }

    async fn global_analytics(&self) -> Result<GlobalAnalytics, AppError> {
        let total_tournaments =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tournaments")
                .fetch_one(&self.pool)
                .await?;
        let total_teams = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.pool)
            .await?;
        let total_matches = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await?;
        let completed_matches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;
        let ongoing_matches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE status = 'ongoing'",
        )
        .fetch_one(&self.pool)
        .await?;
        let average_spirit =
            sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(total)::FLOAT8 FROM spirit_scores")
                .fetch_one(&self.pool)
                .await?
                .unwrap_or(0.0);

        Ok(GlobalAnalytics {
            total_tournaments,
            total_teams,
            total_matches,
            completed_matches,
            ongoing_matches,
            average_spirit_score: round2(average_spirit),
        })
    }

    async fn tournament_analytics(
        &self,
        tournament_id: i64,
    ) -> Result<Option<TournamentAnalytics>, AppError> {
        let Some(tournament) = self.tournament(tournament_id).await? else {
            return Ok(None);
        };

        let team_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams WHERE tournament_id = $1")
                .bind(tournament_id)
                .fetch_one(&self.pool)
                .await?;
        let total_matches = self.count_matches(tournament_id).await?;
        let completed_matches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE tournament_id = $1 AND status = 'completed'",
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;
        let ongoing_matches = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE tournament_id = $1 AND status = 'ongoing'",
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;
        let average_spirit = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(s.total)::FLOAT8
            FROM spirit_scores s
            JOIN matches m ON m.id = s.match_id
            WHERE m.tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?
        .unwrap_or(0.0);

        Ok(Some(TournamentAnalytics {
            tournament_id,
            tournament_title: tournament.title,
            team_count,
            total_matches,
            completed_matches,
            ongoing_matches,
            average_spirit_score: round2(average_spirit),
        }))
    }

    async fn create_notification(&self, new: NewNotification) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, payload_json)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.kind)
        .bind(&new.payload_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }
}
