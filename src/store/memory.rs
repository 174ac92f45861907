use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::leaderboard::round2;
use crate::AppError;

use super::models::*;
use super::Store;

/// An in-memory storage backend.
///
/// Backs the integration tests; behaves like the Postgres schema, cascade
/// deletes included, without needing a running database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tournaments: Vec<Tournament>,
    teams: Vec<Team>,
    matches: Vec<Match>,
    spirit_scores: Vec<SpiritScore>,
    notifications: Vec<Notification>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_tournament(&self, new: NewTournament) -> Result<Tournament, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let fields_json = match &new.fields {
            Some(fields) => Some(serde_json::to_string(fields)?),
            None => None,
        };

        let tournament = Tournament {
            id: inner.next_id(),
            title: new.title,
            slug: new.slug,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            location: new.location,
            fields_json,
            is_published: true,
            created_at: Utc::now(),
        };
        inner.tournaments.push(tournament.clone());

        Ok(tournament)
    }

    async fn tournament(&self, id: i64) -> Result<Option<Tournament>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.tournaments.iter().find(|t| t.id == id).cloned())
    }

    async fn tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.tournaments.iter().find(|t| t.slug == slug).cloned())
    }

    async fn published_tournaments(&self) -> Result<Vec<Tournament>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner
            .tournaments
            .iter()
            .filter(|t| t.is_published)
            .cloned()
            .collect())
    }

    async fn delete_tournament(&self, id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let existed = inner.tournaments.iter().any(|t| t.id == id);
        inner.tournaments.retain(|t| t.id != id);
        inner.teams.retain(|t| t.tournament_id != id);

        let removed_matches: Vec<i64> = inner
            .matches
            .iter()
            .filter(|m| m.tournament_id == id)
            .map(|m| m.id)
            .collect();
        inner.matches.retain(|m| m.tournament_id != id);
        inner
            .spirit_scores
            .retain(|s| !removed_matches.contains(&s.match_id));

        Ok(existed)
    }

    async fn create_team(&self, tournament_id: i64, name: &str) -> Result<Team, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let team = Team {
            id: inner.next_id(),
            tournament_id,
            name: name.to_string(),
            status: TeamStatus::Pending,
            created_at: Utc::now(),
        };
        inner.teams.push(team.clone());

        Ok(team)
    }

    async fn team(&self, id: i64) -> Result<Option<Team>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn teams_in_tournament(&self, tournament_id: i64) -> Result<Vec<Team>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner
            .teams
            .iter()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn find_team_named(
        &self,
        tournament_id: i64,
        name: &str,
    ) -> Result<Option<Team>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        let wanted = name.to_lowercase();
        Ok(inner
            .teams
            .iter()
            .find(|t| t.tournament_id == tournament_id && t.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn set_team_status(
        &self,
        id: i64,
        status: TeamStatus,
    ) -> Result<Option<Team>, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let team = inner.teams.iter_mut().find(|t| t.id == id);

        Ok(team.map(|t| {
            t.status = status;
            t.clone()
        }))
    }

    async fn delete_team(&self, id: i64) -> Result<Option<Team>, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let Some(pos) = inner.teams.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let team = inner.teams.remove(pos);

        let removed_matches: Vec<i64> = inner
            .matches
            .iter()
            .filter(|m| m.team_a_id == id || m.team_b_id == id)
            .map(|m| m.id)
            .collect();
        inner
            .matches
            .retain(|m| m.team_a_id != id && m.team_b_id != id);
        inner
            .spirit_scores
            .retain(|s| !removed_matches.contains(&s.match_id));

        Ok(Some(team))
    }

    async fn create_match(&self, new: NewMatch) -> Result<Match, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let now = Utc::now();

        let row = Match {
            id: inner.next_id(),
            tournament_id: new.tournament_id,
            team_a_id: new.team_a_id,
            team_b_id: new.team_b_id,
            field_id: new.field_id,
            start_time: new.start_time,
            end_time: new.end_time,
            score_a: 0,
            score_b: 0,
            status: MatchStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        inner.matches.push(row.clone());

        Ok(row)
    }

    async fn create_matches(&self, new: Vec<NewMatch>) -> Result<Vec<Match>, AppError> {
        let mut created = Vec::with_capacity(new.len());
        for fixture in new {
            created.push(self.create_match(fixture).await?);
        }
        Ok(created)
    }

    async fn match_by_id(&self, id: i64) -> Result<Option<Match>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn all_matches(&self) -> Result<Vec<Match>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.matches.clone())
    }

    async fn matches_in_tournament(&self, tournament_id: i64) -> Result<Vec<Match>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn count_matches(&self, tournament_id: i64) -> Result<i64, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .count() as i64)
    }

    async fn update_score(
        &self,
        id: i64,
        score_a: i32,
        score_b: i32,
        status: MatchStatus,
    ) -> Result<Option<Match>, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let row = inner.matches.iter_mut().find(|m| m.id == id);

        Ok(row.map(|m| {
            m.score_a = score_a;
            m.score_b = score_b;
            m.status = status;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn delete_match(&self, id: i64) -> Result<Option<Match>, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let Some(pos) = inner.matches.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        let row = inner.matches.remove(pos);
        inner.spirit_scores.retain(|s| s.match_id != id);

        Ok(Some(row))
    }

    async fn create_spirit_score(&self, new: NewSpiritScore) -> Result<SpiritScore, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let spirit = SpiritScore {
            id: inner.next_id(),
            match_id: new.match_id,
            from_team_id: new.from_team_id,
            to_team_id: new.to_team_id,
            rules_knowledge: new.rules_knowledge,
            fouls_body_contact: new.fouls_body_contact,
            fair_mindedness: new.fair_mindedness,
            positive_attitude: new.positive_attitude,
            communication: new.communication,
            total: new.total,
            comments: new.comments,
            submitted_by: new.submitted_by,
            created_at: Utc::now(),
        };
        inner.spirit_scores.push(spirit.clone());

        Ok(spirit)
    }

    async fn avg_spirit_received(&self, team_id: i64) -> Result<Option<f64>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        let totals: Vec<i32> = inner
            .spirit_scores
            .iter()
            .filter(|s| s.to_team_id == team_id)
            .map(|s| s.total)
            .collect();

        if totals.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            totals.iter().sum::<i32>() as f64 / totals.len() as f64,
        ))
    }

    async fn global_analytics(&self) -> Result<GlobalAnalytics, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");

        let average_spirit = if inner.spirit_scores.is_empty() {
            0.0
        } else {
            inner.spirit_scores.iter().map(|s| s.total).sum::<i32>() as f64
                / inner.spirit_scores.len() as f64
        };

        Ok(GlobalAnalytics {
            total_tournaments: inner.tournaments.len() as i64,
            total_teams: inner.teams.len() as i64,
            total_matches: inner.matches.len() as i64,
            completed_matches: inner
                .matches
                .iter()
                .filter(|m| m.status == MatchStatus::Completed)
                .count() as i64,
            ongoing_matches: inner
                .matches
                .iter()
                .filter(|m| m.status == MatchStatus::Ongoing)
                .count() as i64,
            average_spirit_score: round2(average_spirit),
        })
    }

    async fn tournament_analytics(
        &self,
        tournament_id: i64,
    ) -> Result<Option<TournamentAnalytics>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");

        let Some(tournament) = inner.tournaments.iter().find(|t| t.id == tournament_id) else {
            return Ok(None);
        };

        let matches: Vec<&Match> = inner
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .collect();
        let match_ids: Vec<i64> = matches.iter().map(|m| m.id).collect();
        let totals: Vec<i32> = inner
            .spirit_scores
            .iter()
            .filter(|s| match_ids.contains(&s.match_id))
            .map(|s| s.total)
            .collect();

        let average_spirit = if totals.is_empty() {
            0.0
        } else {
            totals.iter().sum::<i32>() as f64 / totals.len() as f64
        };

        Ok(Some(TournamentAnalytics {
            tournament_id,
            tournament_title: tournament.title.clone(),
            team_count: inner
                .teams
                .iter()
                .filter(|t| t.tournament_id == tournament_id)
                .count() as i64,
            total_matches: matches.len() as i64,
            completed_matches: matches
                .iter()
                .filter(|m| m.status == MatchStatus::Completed)
                .count() as i64,
            ongoing_matches: matches
                .iter()
                .filter(|m| m.status == MatchStatus::Ongoing)
                .count() as i64,
            average_spirit_score: round2(average_spirit),
        }))
    }

    async fn create_notification(&self, new: NewNotification) -> Result<Notification, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        let notification = Notification {
            id: inner.next_id(),
            user_id: new.user_id,
            kind: new.kind,
            payload_json: new.payload_json,
            is_read: false,
            created_at: Utc::now(),
        };
        inner.notifications.push(notification.clone());

        Ok(notification)
    }

    async fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, AppError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        let mut notifications: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Notification>, AppError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id);

        Ok(notification.map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }
}
