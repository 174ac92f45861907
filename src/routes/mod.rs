use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::state::SharedState;

/// Cached aggregate analytics.
pub mod analytics;
/// The ranked tournament leaderboard.
pub mod leaderboard;
/// Match CRUD, live scoring and fixture generation.
pub mod matches;
/// Personal notifications.
pub mod notifications;
/// Spirit score submission.
pub mod spirit;
/// Team registration and approval.
pub mod teams;
/// Tournament CRUD.
pub mod tournaments;
/// WebSocket relays for live updates.
pub mod ws;

/// Assembles the full routing table over the shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/tournaments",
            post(tournaments::create).get(tournaments::list),
        )
        .route(
            "/tournaments/:id",
            get(tournaments::get_one).delete(tournaments::remove),
        )
        .route(
            "/tournaments/:id/leaderboard",
            get(leaderboard::tournament_leaderboard),
        )
        .route(
            "/tournaments/:id/teams",
            post(teams::register).get(teams::list),
        )
        .route("/teams/:id/status", patch(teams::set_status))
        .route("/teams/:id", delete(teams::remove))
        .route("/matches", post(matches::create).get(matches::list))
        .route("/matches/:id", get(matches::get_one).delete(matches::remove))
        .route("/matches/:id/score", patch(matches::update_score))
        .route(
            "/matches/tournaments/:id/generate-matches",
            post(matches::generate),
        )
        .route(
            "/matches/tournaments/:id/schedule",
            get(matches::tournament_schedule),
        )
        .route("/spirit", post(spirit::submit))
        .route("/analytics/overview", get(analytics::overview))
        .route(
            "/analytics/tournaments/:id",
            get(analytics::tournament_analytics),
        )
        .route("/notifications", post(notifications::create))
        .route("/notifications/:user_id", get(notifications::list))
        .route("/notifications/:id/read", patch(notifications::mark_read))
        .route("/ws/matches/:match_id", get(ws::match_updates))
        .route("/ws/notifications/:user_id", get(ws::user_notifications))
        .with_state(state)
}
