//! End-to-end scenarios driven through the request handlers over the
//! in-memory storage backend.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use ultihub::cache::{tournament_analytics_key, AnalyticsCache};
use ultihub::error::ApiError;
use ultihub::live::{self, LiveBus};
use ultihub::routes::{
    self, analytics, leaderboard, matches, notifications, spirit, teams, tournaments,
};
use ultihub::state::{AppState, SharedState};
use ultihub::store::memory::MemoryStore;
use ultihub::store::models::{MatchStatus, NewTournament, TeamStatus};

fn test_state() -> SharedState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(LiveBus::new()),
        Arc::new(AnalyticsCache::new(Duration::from_secs(60))),
    )
}

fn summer_open(fields: Option<Vec<&str>>) -> NewTournament {
    NewTournament {
        title: "Summer Open".to_string(),
        slug: "summer-open".to_string(),
        description: None,
        start_date: NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 7, 5).unwrap(),
        location: None,
        fields: fields.map(|f| f.iter().map(|s| s.to_string()).collect()),
    }
}

/// Creates a tournament with the given approved teams, returning
/// (tournament_id, team_ids).
async fn seeded_tournament(state: &SharedState, team_names: &[&str]) -> (i64, Vec<i64>) {
    let tournament = state
        .store
        .create_tournament(summer_open(Some(vec!["Field 1", "Field 2"])))
        .await
        .unwrap();

    let mut team_ids = Vec::new();
    for name in team_names {
        let team = state.store.create_team(tournament.id, name).await.unwrap();
        state
            .store
            .set_team_status(team.id, TeamStatus::Approved)
            .await
            .unwrap();
        team_ids.push(team.id);
    }

    (tournament.id, team_ids)
}

#[tokio::test]
async fn generate_score_and_rank_three_teams() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B", "C"]).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    // 3 teams -> 3 fixtures: A-B, A-C, B-C, fields cycling, hourly slots.
    assert_eq!(fixtures.len(), 3);
    assert_eq!(
        fixtures
            .iter()
            .map(|m| (m.team_a_id, m.team_b_id))
            .collect::<Vec<_>>(),
        vec![(a, b), (a, c), (b, c)]
    );
    assert_eq!(
        fixtures
            .iter()
            .map(|m| m.field_id.as_deref().unwrap())
            .collect::<Vec<_>>(),
        vec!["Field 1", "Field 2", "Field 1"]
    );
    let day = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
    assert_eq!(
        fixtures
            .iter()
            .map(|m| m.start_time.unwrap())
            .collect::<Vec<_>>(),
        vec![
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(10, 0, 0).unwrap(),
            day.and_hms_opt(11, 0, 0).unwrap(),
        ]
    );

    // A beats B 10-8, A draws C 5-5; B-C stays scheduled.
    matches::update_score(
        State(state.clone()),
        Path(fixtures[0].id),
        Json(matches::ScoreUpdate {
            score_a: 10,
            score_b: 8,
            status: MatchStatus::Completed,
        }),
    )
    .await
    .unwrap();
    matches::update_score(
        State(state.clone()),
        Path(fixtures[1].id),
        Json(matches::ScoreUpdate {
            score_a: 5,
            score_b: 5,
            status: MatchStatus::Completed,
        }),
    )
    .await
    .unwrap();

    let mut board_feed = state.bus.subscribe(&live::leaderboard_channel(tid));

    let Json(board) = leaderboard::tournament_leaderboard(State(state.clone()), Path(tid))
        .await
        .unwrap();

    let entry_a = board.iter().find(|e| e.team_id == a).unwrap();
    let entry_b = board.iter().find(|e| e.team_id == b).unwrap();
    let entry_c = board.iter().find(|e| e.team_id == c).unwrap();

    assert_eq!(
        (entry_a.wins, entry_a.draws, entry_a.points, entry_a.goal_diff),
        (1, 1, 4, 2)
    );
    assert_eq!((entry_b.losses, entry_b.points), (1, 0));
    assert_eq!((entry_c.draws, entry_c.points), (1, 1));
    assert_eq!(entry_a.rank, 1);

    // The read re-broadcast the whole ranked list.
    let frame: Value = serde_json::from_str(&board_feed.recv().await.unwrap()).unwrap();
    assert_eq!(frame["leaderboard"].as_array().unwrap().len(), 3);
    assert_eq!(frame["leaderboard"][0]["team_id"], json!(a));
}

#[tokio::test]
async fn second_generation_conflicts_and_adds_nothing() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["A", "B", "C"]).await;

    matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();
    let before = state.store.count_matches(tid).await.unwrap();

    let err = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(state.store.count_matches(tid).await.unwrap(), before);
}

#[tokio::test]
async fn generation_needs_two_approved_teams() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B"]).await;
    state
        .store
        .set_team_status(ids[1], TeamStatus::Rejected)
        .await
        .unwrap();

    let err = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn duplicate_team_names_conflict_case_insensitively() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["Discraft"]).await;

    let err = teams::register(
        State(state.clone()),
        Path(tid),
        Json(serde_json::from_value(json!({ "name": "DISCRAFT" })).unwrap()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn leaderboard_of_an_empty_tournament_is_not_found() {
    let state = test_state();
    let tournament = state
        .store
        .create_tournament(summer_open(None))
        .await
        .unwrap();

    let err = leaderboard::tournament_leaderboard(State(state.clone()), Path(tournament.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn spirit_total_is_recomputed_even_when_forged() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    let mut feed = state.bus.subscribe(&live::match_channel(fixtures[0].id));

    // The caller supplies a forged total of 99; the submission parser drops
    // unknown fields and the server sums the five sub-scores itself.
    let submission = serde_json::from_value(json!({
        "match_id": fixtures[0].id,
        "from_team_id": ids[0],
        "to_team_id": ids[1],
        "rules_knowledge": 3,
        "fouls_body_contact": 2,
        "fair_mindedness": 3,
        "positive_attitude": 4,
        "communication": 3,
        "total": 99,
    }))
    .unwrap();

    let Json(spirit) = spirit::submit(State(state.clone()), Json(submission))
        .await
        .unwrap();
    assert_eq!(spirit.total, 15);

    let frame: Value = serde_json::from_str(&feed.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], json!("spirit_update"));
    assert_eq!(frame["total"], json!(15));
    assert_eq!(frame["details"]["rules_knowledge"], json!(3));
}

#[tokio::test]
async fn out_of_range_sub_scores_are_rejected_before_any_write() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    let submission = serde_json::from_value(json!({
        "match_id": fixtures[0].id,
        "from_team_id": ids[0],
        "to_team_id": ids[1],
        "rules_knowledge": 5,
        "fouls_body_contact": 2,
        "fair_mindedness": 3,
        "positive_attitude": 4,
        "communication": 3,
    }))
    .unwrap();

    let err = spirit::submit(State(state.clone()), Json(submission))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(
        state.store.avg_spirit_received(ids[1]).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn spirit_feeds_into_the_leaderboard_average() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    for (rules, comms) in [(3, 3), (4, 4)] {
        let submission = serde_json::from_value(json!({
            "match_id": fixtures[0].id,
            "from_team_id": ids[0],
            "to_team_id": ids[1],
            "rules_knowledge": rules,
            "fouls_body_contact": 2,
            "fair_mindedness": 3,
            "positive_attitude": 4,
            "communication": comms,
        }))
        .unwrap();
        spirit::submit(State(state.clone()), Json(submission))
            .await
            .unwrap();
    }

    let Json(board) = leaderboard::tournament_leaderboard(State(state.clone()), Path(tid))
        .await
        .unwrap();

    // Totals 15 and 17 average to 16.0, received by team B only.
    let entry_b = board.iter().find(|e| e.team_id == ids[1]).unwrap();
    assert_eq!(entry_b.spirit_avg, 16.0);
    let entry_a = board.iter().find(|e| e.team_id == ids[0]).unwrap();
    assert_eq!(entry_a.spirit_avg, 0.0);
}

#[tokio::test]
async fn two_viewers_see_the_same_score_frame() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();
    let match_id = fixtures[0].id;

    let channel = live::match_channel(match_id);
    let mut first = state.bus.subscribe(&channel);
    let mut second = state.bus.subscribe(&channel);

    matches::update_score(
        State(state.clone()),
        Path(match_id),
        Json(matches::ScoreUpdate {
            score_a: 7,
            score_b: 6,
            status: MatchStatus::Ongoing,
        }),
    )
    .await
    .unwrap();

    let frame_a = first.recv().await.unwrap();
    let frame_b = second.recv().await.unwrap();
    assert_eq!(frame_a, frame_b);

    let parsed: Value = serde_json::from_str(&frame_a).unwrap();
    assert_eq!(parsed["score_a"], json!(7));
    assert_eq!(parsed["status"], json!("ongoing"));

    // A viewer that leaves releases its handle; later updates only reach the
    // remaining one.
    drop(first);
    assert_eq!(state.bus.subscriber_count(&channel), 1);
}

#[tokio::test]
async fn score_updates_evict_tournament_analytics() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    // Prime the cache.
    let Json(first) = analytics::tournament_analytics(State(state.clone()), Path(tid))
        .await
        .unwrap();
    assert_eq!(first["data"]["completed_matches"], json!(0));
    assert!(state.cache.get(&tournament_analytics_key(tid)).is_some());

    matches::update_score(
        State(state.clone()),
        Path(fixtures[0].id),
        Json(matches::ScoreUpdate {
            score_a: 11,
            score_b: 4,
            status: MatchStatus::Completed,
        }),
    )
    .await
    .unwrap();

    // The mutation evicted the key; the next read recomputes.
    assert!(state.cache.get(&tournament_analytics_key(tid)).is_none());
    let Json(second) = analytics::tournament_analytics(State(state.clone()), Path(tid))
        .await
        .unwrap();
    assert_eq!(second["data"]["completed_matches"], json!(1));
}

#[tokio::test]
async fn tournament_creation_evicts_global_analytics() {
    let state = test_state();

    let Json(first) = analytics::overview(State(state.clone())).await.unwrap();
    assert_eq!(first["data"]["total_tournaments"], json!(0));

    tournaments::create(State(state.clone()), Json(summer_open(None)))
        .await
        .unwrap();

    let Json(second) = analytics::overview(State(state.clone())).await.unwrap();
    assert_eq!(second["data"]["total_tournaments"], json!(1));
}

#[tokio::test]
async fn duplicate_slugs_conflict() {
    let state = test_state();
    tournaments::create(State(state.clone()), Json(summer_open(None)))
        .await
        .unwrap();

    let err = tournaments::create(State(state.clone()), Json(summer_open(None)))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn notifications_reach_the_user_channel() {
    let state = test_state();
    let mut feed = state.bus.subscribe(&live::user_channel(42));

    let request = serde_json::from_value(json!({
        "user_id": 42,
        "type": "match_reminder",
        "payload": { "match_id": 7 },
    }))
    .unwrap();
    let Json(created) = notifications::create(State(state.clone()), Json(request))
        .await
        .unwrap();
    assert!(!created.is_read);

    let frame: Value = serde_json::from_str(&feed.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], json!("match_reminder"));
    assert_eq!(frame["payload"]["match_id"], json!(7));

    let Json(listed) = notifications::list(State(state.clone()), Path(42))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let Json(read) = notifications::mark_read(
        State(state.clone()),
        Path(created.id),
        Json(serde_json::from_value(json!({ "user_id": 42 })).unwrap()),
    )
    .await
    .unwrap();
    assert!(read.is_read);
}

#[tokio::test]
async fn schedule_groups_by_date_then_field() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["A", "B", "C"]).await;
    matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    let Json(schedule) = matches::tournament_schedule(State(state.clone()), Path(tid))
        .await
        .unwrap();

    assert_eq!(schedule.tournament_title, "Summer Open");
    assert_eq!(schedule.schedule.len(), 1); // all slots on the start date
    let day = &schedule.schedule[0];
    assert_eq!(day.date, "2026-07-04");
    assert_eq!(
        day.fields.iter().map(|f| f.field_id.as_str()).collect::<Vec<_>>(),
        vec!["Field 1", "Field 2"]
    );
    // Two fixtures landed on Field 1 (slots 1 and 3), one on Field 2.
    assert_eq!(day.fields[0].matches.len(), 2);
    assert!(day.fields[0].matches[0].start_time < day.fields[0].matches[1].start_time);
}

/// Serves the full router on an ephemeral port for WebSocket clients.
async fn serve_app(state: &SharedState) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    let app = routes::router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    addr
}

#[tokio::test]
async fn websocket_viewer_receives_score_frames() {
    let state = test_state();
    let (tid, _) = seeded_tournament(&state, &["A", "B"]).await;
    let Json(fixtures) = matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();
    let match_id = fixtures[0].id;

    let addr = serve_app(&state).await;
    let (mut socket, _) = connect_async(format!("ws://{}/ws/matches/{}", addr, match_id))
        .await
        .unwrap();

    // The subscription is registered during the upgrade handshake.
    let channel = live::match_channel(match_id);
    assert_eq!(state.bus.subscriber_count(&channel), 1);

    matches::update_score(
        State(state.clone()),
        Path(match_id),
        Json(matches::ScoreUpdate {
            score_a: 9,
            score_b: 7,
            status: MatchStatus::Ongoing,
        }),
    )
    .await
    .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("frame within the poll window")
        .unwrap()
        .unwrap();
    let parsed: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(parsed["score_a"], json!(9));
    assert_eq!(parsed["status"], json!("ongoing"));

    // Hanging up releases the relay's subscription.
    socket.close(None).await.unwrap();
    for _ in 0..100 {
        if state.bus.subscriber_count(&channel) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.bus.subscriber_count(&channel), 0);
}

#[tokio::test]
async fn closing_the_bus_hangs_up_connected_viewers() {
    let state = test_state();
    let addr = serve_app(&state).await;

    let (mut socket, _) = connect_async(format!("ws://{}/ws/notifications/42", addr))
        .await
        .unwrap();
    assert_eq!(state.bus.subscriber_count(&live::user_channel(42)), 1);

    state.bus.close();

    // The relay must exit without any client action, so shutdown never waits
    // on an idle viewer.
    let hung_up = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match socket.next().await {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(hung_up.is_ok());
}

#[tokio::test]
async fn deleting_a_tournament_cascades() {
    let state = test_state();
    let (tid, ids) = seeded_tournament(&state, &["A", "B"]).await;
    matches::generate(State(state.clone()), Path(tid))
        .await
        .unwrap();

    tournaments::remove(State(state.clone()), Path(tid))
        .await
        .unwrap();

    assert!(state.store.tournament(tid).await.unwrap().is_none());
    assert!(state.store.team(ids[0]).await.unwrap().is_none());
    assert_eq!(state.store.count_matches(tid).await.unwrap(), 0);
}
