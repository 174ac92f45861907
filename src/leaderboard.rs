use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::models::{Match, MatchStatus, Team};

/// One team's standing, derived from completed matches and received spirit
/// scores. Never persisted; recomputed on every leaderboard read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub team_id: i64,
    pub team_name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_diff: i32,
    pub spirit_avg: f64,
    pub rank: u32,
}

/// Rounds to 2 decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregates one team's results over the completed matches it played in.
///
/// Points follow the standard 3/1/0 win/draw/loss scheme. The rank is left
/// at 0 until [`rank`] assigns positions.
pub fn aggregate_team(team: &Team, matches: &[Match], spirit_avg: Option<f64>) -> LeaderboardEntry {
    let mut wins = 0;
    let mut losses = 0;
    let mut draws = 0;
    let mut goals_for = 0;
    let mut goals_against = 0;
    let mut matches_played = 0;

    for m in matches {
        if m.status != MatchStatus::Completed {
            continue;
        }
        let (gf, ga) = if m.team_a_id == team.id {
            (m.score_a, m.score_b)
        } else if m.team_b_id == team.id {
            (m.score_b, m.score_a)
        } else {
            continue;
        };

        matches_played += 1;
        goals_for += gf;
        goals_against += ga;

        if gf > ga {
            wins += 1;
        } else if gf < ga {
            losses += 1;
        } else {
            draws += 1;
        }
    }

    LeaderboardEntry {
        team_id: team.id,
        team_name: team.name.clone(),
        matches_played,
        wins,
        losses,
        draws,
        points: wins * 3 + draws,
        goals_for,
        goals_against,
        goal_diff: goals_for - goals_against,
        spirit_avg: round2(spirit_avg.unwrap_or(0.0)),
        rank: 0,
    }
}

/// Sorts entries by (points, goal_diff, spirit_avg) descending and assigns
/// 1-based ranks.
///
/// The sort is stable: teams tied on all three keys keep their input order,
/// and ranks stay strictly positional even on exact ties.
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff.cmp(&a.goal_diff))
            .then(
                b.spirit_avg
                    .partial_cmp(&a.spirit_avg)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i as u32 + 1;
    }

    entries
}

/// Builds the full ranked leaderboard for a tournament's teams.
///
/// `spirit_avgs` maps team id to the mean spirit total that team has
/// received; absent teams default to 0.0.
pub fn compute(
    teams: &[Team],
    matches: &[Match],
    spirit_avgs: &HashMap<i64, f64>,
) -> Vec<LeaderboardEntry> {
    let entries = teams
        .iter()
        .map(|team| aggregate_team(team, matches, spirit_avgs.get(&team.id).copied()))
        .collect();

    rank(entries)
}
