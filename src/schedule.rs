use chrono::Duration;

use anyhow::anyhow;

use crate::store::models::{NewMatch, Team, Tournament};
use crate::AppError;

/// Hour of the first slot on the tournament's start date.
const FIRST_SLOT_HOUR: u32 = 9;
/// Minutes between consecutive slots.
const SLOT_MINUTES: i64 = 60;
/// Used when the tournament declares no fields.
const DEFAULT_FIELDS: [&str; 2] = ["Field A", "Field B"];

/// Builds a full round-robin fixture list over the given teams.
///
/// One match per unordered pair, in (i, j) generation order with i < j.
/// Fields cycle round-robin through the tournament's field list; slots start
/// at 09:00 on the start date and advance 60 minutes per match in generation
/// order, not per field.
pub fn round_robin_fixtures(
    tournament: &Tournament,
    teams: &[Team],
) -> Result<Vec<NewMatch>, AppError> {
    let mut fields = tournament.fields();
    if fields.is_empty() {
        fields = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();
    }

    let mut slot = tournament
        .start_date
        .and_hms_opt(FIRST_SLOT_HOUR, 0, 0)
        .ok_or_else(|| anyhow!("Invalid first slot time"))?;
    let slot_gap = Duration::minutes(SLOT_MINUTES);

    let mut fixtures = Vec::new();
    let mut field_index = 0usize;

    for i in 0..teams.len() {
        for j in (i + 1)..teams.len() {
            fixtures.push(NewMatch {
                tournament_id: tournament.id,
                team_a_id: teams[i].id,
                team_b_id: teams[j].id,
                field_id: Some(fields[field_index % fields.len()].clone()),
                start_time: Some(slot),
                end_time: None,
            });

            field_index += 1;
            slot += slot_gap;
        }
    }

    Ok(fixtures)
}
