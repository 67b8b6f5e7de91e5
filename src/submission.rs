//! Week submission merge.
//!
//! A [`WeekSubmission`] carries the raw strings a client sends for one week:
//! bodyweight, an optional per-day session timer, and per-exercise load, rep,
//! and note fields. Everything here is lenient by contract: a field that is
//! absent or fails to parse is skipped and the stored value stands. Saving a
//! week must never bounce on a half-filled form.
//!
//! Loads arrive in the lifter's display unit and are converted to kilograms
//! during the merge; after the merge every row's next-week load is recomputed
//! so a submission always leaves the week internally consistent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::{LogRow, WorkoutSession};
use crate::progression::{RowSnapshot, compute_new_load};
use crate::units::{Unit, parse_reps, parse_weight, to_canonical};

/// Raw input for one week, as posted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekSubmission {
    /// Bodyweight in the display unit.
    pub bodyweight: Option<String>,
    /// Session timer for the day being saved.
    pub day_timer: Option<DayTimer>,
    #[serde(default)]
    pub entries: Vec<EntryInput>,
}

/// Start/end timestamps for one day's workout, RFC 3339.
#[derive(Debug, Clone, Deserialize)]
pub struct DayTimer {
    pub day: u32,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Raw input for one exercise row, addressed by (day, exercise).
#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub day: u32,
    pub exercise: String,
    /// Load in the display unit.
    pub load: Option<String>,
    pub s1: Option<String>,
    pub s2: Option<String>,
    pub s3: Option<String>,
    pub notes: Option<String>,
}

/// Merges a submission into the week's rows and recomputes every row's
/// next-week load.
///
/// Entries that address no row (wrong day, unknown exercise) are ignored.
/// The recompute pass runs over all rows, not only the touched ones, so a
/// stale `new_load` left by an older rule version is repaired on next save.
pub fn apply(sub: &WeekSubmission, unit: Unit, rows: &mut [LogRow]) {
    for entry in &sub.entries {
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.day == entry.day && r.exercise == entry.exercise)
        else {
            continue;
        };
        merge_entry(entry, unit, row);
    }

    for row in rows.iter_mut() {
        row.new_load = compute_new_load(&RowSnapshot::from(&*row));
    }
}

fn merge_entry(entry: &EntryInput, unit: Unit, row: &mut LogRow) {
    if let Some(raw) = &entry.load
        && let Some(v) = parse_weight(raw)
    {
        row.load_used = to_canonical(Some(v), unit);
    }
    if let Some(raw) = &entry.s1
        && let Some(v) = parse_reps(raw)
    {
        row.s1 = Some(v);
    }
    if let Some(raw) = &entry.s2
        && let Some(v) = parse_reps(raw)
    {
        row.s2 = Some(v);
    }
    if let Some(raw) = &entry.s3
        && let Some(v) = parse_reps(raw)
    {
        row.s3 = Some(v);
    }
    if let Some(raw) = &entry.notes {
        let trimmed = raw.trim();
        row.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
}

/// The submitted bodyweight in kilograms, when present and parseable.
pub fn bodyweight_kg(sub: &WeekSubmission, unit: Unit) -> Option<f64> {
    let raw = sub.bodyweight.as_deref()?;
    to_canonical(parse_weight(raw), unit)
}

/// Builds the session row implied by the submission's timer, dated `today`.
///
/// The session exists as soon as a timer block is posted; the timestamps
/// themselves are optional and parsed leniently. Duration is derived only
/// when both ends are present.
pub fn session_for(sub: &WeekSubmission, week: u32, today: NaiveDate) -> Option<WorkoutSession> {
    let timer = sub.day_timer.as_ref()?;
    let started_at = timer.start.as_deref().and_then(parse_timestamp);
    let ended_at = timer.end.as_deref().and_then(parse_timestamp);
    let duration_seconds = match (started_at, ended_at) {
        (Some(start), Some(end)) => Some((end - start).num_seconds()),
        _ => None,
    };
    Some(WorkoutSession {
        week,
        day: timer.day,
        session_date: today,
        started_at,
        ended_at,
        duration_seconds,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
