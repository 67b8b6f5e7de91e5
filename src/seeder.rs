//! Week seeding.
//!
//! Materializes the program template into log rows for one week. Seeding is
//! pure: it takes the stored rows plus whatever context the week needs (tested
//! maxes for the opening weeks, the prior week's rows afterwards) and returns
//! the complete row set in program order. Running it again over its own output
//! changes nothing, so every view of a week can seed first and render second.

use crate::domain::{Category, LogRow, TestedMaxes};
use crate::program::{PROGRAM, ProgramEntry, SeedPolicy, rm_key_for};
use crate::units::round_to_increment;

/// Builds the full row set for `week`, preserving logged data in `existing`.
///
/// Rows missing from `existing` are created from the program template. Rows
/// that are present keep everything the lifter entered (load, reps, notes,
/// computed next load) and only have their template metadata refreshed, so
/// program edits flow into old weeks without rewriting history.
///
/// A row with no load yet gets a suggested one: weeks covered by `policy`
/// derive it from the matching tested max, later weeks carry forward the
/// prior week's outcome for the same exercise. Rows stored under exercises
/// the program no longer contains are not returned.
pub fn seed_week(
    week: u32,
    maxes: &TestedMaxes,
    policy: &SeedPolicy,
    prior_rows: &[LogRow],
    existing: &[LogRow],
) -> Vec<LogRow> {
    let mut rows = Vec::new();
    for (idx, day) in PROGRAM.iter().enumerate() {
        let day_no = idx as u32 + 1;
        for entry in day.entries {
            let mut row = existing
                .iter()
                .find(|r| r.day == day_no && r.exercise == entry.exercise)
                .cloned()
                .unwrap_or_else(|| blank_row(week, day_no, entry));

            row.day_title = day.title.to_string();
            row.sets = entry.sets;
            row.rep_low = entry.rep_low;
            row.rep_high = entry.rep_high;
            row.category = entry.category;
            row.increment = entry.increment;
            row.last_set_is_amrap = entry.category == Category::Accessory;

            if load_is_unset(row.load_used) {
                row.load_used = suggested_load(week, entry, maxes, policy, prior_rows);
            }
            rows.push(row);
        }
    }
    rows
}

fn blank_row(week: u32, day: u32, entry: &ProgramEntry) -> LogRow {
    LogRow {
        week,
        day,
        day_title: String::new(),
        exercise: entry.exercise.to_string(),
        sets: entry.sets,
        rep_low: entry.rep_low,
        rep_high: entry.rep_high,
        category: entry.category,
        increment: entry.increment,
        load_used: None,
        s1: None,
        s2: None,
        s3: None,
        last_set_is_amrap: false,
        new_load: None,
        notes: None,
    }
}

/// A load the lifter never chose: unlogged, or logged as zero.
fn load_is_unset(load: Option<f64>) -> bool {
    load.is_none_or(|v| v == 0.0)
}

fn suggested_load(
    week: u32,
    entry: &ProgramEntry,
    maxes: &TestedMaxes,
    policy: &SeedPolicy,
    prior_rows: &[LogRow],
) -> Option<f64> {
    if let Some(pct) = policy.pct_for_week(week) {
        let key = rm_key_for(entry.exercise)?;
        let max = maxes.get(key).filter(|m| *m > 0.0)?;
        round_to_increment(Some(max * pct))
    } else {
        // Exercise names are unique across the program, so a name match in
        // the prior week is unambiguous regardless of day.
        let prev = prior_rows.iter().find(|r| r.exercise == entry.exercise)?;
        prev.effective_load().filter(|l| *l > 0.0)
    }
}
