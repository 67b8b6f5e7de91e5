//! Estimated one-rep-max tracking and PR detection.
//!
//! After a week is saved, every logged set that belongs to a tracked lift is
//! converted to an estimated 1RM and compared against the stored max. A new
//! best becomes the stored max and is reported as a PR event, which the
//! caller appends to history. Estimates stay raw kilograms; they are plate
//! targets for nobody and are only rounded at the display boundary.

use crate::domain::{LiftKey, LogRow, TestedMaxes};
use crate::program::rm_key_for;

/// One detected PR for a lift, within a single week's rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrEvent {
    pub lift: LiftKey,
    /// The max on record before this week, `None` when the lift was untested.
    pub previous_kg: Option<f64>,
    pub estimated_kg: f64,
    /// Day whose row produced the estimate.
    pub day: u32,
}

/// Calculates estimated 1RM using the Epley formula.
///
/// Formula: e1RM = w × (1 + r/30)
///
/// # Arguments
/// * `weight_kg` - Weight lifted in kilograms
/// * `reps` - Number of repetitions performed
///
/// # Returns
/// Estimated 1RM in kilograms, or 0.0 for non-positive weight or zero reps
pub fn epley_1rm(weight_kg: f64, reps: u32) -> f64 {
    if weight_kg <= 0.0 || reps < 1 {
        return 0.0;
    }
    weight_kg * (1.0 + reps as f64 / 30.0)
}

/// Scans one week's rows for PRs against the stored maxes.
///
/// Every row whose exercise maps to a tracked lift contributes an estimate
/// from its load and best set; the best estimate per lift is compared against
/// the stored max. Strictly higher (or any estimate for an untested lift)
/// updates the max and yields a [`PrEvent`]. Returns the updated maxes and
/// the events in lift order.
pub fn detect_prs(rows: &[LogRow], maxes: &TestedMaxes) -> (TestedMaxes, Vec<PrEvent>) {
    let mut updated = *maxes;
    let mut events = Vec::new();

    for lift in LiftKey::all() {
        let mut best: Option<(f64, u32)> = None;
        for row in rows.iter().filter(|r| rm_key_for(&r.exercise) == Some(*lift)) {
            let Some(load) = row.load_used.filter(|l| *l > 0.0) else {
                continue;
            };
            let Some(reps) = row.best_reps().filter(|r| *r >= 1) else {
                continue;
            };
            let est = epley_1rm(load, reps);
            if best.is_none_or(|(b, _)| est > b) {
                best = Some((est, row.day));
            }
        }

        let Some((est, day)) = best else { continue };
        // A zero on record carries no information, same as no record.
        let previous = maxes.get(*lift).filter(|v| *v > 0.0);
        if previous.is_none_or(|p| est > p) {
            updated.set(*lift, Some(est));
            events.push(PrEvent {
                lift: *lift,
                previous_kg: previous,
                estimated_kg: est,
                day,
            });
        }
    }

    (updated, events)
}
