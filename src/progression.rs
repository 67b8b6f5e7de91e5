//! The load progression rule.
//!
//! Given one exercise's logged performance for a week, decides the load
//! prescribed for the next week. Deterministic and side-effect-free: the rule
//! runs on a value-object snapshot of the row, independent of storage, so it
//! can be exercised directly over partially-filled historical data.

use crate::domain::{Category, LogRow};
use crate::units::round_to_increment;

/// The row fields the progression rule depends on, snapshotted as values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSnapshot {
    /// Load used this week, kg. Absent when the week was never logged.
    pub load_used: Option<f64>,
    /// Top of the target rep range.
    pub rep_high: u32,
    /// Load step on successful progression, kg.
    pub increment: f64,
    pub category: Category,
    /// Target set count.
    pub sets: u32,
    pub s1: Option<u32>,
    pub s2: Option<u32>,
    pub s3: Option<u32>,
    /// Whether the final prescribed set is an AMRAP count.
    pub last_set_is_amrap: bool,
}

impl From<&LogRow> for RowSnapshot {
    fn from(row: &LogRow) -> Self {
        Self {
            load_used: row.load_used,
            rep_high: row.rep_high,
            increment: row.increment,
            category: row.category,
            sets: row.sets,
            s1: row.s1,
            s2: row.s2,
            s3: row.s3,
            last_set_is_amrap: row.last_set_is_amrap,
        }
    }
}

impl RowSnapshot {
    /// The AMRAP count: reps of the final prescribed set, for tagged rows.
    fn amrap_count(&self) -> Option<u32> {
        if !self.last_set_is_amrap {
            return None;
        }
        match self.sets.clamp(1, 3) {
            1 => self.s1,
            2 => self.s2,
            _ => self.s3,
        }
    }
}

/// AMRAP rep threshold that earns a load increase, by top of rep range.
pub fn amrap_threshold(rep_high: u32) -> u32 {
    match rep_high {
        0..=8 => 12,
        10 => 15,
        12 => 20,
        15 => 25,
        20.. => 30,
        _ => 20,
    }
}

/// Computes the next week's prescribed load for one row, kg.
///
/// Returns `None` when no load was logged this week: there is nothing to
/// progress from. Otherwise always returns a load; unchanged performance
/// yields the current load re-snapped to the plate step, never `None`.
///
/// Compounds progress when every prescribed set reaches the top of the rep
/// range; a 2-set prescription does not require a third-set value. Accessories
/// progress when the final AMRAP set reaches [`amrap_threshold`]. Unlogged
/// sets count as zero reps.
pub fn compute_new_load(row: &RowSnapshot) -> Option<f64> {
    let load = row.load_used?;

    let earned = match row.category {
        Category::Compound => {
            let s1 = row.s1.unwrap_or(0);
            let s2 = row.s2.unwrap_or(0);
            let s3 = row.s3.unwrap_or(0);
            s1 >= row.rep_high && s2 >= row.rep_high && (s3 >= row.rep_high || row.sets < 3)
        }
        Category::Accessory => {
            row.amrap_count().unwrap_or(0) >= amrap_threshold(row.rep_high)
        }
    };

    if earned {
        round_to_increment(Some(load + row.increment))
    } else {
        round_to_increment(Some(load))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(load: Option<f64>, reps: [Option<u32>; 3]) -> RowSnapshot {
        RowSnapshot {
            load_used: load,
            rep_high: 8,
            increment: 2.5,
            category: Category::Compound,
            sets: 3,
            s1: reps[0],
            s2: reps[1],
            s3: reps[2],
            last_set_is_amrap: false,
        }
    }

    fn accessory(load: Option<f64>, rep_high: u32, amrap: Option<u32>) -> RowSnapshot {
        RowSnapshot {
            load_used: load,
            rep_high,
            increment: 1.25,
            category: Category::Accessory,
            sets: 3,
            s1: Some(rep_high),
            s2: Some(rep_high),
            s3: amrap,
            last_set_is_amrap: true,
        }
    }

    #[test]
    fn test_no_load_no_progression() {
        assert_eq!(
            compute_new_load(&compound(None, [Some(8), Some(8), Some(8)])),
            None
        );
    }

    #[test]
    fn test_compound_all_sets_at_top_progresses() {
        // rep_high=8, sets=3, increment=2.5, load 100, reps 8/8/8.
        let next = compute_new_load(&compound(Some(100.0), [Some(8), Some(8), Some(8)]));
        assert_eq!(next, Some(102.5));
    }

    #[test]
    fn test_compound_missed_set_holds_load() {
        let next = compute_new_load(&compound(Some(100.0), [Some(8), Some(8), Some(6)]));
        assert_eq!(next, Some(100.0));
    }

    #[test]
    fn test_compound_unlogged_set_counts_as_zero() {
        let next = compute_new_load(&compound(Some(100.0), [Some(8), None, Some(8)]));
        assert_eq!(next, Some(100.0));
    }

    #[test]
    fn test_compound_two_set_prescription_exempts_third() {
        // Deadlift-style 2x4-6 row: s3 stays empty but both work sets hit top.
        let mut row = compound(Some(180.0), [Some(6), Some(6), None]);
        row.sets = 2;
        row.rep_high = 6;
        row.increment = 5.0;
        assert_eq!(compute_new_load(&row), Some(185.0));
    }

    #[test]
    fn test_compound_hold_resnaps_load() {
        // An off-step load entered by hand comes back snapped even on a hold.
        let next = compute_new_load(&compound(Some(101.3), [Some(8), Some(8), Some(6)]));
        assert_eq!(next, Some(101.25));
    }

    #[test]
    fn test_accessory_amrap_at_threshold_progresses() {
        // rep_high=12 thresholds at 20: 22 reps earns the 1.25 bump.
        let next = compute_new_load(&accessory(Some(20.0), 12, Some(22)));
        assert_eq!(next, Some(21.25));
    }

    #[test]
    fn test_accessory_amrap_below_threshold_holds() {
        let next = compute_new_load(&accessory(Some(20.0), 12, Some(15)));
        assert_eq!(next, Some(20.0));
    }

    #[test]
    fn test_accessory_unlogged_amrap_holds() {
        let next = compute_new_load(&accessory(Some(20.0), 12, None));
        assert_eq!(next, Some(20.0));
    }

    #[test]
    fn test_accessory_untagged_row_never_progresses() {
        // A category edit that cleared the tag leaves rep history unread
        // rather than reinterpreting s3 as an AMRAP.
        let mut row = accessory(Some(20.0), 12, Some(30));
        row.last_set_is_amrap = false;
        assert_eq!(compute_new_load(&row), Some(20.0));
    }

    #[test]
    fn test_accessory_short_prescription_reads_its_last_set() {
        // 2-set accessory: the AMRAP lives in s2.
        let mut row = accessory(Some(40.0), 10, None);
        row.sets = 2;
        row.s2 = Some(15);
        row.s3 = None;
        assert_eq!(compute_new_load(&row), Some(41.25));
    }

    #[test]
    fn test_amrap_threshold_table() {
        assert_eq!(amrap_threshold(6), 12);
        assert_eq!(amrap_threshold(8), 12);
        assert_eq!(amrap_threshold(10), 15);
        assert_eq!(amrap_threshold(12), 20);
        assert_eq!(amrap_threshold(15), 25);
        assert_eq!(amrap_threshold(20), 30);
        assert_eq!(amrap_threshold(25), 30);
        // Off-table rep ranges fall back to 20.
        assert_eq!(amrap_threshold(9), 20);
        assert_eq!(amrap_threshold(14), 20);
    }

    #[test]
    fn test_snapshot_from_row() {
        let row = LogRow {
            week: 3,
            day: 1,
            day_title: "Day 1".to_string(),
            exercise: "Flat Barbell Bench Press".to_string(),
            sets: 3,
            rep_low: 6,
            rep_high: 8,
            category: Category::Compound,
            increment: 2.5,
            load_used: Some(80.0),
            s1: Some(8),
            s2: Some(8),
            s3: Some(8),
            last_set_is_amrap: false,
            new_load: None,
            notes: None,
        };
        let snap = RowSnapshot::from(&row);
        assert_eq!(snap.load_used, Some(80.0));
        assert_eq!(compute_new_load(&snap), Some(82.5));
    }
}
