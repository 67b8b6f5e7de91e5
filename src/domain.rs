//! Domain types for program tracking.
//!
//! Everything here is a plain value object: rows are snapshots read from and
//! written back to the store, never live handles. Loads are always kilograms;
//! see [`crate::units`] for the display boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The lifts with a tracked one-rep max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiftKey {
    Squat,
    Bench,
    Deadlift,
    Ohp,
}

impl LiftKey {
    /// Returns all lift keys.
    pub fn all() -> &'static [LiftKey] {
        &[
            LiftKey::Squat,
            LiftKey::Bench,
            LiftKey::Deadlift,
            LiftKey::Ohp,
        ]
    }

    /// Stable identifier used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiftKey::Squat => "squat",
            LiftKey::Bench => "bench",
            LiftKey::Deadlift => "deadlift",
            LiftKey::Ohp => "ohp",
        }
    }

    /// Human-readable name for summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            LiftKey::Squat => "Squat",
            LiftKey::Bench => "Bench Press",
            LiftKey::Deadlift => "Deadlift",
            LiftKey::Ohp => "Overhead Press",
        }
    }

    /// Parses a stored identifier. Unknown strings yield `None`.
    pub fn from_id(s: &str) -> Option<LiftKey> {
        match s.trim().to_lowercase().as_str() {
            "squat" => Some(LiftKey::Squat),
            "bench" => Some(LiftKey::Bench),
            "deadlift" => Some(LiftKey::Deadlift),
            "ohp" => Some(LiftKey::Ohp),
            _ => None,
        }
    }
}

impl std::fmt::Display for LiftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exercise category, which selects the progression rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Progresses when every prescribed set reaches the top of the rep range.
    Compound,
    /// Progresses when the final AMRAP set reaches its threshold.
    Accessory,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Compound => "compound",
            Category::Accessory => "accessory",
        }
    }

    pub fn from_id(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "compound" => Some(Category::Compound),
            "accessory" => Some(Category::Accessory),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tested one-rep maxes, kg. Absence means "untested", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TestedMaxes {
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    pub ohp: Option<f64>,
}

impl TestedMaxes {
    pub fn get(&self, lift: LiftKey) -> Option<f64> {
        match lift {
            LiftKey::Squat => self.squat,
            LiftKey::Bench => self.bench,
            LiftKey::Deadlift => self.deadlift,
            LiftKey::Ohp => self.ohp,
        }
    }

    pub fn set(&mut self, lift: LiftKey, value_kg: Option<f64>) {
        match lift {
            LiftKey::Squat => self.squat = value_kg,
            LiftKey::Bench => self.bench = value_kg,
            LiftKey::Deadlift => self.deadlift = value_kg,
            LiftKey::Ohp => self.ohp = value_kg,
        }
    }
}

/// One exercise for one (week, day). Unique per (week, day, exercise);
/// created by the seeder, updated by submissions, never deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub week: u32,
    pub day: u32,
    pub day_title: String,
    pub exercise: String,

    pub sets: u32,
    pub rep_low: u32,
    pub rep_high: u32,
    pub category: Category,
    /// Load step added on successful progression, kg.
    pub increment: f64,

    /// Load used this week, kg.
    pub load_used: Option<f64>,
    pub s1: Option<u32>,
    pub s2: Option<u32>,
    pub s3: Option<u32>,
    /// Whether the final prescribed set is logged as an AMRAP count.
    /// Set by the seeder from the category; kept explicit so a category edit
    /// mid-history cannot silently reinterpret old rep data.
    pub last_set_is_amrap: bool,

    /// Prescription computed for next week, kg.
    pub new_load: Option<f64>,
    pub notes: Option<String>,
}

impl LogRow {
    /// Logged reps for set 1..=3, `None` outside that range.
    pub fn reps_for_set(&self, set_no: u32) -> Option<u32> {
        match set_no {
            1 => self.s1,
            2 => self.s2,
            3 => self.s3,
            _ => None,
        }
    }

    /// Index of the final prescribed set (rep columns stop at 3).
    pub fn last_prescribed_set(&self) -> u32 {
        self.sets.clamp(1, 3)
    }

    /// The AMRAP count: the rep value of the final prescribed set, present
    /// only on rows tagged `last_set_is_amrap`.
    pub fn amrap_reps(&self) -> Option<u32> {
        if self.last_set_is_amrap {
            self.reps_for_set(self.last_prescribed_set())
        } else {
            None
        }
    }

    /// The best logged rep count across all sets, for e1RM estimation.
    pub fn best_reps(&self) -> Option<u32> {
        [self.s1, self.s2, self.s3].into_iter().flatten().max()
    }

    /// The load this row contributes to a progress series: next week's
    /// prescription when computed, otherwise the load actually used.
    pub fn effective_load(&self) -> Option<f64> {
        self.new_load.or(self.load_used)
    }
}

/// One bodyweight sample per week, kg. Upserted on submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub week: u32,
    pub bodyweight_kg: f64,
}

/// A (week, day) performed on a calendar date. At most one per
/// (week, day, date); the store looks the triple up before inserting.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub week: u32,
    pub day: u32,
    pub session_date: NaiveDate,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

/// An estimated-1RM improvement, appended to history when detected.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecord {
    pub lift: LiftKey,
    pub estimated_kg: f64,
    pub week: u32,
    pub day: Option<u32>,
    pub session_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: Category, sets: u32, amrap: bool) -> LogRow {
        LogRow {
            week: 1,
            day: 1,
            day_title: "Day 1".to_string(),
            exercise: "Test Lift".to_string(),
            sets,
            rep_low: 8,
            rep_high: 10,
            category,
            increment: 2.5,
            load_used: Some(50.0),
            s1: Some(10),
            s2: Some(9),
            s3: Some(14),
            last_set_is_amrap: amrap,
            new_load: None,
            notes: None,
        }
    }

    #[test]
    fn test_lift_key_ids_round_trip() {
        for lift in LiftKey::all() {
            assert_eq!(LiftKey::from_id(lift.as_str()), Some(*lift));
        }
        assert_eq!(LiftKey::from_id(" OHP "), Some(LiftKey::Ohp));
        assert_eq!(LiftKey::from_id("press"), None);
    }

    #[test]
    fn test_category_ids_round_trip() {
        assert_eq!(Category::from_id("compound"), Some(Category::Compound));
        assert_eq!(Category::from_id("Accessory"), Some(Category::Accessory));
        assert_eq!(Category::from_id("cardio"), None);
    }

    #[test]
    fn test_tested_maxes_get_set() {
        let mut maxes = TestedMaxes::default();
        assert_eq!(maxes.get(LiftKey::Squat), None);
        maxes.set(LiftKey::Squat, Some(140.0));
        assert_eq!(maxes.get(LiftKey::Squat), Some(140.0));
        assert_eq!(maxes.get(LiftKey::Bench), None);
    }

    #[test]
    fn test_amrap_reps_reads_last_prescribed_set() {
        // 3-set accessory: AMRAP count comes from s3.
        let r = row(Category::Accessory, 3, true);
        assert_eq!(r.amrap_reps(), Some(14));

        // 2-set accessory: AMRAP count comes from s2, not s3.
        let r = row(Category::Accessory, 2, true);
        assert_eq!(r.amrap_reps(), Some(9));
    }

    #[test]
    fn test_amrap_reps_absent_without_tag() {
        let r = row(Category::Compound, 3, false);
        assert_eq!(r.amrap_reps(), None);
    }

    #[test]
    fn test_best_reps_ignores_missing_sets() {
        let mut r = row(Category::Compound, 3, false);
        r.s2 = None;
        assert_eq!(r.best_reps(), Some(14));
        r.s1 = None;
        r.s3 = None;
        assert_eq!(r.best_reps(), None);
    }

    #[test]
    fn test_effective_load_prefers_new_load() {
        let mut r = row(Category::Compound, 3, false);
        assert_eq!(r.effective_load(), Some(50.0));
        r.new_load = Some(52.5);
        assert_eq!(r.effective_load(), Some(52.5));
        r.load_used = None;
        r.new_load = None;
        assert_eq!(r.effective_load(), None);
    }
}
