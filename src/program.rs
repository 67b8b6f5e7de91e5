//! The fixed 12-week program definition.
//!
//! Pure, read-only configuration: an ordered table of exercises per day with
//! set/rep targets, category, and per-exercise load increment, plus the map
//! from compound lifts to the tested max they seed from. The seeder treats
//! all of this as constant input; nothing here is mutable state.
//!
//! This is the V1 revision of the program, with a strict RM map (every mapped
//! exercise really is a variant of the tested lift). A later revision mapped
//! assistance pulls to a bench max as a rough guide; that variant was dropped.

use crate::domain::{Category, LiftKey};

// === Constants ===

/// Length of the program in weeks.
pub const WEEK_COUNT: u32 = 12;

/// Days per program week.
pub const DAY_COUNT: u32 = 7;

/// Seeding percentages applied to a tested max in the opening weeks.
///
/// Carried as a value rather than hard-coded in the seeder: the program has
/// shipped with a gentler 0.55 opener in the past, and the pair may be tuned
/// without touching seeding logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedPolicy {
    /// Fraction of the tested max prescribed in week 1.
    pub week1_pct: f64,
    /// Fraction of the tested max prescribed in week 2.
    pub week2_pct: f64,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            week1_pct: 0.625,
            week2_pct: 0.675,
        }
    }
}

impl SeedPolicy {
    /// The percentage to seed with for `week`, or `None` once seeding
    /// switches to carry-forward (week 3 onward).
    pub fn pct_for_week(&self, week: u32) -> Option<f64> {
        match week {
            1 => Some(self.week1_pct),
            2 => Some(self.week2_pct),
            _ => None,
        }
    }
}

// === Program table ===

/// One exercise prescription within a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramEntry {
    pub exercise: &'static str,
    pub sets: u32,
    pub rep_low: u32,
    pub rep_high: u32,
    pub category: Category,
    /// Load step added on successful progression, kg.
    pub increment: f64,
}

/// One day of the program week.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDay {
    pub title: &'static str,
    pub entries: &'static [ProgramEntry],
}

const fn entry(
    exercise: &'static str,
    sets: u32,
    rep_low: u32,
    rep_high: u32,
    category: Category,
    increment: f64,
) -> ProgramEntry {
    ProgramEntry {
        exercise,
        sets,
        rep_low,
        rep_high,
        category,
        increment,
    }
}

/// The full week template, days 1..=7 in order.
pub const PROGRAM: &[ProgramDay] = &[
    ProgramDay {
        title: "Day 1 – Push (Chest/Shoulders/Triceps)",
        entries: &[
            entry("Flat Barbell Bench Press", 3, 6, 8, Category::Compound, 2.5),
            entry("Incline Barbell Press", 3, 8, 10, Category::Accessory, 2.5),
            entry(
                "Overhead Press (Seated/Standing)",
                3,
                6,
                8,
                Category::Compound,
                2.5,
            ),
            entry("Lateral Raise (DB/Cable)", 3, 12, 15, Category::Accessory, 1.25),
            entry("Rope Pushdown", 3, 12, 15, Category::Accessory, 1.25),
        ],
    },
    ProgramDay {
        title: "Day 2 – Pull (Back/Biceps/Rear Delts)",
        entries: &[
            entry(
                "Pull-Ups (weighted if needed)",
                3,
                6,
                10,
                Category::Compound,
                2.5,
            ),
            entry("Barbell Row", 3, 6, 8, Category::Compound, 2.5),
            entry("Lat Pulldown", 3, 10, 12, Category::Accessory, 2.5),
            entry(
                "Rear Delt Fly / Face Pull",
                3,
                12,
                15,
                Category::Accessory,
                1.25,
            ),
            entry("Barbell Curl", 3, 8, 10, Category::Accessory, 1.25),
        ],
    },
    ProgramDay {
        title: "Day 3 – Rest (Core)",
        entries: &[
            entry("Cable Crunch", 3, 15, 15, Category::Accessory, 1.25),
            entry("Hanging Knees/Leg Raises", 3, 8, 20, Category::Accessory, 1.25),
            entry("Weighted Sit-Ups", 3, 15, 15, Category::Accessory, 1.25),
        ],
    },
    ProgramDay {
        title: "Day 4 – Lower (Quads/Hams/Glutes/Calves)",
        entries: &[
            entry("Back Squat", 3, 6, 8, Category::Compound, 5.0),
            entry("Romanian Deadlift", 3, 8, 10, Category::Accessory, 2.5),
            entry(
                "Bulgarian Split Squat (per leg)",
                3,
                10,
                12,
                Category::Accessory,
                2.5,
            ),
            entry("Standing Calf Raise", 3, 12, 15, Category::Accessory, 1.25),
            entry("Hip Thrust (BB/DB)", 2, 8, 10, Category::Accessory, 2.5),
        ],
    },
    ProgramDay {
        title: "Day 5 – Push",
        entries: &[
            entry("DB Flat Press", 3, 8, 10, Category::Accessory, 2.5),
            entry(
                "Incline DB Press / Cable Fly",
                3,
                10,
                12,
                Category::Accessory,
                2.5,
            ),
            entry("Seated DB Overhead Press", 3, 8, 10, Category::Accessory, 2.5),
            entry("Cable Lateral Raise", 3, 12, 15, Category::Accessory, 1.25),
            entry("Close-Grip Bench Press", 3, 6, 8, Category::Compound, 2.5),
        ],
    },
    ProgramDay {
        title: "Day 6 – Pull",
        entries: &[
            entry("Deadlift", 2, 4, 6, Category::Compound, 5.0),
            entry("Weighted Chin-Ups", 3, 6, 8, Category::Compound, 2.5),
            entry("One-Arm DB Row", 3, 8, 10, Category::Accessory, 2.5),
            entry("Seated Cable Row", 3, 10, 12, Category::Accessory, 2.5),
            entry("Rear Delt Fly", 3, 12, 15, Category::Accessory, 1.25),
            entry("Hammer Curl", 3, 10, 12, Category::Accessory, 1.25),
        ],
    },
    ProgramDay {
        title: "Day 7 – Rest",
        entries: &[],
    },
];

/// Which tested max a compound draws its opening-week seed from.
pub const RM_MAP: &[(&str, LiftKey)] = &[
    ("Back Squat", LiftKey::Squat),
    ("Flat Barbell Bench Press", LiftKey::Bench),
    ("Deadlift", LiftKey::Deadlift),
    ("Overhead Press (Seated/Standing)", LiftKey::Ohp),
    ("Close-Grip Bench Press", LiftKey::Bench),
];

/// Looks up the tested-max key for an exercise, if it has one.
pub fn rm_key_for(exercise: &str) -> Option<LiftKey> {
    RM_MAP
        .iter()
        .find(|(name, _)| *name == exercise)
        .map(|(_, key)| *key)
}

/// The exercise whose load series stands in for `lift` in progress views.
/// Variants that share a tested max (Close-Grip Bench) do not contribute.
pub fn primary_exercise(lift: LiftKey) -> &'static str {
    match lift {
        LiftKey::Squat => "Back Squat",
        LiftKey::Bench => "Flat Barbell Bench Press",
        LiftKey::Deadlift => "Deadlift",
        LiftKey::Ohp => "Overhead Press (Seated/Standing)",
    }
}

/// Returns the program day for `day_no` (1..=7).
pub fn program_day(day_no: u32) -> Option<&'static ProgramDay> {
    if day_no == 0 {
        return None;
    }
    PROGRAM.get(day_no as usize - 1)
}
