//! Unit conversion and load rounding.
//!
//! All loads and maxes are stored in kilograms. Conversion to and from the
//! lifter's display unit happens only at the input/display boundary, never
//! inside the progression arithmetic. Rounding to the plate increment is a
//! separate, explicit step applied when a load is stored as a prescription.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pounds per kilogram.
pub const LB_PER_KG: f64 = 2.20462262185;

/// Smallest loadable step, kg: a 1.25 kg microplate pair or half a dumbbell
/// jump. The program's accessory increments are 1.25 kg, so the snap must be
/// at least this fine or those increments would round away and accessory
/// progression would stall.
pub const LOAD_STEP_KG: f64 = 1.25;

/// Display unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Lb,
}

impl Unit {
    /// Stable string form used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lb => "lb",
        }
    }
}

impl FromStr for Unit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "lb" | "lbs" => Ok(Unit::Lb),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Converts a value entered in `unit` to kilograms.
///
/// `None` passes through untouched so optional fields can be piped through
/// without unwrapping. No rounding is applied here.
pub fn to_canonical(value: Option<f64>, unit: Unit) -> Option<f64> {
    value.map(|v| match unit {
        Unit::Kg => v,
        Unit::Lb => v / LB_PER_KG,
    })
}

/// Converts a stored kilogram value to the display unit.
///
/// The inverse of [`to_canonical`]; `None` passes through untouched.
pub fn to_display(value: Option<f64>, unit: Unit) -> Option<f64> {
    value.map(|v| match unit {
        Unit::Kg => v,
        Unit::Lb => v * LB_PER_KG,
    })
}

/// Snaps a load to the nearest loadable step.
///
/// Applied to every computed or user-entered load before it is stored as a
/// next-week prescription, and to seeded loads derived from a percentage of
/// a tested max. The result is additionally rounded to 2 decimal places to
/// absorb floating-point noise, so the function is idempotent. `None` in,
/// `None` out.
pub fn round_to_increment(value: Option<f64>) -> Option<f64> {
    value.map(|v| {
        let snapped = (v / LOAD_STEP_KG).round() * LOAD_STEP_KG;
        (snapped * 100.0).round() / 100.0
    })
}

/// Parses a raw weight field leniently.
///
/// Empty, whitespace-only, or unparseable input yields `None`; callers skip
/// the field and keep prior state. Partial form submissions must never abort
/// a save.
pub fn parse_weight(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a raw rep-count field leniently. Same policy as [`parse_weight`].
pub fn parse_reps(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u32>().ok()
}
