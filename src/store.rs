//! SQLite persistence.
//!
//! One [`Store`] wraps one rusqlite connection. The schema is created
//! idempotently at open, so a fresh database file is ready after `open` and
//! an existing one is left untouched. Log rows are unique per
//! (week, day, exercise), bodyweight per week, and sessions per
//! (week, day, date); those constraints live here as SQL, not in the domain.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::domain::{
    Category, LiftKey, LogRow, PersonalRecord, ProgressEntry, TestedMaxes, WorkoutSession,
};
use crate::error::StoreError;
use crate::units::Unit;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS state (
    id        INTEGER PRIMARY KEY CHECK (id = 1),
    units     TEXT NOT NULL DEFAULT 'kg',
    squat     REAL,
    bench     REAL,
    deadlift  REAL,
    ohp       REAL
);
INSERT OR IGNORE INTO state (id, units) VALUES (1, 'kg');

CREATE TABLE IF NOT EXISTS log (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    week              INTEGER NOT NULL,
    day               INTEGER NOT NULL,
    day_title         TEXT NOT NULL,
    exercise          TEXT NOT NULL,
    sets              INTEGER NOT NULL,
    rep_low           INTEGER NOT NULL,
    rep_high          INTEGER NOT NULL,
    category          TEXT NOT NULL,
    increment         REAL NOT NULL,
    load_used         REAL,
    s1                INTEGER,
    s2                INTEGER,
    s3                INTEGER,
    last_set_is_amrap INTEGER NOT NULL DEFAULT 0,
    new_load          REAL,
    notes             TEXT,
    UNIQUE (week, day, exercise)
);

CREATE TABLE IF NOT EXISTS progress (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    week       INTEGER NOT NULL UNIQUE,
    bodyweight REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS workout_sessions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    week             INTEGER NOT NULL,
    day              INTEGER NOT NULL,
    session_date     TEXT NOT NULL,
    started_at       TEXT,
    ended_at         TEXT,
    duration_seconds INTEGER,
    UNIQUE (week, day, session_date)
);

CREATE TABLE IF NOT EXISTS pr_history (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    session_date TEXT NOT NULL,
    week         INTEGER NOT NULL,
    day          INTEGER,
    lift_key     TEXT NOT NULL,
    pr_kg        REAL NOT NULL
);
";

const UPSERT_ROW: &str = "
INSERT INTO log (week, day, day_title, exercise, sets, rep_low, rep_high,
                 category, increment, load_used, s1, s2, s3,
                 last_set_is_amrap, new_load, notes)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
ON CONFLICT (week, day, exercise) DO UPDATE SET
    day_title = excluded.day_title,
    sets = excluded.sets,
    rep_low = excluded.rep_low,
    rep_high = excluded.rep_high,
    category = excluded.category,
    increment = excluded.increment,
    load_used = excluded.load_used,
    s1 = excluded.s1,
    s2 = excluded.s2,
    s3 = excluded.s3,
    last_set_is_amrap = excluded.last_set_is_amrap,
    new_load = excluded.new_load,
    notes = excluded.notes
";

const SELECT_ROW: &str = "
SELECT week, day, day_title, exercise, sets, rep_low, rep_high, category,
       increment, load_used, s1, s2, s3, last_set_is_amrap, new_load, notes
FROM log
";

const SELECT_SESSION: &str = "
SELECT week, day, session_date, started_at, ended_at, duration_seconds
FROM workout_sessions
";

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Store, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Store, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Store, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    // === State ===

    pub fn units(&self) -> Result<Unit, StoreError> {
        let raw: String = self
            .conn
            .query_row("SELECT units FROM state WHERE id = 1", [], |r| r.get(0))?;
        raw.parse()
            .map_err(|()| StoreError::CorruptState(format!("unknown units '{raw}'")))
    }

    pub fn set_units(&self, unit: Unit) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE state SET units = ?1 WHERE id = 1",
            params![unit.as_str()],
        )?;
        Ok(())
    }

    pub fn maxes(&self) -> Result<TestedMaxes, StoreError> {
        let maxes = self.conn.query_row(
            "SELECT squat, bench, deadlift, ohp FROM state WHERE id = 1",
            [],
            |r| {
                Ok(TestedMaxes {
                    squat: r.get(0)?,
                    bench: r.get(1)?,
                    deadlift: r.get(2)?,
                    ohp: r.get(3)?,
                })
            },
        )?;
        Ok(maxes)
    }

    pub fn save_maxes(&self, maxes: &TestedMaxes) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE state SET squat = ?1, bench = ?2, deadlift = ?3, ohp = ?4 WHERE id = 1",
            params![maxes.squat, maxes.bench, maxes.deadlift, maxes.ohp],
        )?;
        Ok(())
    }

    // === Log rows ===

    pub fn rows_for_week(&self, week: u32) -> Result<Vec<LogRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_ROW} WHERE week = ?1 ORDER BY day, id"))?;
        let rows = stmt
            .query_map(params![week], map_log_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn rows_for_day(&self, week: u32, day: u32) -> Result<Vec<LogRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_ROW} WHERE week = ?1 AND day = ?2 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![week, day], map_log_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All log rows, ordered for export.
    pub fn all_rows(&self) -> Result<Vec<LogRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_ROW} ORDER BY week, day, id"))?;
        let rows = stmt
            .query_map([], map_log_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Load series for one exercise, week ascending. Each point is the
    /// computed next load when present, otherwise the load actually used.
    pub fn load_series(&self, exercise: &str) -> Result<Vec<(u32, Option<f64>)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT week, new_load, load_used FROM log WHERE exercise = ?1 ORDER BY week",
        )?;
        let rows = stmt
            .query_map(params![exercise], |r| {
                let week: u32 = r.get(0)?;
                let new_load: Option<f64> = r.get(1)?;
                let load_used: Option<f64> = r.get(2)?;
                Ok((week, new_load.or(load_used)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Writes all rows in one transaction, inserting or updating each by
    /// its (week, day, exercise) key.
    pub fn save_rows(&mut self, rows: &[LogRow]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_ROW)?;
            for row in rows {
                bind_row(&mut stmt, row)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // === Bodyweight progress ===

    pub fn upsert_bodyweight(&self, week: u32, bodyweight_kg: f64) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO progress (week, bodyweight) VALUES (?1, ?2)
             ON CONFLICT (week) DO UPDATE SET bodyweight = excluded.bodyweight",
            params![week, bodyweight_kg],
        )?;
        Ok(())
    }

    pub fn bodyweight_for_week(&self, week: u32) -> Result<Option<f64>, StoreError> {
        let bw = self
            .conn
            .query_row(
                "SELECT bodyweight FROM progress WHERE week = ?1",
                params![week],
                |r| r.get(0),
            )
            .optional()?;
        Ok(bw)
    }

    pub fn progress_list(&self) -> Result<Vec<ProgressEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT week, bodyweight FROM progress ORDER BY week")?;
        let rows = stmt
            .query_map([], |r| {
                Ok(ProgressEntry {
                    week: r.get(0)?,
                    bodyweight_kg: r.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // === Workout sessions ===

    /// Inserts or merges a session for its (week, day, date). Present
    /// timestamps overwrite, absent ones keep what is stored.
    pub fn upsert_session(&self, sess: &WorkoutSession) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO workout_sessions
                 (week, day, session_date, started_at, ended_at, duration_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (week, day, session_date) DO UPDATE SET
                 started_at = COALESCE(excluded.started_at, started_at),
                 ended_at = COALESCE(excluded.ended_at, ended_at),
                 duration_seconds = COALESCE(excluded.duration_seconds, duration_seconds)",
            params![
                sess.week,
                sess.day,
                sess.session_date,
                sess.started_at,
                sess.ended_at,
                sess.duration_seconds,
            ],
        )?;
        Ok(())
    }

    pub fn sessions_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkoutSession>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_SESSION} WHERE session_date >= ?1 AND session_date <= ?2
             ORDER BY session_date, id"
        ))?;
        let rows = stmt
            .query_map(params![from, to], map_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn first_session_on(&self, date: NaiveDate) -> Result<Option<WorkoutSession>, StoreError> {
        let sess = self
            .conn
            .query_row(
                &format!("{SELECT_SESSION} WHERE session_date = ?1 ORDER BY id LIMIT 1"),
                params![date],
                map_session,
            )
            .optional()?;
        Ok(sess)
    }

    // === PR history ===

    pub fn append_pr(&self, pr: &PersonalRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO pr_history (session_date, week, day, lift_key, pr_kg)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pr.session_date,
                pr.week,
                pr.day,
                pr.lift.as_str(),
                pr.estimated_kg,
            ],
        )?;
        Ok(())
    }

    pub fn pr_list(&self) -> Result<Vec<PersonalRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT lift_key, pr_kg, week, day, session_date FROM pr_history ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], map_pr)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn bind_row(stmt: &mut rusqlite::Statement<'_>, row: &LogRow) -> rusqlite::Result<usize> {
    stmt.execute(params![
        row.week,
        row.day,
        row.day_title,
        row.exercise,
        row.sets,
        row.rep_low,
        row.rep_high,
        row.category.as_str(),
        row.increment,
        row.load_used,
        row.s1,
        row.s2,
        row.s3,
        row.last_set_is_amrap,
        row.new_load,
        row.notes,
    ])
}

fn map_log_row(row: &Row) -> rusqlite::Result<LogRow> {
    let category_str: String = row.get("category")?;
    let category = Category::from_id(&category_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(StoreError::CorruptState(format!(
                "unknown category '{category_str}'"
            ))),
        )
    })?;

    Ok(LogRow {
        week: row.get("week")?,
        day: row.get("day")?,
        day_title: row.get("day_title")?,
        exercise: row.get("exercise")?,
        sets: row.get("sets")?,
        rep_low: row.get("rep_low")?,
        rep_high: row.get("rep_high")?,
        category,
        increment: row.get("increment")?,
        load_used: row.get("load_used")?,
        s1: row.get("s1")?,
        s2: row.get("s2")?,
        s3: row.get("s3")?,
        last_set_is_amrap: row.get("last_set_is_amrap")?,
        new_load: row.get("new_load")?,
        notes: row.get("notes")?,
    })
}

fn map_session(row: &Row) -> rusqlite::Result<WorkoutSession> {
    Ok(WorkoutSession {
        week: row.get("week")?,
        day: row.get("day")?,
        session_date: row.get("session_date")?,
        started_at: row.get::<_, Option<DateTime<Utc>>>("started_at")?,
        ended_at: row.get::<_, Option<DateTime<Utc>>>("ended_at")?,
        duration_seconds: row.get("duration_seconds")?,
    })
}

fn map_pr(row: &Row) -> rusqlite::Result<PersonalRecord> {
    let key_str: String = row.get("lift_key")?;
    let lift = LiftKey::from_id(&key_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(StoreError::CorruptState(format!(
                "unknown lift key '{key_str}'"
            ))),
        )
    })?;

    Ok(PersonalRecord {
        lift,
        estimated_kg: row.get("pr_kg")?,
        week: row.get("week")?,
        day: row.get("day")?,
        session_date: row.get("session_date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::SeedPolicy;
    use crate::seeder::seed_week;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    fn sample_row(week: u32, day: u32, exercise: &str) -> LogRow {
        LogRow {
            week,
            day,
            day_title: format!("Day {day}"),
            exercise: exercise.to_string(),
            sets: 3,
            rep_low: 6,
            rep_high: 8,
            category: Category::Compound,
            increment: 2.5,
            load_used: Some(100.0),
            s1: Some(8),
            s2: Some(7),
            s3: None,
            last_set_is_amrap: false,
            new_load: Some(100.0),
            notes: Some("paused".to_string()),
        }
    }

    #[test]
    fn test_schema_is_idempotent_and_units_default_kg() {
        let s = store();
        s.conn.execute_batch(SCHEMA).unwrap();
        assert_eq!(s.units().unwrap(), Unit::Kg);
    }

    #[test]
    fn test_units_round_trip() {
        let s = store();
        s.set_units(Unit::Lb).unwrap();
        assert_eq!(s.units().unwrap(), Unit::Lb);
    }

    #[test]
    fn test_maxes_round_trip() {
        let s = store();
        assert_eq!(s.maxes().unwrap(), TestedMaxes::default());
        let maxes = TestedMaxes {
            squat: Some(140.0),
            bench: Some(100.0),
            deadlift: None,
            ohp: Some(60.0),
        };
        s.save_maxes(&maxes).unwrap();
        assert_eq!(s.maxes().unwrap(), maxes);
    }

    #[test]
    fn test_row_upsert_keeps_one_row_per_key() {
        let mut s = store();
        let mut row = sample_row(1, 1, "Flat Barbell Bench Press");
        s.save_rows(&[row.clone()]).unwrap();
        row.load_used = Some(102.5);
        row.notes = None;
        s.save_rows(&[row]).unwrap();

        let rows = s.rows_for_week(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].load_used, Some(102.5));
        assert_eq!(rows[0].notes, None);
    }

    #[test]
    fn test_save_rows_round_trips_seeded_week() {
        let mut s = store();
        let seeded = seed_week(1, &TestedMaxes::default(), &SeedPolicy::default(), &[], &[]);
        s.save_rows(&seeded).unwrap();
        let back = s.rows_for_week(1).unwrap();
        assert_eq!(back, seeded);
    }

    #[test]
    fn test_rows_for_day_filters() {
        let mut s = store();
        s.save_rows(&[
            sample_row(2, 1, "Flat Barbell Bench Press"),
            sample_row(2, 4, "Back Squat"),
        ])
        .unwrap();
        let day4 = s.rows_for_day(2, 4).unwrap();
        assert_eq!(day4.len(), 1);
        assert_eq!(day4[0].exercise, "Back Squat");
    }

    #[test]
    fn test_load_series_prefers_new_load() {
        let mut s = store();
        let mut w1 = sample_row(1, 4, "Back Squat");
        w1.load_used = Some(100.0);
        w1.new_load = Some(105.0);
        let mut w2 = sample_row(2, 4, "Back Squat");
        w2.load_used = Some(105.0);
        w2.new_load = None;
        s.save_rows(&[w1, w2]).unwrap();

        let series = s.load_series("Back Squat").unwrap();
        assert_eq!(series, vec![(1, Some(105.0)), (2, Some(105.0))]);
    }

    #[test]
    fn test_bodyweight_upsert_replaces() {
        let s = store();
        s.upsert_bodyweight(3, 82.0).unwrap();
        s.upsert_bodyweight(3, 82.6).unwrap();
        s.upsert_bodyweight(1, 81.0).unwrap();

        assert_eq!(s.bodyweight_for_week(3).unwrap(), Some(82.6));
        assert_eq!(s.bodyweight_for_week(7).unwrap(), None);
        let list = s.progress_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].week, 1);
        assert_eq!(list[1].bodyweight_kg, 82.6);
    }

    #[test]
    fn test_session_upsert_merges_timestamps() {
        let s = store();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let start = "2026-03-02T17:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let end = "2026-03-02T18:00:00Z".parse::<DateTime<Utc>>().unwrap();

        s.upsert_session(&WorkoutSession {
            week: 5,
            day: 4,
            session_date: date,
            started_at: Some(start),
            ended_at: None,
            duration_seconds: None,
        })
        .unwrap();
        s.upsert_session(&WorkoutSession {
            week: 5,
            day: 4,
            session_date: date,
            started_at: None,
            ended_at: Some(end),
            duration_seconds: Some(3600),
        })
        .unwrap();

        let sessions = s.sessions_in_range(date, date).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].started_at, Some(start));
        assert_eq!(sessions[0].ended_at, Some(end));
        assert_eq!(sessions[0].duration_seconds, Some(3600));
    }

    #[test]
    fn test_sessions_in_range_filters_by_date() {
        let s = store();
        for (day, date) in [(1, "2026-03-30"), (2, "2026-04-01"), (4, "2026-04-28")] {
            s.upsert_session(&WorkoutSession {
                week: 1,
                day,
                session_date: date.parse().unwrap(),
                started_at: None,
                ended_at: None,
                duration_seconds: None,
            })
            .unwrap();
        }
        let april = s
            .sessions_in_range(
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
            )
            .unwrap();
        assert_eq!(april.len(), 2);
        assert_eq!(april[0].day, 2);

        let on_day = s
            .first_session_on(NaiveDate::from_ymd_opt(2026, 4, 28).unwrap())
            .unwrap();
        assert_eq!(on_day.unwrap().day, 4);
        assert!(
            s.first_session_on(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_pr_history_round_trip() {
        let s = store();
        let pr = PersonalRecord {
            lift: LiftKey::Bench,
            estimated_kg: 116.67,
            week: 4,
            day: Some(1),
            session_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        s.append_pr(&pr).unwrap();
        let list = s.pr_list().unwrap();
        assert_eq!(list, vec![pr]);
    }

    #[test]
    fn test_corrupt_category_surfaces_as_error() {
        let s = store();
        s.conn
            .execute(
                "INSERT INTO log (week, day, day_title, exercise, sets, rep_low, rep_high,
                                  category, increment)
                 VALUES (1, 1, 'Day 1', 'Mystery Lift', 3, 6, 8, 'cardio', 2.5)",
                [],
            )
            .unwrap();
        assert!(s.rows_for_week(1).is_err());
    }
}
