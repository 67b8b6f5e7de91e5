//! Web server exposing the program tracker as a JSON API.
//!
//! Handlers are thin: they validate the route, take the store mutex, and call
//! into the sync pipeline helpers at the bottom of this module. One lock per
//! request covers the whole seed/merge/progress sequence, so every request
//! reads its own writes. All loads cross this boundary in the lifter's
//! display unit; everything behind it is kilograms.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{Category, LiftKey, LogRow, PersonalRecord, TestedMaxes, WorkoutSession};
use crate::error::StoreError;
use crate::estimator::{PrEvent, detect_prs};
use crate::export::export_workbook;
use crate::program::{DAY_COUNT, SeedPolicy, WEEK_COUNT, primary_exercise, program_day};
use crate::seeder::seed_week;
use crate::store::Store;
use crate::submission::{self, WeekSubmission};
use crate::units::{Unit, to_canonical, to_display};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared application state.
pub struct AppState {
    /// The single store, behind an async mutex: a request's read-modify-write
    /// sequence is one critical section.
    pub store: Mutex<Store>,
    pub seed_policy: SeedPolicy,
}

// === JSON Response Types ===

#[derive(Serialize)]
pub struct WeekResponse {
    pub week: u32,
    pub units: Unit,
    pub bodyweight: Option<f64>,
    pub days: Vec<DayGroup>,
}

#[derive(Serialize)]
pub struct DayGroup {
    pub day: u32,
    pub title: String,
    pub rows: Vec<RowJson>,
}

#[derive(Serialize)]
pub struct RowJson {
    pub exercise: String,
    pub sets: u32,
    pub rep_low: u32,
    pub rep_high: u32,
    pub category: Category,
    pub increment: f64,
    pub load_used: Option<f64>,
    pub s1: Option<u32>,
    pub s2: Option<u32>,
    pub s3: Option<u32>,
    pub last_set_is_amrap: bool,
    pub new_load: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub week: u32,
    pub saved_rows: usize,
    pub prs: Vec<PrJson>,
}

#[derive(Serialize)]
pub struct PrJson {
    pub lift: String,
    pub name: String,
    pub previous: Option<f64>,
    pub estimated: f64,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    pub units: Unit,
}

#[derive(Deserialize)]
pub struct SettingsUpdate {
    pub units: Unit,
}

#[derive(Serialize)]
pub struct MaxesResponse {
    pub units: Unit,
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    pub ohp: Option<f64>,
}

/// RM test input, values in the display unit. Absent or non-positive fields
/// leave the stored max untouched.
#[derive(Deserialize)]
pub struct MaxesUpdate {
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    pub ohp: Option<f64>,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub units: Unit,
    pub bodyweight: Vec<ProgressPointJson>,
    pub lifts: Vec<LiftSeriesJson>,
    pub prs: Vec<PrHistoryJson>,
}

#[derive(Serialize)]
pub struct ProgressPointJson {
    pub week: u32,
    pub bodyweight: f64,
}

#[derive(Serialize)]
pub struct LiftSeriesJson {
    pub lift: String,
    pub name: String,
    pub points: Vec<SeriesPointJson>,
}

#[derive(Serialize)]
pub struct SeriesPointJson {
    pub week: u32,
    pub load: Option<f64>,
}

#[derive(Serialize)]
pub struct PrHistoryJson {
    pub lift: String,
    pub estimated: f64,
    pub week: u32,
    pub day: Option<u32>,
    pub date: String,
}

#[derive(Serialize)]
pub struct MonthResponse {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Blank cells before day 1 in a Sunday-first calendar grid.
    pub start_pad: u32,
    pub sessions: Vec<SessionJson>,
}

#[derive(Serialize)]
pub struct SessionJson {
    pub week: u32,
    pub day: u32,
    pub date: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_seconds: Option<i64>,
}

#[derive(Serialize)]
pub struct DayDetailResponse {
    pub units: Unit,
    pub session: SessionJson,
    pub rows: Vec<RowJson>,
}

// === Router Setup ===

/// Creates the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/week/{week}", get(get_week).post(post_week))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/maxes", get(get_maxes).put(put_maxes))
        .route("/api/progress", get(get_progress))
        .route("/api/history/{year}/{month}", get(get_history_month))
        .route("/api/history/{year}/{month}/{day}", get(get_history_day))
        .route("/export.xlsx", get(get_export))
        .with_state(state)
}

/// Runs the web server.
pub async fn run_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("Server running at http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// === API Handlers ===

/// GET /healthz - Liveness probe touching the database.
async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, (StatusCode, String)> {
    let store = state.store.lock().await;
    match store.units() {
        Ok(_) => Ok("ok"),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"))),
    }
}

/// GET /api/week/{week} - Seed and return one week, grouped by day.
async fn get_week(
    State(state): State<Arc<AppState>>,
    Path(week): Path<u32>,
) -> Result<Json<WeekResponse>, StatusCode> {
    validate_week(week)?;
    let mut store = state.store.lock().await;
    let unit = store.units().map_err(internal_error)?;
    let maxes = store.maxes().map_err(internal_error)?;
    let rows =
        seed_week_rows(&mut store, week, &maxes, &state.seed_policy).map_err(internal_error)?;
    let bodyweight = store.bodyweight_for_week(week).map_err(internal_error)?;
    Ok(Json(week_response(week, unit, bodyweight, &rows)))
}

/// POST /api/week/{week} - Save a week submission, report PRs.
async fn post_week(
    State(state): State<Arc<AppState>>,
    Path(week): Path<u32>,
    Json(sub): Json<WeekSubmission>,
) -> Result<Json<SaveResponse>, StatusCode> {
    validate_week(week)?;
    let mut store = state.store.lock().await;
    let today = Utc::now().date_naive();
    let outcome = run_submission(&mut store, week, &sub, &state.seed_policy, today)
        .map_err(internal_error)?;
    Ok(Json(SaveResponse {
        week,
        saved_rows: outcome.rows.len(),
        prs: outcome
            .prs
            .iter()
            .map(|e| pr_json(e, outcome.unit))
            .collect(),
    }))
}

/// GET /api/settings - Display unit preference.
async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let store = state.store.lock().await;
    let units = store.units().map_err(internal_error)?;
    Ok(Json(SettingsResponse { units }))
}

/// PUT /api/settings - Change the display unit.
async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let store = state.store.lock().await;
    store.set_units(update.units).map_err(internal_error)?;
    Ok(Json(SettingsResponse {
        units: update.units,
    }))
}

/// GET /api/maxes - Tested maxes in display units.
async fn get_maxes(State(state): State<Arc<AppState>>) -> Result<Json<MaxesResponse>, StatusCode> {
    let store = state.store.lock().await;
    let unit = store.units().map_err(internal_error)?;
    let maxes = store.maxes().map_err(internal_error)?;
    Ok(Json(maxes_response(unit, &maxes)))
}

/// PUT /api/maxes - Record an RM test; absent fields keep their stored value.
async fn put_maxes(
    State(state): State<Arc<AppState>>,
    Json(update): Json<MaxesUpdate>,
) -> Result<Json<MaxesResponse>, StatusCode> {
    let store = state.store.lock().await;
    let unit = store.units().map_err(internal_error)?;
    let mut maxes = store.maxes().map_err(internal_error)?;

    let fields = [
        (LiftKey::Squat, update.squat),
        (LiftKey::Bench, update.bench),
        (LiftKey::Deadlift, update.deadlift),
        (LiftKey::Ohp, update.ohp),
    ];
    for (lift, value) in fields {
        if let Some(v) = value.filter(|v| *v > 0.0) {
            maxes.set(lift, to_canonical(Some(v), unit));
        }
    }

    store.save_maxes(&maxes).map_err(internal_error)?;
    Ok(Json(maxes_response(unit, &maxes)))
}

/// GET /api/progress - Bodyweight and lift series plus PR history.
async fn get_progress(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProgressResponse>, StatusCode> {
    let store = state.store.lock().await;
    let unit = store.units().map_err(internal_error)?;

    let bodyweight = store
        .progress_list()
        .map_err(internal_error)?
        .into_iter()
        .map(|p| ProgressPointJson {
            week: p.week,
            bodyweight: display_value(p.bodyweight_kg, unit),
        })
        .collect();

    let mut lifts = Vec::new();
    for lift in LiftKey::all() {
        let points = store
            .load_series(primary_exercise(*lift))
            .map_err(internal_error)?
            .into_iter()
            .map(|(week, load)| SeriesPointJson {
                week,
                load: display_load(load, unit),
            })
            .collect();
        lifts.push(LiftSeriesJson {
            lift: lift.as_str().to_string(),
            name: lift.display_name().to_string(),
            points,
        });
    }

    let prs = store
        .pr_list()
        .map_err(internal_error)?
        .iter()
        .map(|pr| PrHistoryJson {
            lift: pr.lift.as_str().to_string(),
            estimated: display_value(pr.estimated_kg, unit),
            week: pr.week,
            day: pr.day,
            date: pr.session_date.to_string(),
        })
        .collect();

    Ok(Json(ProgressResponse {
        units: unit,
        bodyweight,
        lifts,
        prs,
    }))
}

/// GET /api/history/{year}/{month} - Sessions for a calendar month.
async fn get_history_month(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthResponse>, StatusCode> {
    let (first, last) = month_bounds(year, month).ok_or(StatusCode::BAD_REQUEST)?;
    let store = state.store.lock().await;
    let sessions = store
        .sessions_in_range(first, last)
        .map_err(internal_error)?;
    Ok(Json(MonthResponse {
        year,
        month,
        days_in_month: last.day(),
        start_pad: first.weekday().num_days_from_sunday(),
        sessions: sessions.iter().map(session_json).collect(),
    }))
}

/// GET /api/history/{year}/{month}/{day} - The workout performed on a date.
async fn get_history_day(
    State(state): State<Arc<AppState>>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Json<DayDetailResponse>, StatusCode> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(StatusCode::BAD_REQUEST)?;
    let store = state.store.lock().await;
    let sess = store
        .first_session_on(date)
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    let unit = store.units().map_err(internal_error)?;
    let rows = store
        .rows_for_day(sess.week, sess.day)
        .map_err(internal_error)?;
    Ok(Json(DayDetailResponse {
        units: unit,
        session: session_json(&sess),
        rows: rows.iter().map(|r| row_json(r, unit)).collect(),
    }))
}

/// GET /export.xlsx - Workbook download.
async fn get_export(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let store = state.store.lock().await;
    let bytes = export_workbook(&store).map_err(|e| {
        log::error!("export failed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    drop(store);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"liftplan_export.xlsx\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

// === Submission Pipeline ===

/// Outcome of one saved week, for the response body.
pub struct SubmissionOutcome {
    pub unit: Unit,
    pub rows: Vec<LogRow>,
    pub prs: Vec<PrEvent>,
}

/// Seeds `week` from the program, persists the result, and returns the rows.
fn seed_week_rows(
    store: &mut Store,
    week: u32,
    maxes: &TestedMaxes,
    policy: &SeedPolicy,
) -> Result<Vec<LogRow>, StoreError> {
    let existing = store.rows_for_week(week)?;
    let prior = if week > 1 {
        store.rows_for_week(week - 1)?
    } else {
        Vec::new()
    };
    let rows = seed_week(week, maxes, policy, &prior, &existing);
    store.save_rows(&rows)?;
    Ok(rows)
}

/// The full save pipeline: seed, merge the submission, persist rows,
/// bodyweight and session, then scan for PRs and record them.
fn run_submission(
    store: &mut Store,
    week: u32,
    sub: &WeekSubmission,
    policy: &SeedPolicy,
    today: NaiveDate,
) -> Result<SubmissionOutcome, StoreError> {
    let unit = store.units()?;
    let maxes = store.maxes()?;

    let mut rows = seed_week_rows(store, week, &maxes, policy)?;
    submission::apply(sub, unit, &mut rows);
    store.save_rows(&rows)?;

    if let Some(bw) = submission::bodyweight_kg(sub, unit) {
        store.upsert_bodyweight(week, bw)?;
    }
    if let Some(sess) = submission::session_for(sub, week, today) {
        store.upsert_session(&sess)?;
    }

    let (updated, events) = detect_prs(&rows, &maxes);
    if !events.is_empty() {
        store.save_maxes(&updated)?;
        for event in &events {
            log::info!(
                "new {} PR: {:.1} kg estimated (week {week})",
                event.lift.display_name(),
                event.estimated_kg
            );
            store.append_pr(&PersonalRecord {
                lift: event.lift,
                estimated_kg: event.estimated_kg,
                week,
                day: Some(event.day),
                session_date: today,
            })?;
        }
    }

    Ok(SubmissionOutcome {
        unit,
        rows,
        prs: events,
    })
}

// === Helper Functions ===

fn validate_week(week: u32) -> Result<(), StatusCode> {
    if (1..=WEEK_COUNT).contains(&week) {
        Ok(())
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

fn internal_error(err: StoreError) -> StatusCode {
    log::error!("store error: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Converts a stored kg value to the display unit, rounded to 2 decimals.
fn display_load(value: Option<f64>, unit: Unit) -> Option<f64> {
    to_display(value, unit).map(|v| (v * 100.0).round() / 100.0)
}

fn display_value(value_kg: f64, unit: Unit) -> f64 {
    display_load(Some(value_kg), unit).unwrap_or(value_kg)
}

/// First and last day of a calendar month, `None` for an invalid month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

fn week_response(
    week: u32,
    unit: Unit,
    bodyweight_kg: Option<f64>,
    rows: &[LogRow],
) -> WeekResponse {
    let days = (1..=DAY_COUNT)
        .map(|day| {
            let day_rows: Vec<&LogRow> = rows.iter().filter(|r| r.day == day).collect();
            let title = day_rows
                .first()
                .map(|r| r.day_title.clone())
                .or_else(|| program_day(day).map(|d| d.title.to_string()))
                .unwrap_or_else(|| format!("Day {day}"));
            DayGroup {
                day,
                title,
                rows: day_rows.into_iter().map(|r| row_json(r, unit)).collect(),
            }
        })
        .collect();
    WeekResponse {
        week,
        units: unit,
        bodyweight: display_load(bodyweight_kg, unit),
        days,
    }
}

fn row_json(row: &LogRow, unit: Unit) -> RowJson {
    RowJson {
        exercise: row.exercise.clone(),
        sets: row.sets,
        rep_low: row.rep_low,
        rep_high: row.rep_high,
        category: row.category,
        increment: row.increment,
        load_used: display_load(row.load_used, unit),
        s1: row.s1,
        s2: row.s2,
        s3: row.s3,
        last_set_is_amrap: row.last_set_is_amrap,
        new_load: display_load(row.new_load, unit),
        notes: row.notes.clone(),
    }
}

fn maxes_response(unit: Unit, maxes: &TestedMaxes) -> MaxesResponse {
    MaxesResponse {
        units: unit,
        squat: display_load(maxes.squat, unit),
        bench: display_load(maxes.bench, unit),
        deadlift: display_load(maxes.deadlift, unit),
        ohp: display_load(maxes.ohp, unit),
    }
}

fn pr_json(event: &PrEvent, unit: Unit) -> PrJson {
    PrJson {
        lift: event.lift.as_str().to_string(),
        name: event.lift.display_name().to_string(),
        previous: display_load(event.previous_kg, unit),
        estimated: display_value(event.estimated_kg, unit),
    }
}

fn session_json(sess: &WorkoutSession) -> SessionJson {
    SessionJson {
        week: sess.week,
        day: sess.day,
        date: sess.session_date.to_string(),
        started_at: sess.started_at.map(|t| t.to_rfc3339()),
        ended_at: sess.ended_at.map(|t| t.to_rfc3339()),
        duration_seconds: sess.duration_seconds,
    }
}
