use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::display::schedule_lines;
use crate::error::PlannerError;
use crate::parser::read_desiderata_csv;
use crate::schedule::desiderata::rank_by_preference;
use crate::schedule::planner::{Planner, PlanningRequest, ScheduleRun};
use crate::schedule::slots::SlotId;
use crate::schedule::stats::{coverage, shift_counts, Coverage};
use crate::schedule::types::{Assignment, Cell, Period, PhysicianId};
use crate::schedule::validator::Violation;

/// Last generated plan together with the planner that produced it
pub struct Generated {
    pub planner: Planner,
    pub run: ScheduleRun,
}

// In-memory only; the calling application owns persistence
pub struct AppState {
    pub config: PlannerConfig,
    pub last: Mutex<Option<Generated>>,
}

impl AppState {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            last: Mutex::new(None),
        }
    }

    fn last(&self) -> MutexGuard<'_, Option<Generated>> {
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    success: bool,
    score: i64,
    draft_score: i64,
    seed: Option<u64>,
    assignment: Assignment,
    gaps: Vec<Cell>,
    coverage: Coverage,
}

impl GenerateResponse {
    fn from_run(run: &ScheduleRun) -> Self {
        Self {
            success: true,
            score: run.score,
            draft_score: run.draft_score,
            seed: run.seed,
            assignment: run.assignment.clone(),
            gaps: run.gaps.clone(),
            coverage: coverage(&run.assignment),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    shift_counts: BTreeMap<PhysicianId, u32>,
    coverage: Coverage,
    unfilled: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    score: i64,
    feasible: bool,
    violations: Vec<Violation>,
}

#[derive(Deserialize)]
pub struct CandidatesQuery {
    date: NaiveDate,
    slot: SlotId,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    start: NaiveDate,
    end: NaiveDate,
    /// Comma separated physician ids
    roster: String,
}

fn bad_request(err: PlannerError) -> HttpResponse {
    warn!(error = %err, "rejected planning input");
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": err.to_string()
    }))
}

fn run_and_store(planner: Planner, state: &AppState) -> HttpResponse {
    match planner.run_seeded() {
        Ok(run) => {
            let response = GenerateResponse::from_run(&run);
            *state.last() = Some(Generated { planner, run });
            HttpResponse::Ok().json(response)
        }
        Err(e) => bad_request(e),
    }
}

// Generate from a JSON planning request
async fn generate(
    req: web::Json<PlanningRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    match Planner::from_request(req.into_inner(), state.config.clone()) {
        Ok(planner) => Ok(run_and_store(planner, &state)),
        Err(e) => Ok(bad_request(e)),
    }
}

// Generate from a desiderata CSV sheet posted as the request body
async fn upload(
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let roster: Vec<PhysicianId> = query
        .roster
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let planner = Period::new(query.start, query.end).and_then(|period| {
        let records = read_desiderata_csv(&body[..])?;
        info!(records = records.len(), "desiderata sheet uploaded");
        Planner::new(period, roster, &records, state.config.clone())
    });

    match planner {
        Ok(planner) => Ok(run_and_store(planner, &state)),
        Err(e) => Ok(bad_request(e)),
    }
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let last = state.last();
    match last.as_ref() {
        Some(generated) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "period": generated.planner.period(),
            "roster": generated.planner.roster(),
            "score": generated.run.score,
            "assignment": generated.run.assignment,
            "lines": schedule_lines(&generated.run.assignment),
        }))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Schedule not available"}))),
    }
}

async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let last = state.last();
    match last.as_ref() {
        Some(generated) => Ok(HttpResponse::Ok().json(StatsResponse {
            shift_counts: shift_counts(&generated.run.assignment),
            coverage: coverage(&generated.run.assignment),
            unfilled: generated.run.gaps.len(),
        })),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"}))),
    }
}

// Roster ordered by willingness for one cell, for manual edits
async fn get_candidates(
    query: web::Query<CandidatesQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let last = state.last();
    match last.as_ref() {
        Some(generated) => {
            let planner = &generated.planner;
            let ranking = rank_by_preference(planner.roster(), planner.desiderata(), query.date, query.slot);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "ranking": ranking,
                "ordered": ranking.all(),
            })))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Generate a schedule first"}))),
    }
}

// Score a hand-edited assignment against the last generated plan's inputs
async fn evaluate(
    assignment: web::Json<Assignment>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let last = state.last();
    match last.as_ref() {
        Some(generated) => {
            let violations = generated.planner.violations(&assignment);
            Ok(HttpResponse::Ok().json(EvaluateResponse {
                score: generated.planner.evaluate(&assignment),
                feasible: violations.is_empty(),
                violations,
            }))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Generate a schedule first"}))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/generate", web::post().to(generate))
        .route("/api/upload", web::post().to(upload))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/stats", web::get().to(get_stats))
        .route("/api/candidates", web::get().to(get_candidates))
        .route("/api/evaluate", web::post().to(evaluate));
}

pub async fn start_server(port: u16, config: PlannerConfig) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(config));

    info!(port, "starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
