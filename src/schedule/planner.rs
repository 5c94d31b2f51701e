use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::construction::construct;
use super::context::PlanningContext;
use super::desiderata::{Desiderata, PreferenceRecord};
use super::evaluation::evaluate;
use super::improve::{improve_with, Improvement};
use super::slots::SlotCatalog;
use super::stats::staffing_gaps;
use super::types::{Assignment, Cell, Period, PhysicianId};
use super::validator::{violations, Violation};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};

/// Input contract handed over by the surrounding application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRequest {
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub roster: Vec<PhysicianId>,
    #[serde(default)]
    pub preferences: Vec<PreferenceRecord>,
}

/// Where a planning run stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RunState {
    #[default]
    Empty,
    Constructed,
    /// Number of accepted improving moves
    Improved(usize),
}

/// Everything a run produced; `draft` is kept so callers can compare or roll back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRun {
    pub draft: Assignment,
    pub draft_score: i64,
    /// False when the draft broke a hard rule; the search then rarely moves
    pub draft_feasible: bool,
    pub assignment: Assignment,
    pub score: i64,
    pub state: RunState,
    pub gaps: Vec<Cell>,
    pub seed: Option<u64>,
}

/// Validated inputs of one planning run
#[derive(Debug, Clone)]
pub struct Planner {
    period: Period,
    roster: Vec<PhysicianId>,
    catalog: SlotCatalog,
    desiderata: Desiderata,
    config: PlannerConfig,
}

impl Planner {
    /// Refuses to plan for an empty roster. Duplicate roster entries are dropped,
    /// keeping the first occurrence.
    pub fn new(
        period: Period,
        roster: Vec<PhysicianId>,
        records: &[PreferenceRecord],
        config: PlannerConfig,
    ) -> Result<Self> {
        let mut unique: Vec<PhysicianId> = Vec::with_capacity(roster.len());
        for physician in roster {
            if !unique.contains(&physician) {
                unique.push(physician);
            }
        }
        if unique.is_empty() {
            return Err(PlannerError::EmptyRoster);
        }

        Ok(Self {
            period,
            roster: unique,
            catalog: SlotCatalog::standard(),
            desiderata: Desiderata::from_records(records, &period),
            config,
        })
    }

    pub fn from_request(request: PlanningRequest, config: PlannerConfig) -> Result<Self> {
        let period = request.period.ok_or(PlannerError::MissingPeriod)?;
        Self::new(period, request.roster, &request.preferences, config)
    }

    pub fn with_catalog(mut self, catalog: SlotCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn roster(&self) -> &[PhysicianId] {
        &self.roster
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    pub fn desiderata(&self) -> &Desiderata {
        &self.desiderata
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn context(&self) -> PlanningContext<'_> {
        PlanningContext::new(&self.catalog, &self.desiderata, &self.roster)
    }

    pub fn construct(&self) -> Result<Assignment> {
        construct(&self.context(), &self.period)
    }

    pub fn improve<R: Rng>(&self, draft: &Assignment, rng: &mut R) -> Improvement {
        improve_with(&self.context(), draft, self.config.improve_options(), rng)
    }

    pub fn evaluate(&self, assignment: &Assignment) -> i64 {
        evaluate(&self.context(), assignment)
    }

    pub fn violations(&self, assignment: &Assignment) -> Vec<Violation> {
        violations(&self.context(), assignment)
    }

    /// Construction followed by local search, drawing randomness from `rng`
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<ScheduleRun> {
        info!(
            start = %self.period.start(),
            end = %self.period.end(),
            physicians = self.roster.len(),
            profiles = self.desiderata.len(),
            "planning run started"
        );

        let draft = self.construct()?;
        let draft_score = self.evaluate(&draft);
        let draft_gaps = staffing_gaps(&draft).len();
        if draft_gaps > 0 {
            warn!(positions = draft_gaps, "draft leaves positions unfilled");
        }
        let draft_violations = self.violations(&draft);
        if !draft_violations.is_empty() {
            // Only feasible neighbors are scored, so one cell change must repair them all
            warn!(
                violations = draft_violations.len(),
                first = ?draft_violations[0].kind,
                "draft breaks hard rules, local search may stay put"
            );
        }
        info!(score = draft_score, "draft constructed");

        let improvement = self.improve(&draft, rng);
        let state = if improvement.iterations == 0 {
            RunState::Constructed
        } else {
            RunState::Improved(improvement.accepted_moves)
        };
        let gaps = staffing_gaps(&improvement.assignment);

        info!(
            score = improvement.score,
            accepted_moves = improvement.accepted_moves,
            iterations = improvement.iterations,
            unfilled = gaps.len(),
            "planning run finished"
        );

        Ok(ScheduleRun {
            draft,
            draft_score,
            draft_feasible: draft_violations.is_empty(),
            assignment: improvement.assignment,
            score: improvement.score,
            state,
            gaps,
            seed: None,
        })
    }

    /// Like [`Planner::run`] with a `StdRng` seeded from the config, or from OS
    /// entropy when no seed is configured. The seed used is logged and returned
    /// so the run can be replayed.
    pub fn run_seeded(&self) -> Result<ScheduleRun> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!(seed, "seeding local search");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut run = self.run(&mut rng)?;
        run.seed = Some(seed);
        Ok(run)
    }
}
