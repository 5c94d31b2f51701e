use rand::Rng;
use tracing::{debug, trace};

use super::context::PlanningContext;
use super::evaluation::evaluate;
use super::stats::week_count;
use super::tabu::{TabuList, DEFAULT_TABU_CAPACITY};
use super::types::{Assignment, Cell, PhysicianId};
use super::validator::is_feasible;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// A single-cell change to an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    /// Put `physician` into the cell, replacing whoever held it
    Substitute { cell: Cell, physician: PhysicianId },
    /// Empty the cell
    Clear { cell: Cell },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImproveOptions {
    pub max_iterations: usize,
    pub tabu_capacity: usize,
}

impl Default for ImproveOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tabu_capacity: DEFAULT_TABU_CAPACITY,
        }
    }
}

/// Result of a local search pass
#[derive(Debug, Clone)]
pub struct Improvement {
    pub assignment: Assignment,
    pub score: i64,
    pub accepted_moves: usize,
    pub iterations: usize,
}

/// Runs the tabu repair loop with the default tabu capacity
pub fn improve<R: Rng>(
    ctx: &PlanningContext,
    assignment: &Assignment,
    max_iterations: usize,
    rng: &mut R,
) -> Assignment {
    let options = ImproveOptions {
        max_iterations,
        ..ImproveOptions::default()
    };
    improve_with(ctx, assignment, options, rng).assignment
}

/// Randomized single-cell local search.
///
/// Every round draws one cell of the current best solution uniformly, builds
/// all feasible substitutions plus the clearing move for that cell, and keeps
/// the best-scoring neighbor that is not tabu. The neighbor replaces the best
/// solution only when it scores strictly higher; accepted solutions enter the
/// tabu list. The input is never modified.
pub fn improve_with<R: Rng>(
    ctx: &PlanningContext,
    assignment: &Assignment,
    options: ImproveOptions,
    rng: &mut R,
) -> Improvement {
    let mut best = assignment.clone();
    let mut best_score = evaluate(ctx, &best);
    let mut tabu = TabuList::new(options.tabu_capacity);
    let mut accepted_moves = 0;

    // Neighbors never add or remove positions, so the cell list is fixed
    let cells = best.cells();
    if cells.is_empty() {
        return Improvement {
            assignment: best,
            score: best_score,
            accepted_moves,
            iterations: 0,
        };
    }

    for iteration in 0..options.max_iterations {
        let cell = cells[rng.gen_range(0..cells.len())];

        let mut chosen: Option<(Move, Assignment, i64, u64)> = None;
        for (mv, candidate) in neighbors(ctx, &best, &cell) {
            let fingerprint = candidate.fingerprint();
            if tabu.contains(fingerprint) {
                continue;
            }
            let score = evaluate(ctx, &candidate);
            if chosen.as_ref().map_or(true, |(_, _, s, _)| score > *s) {
                chosen = Some((mv, candidate, score, fingerprint));
            }
        }

        match chosen {
            Some((mv, candidate, score, fingerprint)) if score > best_score => {
                debug!(iteration, from = best_score, to = score, ?mv, "accepted move");
                tabu.insert(fingerprint);
                best = candidate;
                best_score = score;
                accepted_moves += 1;
            }
            _ => trace!(iteration, ?cell, "no improving neighbor"),
        }
    }

    Improvement {
        assignment: best,
        score: best_score,
        accepted_moves,
        iterations: options.max_iterations,
    }
}

/// Feasible single-cell variants of `assignment` at `cell`
pub fn neighbors(ctx: &PlanningContext, assignment: &Assignment, cell: &Cell) -> Vec<(Move, Assignment)> {
    let mut found = Vec::new();

    for physician in ctx.roster {
        if assignment.holds(cell.date, cell.slot, physician) {
            continue;
        }
        let candidate = assignment.with_cell(cell, Some(physician.clone()));
        let within_cap =
            week_count(&candidate, physician, cell.date) <= ctx.desiderata.max_per_week(physician);
        if within_cap && is_feasible(ctx, &candidate) {
            let mv = Move::Substitute {
                cell: *cell,
                physician: physician.clone(),
            };
            found.push((mv, candidate));
        }
    }

    let cleared = assignment.with_cell(cell, None);
    if is_feasible(ctx, &cleared) {
        found.push((Move::Clear { cell: *cell }, cleared));
    }

    found
}
