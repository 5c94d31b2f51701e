use chrono::NaiveDate;

use super::context::PlanningContext;
use super::desiderata::Preference;
use super::slots::SlotId;
use super::stats::week_count;
use super::types::Assignment;
use super::validator::holds_overlapping;

pub const YES_SCORE: i64 = 3;
pub const POSSIBLE_SCORE: i64 = 1;
pub const NO_PENALTY: i64 = -5;
pub const OVERLAP_PENALTY: i64 = -50;
pub const NEAR_WEEKLY_CAP_PENALTY: i64 = -10;

/// Preference contribution shared by the candidate scorer and the evaluator
pub fn preference_score(preference: Option<Preference>) -> i64 {
    match preference {
        Some(Preference::Yes) => YES_SCORE,
        Some(Preference::Possible) => POSSIBLE_SCORE,
        Some(Preference::No) => NO_PENALTY,
        None => 0,
    }
}

/// Ranks one physician for one cell while a slot is being filled.
///
/// Only a ranking signal for the greedy constructor: it looks at the partial
/// assignment built so far, never at the whole solution.
pub fn score_candidate(
    ctx: &PlanningContext,
    physician: &str,
    date: NaiveDate,
    slot: SlotId,
    assignment: &Assignment,
) -> i64 {
    let mut score = preference_score(ctx.desiderata.preference(physician, date, slot));

    if holds_overlapping(ctx.catalog, assignment, physician, date, slot) {
        score += OVERLAP_PENALTY;
    }

    let max_per_week = ctx.desiderata.max_per_week(physician);
    if week_count(assignment, physician, date) >= max_per_week.saturating_sub(1) {
        score += NEAR_WEEKLY_CAP_PENALTY;
    }

    score
}
