//! Whole-assignment objective used to compare candidate solutions.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use super::calendar::{is_weekend, month_key, week_key, weekend_of};
use super::context::PlanningContext;
use super::scoring::{preference_score, OVERLAP_PENALTY};
use super::slots::SlotId;
use super::types::{Assignment, DayPlan};
use super::validator::holds_overlapping;

pub const WEEKLY_EXCESS_PENALTY: i64 = -20;
pub const GROUPED_WEEKEND_BONUS: i64 = 2;
pub const PAIRED_REINFORCEMENT_BONUS: i64 = 2;
pub const MONTHLY_DEVIATION_WEIGHT: i64 = 2;

/// Scores an entire assignment. Higher is better.
///
/// Per occupied cell: the preference term, the overlap penalty, a penalty for
/// every shift beyond the weekly cap, and the grouped-weekend and
/// paired-reinforcement bonuses. Then, for each physician holding at least one
/// shift, the distance between actual and desired monthly counts is subtracted
/// for every month the assignment covers.
pub fn evaluate(ctx: &PlanningContext, assignment: &Assignment) -> i64 {
    let mut score = 0;
    let mut weekly: HashMap<(&str, (i32, u32)), u32> = HashMap::new();
    let mut monthly: HashMap<(&str, (i32, u32)), u32> = HashMap::new();

    for (cell, physician) in assignment.occupied() {
        let physician = physician.as_str();
        let date = cell.date;

        let week = weekly.entry((physician, week_key(date))).or_insert(0);
        *week += 1;
        if *week > ctx.desiderata.max_per_week(physician) {
            score += WEEKLY_EXCESS_PENALTY;
        }

        if holds_overlapping(ctx.catalog, assignment, physician, date, cell.slot) {
            score += OVERLAP_PENALTY;
        }

        score += preference_score(ctx.desiderata.preference(physician, date, cell.slot));

        if let Some(profile) = ctx.desiderata.profile(physician) {
            if profile.grouped_weekend_affinity
                && is_weekend(date)
                && other_weekend_shifts(assignment, physician, date) > 0
            {
                score += GROUPED_WEEKEND_BONUS;
            }

            if profile.reinforcement_affinity {
                if let Some(day) = assignment.day(date) {
                    if pairs_with_other_kind(day, physician, cell.slot) {
                        score += PAIRED_REINFORCEMENT_BONUS;
                    }
                }
            }
        }

        *monthly.entry((physician, month_key(date))).or_insert(0) += 1;
    }

    let months: BTreeSet<(i32, u32)> = assignment.dates().map(month_key).collect();
    let staffed: BTreeSet<&str> = monthly.keys().map(|(p, _)| *p).collect();

    for physician in staffed {
        let desired = ctx.desiderata.monthly_desired(physician) as i64;
        for month in &months {
            let actual = monthly.get(&(physician, *month)).copied().unwrap_or(0) as i64;
            score -= MONTHLY_DEVIATION_WEIGHT * (actual - desired).abs();
        }
    }

    score
}

/// Shifts held on the same Saturday/Sunday pair, excluding the cell being scored
fn other_weekend_shifts(assignment: &Assignment, physician: &str, date: NaiveDate) -> usize {
    let Some(weekend) = weekend_of(date) else {
        return 0;
    };
    let total: usize = weekend
        .iter()
        .filter_map(|d| assignment.day(*d))
        .map(|day| day.count_for(physician))
        .sum();
    total.saturating_sub(1)
}

/// Reinforcement cell with a main shift the same day, or the reverse
fn pairs_with_other_kind(day: &DayPlan, physician: &str, slot: SlotId) -> bool {
    day.slots()
        .filter(|(other, _)| other.is_reinforcement() != slot.is_reinforcement())
        .any(|(_, row)| row.iter().flatten().any(|p| p == physician))
}
