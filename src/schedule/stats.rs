use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{month_key, week_key, MonthKey, WeekKey};
use super::types::{Assignment, Cell, PhysicianId};

/// Shifts held by `physician` in the ISO week containing `date`
pub fn week_count(assignment: &Assignment, physician: &str, date: NaiveDate) -> u32 {
    let week = week_key(date);
    assignment
        .occupied()
        .filter(|(cell, p)| p.as_str() == physician && week_key(cell.date) == week)
        .count() as u32
}

/// Shift counts per physician per ISO week
pub fn weekly_counts(assignment: &Assignment) -> HashMap<(PhysicianId, WeekKey), u32> {
    let mut counts = HashMap::new();
    for (cell, physician) in assignment.occupied() {
        *counts.entry((physician.clone(), week_key(cell.date))).or_insert(0) += 1;
    }
    counts
}

/// Shift counts per physician per calendar month
pub fn monthly_counts(assignment: &Assignment) -> HashMap<(PhysicianId, MonthKey), u32> {
    let mut counts = HashMap::new();
    for (cell, physician) in assignment.occupied() {
        *counts.entry((physician.clone(), month_key(cell.date))).or_insert(0) += 1;
    }
    counts
}

/// Total shifts per physician over the whole assignment
pub fn shift_counts(assignment: &Assignment) -> BTreeMap<PhysicianId, u32> {
    let mut counts = BTreeMap::new();
    for (_, physician) in assignment.occupied() {
        *counts.entry(physician.clone()).or_insert(0) += 1;
    }
    counts
}

/// Unfilled staffing positions, for callers reporting under-staffed slots
pub fn staffing_gaps(assignment: &Assignment) -> Vec<Cell> {
    assignment
        .cells()
        .into_iter()
        .filter(|cell| assignment.get(cell).is_none())
        .collect()
}

/// Filled vs. required positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub filled: usize,
    pub required: usize,
}

pub fn coverage(assignment: &Assignment) -> Coverage {
    Coverage {
        filled: assignment.occupied().count(),
        required: assignment.cells().len(),
    }
}
