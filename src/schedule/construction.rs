use chrono::NaiveDate;

use super::context::PlanningContext;
use super::desiderata::Preference;
use super::scoring::score_candidate;
use super::slots::SlotId;
use super::stats::week_count;
use super::types::{Assignment, Cell, Period, PhysicianId};
use super::validator::holds_overlapping;
use crate::error::{PlannerError, Result};

/// Builds the draft assignment date by date, slot by slot.
///
/// Each capacity position goes to the best-scoring physician among those who
/// said Yes or Possible for the cell, still have room under their weekly cap,
/// hold no overlapping slot that day and are not already in this slot. When
/// nobody willing is left, physicians who stated nothing for the cell are
/// considered the same way. Positions nobody can take stay empty.
pub fn construct(ctx: &PlanningContext, period: &Period) -> Result<Assignment> {
    if ctx.roster.is_empty() {
        return Err(PlannerError::EmptyRoster);
    }

    let mut assignment = Assignment::new();

    for date in period.dates() {
        assignment.open_day(date);

        for slot_type in ctx.catalog.fill_order_for(date) {
            assignment.open_slot(date, slot_type.id, slot_type.capacity);

            for position in 0..slot_type.capacity {
                // Counts change after every placement, so re-filter each time
                if let Some(chosen) = pick_candidate(ctx, &assignment, date, slot_type.id) {
                    let cell = Cell {
                        date,
                        slot: slot_type.id,
                        position,
                    };
                    assignment.set(&cell, Some(chosen.clone()));
                }
            }
        }
    }

    Ok(assignment)
}

/// Hard filters every constructor candidate must pass
fn can_take(
    ctx: &PlanningContext,
    assignment: &Assignment,
    physician: &str,
    date: NaiveDate,
    slot: SlotId,
) -> bool {
    !assignment.holds(date, slot, physician)
        && week_count(assignment, physician, date) < ctx.desiderata.max_per_week(physician)
        && !holds_overlapping(ctx.catalog, assignment, physician, date, slot)
}

fn pick_candidate<'a>(
    ctx: &PlanningContext<'a>,
    assignment: &Assignment,
    date: NaiveDate,
    slot: SlotId,
) -> Option<&'a PhysicianId> {
    let willing: Vec<&'a PhysicianId> = ctx
        .roster
        .iter()
        .filter(|p| {
            matches!(
                ctx.desiderata.preference(p, date, slot),
                Some(Preference::Yes) | Some(Preference::Possible)
            )
        })
        .filter(|p| can_take(ctx, assignment, p, date, slot))
        .collect();

    let pool = if willing.is_empty() {
        ctx.roster
            .iter()
            .filter(|p| ctx.desiderata.preference(p, date, slot).is_none())
            .filter(|p| can_take(ctx, assignment, p, date, slot))
            .collect()
    } else {
        willing
    };

    best_ranked(ctx, assignment, date, slot, pool)
}

/// Highest score wins; the sort is stable so roster order breaks ties
fn best_ranked<'a>(
    ctx: &PlanningContext,
    assignment: &Assignment,
    date: NaiveDate,
    slot: SlotId,
    pool: Vec<&'a PhysicianId>,
) -> Option<&'a PhysicianId> {
    let mut ranked: Vec<(&'a PhysicianId, i64)> = pool
        .into_iter()
        .map(|p| (p, score_candidate(ctx, p, date, slot, assignment)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.first().map(|(p, _)| *p)
}
