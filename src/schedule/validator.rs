use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::week_key;
use super::context::PlanningContext;
use super::slots::{SlotCatalog, SlotId};
use super::types::{Assignment, PhysicianId};

/// Which hard rule an assignment breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    /// Row longer than the slot's capacity, or a slot that does not exist that day
    Capacity,
    /// Same physician in two slots whose time windows intersect
    Overlap,
    /// Same physician twice in one slot-day
    DuplicateInSlot,
    /// More shifts in an ISO week than the physician's cap
    WeeklyCap,
    /// Worked on three consecutive date keys
    ConsecutiveDays,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Absent for grid-shape problems
    pub physician: Option<PhysicianId>,
    pub date: NaiveDate,
    pub slot: Option<SlotId>,
}

/// Whether `physician` already holds a slot overlapping `slot` on `date`
pub fn holds_overlapping(
    catalog: &SlotCatalog,
    assignment: &Assignment,
    physician: &str,
    date: NaiveDate,
    slot: SlotId,
) -> bool {
    catalog
        .overlaps(slot)
        .into_iter()
        .any(|other| assignment.holds(date, other, physician))
}

/// Hard feasibility of a full assignment
pub fn is_feasible(ctx: &PlanningContext, assignment: &Assignment) -> bool {
    scan(ctx, assignment, true).is_empty()
}

/// Every broken hard rule, in date order
pub fn violations(ctx: &PlanningContext, assignment: &Assignment) -> Vec<Violation> {
    scan(ctx, assignment, false)
}

fn scan(ctx: &PlanningContext, assignment: &Assignment, stop_at_first: bool) -> Vec<Violation> {
    let mut found = Vec::new();
    let mut weekly: HashMap<(&str, (i32, u32)), u32> = HashMap::new();
    // Physicians working on the previous two date keys (sorted order, not calendar)
    let mut previous: HashSet<&str> = HashSet::new();
    let mut before_previous: HashSet<&str> = HashSet::new();

    macro_rules! report {
        ($kind:expr, $physician:expr, $date:expr, $slot:expr) => {{
            found.push(Violation {
                kind: $kind,
                physician: $physician.map(str::to_string),
                date: $date,
                slot: $slot,
            });
            if stop_at_first {
                return found;
            }
        }};
    }

    for (date, day) in assignment.days() {
        let mut working: Vec<&str> = Vec::new();

        for (slot, row) in day.slots() {
            let fits = ctx
                .catalog
                .get(slot)
                .map_or(false, |t| t.applies_on(date) && row.len() <= t.capacity);
            if !fits {
                report!(ViolationKind::Capacity, None, date, Some(slot));
            }

            let mut in_slot: HashSet<&str> = HashSet::new();

            for physician in row.iter().flatten() {
                let physician = physician.as_str();

                if !in_slot.insert(physician) {
                    report!(ViolationKind::DuplicateInSlot, Some(physician), date, Some(slot));
                }

                // Each overlapping pair is reported once, from its lower slot
                let clash = ctx
                    .catalog
                    .overlaps(slot)
                    .into_iter()
                    .any(|other| slot < other && day.holds(other, physician));
                if clash {
                    report!(ViolationKind::Overlap, Some(physician), date, Some(slot));
                }

                let count = weekly.entry((physician, week_key(date))).or_insert(0);
                *count += 1;
                if *count == ctx.desiderata.max_per_week(physician).saturating_add(1) {
                    report!(ViolationKind::WeeklyCap, Some(physician), date, Some(slot));
                }

                if !working.contains(&physician) {
                    working.push(physician);
                }
            }
        }

        for physician in &working {
            if previous.contains(physician) && before_previous.contains(physician) {
                report!(ViolationKind::ConsecutiveDays, Some(*physician), date, None);
            }
        }

        before_previous = previous;
        previous = working.into_iter().collect();
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::desiderata::{Desiderata, PreferenceRecord};
    use crate::schedule::types::{Cell, Period};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid(dates: &[NaiveDate], catalog: &SlotCatalog) -> Assignment {
        let mut a = Assignment::new();
        for d in dates {
            for slot in catalog.fill_order_for(*d) {
                a.open_slot(*d, slot.id, slot.capacity);
            }
        }
        a
    }

    fn place(a: &mut Assignment, d: NaiveDate, slot: SlotId, position: usize, who: &str) {
        a.set(&Cell { date: d, slot, position }, Some(who.to_string()));
    }

    #[test]
    fn empty_grid_is_feasible() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let a = grid(&[date(2024, 3, 9), date(2024, 3, 10)], &catalog);
        assert!(is_feasible(&ctx, &a));
        assert!(violations(&ctx, &a).is_empty());
    }

    #[test]
    fn detects_overlap_on_saturday() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let sat = date(2024, 3, 9);
        let mut a = grid(&[sat], &catalog);
        place(&mut a, sat, SlotId::Quart2, 0, "alice");
        place(&mut a, sat, SlotId::Renfort1, 0, "alice");

        assert!(!is_feasible(&ctx, &a));
        let found = violations(&ctx, &a);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::Overlap);
        assert_eq!(found[0].slot, Some(SlotId::Quart2));
    }

    #[test]
    fn non_overlapping_slots_same_day_are_fine() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let d = date(2024, 3, 11);
        let mut a = grid(&[d], &catalog);
        place(&mut a, d, SlotId::Quart1, 0, "alice");
        place(&mut a, d, SlotId::Quart3, 0, "alice");
        assert!(is_feasible(&ctx, &a));
    }

    #[test]
    fn detects_three_consecutive_date_keys() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let days = [date(2024, 3, 11), date(2024, 3, 12), date(2024, 3, 13)];
        let mut a = grid(&days, &catalog);
        place(&mut a, days[0], SlotId::Quart1, 0, "alice");
        place(&mut a, days[1], SlotId::Quart1, 0, "alice");
        assert!(is_feasible(&ctx, &a));

        place(&mut a, days[2], SlotId::Quart3, 0, "alice");
        let found = violations(&ctx, &a);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::ConsecutiveDays);
        assert_eq!(found[0].date, days[2]);
        assert_eq!(found[0].physician.as_deref(), Some("alice"));
    }

    #[test]
    fn consecutive_rule_uses_sorted_keys_not_calendar() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        // Gaps between the dates still count as consecutive entries
        let days = [date(2024, 3, 4), date(2024, 3, 7), date(2024, 3, 20)];
        let mut a = grid(&days, &catalog);
        for d in days {
            place(&mut a, d, SlotId::Quart1, 0, "alice");
        }
        assert!(!is_feasible(&ctx, &a));
    }

    #[test]
    fn weekly_cap_uses_profile() {
        let catalog = SlotCatalog::standard();
        let period = Period::new(date(2024, 3, 11), date(2024, 3, 17)).unwrap();
        let desiderata = Desiderata::from_records(&[PreferenceRecord::new("alice").with_max_per_week(2)], &period);
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let days = [date(2024, 3, 11), date(2024, 3, 13)];
        let mut a = grid(&days, &catalog);
        place(&mut a, days[0], SlotId::Quart1, 0, "alice");
        place(&mut a, days[1], SlotId::Quart1, 0, "alice");
        assert!(is_feasible(&ctx, &a));

        place(&mut a, days[1], SlotId::Quart3, 0, "alice");
        let found = violations(&ctx, &a);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::WeeklyCap);
    }

    #[test]
    fn duplicate_in_slot_is_infeasible() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let d = date(2024, 3, 11);
        let mut a = grid(&[d], &catalog);
        place(&mut a, d, SlotId::Quart2, 0, "alice");
        place(&mut a, d, SlotId::Quart2, 2, "alice");
        assert_eq!(violations(&ctx, &a)[0].kind, ViolationKind::DuplicateInSlot);
        assert!(!is_feasible(&ctx, &a));
    }

    #[test]
    fn oversized_rows_and_misplaced_slots_are_reported() {
        let catalog = SlotCatalog::standard();
        let desiderata = Desiderata::default();
        let roster = vec!["alice".to_string()];
        let ctx = PlanningContext::new(&catalog, &desiderata, &roster);

        let monday = date(2024, 3, 11);
        let mut a = grid(&[monday], &catalog);
        a.open_slot(monday, SlotId::Quart1, 3);
        let found = violations(&ctx, &a);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::Capacity);
        assert_eq!(found[0].slot, Some(SlotId::Quart1));
        assert_eq!(found[0].physician, None);

        // RENFORT_1 only exists on Saturdays
        let mut b = grid(&[monday], &catalog);
        b.open_slot(monday, SlotId::Renfort1, 1);
        assert!(!is_feasible(&ctx, &b));
        assert_eq!(violations(&ctx, &b)[0].kind, ViolationKind::Capacity);
    }

    #[test]
    fn holds_overlapping_helper() {
        let catalog = SlotCatalog::standard();
        let d = date(2024, 3, 11);
        let mut a = grid(&[d], &catalog);
        place(&mut a, d, SlotId::Quart4, 1, "bob");
        assert!(holds_overlapping(&catalog, &a, "bob", d, SlotId::Renfort2));
        assert!(!holds_overlapping(&catalog, &a, "bob", d, SlotId::Quart3));
        assert!(!holds_overlapping(&catalog, &a, "alice", d, SlotId::Renfort2));
    }
}
