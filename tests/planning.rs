use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;

use shift_planner::parser::read_desiderata_csv;
use shift_planner::schedule::calendar::week_key;
use shift_planner::schedule::stats::{shift_counts, staffing_gaps};
use shift_planner::schedule::{
    evaluate, improve, Assignment, Period, Planner, Preference, PreferenceRecord, RunState,
    SlotCatalog, SlotId, SlotType, ViolationKind,
};
use shift_planner::{PlannerConfig, PlannerError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn everywhere(id: &str, period: &Period, preference: Preference) -> PreferenceRecord {
    let mut record = PreferenceRecord::new(id);
    for d in period.dates() {
        for slot in SlotId::ALL {
            record = record.with_preference(d, slot, preference);
        }
    }
    record
}

/// Eight physicians over March 2024 with a deterministic spread of answers
fn march_planner(seed: u64) -> Planner {
    let period = Period::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
    let roster = names(&["ana", "ben", "chloe", "dev", "eli", "fay", "gus", "hana"]);
    let answers = [Preference::Yes, Preference::Possible, Preference::No];

    let records: Vec<PreferenceRecord> = roster
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut record = PreferenceRecord::new(id.as_str())
                .with_monthly_desired(10 + i as u32)
                .with_max_per_week(3 + (i % 3) as u32)
                .with_grouped_weekends(i % 2 == 0)
                .with_reinforcement_affinity(i % 3 == 0);
            for (k, d) in period.dates().enumerate() {
                for (s, slot) in SlotId::ALL.iter().enumerate() {
                    if (i + k + s) % 4 != 0 {
                        record = record.with_preference(d, *slot, answers[(i * 7 + k + s) % 3]);
                    }
                }
            }
            record
        })
        .collect();

    let config = PlannerConfig::default().with_seed(seed).with_max_iterations(300);
    Planner::new(period, roster, &records, config).unwrap()
}

/// Eighteen physicians in three groups over March 2024. A group answers Yes
/// to every slot on every third day and No otherwise, so the draft never
/// books anyone on two dates in a row. The first member of each group wants
/// no shifts, the others want more than a month can give them.
fn rotating_planner(seed: u64) -> Planner {
    let period = Period::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
    let mut roster = Vec::new();
    let mut records = Vec::new();
    for group in 0..3 {
        for member in 0..6 {
            let id = format!("g{}-{}", group, member);
            let mut record =
                PreferenceRecord::new(id.as_str()).with_monthly_desired(if member == 0 { 0 } else { 40 });
            for (k, d) in period.dates().enumerate() {
                let answer = if k % 3 == group { Preference::Yes } else { Preference::No };
                for slot in SlotId::ALL {
                    record = record.with_preference(d, slot, answer);
                }
            }
            roster.push(id);
            records.push(record);
        }
    }

    let config = PlannerConfig::default().with_seed(seed).with_max_iterations(300);
    Planner::new(period, roster, &records, config).unwrap()
}

fn assert_no_three_day_streaks(planner: &Planner, assignment: &Assignment) {
    let dates: Vec<NaiveDate> = assignment.dates().collect();
    for physician in planner.roster() {
        for window in dates.windows(3) {
            assert!(
                !window.iter().all(|d| assignment.works_on(*d, physician)),
                "{} works {} to {}",
                physician,
                window[0],
                window[2]
            );
        }
    }
}

#[test]
fn scenario_a_single_physician_fills_every_eligible_slot() {
    // capacity 1, no overlaps, Tuesday..Sunday keeps the week at 7 shifts
    let catalog = SlotCatalog::new(
        vec![
            SlotType::new(SlotId::Quart1, "night", 1),
            SlotType::new(SlotId::Renfort1, "saturday reinforcement", 1).only_on(Weekday::Sat),
        ],
        Vec::new(),
    );
    let period = Period::new(date(2024, 3, 5), date(2024, 3, 10)).unwrap();
    let planner = Planner::new(
        period,
        names(&["solo"]),
        &[everywhere("solo", &period, Preference::Yes).with_max_per_week(7)],
        PlannerConfig::default(),
    )
    .unwrap()
    .with_catalog(catalog);

    let draft = planner.construct().unwrap();
    assert_eq!(draft.dates().count(), 6);
    for (d, day) in draft.days() {
        assert_eq!(day.row(SlotId::Quart1).unwrap(), &vec![Some("solo".to_string())]);
        match day.row(SlotId::Renfort1) {
            Some(row) => {
                assert_eq!(d.weekday(), Weekday::Sat);
                assert_eq!(row, &vec![Some("solo".to_string())]);
            }
            None => assert_ne!(d.weekday(), Weekday::Sat),
        }
    }
    assert!(staffing_gaps(&draft).is_empty());
}

#[test]
fn scenario_b_overlapping_pair_holds_at_most_one() {
    let sat = date(2024, 3, 9);
    let period = Period::new(sat, sat).unwrap();
    let record = PreferenceRecord::new("solo")
        .with_preference(sat, SlotId::Quart2, Preference::Yes)
        .with_preference(sat, SlotId::Renfort1, Preference::Yes);
    let planner = Planner::new(
        period,
        names(&["solo"]),
        &[record],
        PlannerConfig::default().with_seed(3).with_max_iterations(200),
    )
    .unwrap();

    let run = planner.run_seeded().unwrap();
    let in_quart = run.assignment.holds(sat, SlotId::Quart2, "solo");
    let in_renfort = run.assignment.holds(sat, SlotId::Renfort1, "solo");
    assert!(!(in_quart && in_renfort));
    assert!(planner
        .violations(&run.assignment)
        .iter()
        .all(|v| v.kind != ViolationKind::Overlap));
}

#[test]
fn scenario_c_unspecified_preferences_fill_in_roster_order() {
    let catalog = SlotCatalog::new(vec![SlotType::new(SlotId::Quart1, "night", 1)], Vec::new());
    let period = Period::new(date(2024, 3, 4), date(2024, 3, 5)).unwrap();
    let planner = Planner::new(period, names(&["first", "second"]), &[], PlannerConfig::default())
        .unwrap()
        .with_catalog(catalog);

    let draft = planner.construct().unwrap();
    assert!(staffing_gaps(&draft).is_empty());
    for d in period.dates() {
        assert_eq!(draft.row(d, SlotId::Quart1).unwrap(), &vec![Some("first".to_string())]);
    }
}

#[test]
fn scenario_d_same_seed_same_assignment() {
    let planner = rotating_planner(2024);
    let draft = planner.construct().unwrap();
    assert!(planner.violations(&draft).is_empty());

    let ctx = planner.context();
    let first = improve(&ctx, &draft, 250, &mut StdRng::seed_from_u64(99));
    let second = improve(&ctx, &draft, 250, &mut StdRng::seed_from_u64(99));
    assert_eq!(first, second);
    assert_ne!(first, draft);

    let run_a = planner.run_seeded().unwrap();
    let run_b = planner.run_seeded().unwrap();
    assert_eq!(run_a.assignment, run_b.assignment);
    assert_eq!(run_a.score, run_b.score);
    assert_eq!(run_a.state, run_b.state);
    assert!(matches!(run_a.state, RunState::Improved(n) if n > 0));
}

#[test]
fn month_run_respects_hard_rules() {
    let planner = rotating_planner(17);
    let run = planner.run_seeded().unwrap();
    let catalog = planner.catalog();

    assert!(run.draft_feasible);
    assert!(matches!(run.state, RunState::Improved(n) if n > 0));
    assert!(run.score > run.draft_score);
    assert_eq!(run.score, planner.evaluate(&run.assignment));
    assert!(planner.violations(&run.assignment).is_empty());

    // capacity
    for (_, day) in run.assignment.days() {
        for (slot, row) in day.slots() {
            assert_eq!(row.len(), catalog.capacity(slot));
        }
    }

    // overlaps
    for (d, day) in run.assignment.days() {
        for (a, b) in catalog.overlap_pairs() {
            for physician in planner.roster() {
                assert!(!(day.holds(*a, physician) && day.holds(*b, physician)), "{} on {}", physician, d);
            }
        }
    }

    // weekly caps
    let mut weekly: HashMap<(String, (i32, u32)), u32> = HashMap::new();
    for (cell, physician) in run.assignment.occupied() {
        *weekly.entry((physician.clone(), week_key(cell.date))).or_default() += 1;
    }
    for ((physician, _), count) in weekly {
        assert!(count <= planner.desiderata().max_per_week(&physician));
    }

    // explicit refusals are never placed by construction
    for (cell, physician) in run.draft.occupied() {
        assert_ne!(
            planner.desiderata().preference(physician, cell.date, cell.slot),
            Some(Preference::No)
        );
    }

    // the search moves shifts away from the physicians who asked for none
    let before = shift_counts(&run.draft);
    let after = shift_counts(&run.assignment);
    let unwanted = |counts: &BTreeMap<String, u32>| -> u32 {
        (0..3).map(|g| counts.get(&format!("g{}-0", g)).copied().unwrap_or(0)).sum()
    };
    assert!(unwanted(&after) < unwanted(&before));
}

#[test]
fn runs_have_no_three_day_streaks() {
    let planner = rotating_planner(5);
    let run = planner.run_seeded().unwrap();
    assert!(planner.violations(&run.draft).is_empty());
    assert!(planner.violations(&run.assignment).is_empty());
    assert_no_three_day_streaks(&planner, &run.draft);
    assert_no_three_day_streaks(&planner, &run.assignment);
}

#[test]
fn streaky_draft_is_reported_and_kept() {
    let planner = march_planner(17);
    let run = planner.run_seeded().unwrap();

    assert!(!run.draft_feasible);
    let kinds: Vec<ViolationKind> = planner.violations(&run.draft).iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ViolationKind::ConsecutiveDays));
    assert!(!kinds.contains(&ViolationKind::Overlap));
    assert!(!kinds.contains(&ViolationKind::WeeklyCap));
    assert!(!kinds.contains(&ViolationKind::DuplicateInSlot));
    assert!(!kinds.contains(&ViolationKind::Capacity));

    assert_eq!(run.state, RunState::Improved(0));
    assert_eq!(run.assignment, run.draft);
    assert_eq!(run.score, run.draft_score);
}

#[test]
fn evaluate_is_pure() {
    let planner = march_planner(1);
    let draft = planner.construct().unwrap();
    let before: Assignment = draft.clone();
    let ctx = planner.context();
    assert_eq!(evaluate(&ctx, &draft), evaluate(&ctx, &draft));
    assert_eq!(draft, before);
}

#[test]
fn sheet_to_schedule() {
    let sheet = "\
physician_id,date,QUART_1,QUART_2,QUART_3,QUART_4,desired_per_month,max_per_week
ana,2024-03-04,Yes,,No,,4,3
ana,2024-03-05,Yes,,,,,
ben,2024-03-04,No,Yes,,Possible,4,3
ben,2024-03-05,,Yes,,,,
";
    let records = read_desiderata_csv(sheet.as_bytes()).unwrap();
    let period = Period::new(date(2024, 3, 4), date(2024, 3, 5)).unwrap();
    let planner = Planner::new(
        period,
        names(&["ana", "ben"]),
        &records,
        PlannerConfig::default().with_seed(8).with_max_iterations(100),
    )
    .unwrap();

    let run = planner.run_seeded().unwrap();
    assert!(run.assignment.holds(date(2024, 3, 4), SlotId::Quart1, "ana"));
    assert!(!run.assignment.holds(date(2024, 3, 4), SlotId::Quart1, "ben"));
    assert!(!run.assignment.holds(date(2024, 3, 4), SlotId::Quart3, "ana"));
    assert!(shift_counts(&run.assignment).values().all(|c| *c <= 6));
}

#[test]
fn invalid_inputs_are_rejected_up_front() {
    assert!(matches!(
        Period::new(date(2024, 3, 10), date(2024, 3, 1)),
        Err(PlannerError::InvertedPeriod { .. })
    ));
    let period = Period::new(date(2024, 3, 1), date(2024, 3, 2)).unwrap();
    assert!(matches!(
        Planner::new(period, Vec::new(), &[], PlannerConfig::default()),
        Err(PlannerError::EmptyRoster)
    ));
}
