use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::schedule::planner::ScheduleRun;
use crate::schedule::slots::SlotCatalog;
use crate::schedule::stats::shift_counts;
use crate::schedule::types::{Assignment, SlotRow};

/// Formats a slot row as `a, b, [EMPTY]`
pub fn format_row(row: &SlotRow) -> String {
    row.iter()
        .map(|position| position.as_deref().unwrap_or("[EMPTY]"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per date and slot: `YYYY-MM-DD QUART_1: a, b, [EMPTY]`
pub fn schedule_lines(assignment: &Assignment) -> Vec<String> {
    let mut lines = Vec::new();
    for (date, day) in assignment.days() {
        for (slot, row) in day.slots() {
            lines.push(format!("{} {}: {}", date, slot, format_row(row)));
        }
    }
    lines
}

/// Slot legend: `QUART_1  1st quarter (01:00-07:00)  x2`, Saturday-only slots flagged
pub fn slot_legend(catalog: &SlotCatalog) -> Vec<String> {
    catalog
        .slots()
        .iter()
        .map(|slot| match slot.day_restriction {
            Some(day) => format!("{}  {}  x{} ({} only)", slot.id, slot.label, slot.capacity, day),
            None => format!("{}  {}  x{}", slot.id, slot.label, slot.capacity),
        })
        .collect()
}

/// Writes the schedule grid to a file, one line per date-slot
pub fn write_schedule_to_file<P: AsRef<Path>>(assignment: &Assignment, path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for line in schedule_lines(assignment) {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(())
}

/// Prints a planning run in a readable format
pub fn print_schedule(run: &ScheduleRun, catalog: &SlotCatalog) {
    println!("\n=== Schedule ===");
    println!("Score: {} (draft {})", run.score, run.draft_score);
    if let Some(seed) = run.seed {
        println!("Seed: {}", seed);
    }

    if !run.gaps.is_empty() {
        println!("⚠️  Unfilled positions ({}):", run.gaps.len());
        for gap in &run.gaps {
            println!("  - {} {} #{}", gap.date, gap.slot, gap.position + 1);
        }
    }

    println!("\nSlots:");
    for line in slot_legend(catalog) {
        println!("  {}", line);
    }

    println!("\nShifts per physician:");
    for (physician, count) in shift_counts(&run.assignment) {
        println!("  {}: {}", physician, count);
    }

    println!("\nSchedule by date and slot:");
    for line in schedule_lines(&run.assignment) {
        println!("  {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::slots::SlotId;
    use crate::schedule::types::Cell;
    use chrono::NaiveDate;

    #[test]
    fn legend_shows_labels_and_restrictions() {
        let legend = slot_legend(&SlotCatalog::standard());
        assert_eq!(legend.len(), 6);
        assert_eq!(legend[0], "QUART_1  1st quarter (01:00-07:00)  x2");
        assert_eq!(legend[2], "RENFORT_1  Reinforcement (10:00-13:00)  x1 (Sat only)");
    }

    #[test]
    fn renders_empty_positions() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let mut a = Assignment::new();
        a.open_slot(d, SlotId::Quart1, 2);
        a.open_slot(d, SlotId::Renfort1, 1);
        a.set(&Cell { date: d, slot: SlotId::Quart1, position: 0 }, Some("ana".into()));

        assert_eq!(
            schedule_lines(&a),
            vec![
                "2024-03-09 QUART_1: ana, [EMPTY]".to_string(),
                "2024-03-09 RENFORT_1: [EMPTY]".to_string(),
            ]
        );

        let path = std::env::temp_dir().join(format!("shift-planner-render-{}.txt", std::process::id()));
        write_schedule_to_file(&a, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "2024-03-09 QUART_1: ana, [EMPTY]\n2024-03-09 RENFORT_1: [EMPTY]\n");
        std::fs::remove_file(&path).unwrap();
    }
}
