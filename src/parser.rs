use csv::{Reader, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{PlannerError, Result};
use crate::schedule::desiderata::{Preference, PreferenceRecord};
use crate::schedule::planner::PlanningRequest;
use crate::schedule::slots::SlotId;

/// Column positions found in the sheet header
struct Columns {
    physician: usize,
    date: usize,
    slots: Vec<(SlotId, usize)>,
    desired_per_month: Option<usize>,
    max_per_week: Option<usize>,
    grouped_weekends: Option<usize>,
    paired_reinforcements: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| PlannerError::InvalidRecord {
                line: 1,
                reason: format!("missing '{}' column", name),
            })
        };

        Ok(Self {
            physician: required("physician_id")?,
            date: required("date")?,
            slots: SlotId::ALL
                .iter()
                .filter_map(|slot| find(slot.as_str()).map(|col| (*slot, col)))
                .collect(),
            desired_per_month: find("desired_per_month"),
            max_per_week: find("max_per_week"),
            grouped_weekends: find("grouped_weekends"),
            paired_reinforcements: find("paired_reinforcements"),
        })
    }
}

/// Quota fields are taken from the first row that fills them
#[derive(Default)]
struct SeenQuotas {
    desired_per_month: bool,
    max_per_week: bool,
    grouped_weekends: bool,
    paired_reinforcements: bool,
}

fn cell<'r>(record: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "oui" || lower == "true" || lower == "1"
}

fn parse_number(value: &str, line: u64, column: &str) -> Result<u32> {
    value.trim().parse().map_err(|_| PlannerError::InvalidRecord {
        line,
        reason: format!("'{}' is not a valid {}", value, column),
    })
}

/// Loads a desiderata sheet from a CSV file
///
/// One row per physician and date. Expected columns:
/// * `physician_id`, `date` (YYYY-MM-DD) - required
/// * one column per slot id (`QUART_1` .. `RENFORT_2`) holding Yes/Possible/No or blank
/// * `desired_per_month`, `max_per_week`, `grouped_weekends`, `paired_reinforcements` - optional
///
/// Rows of the same physician are merged into one record, in order of first appearance.
pub fn load_desiderata_csv<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PreferenceRecord>> {
    read_desiderata_csv(File::open(csv_path)?)
}

/// Same as [`load_desiderata_csv`] for any reader, e.g. an uploaded request body
pub fn read_desiderata_csv<R: Read>(input: R) -> Result<Vec<PreferenceRecord>> {
    let mut reader = Reader::from_reader(input);
    let columns = Columns::locate(reader.headers()?)?;

    let mut records: Vec<PreferenceRecord> = Vec::new();
    let mut seen: Vec<SeenQuotas> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());

        let physician_id = cell(&row, Some(columns.physician));
        if physician_id.is_empty() {
            continue; // blank spacer rows
        }

        let raw_date = cell(&row, Some(columns.date));
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            PlannerError::InvalidRecord {
                line,
                reason: format!("'{}' is not a YYYY-MM-DD date", raw_date),
            }
        })?;

        let idx = *index_by_id.entry(physician_id.to_string()).or_insert_with(|| {
            records.push(PreferenceRecord::new(physician_id));
            seen.push(SeenQuotas::default());
            records.len() - 1
        });
        let record = &mut records[idx];
        let quotas = &mut seen[idx];

        for (slot, col) in &columns.slots {
            let value = cell(&row, Some(*col));
            if value.is_empty() {
                continue;
            }
            let preference: Preference = value.parse().map_err(|reason| PlannerError::InvalidRecord {
                line,
                reason: format!("{} column: {}", slot, reason),
            })?;
            record.per_date.entry(date).or_default().insert(*slot, preference);
        }

        let desired = cell(&row, columns.desired_per_month);
        if !quotas.desired_per_month && !desired.is_empty() {
            record.monthly_desired_count = parse_number(desired, line, "desired_per_month")?;
            quotas.desired_per_month = true;
        }
        let max = cell(&row, columns.max_per_week);
        if !quotas.max_per_week && !max.is_empty() {
            record.max_per_week = parse_number(max, line, "max_per_week")?;
            quotas.max_per_week = true;
        }
        let grouped = cell(&row, columns.grouped_weekends);
        if !quotas.grouped_weekends && !grouped.is_empty() {
            record.grouped_weekend_affinity = parse_bool(grouped);
            quotas.grouped_weekends = true;
        }
        let paired = cell(&row, columns.paired_reinforcements);
        if !quotas.paired_reinforcements && !paired.is_empty() {
            record.reinforcement_affinity = parse_bool(paired);
            quotas.paired_reinforcements = true;
        }
    }

    Ok(records)
}

/// Loads a JSON planning request (period, roster, preferences)
pub fn load_request<P: AsRef<Path>>(json_path: P) -> Result<PlanningRequest> {
    let file = File::open(json_path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
