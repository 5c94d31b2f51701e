use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slots::SlotId;
use super::types::{Period, PhysicianId};

pub const DEFAULT_MAX_PER_WEEK: u32 = 7;

/// A physician's stated willingness for one slot on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    #[serde(alias = "Oui", alias = "yes")]
    Yes,
    #[serde(alias = "possible")]
    Possible,
    #[serde(alias = "Non", alias = "no")]
    No,
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "oui" | "y" => Ok(Preference::Yes),
            "possible" | "maybe" | "p" => Ok(Preference::Possible),
            "no" | "non" | "n" => Ok(Preference::No),
            other => Err(format!("unknown preference '{}'", other)),
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preference::Yes => f.write_str("Yes"),
            Preference::Possible => f.write_str("Possible"),
            Preference::No => f.write_str("No"),
        }
    }
}

pub type DatePreferences = BTreeMap<NaiveDate, BTreeMap<SlotId, Preference>>;

fn default_max_per_week() -> u32 {
    DEFAULT_MAX_PER_WEEK
}

/// One desiderata submission as delivered by the surrounding application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub physician_id: PhysicianId,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub per_date: DatePreferences,
    #[serde(default)]
    pub monthly_desired_count: u32,
    #[serde(default = "default_max_per_week")]
    pub max_per_week: u32,
    #[serde(default)]
    pub grouped_weekend_affinity: bool,
    #[serde(default)]
    pub reinforcement_affinity: bool,
}

impl PreferenceRecord {
    pub fn new(physician_id: impl Into<PhysicianId>) -> Self {
        Self {
            physician_id: physician_id.into(),
            start_date: None,
            end_date: None,
            per_date: BTreeMap::new(),
            monthly_desired_count: 0,
            max_per_week: DEFAULT_MAX_PER_WEEK,
            grouped_weekend_affinity: false,
            reinforcement_affinity: false,
        }
    }

    pub fn with_preference(mut self, date: NaiveDate, slot: SlotId, preference: Preference) -> Self {
        self.per_date.entry(date).or_default().insert(slot, preference);
        self
    }

    pub fn with_monthly_desired(mut self, count: u32) -> Self {
        self.monthly_desired_count = count;
        self
    }

    pub fn with_max_per_week(mut self, max: u32) -> Self {
        self.max_per_week = max;
        self
    }

    pub fn with_grouped_weekends(mut self, on: bool) -> Self {
        self.grouped_weekend_affinity = on;
        self
    }

    pub fn with_reinforcement_affinity(mut self, on: bool) -> Self {
        self.reinforcement_affinity = on;
        self
    }

    /// Records without bounds are considered relevant to any period
    fn relevant_to(&self, period: &Period) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => period.intersects(start, end),
            _ => true,
        }
    }
}

/// Merged preferences of one physician
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceProfile {
    pub per_date: DatePreferences,
    pub monthly_desired_count: u32,
    pub max_per_week: u32,
    pub grouped_weekend_affinity: bool,
    pub reinforcement_affinity: bool,
}

impl PreferenceProfile {
    pub fn preference(&self, date: NaiveDate, slot: SlotId) -> Option<Preference> {
        self.per_date.get(&date).and_then(|slots| slots.get(&slot)).copied()
    }
}

/// Preference profiles for the whole roster, keyed by physician id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Desiderata {
    profiles: BTreeMap<PhysicianId, PreferenceProfile>,
}

impl Desiderata {
    /// Merges submissions into one profile per physician.
    ///
    /// The first relevant record of a physician supplies the quotas and
    /// affinity flags (a weekly cap of 0 means unset and falls back to 7); every relevant record contributes its per-date answers,
    /// later records overriding earlier ones slot by slot. Records whose date
    /// range misses `period` are skipped.
    pub fn from_records(records: &[PreferenceRecord], period: &Period) -> Self {
        let mut profiles: BTreeMap<PhysicianId, PreferenceProfile> = BTreeMap::new();

        for record in records.iter().filter(|r| r.relevant_to(period)) {
            let profile = profiles
                .entry(record.physician_id.clone())
                .or_insert_with(|| PreferenceProfile {
                    per_date: BTreeMap::new(),
                    monthly_desired_count: record.monthly_desired_count,
                    max_per_week: match record.max_per_week {
                        0 => DEFAULT_MAX_PER_WEEK,
                        max => max,
                    },
                    grouped_weekend_affinity: record.grouped_weekend_affinity,
                    reinforcement_affinity: record.reinforcement_affinity,
                });

            for (date, slots) in &record.per_date {
                profile
                    .per_date
                    .entry(*date)
                    .or_default()
                    .extend(slots.iter().map(|(s, p)| (*s, *p)));
            }
        }

        Self { profiles }
    }

    pub fn profile(&self, physician: &str) -> Option<&PreferenceProfile> {
        self.profiles.get(physician)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn preference(&self, physician: &str, date: NaiveDate, slot: SlotId) -> Option<Preference> {
        self.profile(physician).and_then(|p| p.preference(date, slot))
    }

    /// Weekly cap, defaulting to 7 for physicians without a profile
    pub fn max_per_week(&self, physician: &str) -> u32 {
        self.profile(physician)
            .map_or(DEFAULT_MAX_PER_WEEK, |p| p.max_per_week)
    }

    pub fn monthly_desired(&self, physician: &str) -> u32 {
        self.profile(physician).map_or(0, |p| p.monthly_desired_count)
    }
}

/// Roster split by stated preference for one slot-day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreferenceRanking {
    pub yes: Vec<PhysicianId>,
    pub possible: Vec<PhysicianId>,
    pub unspecified: Vec<PhysicianId>,
    pub no: Vec<PhysicianId>,
}

impl PreferenceRanking {
    /// Yes, then Possible, then unspecified, then No
    pub fn all(&self) -> Vec<PhysicianId> {
        self.yes
            .iter()
            .chain(&self.possible)
            .chain(&self.unspecified)
            .chain(&self.no)
            .cloned()
            .collect()
    }
}

/// Groups the roster by preference for a cell, keeping roster order inside groups.
/// Used by manual editing surfaces to offer the most willing physicians first.
pub fn rank_by_preference(
    roster: &[PhysicianId],
    desiderata: &Desiderata,
    date: NaiveDate,
    slot: SlotId,
) -> PreferenceRanking {
    let mut ranking = PreferenceRanking::default();
    for physician in roster {
        let bucket = match desiderata.preference(physician, date, slot) {
            Some(Preference::Yes) => &mut ranking.yes,
            Some(Preference::Possible) => &mut ranking.possible,
            Some(Preference::No) => &mut ranking.no,
            None => &mut ranking.unspecified,
        };
        bucket.push(physician.clone());
    }
    ranking
}
