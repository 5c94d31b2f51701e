use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Identifier of a daily shift. Declaration order is the canonical fill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotId {
    #[serde(rename = "QUART_1")]
    Quart1,
    #[serde(rename = "QUART_2")]
    Quart2,
    #[serde(rename = "RENFORT_1")]
    Renfort1,
    #[serde(rename = "QUART_3")]
    Quart3,
    #[serde(rename = "QUART_4")]
    Quart4,
    #[serde(rename = "RENFORT_2")]
    Renfort2,
}

impl SlotId {
    pub const ALL: [SlotId; 6] = [
        SlotId::Quart1,
        SlotId::Quart2,
        SlotId::Renfort1,
        SlotId::Quart3,
        SlotId::Quart4,
        SlotId::Renfort2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotId::Quart1 => "QUART_1",
            SlotId::Quart2 => "QUART_2",
            SlotId::Renfort1 => "RENFORT_1",
            SlotId::Quart3 => "QUART_3",
            SlotId::Quart4 => "QUART_4",
            SlotId::Renfort2 => "RENFORT_2",
        }
    }

    /// Reinforcement slots back up a main quarter for a few hours
    pub fn is_reinforcement(self) -> bool {
        matches!(self, SlotId::Renfort1 | SlotId::Renfort2)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown slot id '{}'", s.trim()))
    }
}

/// A shift type: how many physicians it needs and on which weekday it exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotType {
    pub id: SlotId,
    pub label: String,
    pub capacity: usize,
    pub day_restriction: Option<Weekday>,
}

impl SlotType {
    pub fn new(id: SlotId, label: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            label: label.into(),
            capacity,
            day_restriction: None,
        }
    }

    pub fn only_on(mut self, weekday: Weekday) -> Self {
        self.day_restriction = Some(weekday);
        self
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.day_restriction.map_or(true, |day| date.weekday() == day)
    }
}

/// Static shift definitions plus the overlap relation between them.
///
/// `standard()` is the hospital's fixed catalog. Reduced catalogs (fewer slots,
/// other capacities) can be built with [`SlotCatalog::new`]; the fill order is
/// always the order of the `slots` vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    slots: Vec<SlotType>,
    overlaps: Vec<(SlotId, SlotId)>,
}

impl SlotCatalog {
    pub fn new(slots: Vec<SlotType>, overlaps: Vec<(SlotId, SlotId)>) -> Self {
        Self { slots, overlaps }
    }

    pub fn standard() -> Self {
        Self::new(
            vec![
                SlotType::new(SlotId::Quart1, "1st quarter (01:00-07:00)", 2),
                SlotType::new(SlotId::Quart2, "2nd quarter (07:00-13:00)", 3),
                SlotType::new(SlotId::Renfort1, "Reinforcement (10:00-13:00)", 1)
                    .only_on(Weekday::Sat),
                SlotType::new(SlotId::Quart3, "3rd quarter (13:00-19:00)", 3),
                SlotType::new(SlotId::Quart4, "4th quarter (19:00-01:00)", 3),
                SlotType::new(SlotId::Renfort2, "Reinforcement (20:00-00:00)", 1),
            ],
            vec![
                (SlotId::Quart2, SlotId::Renfort1),
                (SlotId::Quart4, SlotId::Renfort2),
            ],
        )
    }

    pub fn slots(&self) -> &[SlotType] {
        &self.slots
    }

    pub fn get(&self, id: SlotId) -> Option<&SlotType> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn capacity(&self, id: SlotId) -> usize {
        self.get(id).map_or(0, |s| s.capacity)
    }

    /// Slots to fill on `date`, in canonical order, skipping day-restricted ones
    pub fn fill_order_for(&self, date: NaiveDate) -> impl Iterator<Item = &SlotType> {
        self.slots.iter().filter(move |s| s.applies_on(date))
    }

    /// Slots whose time window intersects `id`'s (the relation is symmetric)
    pub fn overlaps(&self, id: SlotId) -> Vec<SlotId> {
        self.overlaps
            .iter()
            .filter_map(|&(a, b)| {
                if a == id {
                    Some(b)
                } else if b == id {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn overlap_pairs(&self) -> &[(SlotId, SlotId)] {
        &self.overlaps
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
