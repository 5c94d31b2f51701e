use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slots::SlotId;
use crate::error::{PlannerError, Result};

pub type PhysicianId = String;

/// Ordered staff positions of one slot on one day; `None` is an unfilled position
pub type SlotRow = Vec<Option<PhysicianId>>;

/// Inclusive date range over which shifts are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl TryFrom<RawPeriod> for Period {
    type Error = PlannerError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        match (raw.start, raw.end) {
            (Some(start), Some(end)) => Period::new(start, end),
            _ => Err(PlannerError::MissingPeriod),
        }
    }
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(PlannerError::InvertedPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether `[start, end]` shares at least one day with this period
    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Position of one staffing cell in an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub date: NaiveDate,
    pub slot: SlotId,
    pub position: usize,
}

/// The slot rows of a single date
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayPlan {
    slots: BTreeMap<SlotId, SlotRow>,
}

impl DayPlan {
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &SlotRow)> {
        self.slots.iter().map(|(id, row)| (*id, row))
    }

    pub fn row(&self, slot: SlotId) -> Option<&SlotRow> {
        self.slots.get(&slot)
    }

    pub fn holds(&self, slot: SlotId, physician: &str) -> bool {
        self.slots
            .get(&slot)
            .map_or(false, |row| row.iter().flatten().any(|p| p == physician))
    }

    /// Number of cells `physician` occupies on this day
    pub fn count_for(&self, physician: &str) -> usize {
        self.slots
            .values()
            .map(|row| row.iter().flatten().filter(|p| *p == physician).count())
            .sum()
    }

    pub fn works(&self, physician: &str) -> bool {
        self.count_for(physician) > 0
    }
}

/// The staffing grid: date -> slot -> ordered positions.
///
/// Days are reference counted so cloning an assignment and changing one cell
/// only copies the touched day; every other day stays shared with the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    days: BTreeMap<NaiveDate, Arc<DayPlan>>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Dates in ascending order together with their slots
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &DayPlan)> {
        self.days.iter().map(|(d, day)| (*d, day.as_ref()))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.days.get(&date).map(|d| d.as_ref())
    }

    pub fn row(&self, date: NaiveDate, slot: SlotId) -> Option<&SlotRow> {
        self.day(date).and_then(|d| d.row(slot))
    }

    pub fn get(&self, cell: &Cell) -> Option<&PhysicianId> {
        self.row(cell.date, cell.slot)
            .and_then(|row| row.get(cell.position))
            .and_then(|p| p.as_ref())
    }

    pub fn holds(&self, date: NaiveDate, slot: SlotId, physician: &str) -> bool {
        self.day(date).map_or(false, |d| d.holds(slot, physician))
    }

    pub fn works_on(&self, date: NaiveDate, physician: &str) -> bool {
        self.day(date).map_or(false, |d| d.works(physician))
    }

    /// Registers `date` with no slots yet
    pub fn open_day(&mut self, date: NaiveDate) {
        self.days.entry(date).or_default();
    }

    /// Creates an all-empty row of `capacity` positions for `slot` on `date`
    pub fn open_slot(&mut self, date: NaiveDate, slot: SlotId, capacity: usize) {
        let day = Arc::make_mut(self.days.entry(date).or_default());
        day.slots.insert(slot, vec![None; capacity]);
    }

    /// Writes one cell in place. Cells outside the opened grid are ignored.
    pub fn set(&mut self, cell: &Cell, value: Option<PhysicianId>) {
        if let Some(day) = self.days.get_mut(&cell.date) {
            let day = Arc::make_mut(day);
            if let Some(position) = day
                .slots
                .get_mut(&cell.slot)
                .and_then(|row| row.get_mut(cell.position))
            {
                *position = value;
            }
        }
    }

    /// Copy of this assignment with one cell replaced
    pub fn with_cell(&self, cell: &Cell, value: Option<PhysicianId>) -> Assignment {
        let mut next = self.clone();
        next.set(cell, value);
        next
    }

    /// Every position of the grid, occupied or not, in date/slot/position order
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for (date, day) in self.days() {
            for (slot, row) in day.slots() {
                for position in 0..row.len() {
                    cells.push(Cell { date, slot, position });
                }
            }
        }
        cells
    }

    /// Occupied positions in date/slot/position order
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, &PhysicianId)> {
        self.days().flat_map(|(date, day)| {
            day.slots().flat_map(move |(slot, row)| {
                row.iter().enumerate().filter_map(move |(position, p)| {
                    p.as_ref().map(|p| (Cell { date, slot, position }, p))
                })
            })
        })
    }

    /// Canonical hash of the whole grid, used as a tabu fingerprint
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
