use super::desiderata::Desiderata;
use super::slots::SlotCatalog;
use super::types::PhysicianId;

/// Read-only inputs shared by every step of a planning run
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    pub catalog: &'a SlotCatalog,
    pub desiderata: &'a Desiderata,
    /// Candidate order; earlier physicians win score ties
    pub roster: &'a [PhysicianId],
}

impl<'a> PlanningContext<'a> {
    pub fn new(catalog: &'a SlotCatalog, desiderata: &'a Desiderata, roster: &'a [PhysicianId]) -> Self {
        Self {
            catalog,
            desiderata,
            roster,
        }
    }
}
