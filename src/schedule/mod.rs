pub mod calendar;
pub mod construction;
pub mod context;
pub mod desiderata;
pub mod evaluation;
pub mod improve;
pub mod planner;
pub mod scoring;
pub mod slots;
pub mod stats;
pub mod tabu;
pub mod types;
pub mod validator;

pub use construction::construct;
pub use context::PlanningContext;
pub use desiderata::{rank_by_preference, Desiderata, Preference, PreferenceRanking, PreferenceRecord};
pub use evaluation::evaluate;
pub use improve::{improve, improve_with, ImproveOptions, Improvement, Move};
pub use planner::{Planner, PlanningRequest, RunState, ScheduleRun};
pub use scoring::score_candidate;
pub use slots::{SlotCatalog, SlotId, SlotType};
pub use types::{Assignment, Cell, DayPlan, Period, PhysicianId};
pub use validator::{is_feasible, violations, Violation, ViolationKind};
