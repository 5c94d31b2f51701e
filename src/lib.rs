pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod web;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use schedule::{Assignment, Planner, PlanningRequest, ScheduleRun};
