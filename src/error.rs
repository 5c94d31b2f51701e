use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced to callers before any planning work starts, or while loading inputs.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planning period is missing a start or end date")]
    MissingPeriod,

    #[error("planning period ends ({end}) before it starts ({start})")]
    InvertedPeriod { start: NaiveDate, end: NaiveDate },

    #[error("roster is empty, nobody can be scheduled")]
    EmptyRoster,

    #[error("invalid desiderata record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
