//! Planner tuning knobs.
//!
//! Loaded from a TOML file; every field is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! max_iterations = 2000
//! tabu_capacity = 50
//! seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::improve::{ImproveOptions, DEFAULT_MAX_ITERATIONS};
use crate::schedule::tabu::DEFAULT_TABU_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Local search rounds after construction
    pub max_iterations: usize,
    /// Accepted solutions remembered by the tabu list
    pub tabu_capacity: usize,
    /// Fixed seed for reproducible runs; drawn from OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tabu_capacity: DEFAULT_TABU_CAPACITY,
            seed: None,
        }
    }
}

impl PlannerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn improve_options(&self) -> ImproveOptions {
        ImproveOptions {
            max_iterations: self.max_iterations,
            tabu_capacity: self.tabu_capacity,
        }
    }
}
