use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;

/// When the search stops after its first complete solution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Return the shortest solution found at the first phase 1 depth that
    /// yields any solution.
    FirstSolution,
    /// Keep searching with a tightened budget until no shorter solution is
    /// possible or a refinement limit is hit.
    #[default]
    Shortest,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown search strategy `{0}`, expected `first_solution` or `shortest`")]
pub struct ParseStrategyError(String);

impl FromStr for SearchStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_solution" | "first" => Ok(SearchStrategy::FirstSolution),
            "shortest" => Ok(SearchStrategy::Shortest),
            _ => Err(ParseStrategyError(s.to_owned())),
        }
    }
}

/// Search parameters for a [`crate::Solver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Total move budget.
    pub max_length: usize,
    pub max_phase1_depth: usize,
    pub max_phase2_depth: usize,
    pub strategy: SearchStrategy,
    /// How long to keep looking for shorter solutions once one exists.
    pub timeout_secs: f64,
    /// Give up if no solution at all exists by then.
    pub hard_timeout_secs: Option<f64>,
    /// Limit on phase 2 probes.
    pub max_attempts: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_length: 30,
            max_phase1_depth: 12,
            max_phase2_depth: 18,
            strategy: SearchStrategy::default(),
            timeout_secs: 1.0,
            hard_timeout_secs: None,
            max_attempts: None,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    pub(crate) fn hard_timeout(&self) -> Option<Duration> {
        self.hard_timeout_secs
            .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }
}
