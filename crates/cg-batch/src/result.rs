//! Per-row outcomes and the failure index.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{SimulationError, TimeSeries};

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Solver(String),
    Panic(String),
    Timeout(Duration),
    InvalidOutput(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solver(msg) => write!(f, "solver error: {}", msg),
            Self::Panic(msg) => write!(f, "simulator panicked: {}", msg),
            Self::Timeout(limit) => write!(f, "timed out after {:.3}s", limit.as_secs_f64()),
            Self::InvalidOutput(msg) => write!(f, "invalid output: {}", msg),
        }
    }
}

impl From<SimulationError> for FailureReason {
    fn from(e: SimulationError) -> Self {
        match e {
            SimulationError::Solver { message } => FailureReason::Solver(message),
            SimulationError::InvalidOutput { message } => FailureReason::InvalidOutput(message),
            SimulationError::Timeout { limit } => FailureReason::Timeout(limit),
            SimulationError::Io(e) => FailureReason::Solver(e.to_string()),
        }
    }
}

/// Outcome of one sample row.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationResult {
    Success(TimeSeries),
    Failed(FailureReason),
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationResult::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        !self.is_success()
    }

    pub fn series(&self) -> Option<&TimeSeries> {
        match self {
            SimulationResult::Success(series) => Some(series),
            SimulationResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            SimulationResult::Success(_) => None,
            SimulationResult::Failed(reason) => Some(reason),
        }
    }
}

/// Sorted, duplicate-free row indices whose simulation failed.
///
/// Serialised as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureIndex(Vec<usize>);

impl FailureIndex {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    pub fn from_results(results: &[SimulationResult]) -> Self {
        Self(
            results
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_failed())
                .map(|(i, _)| i)
                .collect(),
        )
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest index, useful for checking against a sample count.
    pub fn max(&self) -> Option<usize> {
        self.0.last().copied()
    }
}
