//! Error types for batch execution.

use std::path::PathBuf;
use std::time::Duration;

use cg_core::CoreError;
use cg_sampling::SamplingError;
use thiserror::Error;

pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that abort a whole batch. Per-row simulation failures are not
/// represented here; they end up as [`crate::SimulationResult::Failed`].
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Failed to build worker pool: {message}")]
    Pool { message: String },

    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

/// Why a single simulator call did not produce a usable time series.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Solver failed: {message}")]
    Solver { message: String },

    #[error("Simulator output unusable: {message}")]
    InvalidOutput { message: String },

    #[error("Simulation exceeded {limit:?}")]
    Timeout { limit: Duration },

    #[error("Simulator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    pub fn solver(message: impl Into<String>) -> Self {
        SimulationError::Solver {
            message: message.into(),
        }
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        SimulationError::InvalidOutput {
            message: message.into(),
        }
    }
}
