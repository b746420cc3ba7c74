//! Parallel execution of one simulation per sample row.
//!
//! Every row produces exactly one [`SimulationResult`]; a failing row never
//! aborts its neighbours. Results come back in sample order whatever the
//! degree of parallelism.

pub mod command;
pub mod error;
pub mod executor;
pub mod result;
pub mod series;
pub mod simulator;

pub use command::CommandSimulator;
pub use error::{BatchError, BatchResult, SimulationError};
pub use executor::{ArtifactSink, BatchOptions, BatchOutcome, BatchProgress, run_batch};
pub use result::{FailureIndex, FailureReason, SimulationResult};
pub use series::TimeSeries;
pub use simulator::{FnSimulator, RunContext, Simulator};
