//! The simulator seam.

use std::time::{Duration, Instant};

use cg_sampling::ParameterPoint;

use crate::{SimulationError, TimeSeries};

/// Per-call context handed to a [`Simulator`].
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    /// Sample row being simulated.
    pub index: usize,
    pub timeout: Option<Duration>,
    pub deadline: Option<Instant>,
}

impl RunContext {
    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn new(index: usize, timeout: Option<Duration>) -> Self {
        Self {
            index,
            timeout,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Runs the model once for one parameter point.
///
/// Implementations are shared between worker threads and must not rely on
/// call order. Long-running implementations should honour
/// `ctx.deadline`; the executor discards anything returned after it anyway.
pub trait Simulator: Send + Sync {
    fn simulate(
        &self,
        point: &ParameterPoint,
        ctx: &RunContext,
    ) -> Result<TimeSeries, SimulationError>;
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn simulate(
        &self,
        point: &ParameterPoint,
        ctx: &RunContext,
    ) -> Result<TimeSeries, SimulationError> {
        (**self).simulate(point, ctx)
    }
}

impl<S: Simulator + ?Sized> Simulator for std::sync::Arc<S> {
    fn simulate(
        &self,
        point: &ParameterPoint,
        ctx: &RunContext,
    ) -> Result<TimeSeries, SimulationError> {
        (**self).simulate(point, ctx)
    }
}

/// In-process simulator backed by a closure.
pub struct FnSimulator<F>(pub F);

impl<F> Simulator for FnSimulator<F>
where
    F: Fn(&ParameterPoint, &RunContext) -> Result<TimeSeries, SimulationError> + Send + Sync,
{
    fn simulate(
        &self,
        point: &ParameterPoint,
        ctx: &RunContext,
    ) -> Result<TimeSeries, SimulationError> {
        (self.0)(point, ctx)
    }
}
