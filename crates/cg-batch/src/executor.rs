//! Batch execution over a sample table.
//!
//! Rows are dispatched to a fixed-size `rayon` pool as index-tagged tasks and
//! gathered positionally, so `results[i]` always belongs to sample row `i`.
//! Each row is isolated: simulator errors, panics, overruns and empty output
//! become [`SimulationResult::Failed`] for that row and are never retried.
//! Artifact write errors are collected and reported only after every row has
//! finished.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cg_sampling::{ParameterPoint, SampleTable};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    BatchError, BatchResult, FailureIndex, FailureReason, RunContext, SimulationResult, Simulator,
    TimeSeries,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    /// Worker threads; 1 runs rows strictly in sequence on the caller's thread.
    pub n_jobs: usize,
    pub timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            n_jobs: 8,
            timeout: None,
        }
    }
}

/// Persists successful runs as they complete.
///
/// Called from worker threads, at most once per row.
pub trait ArtifactSink: Send + Sync {
    fn persist(&self, index: usize, series: &TimeSeries) -> Result<(), BatchError>;
}

/// Counters reported after every finished row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Share of rows finished, successful or not. An empty batch is complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub results: Vec<SimulationResult>,
    pub failures: FailureIndex,
}

impl BatchOutcome {
    pub fn from_results(results: Vec<SimulationResult>) -> Self {
        let failures = FailureIndex::from_results(&results);
        Self { results, failures }
    }

    pub fn n_success(&self) -> usize {
        self.results.len() - self.failures.len()
    }

    /// Successful runs with their sample index.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &TimeSeries)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.series().map(|s| (i, s)))
    }
}

struct Tracker<'a> {
    completed: AtomicUsize,
    failed: AtomicUsize,
    total: usize,
    callback: Option<&'a (dyn Fn(BatchProgress) + Sync)>,
}

impl Tracker<'_> {
    fn record(&self, result: &SimulationResult) {
        let failed = if result.is_failed() {
            self.failed.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.failed.load(Ordering::Relaxed)
        };
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(callback) = self.callback {
            callback(BatchProgress {
                completed,
                failed,
                total: self.total,
            });
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run one row and classify its outcome.
fn run_row<S: Simulator + ?Sized>(
    simulator: &S,
    point: &ParameterPoint,
    timeout: Option<Duration>,
) -> SimulationResult {
    let ctx = RunContext::new(point.index, timeout);
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| simulator.simulate(point, &ctx)));
    let elapsed = started.elapsed();

    match outcome {
        Err(payload) => SimulationResult::Failed(FailureReason::Panic(panic_message(&*payload))),
        Ok(Err(e)) => SimulationResult::Failed(e.into()),
        Ok(Ok(_)) if timeout.is_some_and(|limit| elapsed > limit) => {
            SimulationResult::Failed(FailureReason::Timeout(timeout.unwrap_or_default()))
        }
        Ok(Ok(series)) if series.is_empty() => SimulationResult::Failed(
            FailureReason::InvalidOutput("simulator returned no samples".to_string()),
        ),
        Ok(Ok(series)) => SimulationResult::Success(series),
    }
}

fn process_row<S: Simulator + ?Sized>(
    simulator: &S,
    point: &ParameterPoint,
    options: &BatchOptions,
    sink: Option<&dyn ArtifactSink>,
    tracker: &Tracker<'_>,
) -> (SimulationResult, Option<BatchError>) {
    let result = run_row(simulator, point, options.timeout);
    let mut artifact_error = None;
    match &result {
        SimulationResult::Success(series) => {
            debug!(index = point.index, rows = series.len(), "Simulation succeeded");
            if let Some(sink) = sink
                && let Err(e) = sink.persist(point.index, series)
            {
                artifact_error = Some(e);
            }
        }
        SimulationResult::Failed(reason) => {
            warn!(index = point.index, reason = %reason, "Simulation failed");
        }
    }
    tracker.record(&result);
    (result, artifact_error)
}

/// Simulate every row of `samples`.
///
/// Returns one result per row in sample order. Fails only on invalid options,
/// pool construction errors and artifact write errors; the latter surface
/// after every row has been attempted.
pub fn run_batch<S: Simulator + ?Sized>(
    samples: &SampleTable,
    simulator: &S,
    options: &BatchOptions,
    sink: Option<&dyn ArtifactSink>,
    progress: Option<&(dyn Fn(BatchProgress) + Sync)>,
) -> BatchResult<BatchOutcome> {
    if options.n_jobs == 0 {
        return Err(BatchError::InvalidArg {
            what: "n_jobs must be at least 1",
        });
    }

    let points = samples.points()?;
    let tracker = Tracker {
        completed: AtomicUsize::new(0),
        failed: AtomicUsize::new(0),
        total: points.len(),
        callback: progress,
    };

    info!(
        n_samples = points.len(),
        n_jobs = options.n_jobs,
        timeout_s = options.timeout.map(|t| t.as_secs_f64()),
        "Starting simulation batch"
    );
    let started = Instant::now();

    let gathered: Vec<(SimulationResult, Option<BatchError>)> = if options.n_jobs == 1 {
        points
            .iter()
            .map(|point| process_row(simulator, point, options, sink, &tracker))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.n_jobs)
            .build()
            .map_err(|e| BatchError::Pool {
                message: e.to_string(),
            })?;
        pool.install(|| {
            points
                .par_iter()
                .map(|point| process_row(simulator, point, options, sink, &tracker))
                .collect()
        })
    };

    let mut results = Vec::with_capacity(gathered.len());
    let mut first_error = None;
    for (result, error) in gathered {
        results.push(result);
        if first_error.is_none() {
            first_error = error;
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let outcome = BatchOutcome::from_results(results);
    info!(
        succeeded = outcome.n_success(),
        failed = outcome.failures.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "Simulation batch finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnSimulator, SimulationError};
    use cg_core::Table;
    use std::sync::Mutex;

    struct FlakySink {
        attempted: AtomicUsize,
    }

    impl ArtifactSink for FlakySink {
        fn persist(&self, index: usize, _series: &TimeSeries) -> Result<(), BatchError> {
            self.attempted.fetch_add(1, Ordering::SeqCst);
            if index == 0 {
                return Err(BatchError::Artifact {
                    path: "simulation_0.csv".into(),
                    source: cg_core::CoreError::Io(std::io::Error::other("disk full")),
                });
            }
            Ok(())
        }
    }

    fn samples(n: usize) -> SampleTable {
        let values = (0..n).map(|i| i as f64).collect();
        let table = Table::from_columns(vec![("x".to_string(), values)]).unwrap();
        SampleTable::new(table, vec![("k".to_string(), 2.0)])
    }

    fn echo(point: &ParameterPoint, _ctx: &RunContext) -> Result<TimeSeries, SimulationError> {
        let x = point.get("x").unwrap_or(f64::NAN);
        let k = point.get("k").unwrap_or(f64::NAN);
        TimeSeries::from_channels([("p", vec![x, x * k, x + k])])
            .map_err(|e| SimulationError::invalid_output(e.to_string()))
    }

    #[test]
    fn one_result_per_row_in_order() {
        let outcome = run_batch(
            &samples(5),
            &FnSimulator(echo),
            &BatchOptions::default(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(outcome.results.len(), 5);
        assert!(outcome.failures.is_empty());
        for (i, series) in outcome.successes() {
            assert_eq!(series.channel("p").unwrap()[0], i as f64);
        }
    }

    #[test]
    fn failing_row_is_isolated() {
        let sim = FnSimulator(|point: &ParameterPoint, ctx: &RunContext| {
            if ctx.index == 1 {
                Err(SimulationError::solver("stiff system"))
            } else {
                echo(point, ctx)
            }
        });
        let outcome = run_batch(&samples(3), &sim, &BatchOptions::default(), None, None).unwrap();
        assert_eq!(outcome.failures.indices(), &[1]);
        assert!(outcome.results[0].is_success());
        assert!(outcome.results[2].is_success());
        assert_eq!(
            outcome.results[1].failure(),
            Some(&FailureReason::Solver("stiff system".to_string()))
        );
    }

    #[test]
    fn panics_are_captured() {
        let sim = FnSimulator(|point: &ParameterPoint, ctx: &RunContext| {
            if ctx.index == 2 {
                panic!("index out of range in solver");
            }
            echo(point, ctx)
        });
        let options = BatchOptions {
            n_jobs: 2,
            timeout: None,
        };
        let outcome = run_batch(&samples(4), &sim, &options, None, None).unwrap();
        assert_eq!(outcome.failures.indices(), &[2]);
        assert!(matches!(
            outcome.results[2].failure(),
            Some(FailureReason::Panic(msg)) if msg.contains("index out of range")
        ));
    }

    #[test]
    fn empty_output_is_invalid() {
        let sim = FnSimulator(|_: &ParameterPoint, _: &RunContext| Ok(TimeSeries::default()));
        let outcome = run_batch(&samples(2), &sim, &BatchOptions::default(), None, None).unwrap();
        assert_eq!(outcome.failures.indices(), &[0, 1]);
        assert!(matches!(
            outcome.results[0].failure(),
            Some(FailureReason::InvalidOutput(_))
        ));
    }

    #[test]
    fn late_results_count_as_timeouts() {
        let sim = FnSimulator(|point: &ParameterPoint, ctx: &RunContext| {
            if ctx.index == 0 {
                std::thread::sleep(Duration::from_millis(80));
            }
            echo(point, ctx)
        });
        let options = BatchOptions {
            n_jobs: 2,
            timeout: Some(Duration::from_millis(20)),
        };
        let outcome = run_batch(&samples(2), &sim, &options, None, None).unwrap();
        assert_eq!(outcome.failures.indices(), &[0]);
        assert_eq!(
            outcome.results[0].failure(),
            Some(&FailureReason::Timeout(Duration::from_millis(20)))
        );
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let options = BatchOptions {
            n_jobs: 0,
            timeout: None,
        };
        assert!(matches!(
            run_batch(&samples(1), &FnSimulator(echo), &options, None, None),
            Err(BatchError::InvalidArg { .. })
        ));
    }

    #[test]
    fn progress_reaches_total() {
        let seen = Mutex::new(Vec::new());
        let callback = |p: BatchProgress| seen.lock().unwrap().push(p);
        let sim = FnSimulator(|point: &ParameterPoint, ctx: &RunContext| {
            if ctx.index % 2 == 0 {
                Err(SimulationError::solver("odd failure"))
            } else {
                echo(point, ctx)
            }
        });
        run_batch(&samples(6), &sim, &BatchOptions::default(), None, Some(&callback)).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 6);
        let last = seen.iter().max_by_key(|p| p.completed).unwrap();
        assert_eq!(last.completed, 6);
        assert_eq!(last.total, 6);
        assert_eq!(seen.iter().map(|p| p.failed).max(), Some(3));
    }

    #[test]
    fn artifact_errors_surface_after_gather() {
        let sink = FlakySink {
            attempted: AtomicUsize::new(0),
        };
        let result = run_batch(
            &samples(4),
            &FnSimulator(echo),
            &BatchOptions::default(),
            Some(&sink),
            None,
        );
        assert!(matches!(result, Err(BatchError::Artifact { .. })));
        assert_eq!(sink.attempted.load(Ordering::SeqCst), 4);
    }
}
