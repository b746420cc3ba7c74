//! Simulation stage: one simulator call per sample row.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use cg_batch::{BatchOptions, BatchOutcome, BatchProgress, Simulator, run_batch};
use tracing::info;

use crate::SamplerHandle;
use crate::error::AppResult;
use crate::progress::{
    PipelineProgressEvent, PipelineStage, ProgressCallback, emit_progress, reborrow,
};

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub n_jobs: usize,
    pub timeout: Option<Duration>,
    /// Header for the time axis in `simulation_<index>.csv`. Without one the
    /// time axis is not persisted.
    pub time_column: Option<String>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            n_jobs: 8,
            timeout: None,
            time_column: None,
        }
    }
}

/// Run the simulator on every sample, persisting successful runs as they
/// finish and the failure index once all rows are done.
pub fn simulate_data<S: Simulator + ?Sized>(
    handle: &SamplerHandle,
    simulator: &S,
    options: &SimulateOptions,
    mut progress_cb: Option<ProgressCallback<'_>>,
) -> AppResult<BatchOutcome> {
    let started = Instant::now();
    let store = handle.store();
    let writer = store.raw_writer(options.time_column.as_deref())?;

    emit_progress(
        &mut progress_cb,
        PipelineStage::Simulating,
        started,
        Some(format!("{} runs on {} workers", handle.n_samples(), options.n_jobs)),
    );

    let batch_options = BatchOptions {
        n_jobs: options.n_jobs,
        timeout: options.timeout,
    };
    let outcome = {
        let shared = reborrow(&mut progress_cb).map(Mutex::new);
        let forward = |p: BatchProgress| {
            if let Some(cb) = &shared
                && let Ok(mut cb) = cb.lock()
            {
                (*cb)(PipelineProgressEvent {
                    stage: PipelineStage::Simulating,
                    elapsed_wall_s: started.elapsed().as_secs_f64(),
                    message: None,
                    batch: Some(p),
                });
            }
        };
        run_batch(
            handle.samples(),
            simulator,
            &batch_options,
            Some(&writer),
            Some(&forward),
        )?
    };

    emit_progress(&mut progress_cb, PipelineStage::SavingFailures, started, None);
    let path = store.save_failures(&outcome.failures)?;

    info!(
        raw_dir = %writer.dir().display(),
        failures = %path.display(),
        succeeded = outcome.n_success(),
        failed = outcome.failures.len(),
        "Simulation stage finished"
    );
    Ok(outcome)
}
