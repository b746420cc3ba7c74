//! Whole-pipeline orchestration driven by a [`PipelineConfig`].
//!
//! Stages not listed in `steps` are skipped; their outputs are reloaded from
//! the campaign directory when a later stage needs them.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use cg_batch::{CommandSimulator, FailureIndex, SimulationResult, Simulator};
use cg_features::{ChannelPolicy, SummaryTable};
use cg_params::{PipelineConfig, StepDef};
use cg_sampling::{TimingMap, VolumeRelation};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::features_service;
use crate::progress::{PipelineStage, ProgressCallback, emit_progress, reborrow};
use crate::sample_service::{SampleRequest, SamplerHandle, sample_input_space};
use crate::sensitivity::export_problem;
use crate::simulate_service::{SimulateOptions, simulate_data};

/// What a pipeline invocation produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub output_dir: PathBuf,
    pub n_samples: usize,
    pub steps: Vec<StepDef>,
    /// `None` when neither simulation nor feature extraction ran.
    pub failures: Option<FailureIndex>,
    pub summary: Option<SummaryTable>,
    pub elapsed_s: f64,
}

pub fn sample_request(config: &PipelineConfig) -> SampleRequest<'_> {
    SampleRequest {
        parameters: &config.parameters,
        output_root: &config.output_root,
        n_samples: config.sampling.n_samples,
        method: config.sampling.method.into(),
        seed: config.sampling.seed,
        timings: config.timings.as_ref().map(TimingMap::from),
        volumes: config.volumes.iter().map(VolumeRelation::from).collect(),
    }
}

pub fn simulate_options(config: &PipelineConfig) -> AppResult<SimulateOptions> {
    let mut options = SimulateOptions {
        n_jobs: config.batch.n_jobs,
        ..SimulateOptions::default()
    };
    if let Some(def) = &config.simulator {
        if let Some(seconds) = def.timeout_s {
            let timeout = Duration::try_from_secs_f64(seconds).map_err(|e| {
                AppError::Configuration(format!("simulator.timeout_s = {seconds}: {e}"))
            })?;
            options.timeout = Some(timeout);
        }
        options.time_column = def.time_column.clone();
    }
    Ok(options)
}

/// The external-command simulator configured in `config`, if any.
pub fn command_simulator(config: &PipelineConfig) -> Option<CommandSimulator> {
    config.simulator.as_ref().map(CommandSimulator::from)
}

/// Run the configured steps in order. `simulator` is required only when the
/// simulate step runs.
pub fn run_pipeline(
    config: &PipelineConfig,
    simulator: Option<&dyn Simulator>,
    mut progress_cb: Option<ProgressCallback<'_>>,
) -> AppResult<PipelineReport> {
    let started = Instant::now();
    let n_samples = config.sampling.n_samples;

    let handle = if config.runs_step(StepDef::Sample) {
        let (handle, _) = sample_input_space(&sample_request(config), reborrow(&mut progress_cb))?;
        export_problem(handle.spec(), handle.store())?;
        handle
    } else {
        emit_progress(&mut progress_cb, PipelineStage::LoadingSamples, started, None);
        SamplerHandle::open(&config.parameters, &config.output_root, n_samples)?
    };

    let options = simulate_options(config)?;
    let mut results: Option<Vec<SimulationResult>> = None;
    let mut failures = None;

    if config.runs_step(StepDef::Simulate) {
        let simulator = simulator.ok_or_else(|| {
            AppError::Configuration("the simulate step needs a simulator".to_string())
        })?;
        let outcome = simulate_data(&handle, simulator, &options, reborrow(&mut progress_cb))?;
        failures = Some(outcome.failures);
        results = Some(outcome.results);
    }

    let mut summary = None;
    if config.runs_step(StepDef::Features) {
        let results = match results {
            Some(results) => results,
            None => {
                emit_progress(&mut progress_cb, PipelineStage::LoadingResults, started, None);
                let loaded = handle.store().load_results(options.time_column.as_deref())?;
                failures = Some(FailureIndex::from_results(&loaded));
                loaded
            }
        };
        let policy = ChannelPolicy::from(config.features.channel_policy);
        summary = Some(features_service::calculate_output_features(
            &results,
            policy,
            handle.store(),
            reborrow(&mut progress_cb),
        )?);
    }

    emit_progress(&mut progress_cb, PipelineStage::Completed, started, None);
    let report = PipelineReport {
        output_dir: handle.output_dir().to_path_buf(),
        n_samples: handle.n_samples(),
        steps: config.steps.clone(),
        failures,
        summary,
        elapsed_s: started.elapsed().as_secs_f64(),
    };
    info!(
        dir = %report.output_dir.display(),
        steps = ?report.steps,
        elapsed_s = report.elapsed_s,
        "Pipeline finished"
    );
    Ok(report)
}
