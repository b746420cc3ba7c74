//! Sampling stage: parameter file to persisted sample table.

use std::path::{Path, PathBuf};
use std::time::Instant;

use cg_params::ParameterSpec;
use cg_results::{OutputLayout, RunManifest, RunStore};
use cg_sampling::{SampleTable, SamplingMethod, TimingMap, VolumeRelation, generate_samples};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::progress::{PipelineStage, ProgressCallback, emit_progress};

/// Request to sample a parameter space.
#[derive(Debug, Clone)]
pub struct SampleRequest<'a> {
    pub parameters: &'a Path,
    pub output_root: &'a Path,
    pub n_samples: usize,
    pub method: SamplingMethod,
    pub seed: u64,
    pub timings: Option<TimingMap>,
    pub volumes: Vec<VolumeRelation>,
}

impl<'a> SampleRequest<'a> {
    pub fn new(parameters: &'a Path, output_root: &'a Path, n_samples: usize) -> Self {
        Self {
            parameters,
            output_root,
            n_samples,
            method: SamplingMethod::default(),
            seed: 0,
            timings: None,
            volumes: Vec::new(),
        }
    }
}

/// Everything later stages need from the sampling stage.
#[derive(Debug, Clone)]
pub struct SamplerHandle {
    spec: ParameterSpec,
    samples: SampleTable,
    method: SamplingMethod,
    seed: u64,
    store: RunStore,
}

impl SamplerHandle {
    /// Reopen a campaign sampled by an earlier invocation.
    pub fn open(parameters: &Path, output_root: &Path, n_samples: usize) -> AppResult<Self> {
        let spec = ParameterSpec::load(parameters)?;
        let layout = OutputLayout::new(output_root, n_samples, spec.stem());
        let store = RunStore::open(layout)?;
        let manifest = store.load_manifest()?;
        let samples = store.load_samples()?.with_key_paths(&spec);
        let method = manifest
            .method
            .parse::<SamplingMethod>()
            .map_err(|e| AppError::Storage(e.to_string()))?;
        if samples.column_names() != spec.free_names().as_slice() {
            return Err(AppError::Schema(format!(
                "{} columns do not match the free parameters of {}",
                store.layout().samples().display(),
                parameters.display()
            )));
        }
        info!(dir = %store.dir().display(), n_samples, "Reopened sampled campaign");
        Ok(Self {
            spec,
            samples,
            method,
            seed: manifest.seed,
            store,
        })
    }

    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    pub fn samples(&self) -> &SampleTable {
        &self.samples
    }

    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.n_samples()
    }
}

/// Sample the free parameters, apply the configured post-processing and
/// persist the parameter copy, samples and manifest.
pub fn sample_input_space(
    request: &SampleRequest<'_>,
    mut progress_cb: Option<ProgressCallback<'_>>,
) -> AppResult<(SamplerHandle, PathBuf)> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        PipelineStage::LoadingParameters,
        started,
        Some(request.parameters.display().to_string()),
    );
    let parameter_bytes = std::fs::read(request.parameters)?;
    let spec = ParameterSpec::load(request.parameters)?;

    emit_progress(
        &mut progress_cb,
        PipelineStage::Sampling,
        started,
        Some(format!("{} x {} ({})", request.n_samples, spec.free_names().len(), request.method)),
    );
    let mut samples = generate_samples(&spec, request.n_samples, request.method, request.seed)?;

    if let Some(timings) = &request.timings {
        emit_progress(&mut progress_cb, PipelineStage::MappingTimings, started, None);
        samples.map_sample_timings(timings)?;
    }
    if !request.volumes.is_empty() {
        emit_progress(&mut progress_cb, PipelineStage::MappingVolumes, started, None);
        samples.map_vessel_volumes(&request.volumes)?;
    }

    emit_progress(&mut progress_cb, PipelineStage::SavingSamples, started, None);
    let layout = OutputLayout::new(request.output_root, request.n_samples, spec.stem());
    let store = RunStore::new(layout)?;
    store.save_parameters_copy(request.parameters)?;
    store.save_samples(&samples)?;

    let parameter_file = request
        .parameters
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let manifest = RunManifest::new(
        &parameter_bytes,
        &parameter_file,
        &request.method.to_string(),
        request.seed,
        &samples,
    );
    store.save_manifest(&manifest)?;

    let dir = store.dir().to_path_buf();
    info!(
        dir = %dir.display(),
        run_id = %manifest.run_id,
        n_samples = samples.n_samples(),
        method = %request.method,
        "Sampled input space"
    );

    Ok((
        SamplerHandle {
            spec,
            samples,
            method: request.method,
            seed: request.seed,
            store,
        },
        dir,
    ))
}
