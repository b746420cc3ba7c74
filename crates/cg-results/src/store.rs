//! Campaign storage API.

use std::fs;
use std::path::{Path, PathBuf};

use cg_batch::{
    ArtifactSink, BatchError, FailureIndex, FailureReason, SimulationResult, TimeSeries,
};
use cg_core::csv_io::{read_table, write_table};
use cg_features::SummaryTable;
use cg_params::SensitivityProblem;
use cg_sampling::SampleTable;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::layout::raw_run_in;
use crate::types::{FixedValue, RunManifest};
use crate::{OutputLayout, ResultsError, ResultsResult, compute_run_id};

#[derive(Debug, Clone)]
pub struct RunStore {
    layout: OutputLayout,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ResultsResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ResultsResult<T> {
    if !path.exists() {
        return Err(ResultsError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn require(path: PathBuf) -> ResultsResult<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ResultsError::NotFound { path })
    }
}

impl RunManifest {
    pub fn new(
        parameter_bytes: &[u8],
        parameter_file: &str,
        method: &str,
        seed: u64,
        samples: &SampleTable,
    ) -> Self {
        Self {
            run_id: compute_run_id(parameter_bytes, method, seed, samples.n_samples()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            parameter_file: parameter_file.to_string(),
            method: method.to_string(),
            seed,
            n_samples: samples.n_samples(),
            fixed: samples
                .fixed_values()
                .iter()
                .map(|(name, value)| FixedValue {
                    name: name.clone(),
                    value: *value,
                })
                .collect(),
            timing_ref: samples.timing_ref(),
            volumes_mapped: samples.volumes_mapped(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl RunStore {
    /// Create the campaign directory (and parents) if needed.
    pub fn new(layout: OutputLayout) -> ResultsResult<Self> {
        if !layout.dir().exists() {
            fs::create_dir_all(layout.dir())?;
        }
        Ok(Self { layout })
    }

    /// Open a campaign directory written by an earlier invocation.
    pub fn open(layout: OutputLayout) -> ResultsResult<Self> {
        require(layout.dir().to_path_buf())?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn dir(&self) -> &Path {
        self.layout.dir()
    }

    /// Copy the parameter file byte for byte.
    pub fn save_parameters_copy(&self, source: &Path) -> ResultsResult<PathBuf> {
        let target = self.layout.parameters();
        fs::copy(source, &target)?;
        Ok(target)
    }

    pub fn save_samples(&self, samples: &SampleTable) -> ResultsResult<PathBuf> {
        if samples.n_samples() != self.layout.n_samples() {
            return Err(ResultsError::Inconsistent {
                path: self.layout.dir().to_path_buf(),
                message: format!(
                    "sample table has {} rows, layout expects {}",
                    samples.n_samples(),
                    self.layout.n_samples()
                ),
            });
        }
        let path = self.layout.samples();
        write_table(&path, samples.table())?;
        debug!(path = %path.display(), rows = samples.n_samples(), "Saved input samples");
        Ok(path)
    }

    /// Rebuild the sample table from `input_samples_<n>.csv` and the manifest.
    pub fn load_samples(&self) -> ResultsResult<SampleTable> {
        let manifest = self.load_manifest()?;
        let path = require(self.layout.samples())?;
        let table = read_table(&path)?;
        if table.n_rows() != self.layout.n_samples() {
            return Err(ResultsError::Inconsistent {
                path,
                message: format!(
                    "{} rows, expected {}",
                    table.n_rows(),
                    self.layout.n_samples()
                ),
            });
        }
        let fixed = manifest
            .fixed
            .into_iter()
            .map(|f| (f.name, f.value))
            .collect();
        Ok(SampleTable::restore(
            table,
            fixed,
            manifest.timing_ref,
            manifest.volumes_mapped,
        ))
    }

    pub fn has_samples(&self) -> bool {
        self.layout.samples().exists() && self.layout.manifest().exists()
    }

    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<PathBuf> {
        let path = self.layout.manifest();
        write_json(&path, manifest)?;
        Ok(path)
    }

    pub fn load_manifest(&self) -> ResultsResult<RunManifest> {
        read_json(&self.layout.manifest())
    }

    /// Create the raw-run directory and return a writer the batch workers
    /// can share. Without a `time_column` only channels are written, so no
    /// channel name is ever mistaken for the time axis on reload.
    pub fn raw_writer(&self, time_column: Option<&str>) -> ResultsResult<RawRunWriter> {
        let dir = self.layout.raw_dir();
        fs::create_dir_all(&dir)?;
        Ok(RawRunWriter {
            dir,
            time_column: time_column.map(str::to_string),
        })
    }

    pub fn save_failures(&self, failures: &FailureIndex) -> ResultsResult<PathBuf> {
        let path = self.layout.failures();
        write_json(&path, failures)?;
        Ok(path)
    }

    pub fn load_failures(&self) -> ResultsResult<FailureIndex> {
        let path = self.layout.failures();
        let failures: FailureIndex = read_json(&path)?;
        if let Some(max) = failures.max()
            && max >= self.layout.n_samples()
        {
            return Err(ResultsError::Inconsistent {
                path,
                message: format!(
                    "failed index {} outside [0, {})",
                    max,
                    self.layout.n_samples()
                ),
            });
        }
        Ok(failures)
    }

    pub fn has_results(&self) -> bool {
        self.layout.failures().exists() && self.layout.raw_dir().is_dir()
    }

    /// Rebuild the ordered batch results from the raw runs and failure
    /// index. Recorded failures come back without their original reason.
    pub fn load_results(&self, time_column: Option<&str>) -> ResultsResult<Vec<SimulationResult>> {
        let failures = self.load_failures()?;
        let raw_dir = require(self.layout.raw_dir())?;
        (0..self.layout.n_samples())
            .map(|index| {
                if failures.contains(index) {
                    Ok(SimulationResult::Failed(FailureReason::Solver(
                        "recorded as failed".to_string(),
                    )))
                } else {
                    let path = require(raw_run_in(&raw_dir, index))?;
                    load_raw_run(&path, time_column).map(SimulationResult::Success)
                }
            })
            .collect()
    }

    pub fn save_summary(&self, summary: &SummaryTable) -> ResultsResult<PathBuf> {
        let path = self.layout.summary();
        summary.save(&path)?;
        Ok(path)
    }

    pub fn load_summary(&self) -> ResultsResult<SummaryTable> {
        let path = require(self.layout.summary())?;
        Ok(SummaryTable::load(&path)?)
    }

    pub fn has_summary(&self) -> bool {
        self.layout.summary().exists()
    }

    pub fn save_problem(&self, problem: &SensitivityProblem) -> ResultsResult<PathBuf> {
        let path = self.layout.problem();
        write_json(&path, problem)?;
        Ok(path)
    }

    pub fn load_problem(&self) -> ResultsResult<SensitivityProblem> {
        read_json(&self.layout.problem())
    }
}

fn load_raw_run(path: &Path, time_column: Option<&str>) -> ResultsResult<TimeSeries> {
    let table = read_table(path)?;
    let time = time_column.filter(|name| table.has_column(name));
    Ok(TimeSeries::from_table(table, time)?)
}

/// Writes `simulation_<index>.csv` for each successful row. Every row
/// touches only its own file, so one writer is shared by all workers.
#[derive(Debug, Clone)]
pub struct RawRunWriter {
    dir: PathBuf,
    time_column: Option<String>,
}

impl RawRunWriter {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, index: usize) -> PathBuf {
        raw_run_in(&self.dir, index)
    }

    pub fn load(&self, index: usize) -> ResultsResult<TimeSeries> {
        let path = require(self.path(index))?;
        load_raw_run(&path, self.time_column.as_deref())
    }
}

impl ArtifactSink for RawRunWriter {
    fn persist(&self, index: usize, series: &TimeSeries) -> Result<(), BatchError> {
        let path = self.path(index);
        series
            .to_table(self.time_column.as_deref())
            .and_then(|table| write_table(&path, &table))
            .map_err(|source| BatchError::Artifact { path, source })
    }
}
