//! File names inside a campaign directory.

use std::path::{Path, PathBuf};

/// Paths of every stage output for one `(parameter file, sample count)`
/// campaign: `<root>/output_<n>_samples_<stem>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    n_samples: usize,
}

impl OutputLayout {
    pub fn new(output_root: &Path, n_samples: usize, stem: &str) -> Self {
        Self {
            dir: output_root.join(format!("output_{}_samples_{}", n_samples, stem)),
            n_samples,
        }
    }

    /// Use an existing campaign directory as-is.
    pub fn at(dir: PathBuf, n_samples: usize) -> Self {
        Self { dir, n_samples }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn parameters(&self) -> PathBuf {
        self.dir.join("parameters.json")
    }

    pub fn samples(&self) -> PathBuf {
        self.dir.join(format!("input_samples_{}.csv", self.n_samples))
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.dir
            .join(format!("raw_simulations_{}_samples", self.n_samples))
    }

    pub fn raw_run(&self, index: usize) -> PathBuf {
        raw_run_in(&self.raw_dir(), index)
    }

    pub fn failures(&self) -> PathBuf {
        self.dir.join("bool_indices.json")
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join("simulations_summary.csv")
    }

    pub fn problem(&self) -> PathBuf {
        self.dir.join("problem.json")
    }

    pub fn training(&self, output: &str) -> PathBuf {
        self.dir.join(format!("training_{}.csv", output))
    }
}

pub(crate) fn raw_run_in(raw_dir: &Path, index: usize) -> PathBuf {
    raw_dir.join(format!("simulation_{}.csv", index))
}
