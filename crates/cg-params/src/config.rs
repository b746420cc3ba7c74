//! Pipeline configuration schema (YAML).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Parameter-bounds JSON document.
    pub parameters: PathBuf,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub sampling: SamplingDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<TimingMapDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeRelationDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator: Option<SimulatorDef>,
    #[serde(default)]
    pub batch: BatchDef,
    #[serde(default)]
    pub features: FeaturesDef,
    #[serde(default = "default_steps")]
    pub steps: Vec<StepDef>,
}

impl PipelineConfig {
    pub fn new(parameters: impl Into<PathBuf>) -> Self {
        Self {
            parameters: parameters.into(),
            output_root: default_output_root(),
            sampling: SamplingDef::default(),
            timings: None,
            volumes: Vec::new(),
            simulator: None,
            batch: BatchDef::default(),
            features: FeaturesDef::default(),
            steps: default_steps(),
        }
    }

    /// Make relative paths relative to `base` instead of the process cwd.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.parameters.is_relative() {
            self.parameters = base.join(&self.parameters);
        }
        if self.output_root.is_relative() {
            self.output_root = base.join(&self.output_root);
        }
        if let Some(simulator) = &mut self.simulator
            && let Some(dir) = &simulator.working_dir
            && dir.is_relative()
        {
            simulator.working_dir = Some(base.join(dir));
        }
    }

    pub fn runs_step(&self, step: StepDef) -> bool {
        self.steps.contains(&step)
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("outputs/simulations")
}

fn default_steps() -> Vec<StepDef> {
    vec![StepDef::Sample, StepDef::Simulate, StepDef::Features]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SamplingMethodDef {
    #[default]
    Sobol,
    #[serde(rename = "LHS", alias = "LatinHypercube")]
    Lhs,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingDef {
    #[serde(default)]
    pub method: SamplingMethodDef,
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for SamplingDef {
    fn default() -> Self {
        Self {
            method: SamplingMethodDef::default(),
            n_samples: default_n_samples(),
            seed: 0,
        }
    }
}

fn default_n_samples() -> usize {
    2048
}

/// Columns holding fractions of a reference cycle, rescaled by `ref_time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingMapDef {
    pub ref_time: f64,
    /// Canonical parameter name -> sampled columns it governs.
    pub map: BTreeMap<String, Vec<String>>,
}

impl TimingMapDef {
    /// Chamber activation timings of the two-chamber left-heart model, with
    /// a 1000 ms cardiac cycle.
    pub fn chamber_defaults() -> Self {
        let names = [
            "lv.t_tr", "la.t_tr", "la.delay", "lv.tau", "la.tau", "lv.t_max", "la.t_max",
        ];
        Self {
            ref_time: 1000.0,
            map: names
                .iter()
                .map(|n| (n.to_string(), vec![n.to_string()]))
                .collect(),
        }
    }
}

/// `columns` hold fractions of `reference`; each becomes `fraction * reference`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeRelationDef {
    pub reference: String,
    pub columns: Vec<String>,
}

/// External program run once per sample row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorDef {
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchDef {
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,
}

impl Default for BatchDef {
    fn default() -> Self {
        Self {
            n_jobs: default_n_jobs(),
        }
    }
}

fn default_n_jobs() -> usize {
    8
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPolicyDef {
    #[default]
    Strict,
    Union,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeaturesDef {
    #[serde(default)]
    pub channel_policy: ChannelPolicyDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum StepDef {
    Sample,
    Simulate,
    Features,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("parameters: inputs/p.json\n").unwrap();
        assert_eq!(config.sampling.n_samples, 2048);
        assert_eq!(config.sampling.method, SamplingMethodDef::Sobol);
        assert_eq!(config.batch.n_jobs, 8);
        assert_eq!(config.features.channel_policy, ChannelPolicyDef::Strict);
        assert_eq!(config.steps.len(), 3);
        assert_eq!(config.output_root, PathBuf::from("outputs/simulations"));
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
parameters: p.json
sampling:
  method: LHS
  n_samples: 64
  seed: 7
timings:
  ref_time: 1000.0
  map:
    lv.t_tr: [lv.t_tr]
volumes:
  - reference: v_tot
    columns: [ao.v, art.v]
simulator:
  program: ./run_model
  args: ["--quiet"]
  time_column: t
  timeout_s: 30
batch:
  n_jobs: 2
features:
  channel_policy: union
steps: [simulate, features]
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sampling.method, SamplingMethodDef::Lhs);
        assert_eq!(config.volumes[0].columns.len(), 2);
        assert_eq!(config.simulator.as_ref().unwrap().timeout_s, Some(30.0));
        assert!(!config.runs_step(StepDef::Sample));
        assert!(config.runs_step(StepDef::Features));
    }

    #[test]
    fn resolves_relative_paths() {
        let mut config = PipelineConfig::new("p.json");
        config.resolve_paths(Path::new("/work/study"));
        assert_eq!(config.parameters, PathBuf::from("/work/study/p.json"));
        assert_eq!(
            config.output_root,
            PathBuf::from("/work/study/outputs/simulations")
        );
    }

    #[test]
    fn chamber_defaults_map_each_name_to_itself() {
        let timings = TimingMapDef::chamber_defaults();
        assert_eq!(timings.ref_time, 1000.0);
        assert_eq!(timings.map.len(), 7);
        assert_eq!(timings.map["la.delay"], vec!["la.delay".to_string()]);
    }
}
