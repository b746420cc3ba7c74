//! Persisted metadata.

use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Written next to the samples; enough to rebuild the sample table in a
/// later invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub timestamp: String,
    pub parameter_file: String,
    pub method: String,
    pub seed: u64,
    pub n_samples: usize,
    /// Fixed values after post-processing, in parameter-file order.
    #[serde(default)]
    pub fixed: Vec<FixedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_ref: Option<f64>,
    #[serde(default)]
    pub volumes_mapped: bool,
    pub tool_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedValue {
    pub name: String,
    pub value: f64,
}
