//! cg-params: parameter-space specifications and pipeline configuration.
//!
//! - `spec`: the JSON parameter-bounds document (fixed values and `[low, high]`
//!   ranges per component attribute)
//! - `config`: the YAML pipeline configuration
//! - `validate`: structural checks shared by both

pub mod config;
pub mod spec;
pub mod validate;

pub use config::*;
pub use spec::{
    FreeParameter, KeyPath, ParameterEntry, ParameterSpec, ParameterValue, SensitivityProblem,
};
pub use validate::{MAX_TIMEOUT_S, ValidationError, validate_config};

use std::path::Path;

pub type ParamsResult<T> = Result<T, ParamsError>;

#[derive(thiserror::Error, Debug)]
pub enum ParamsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParamsError {
    /// True for malformed or incomplete documents, as opposed to I/O failures.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, ParamsError::Io(_))
    }
}

/// Load a pipeline configuration. Relative paths inside it are resolved
/// against the directory containing the YAML file.
pub fn load_config(path: &Path) -> ParamsResult<PipelineConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: PipelineConfig = serde_yaml::from_str(&content)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &PipelineConfig) -> ParamsResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
