//! Error types for the cg-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the pipeline crates and
/// gives the CLI one error interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed parameter file, pipeline config or option.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A table or file is missing columns or has the wrong shape.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Stage output error: {0}")]
    Storage(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cg-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Configuration(_) | AppError::InvalidInput(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, AppError::Schema(_))
    }
}

impl From<cg_params::ParamsError> for AppError {
    fn from(err: cg_params::ParamsError) -> Self {
        match err {
            cg_params::ParamsError::Io(e) => AppError::Io(e),
            other => AppError::Configuration(other.to_string()),
        }
    }
}

impl From<cg_core::CoreError> for AppError {
    fn from(err: cg_core::CoreError) -> Self {
        if err.is_schema() {
            return AppError::Schema(err.to_string());
        }
        match err {
            cg_core::CoreError::Io(e) => AppError::Io(e),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<cg_sampling::SamplingError> for AppError {
    fn from(err: cg_sampling::SamplingError) -> Self {
        match err {
            cg_sampling::SamplingError::Table(e) => e.into(),
            other => AppError::Configuration(other.to_string()),
        }
    }
}

impl From<cg_batch::BatchError> for AppError {
    fn from(err: cg_batch::BatchError) -> Self {
        match err {
            cg_batch::BatchError::InvalidArg { what } => AppError::Configuration(what.to_string()),
            cg_batch::BatchError::Sampling(e) => e.into(),
            other => AppError::Batch(other.to_string()),
        }
    }
}

impl From<cg_features::FeatureError> for AppError {
    fn from(err: cg_features::FeatureError) -> Self {
        if err.is_schema() {
            AppError::Schema(err.to_string())
        } else {
            AppError::Storage(err.to_string())
        }
    }
}

impl From<cg_results::ResultsError> for AppError {
    fn from(err: cg_results::ResultsError) -> Self {
        if err.is_schema() {
            return AppError::Schema(err.to_string());
        }
        match err {
            cg_results::ResultsError::Io(e) => AppError::Io(e),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
