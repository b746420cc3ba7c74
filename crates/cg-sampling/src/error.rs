//! Sampling errors.

use cg_core::CoreError;
use thiserror::Error;

pub type SamplingResult<T> = Result<T, SamplingError>;

#[derive(Error, Debug)]
pub enum SamplingError {
    /// Request or post-processing step inconsistent with the parameter set.
    #[error("Invalid sampling configuration: {message}")]
    Config { message: String },

    #[error("Unknown sampling method: {name}")]
    UnknownMethod { name: String },

    #[error("Sobol sequence supports at most {max} dimensions, got {requested}")]
    TooManyDimensions { requested: usize, max: usize },

    #[error(transparent)]
    Table(#[from] CoreError),
}

impl SamplingError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SamplingError::Config {
            message: message.into(),
        }
    }
}
