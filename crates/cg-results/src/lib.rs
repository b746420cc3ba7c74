//! cg-results: on-disk layout of a sampling campaign.

pub mod hash;
pub mod layout;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use layout::OutputLayout;
pub use store::{RawRunWriter, RunStore};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Table(#[from] cg_core::CoreError),

    #[error("Summary error: {0}")]
    Summary(#[from] cg_features::FeatureError),

    #[error("Missing stage output: {path}")]
    NotFound { path: PathBuf },

    #[error("Inconsistent stage output in {path}: {message}")]
    Inconsistent { path: PathBuf, message: String },
}

impl ResultsError {
    /// True when the files exist but do not have the expected columns.
    pub fn is_schema(&self) -> bool {
        match self {
            ResultsError::Table(e) => e.is_schema(),
            ResultsError::Summary(e) => e.is_schema(),
            ResultsError::Inconsistent { .. } => true,
            _ => false,
        }
    }
}
