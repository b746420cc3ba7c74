use cg_core::CoreError;
use thiserror::Error;

pub type FeatureResult<T> = Result<T, FeatureError>;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error(
        "Channel mismatch at sample {sample_index}: expected [{expected}], got [{got}]"
    )]
    ChannelMismatch {
        sample_index: usize,
        expected: String,
        got: String,
    },

    #[error("Summary row for sample {sample_index} has {got} values, expected {expected}")]
    RowWidth {
        sample_index: usize,
        expected: usize,
        got: usize,
    },

    #[error("Duplicate summary row for sample {sample_index}")]
    DuplicateSample { sample_index: usize },

    #[error("Summary file has no sample_index column")]
    MissingIndexColumn,

    #[error("Invalid sample_index value {value}")]
    InvalidIndex { value: String },

    #[error(transparent)]
    Table(#[from] CoreError),
}

impl FeatureError {
    pub fn is_schema(&self) -> bool {
        match self {
            FeatureError::Table(e) => e.is_schema(),
            FeatureError::ChannelMismatch { .. }
            | FeatureError::RowWidth { .. }
            | FeatureError::DuplicateSample { .. }
            | FeatureError::MissingIndexColumn
            | FeatureError::InvalidIndex { .. } => true,
        }
    }
}
