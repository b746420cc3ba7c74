//! Scalar output features from simulated time series.
//!
//! Each successful run is reduced to the mean, maximum and minimum of every
//! channel. Rows keep the sample index of the run they came from.

pub mod error;
pub mod reduce;
pub mod summary;

pub use error::{FeatureError, FeatureResult};
pub use reduce::{ChannelPolicy, Statistic, calculate_output_features, reduce_run};
pub use summary::SummaryTable;
