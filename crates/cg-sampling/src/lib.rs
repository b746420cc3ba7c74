//! Design-of-experiments sampling over a parameter specification.
//!
//! Provides:
//! - Sobol low-discrepancy sequence, Latin hypercube and uniform random designs
//! - `SampleTable`: sampled free parameters plus the fixed values they run with
//! - post-processing of sampled timings and vessel volumes

pub mod error;
pub mod lhs;
pub mod mapping;
pub mod method;
pub mod samples;
pub mod sobol;

pub use error::{SamplingError, SamplingResult};
pub use mapping::{TimingMap, VolumeRelation};
pub use method::SamplingMethod;
pub use samples::{ParameterPoint, SampleTable, generate_samples};
pub use sobol::Sobol;
