//! Service layer for the comparative GSA pipeline.
//!
//! Wraps the sampling, batch and feature crates into stage-level services
//! that read and write the campaign directory, plus the helpers that feed
//! external sensitivity and emulator tools.

pub mod error;
pub mod features_service;
pub mod pipeline;
pub mod progress;
pub mod sample_service;
pub mod sensitivity;
pub mod simulate_service;
pub mod training;

pub use error::{AppError, AppResult};
pub use features_service::calculate_output_features;
pub use pipeline::{PipelineReport, command_simulator, run_pipeline, sample_request, simulate_options};
pub use progress::{PipelineProgressEvent, PipelineStage, ProgressCallback};
pub use sample_service::{SampleRequest, SamplerHandle, sample_input_space};
pub use sensitivity::{SobolIndexRow, SobolIndexTable, export_problem};
pub use simulate_service::{SimulateOptions, simulate_data};
pub use training::{TrainingSet, build_training_set};
