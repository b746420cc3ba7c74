use cg_batch::BatchProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    LoadingParameters,
    Sampling,
    MappingTimings,
    MappingVolumes,
    SavingSamples,
    LoadingSamples,
    Simulating,
    SavingFailures,
    LoadingResults,
    ReducingOutputs,
    SavingSummary,
    Completed,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::LoadingParameters => "Loading parameters",
            Self::Sampling => "Sampling",
            Self::MappingTimings => "Mapping timings",
            Self::MappingVolumes => "Mapping volumes",
            Self::SavingSamples => "Saving samples",
            Self::LoadingSamples => "Loading samples",
            Self::Simulating => "Simulating",
            Self::SavingFailures => "Saving failures",
            Self::LoadingResults => "Loading results",
            Self::ReducingOutputs => "Reducing outputs",
            Self::SavingSummary => "Saving summary",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineProgressEvent {
    pub stage: PipelineStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub batch: Option<BatchProgress>,
}

impl PipelineProgressEvent {
    pub fn stage(stage: PipelineStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            batch: None,
        }
    }
}

/// Progress sink handed to the services. `Send` so the batch stage can
/// forward worker progress from the pool threads.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(PipelineProgressEvent) + Send);

/// Lend the callback to a nested stage without giving it up.
pub(crate) fn reborrow<'a>(
    progress_cb: &'a mut Option<ProgressCallback<'_>>,
) -> Option<ProgressCallback<'a>> {
    progress_cb.as_mut().map(|cb| &mut **cb as ProgressCallback<'a>)
}

pub(crate) fn emit_progress(
    progress_cb: &mut Option<ProgressCallback<'_>>,
    stage: PipelineStage,
    started: std::time::Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(PipelineProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}
