//! Feature stage: reduce successful runs and persist the summary.

use std::time::Instant;

use cg_batch::SimulationResult;
use cg_features::{ChannelPolicy, SummaryTable};
use cg_results::RunStore;
use tracing::info;

use crate::error::AppResult;
use crate::progress::{PipelineStage, ProgressCallback, emit_progress};

/// Reduce `results` to `<channel>_{mean,max,min}` columns and write
/// `simulations_summary.csv` into the campaign directory.
pub fn calculate_output_features(
    results: &[SimulationResult],
    policy: ChannelPolicy,
    store: &RunStore,
    mut progress_cb: Option<ProgressCallback<'_>>,
) -> AppResult<SummaryTable> {
    let started = Instant::now();
    emit_progress(&mut progress_cb, PipelineStage::ReducingOutputs, started, None);
    let summary = cg_features::calculate_output_features(results, policy)?;

    emit_progress(&mut progress_cb, PipelineStage::SavingSummary, started, None);
    let path = store.save_summary(&summary)?;
    info!(
        path = %path.display(),
        rows = summary.len(),
        columns = summary.columns().len(),
        "Saved simulation summary"
    );
    Ok(summary)
}
