//! Reduction of time series to summary statistics.

use std::collections::BTreeSet;

use cg_batch::{SimulationResult, TimeSeries};
use cg_core::{nan_max, nan_mean, nan_min};
use cg_params::ChannelPolicyDef;
use tracing::{debug, warn};

use crate::{FeatureError, FeatureResult, SummaryTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Max,
    Min,
}

impl Statistic {
    /// Column order within one channel.
    pub const ALL: [Statistic; 3] = [Statistic::Mean, Statistic::Max, Statistic::Min];

    pub fn suffix(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Max => "max",
            Statistic::Min => "min",
        }
    }

    pub fn column(self, channel: &str) -> String {
        format!("{}_{}", channel, self.suffix())
    }

    /// NaN entries are ignored; `None` if nothing is left.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Statistic::Mean => nan_mean(values),
            Statistic::Max => nan_max(values),
            Statistic::Min => nan_min(values),
        }
    }
}

/// What to do when runs report different channel sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPolicy {
    /// Every run must have the channels of the first reduced run.
    #[default]
    Strict,
    /// Align on the union of channels; missing cells stay empty.
    Union,
}

impl From<ChannelPolicyDef> for ChannelPolicy {
    fn from(def: ChannelPolicyDef) -> Self {
        match def {
            ChannelPolicyDef::Strict => ChannelPolicy::Strict,
            ChannelPolicyDef::Union => ChannelPolicy::Union,
        }
    }
}

fn feature_columns<'a>(channels: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    channels
        .into_iter()
        .flat_map(|c| Statistic::ALL.iter().map(move |s| s.column(c)))
        .collect()
}

/// `(column, value)` pairs for every channel of one run.
pub fn reduce_run(series: &TimeSeries) -> Vec<(String, Option<f64>)> {
    series
        .channels()
        .columns()
        .flat_map(|(name, values)| {
            Statistic::ALL
                .iter()
                .map(move |s| (s.column(name), s.apply(values)))
        })
        .collect()
}

fn reduce_aligned(series: &TimeSeries, channels: &[String]) -> Vec<Option<f64>> {
    channels
        .iter()
        .flat_map(|name| {
            let values = series.channel(name);
            Statistic::ALL
                .iter()
                .map(move |s| values.and_then(|v| s.apply(v)))
        })
        .collect()
}

fn joined(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

/// Build the summary table for a batch.
///
/// Failed runs and runs without rows or channels are skipped with a warning.
/// Column order follows the first reduced run; under
/// [`ChannelPolicy::Union`] later channels are appended as first seen.
pub fn calculate_output_features(
    results: &[SimulationResult],
    policy: ChannelPolicy,
) -> FeatureResult<SummaryTable> {
    let mut channels: Option<Vec<String>> = None;
    let mut table = SummaryTable::default();
    let mut skipped = 0usize;

    for (index, result) in results.iter().enumerate() {
        let series = match result {
            SimulationResult::Failed(reason) => {
                warn!(index, reason = %reason, "Skipping failed simulation");
                skipped += 1;
                continue;
            }
            SimulationResult::Success(series) if series.is_empty() => {
                warn!(index, "Skipping simulation without output samples");
                skipped += 1;
                continue;
            }
            SimulationResult::Success(series) => series,
        };

        let names = series.channel_names();
        if channels.is_none() {
            table = SummaryTable::new(feature_columns(names));
            channels = Some(names.to_vec());
        }
        let known = channels.get_or_insert_with(Vec::new);

        let expected: BTreeSet<&str> = known.iter().map(String::as_str).collect();
        let got: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if expected != got {
            match policy {
                ChannelPolicy::Strict => {
                    return Err(FeatureError::ChannelMismatch {
                        sample_index: index,
                        expected: joined(&expected),
                        got: joined(&got),
                    });
                }
                ChannelPolicy::Union => {
                    let added: Vec<String> = names
                        .iter()
                        .filter(|n| !expected.contains(n.as_str()))
                        .cloned()
                        .collect();
                    if !added.is_empty() {
                        debug!(index, added = ?added, "Extending summary with new channels");
                        table.extend_columns(feature_columns(&added));
                        known.extend(added);
                    }
                }
            }
        }

        table.push_row(index, reduce_aligned(series, known))?;
    }

    debug!(rows = table.len(), skipped, columns = table.columns().len(), "Reduced outputs");
    Ok(table)
}
