//! Emulator training data: sampled inputs joined with one summary column.

use std::path::Path;

use cg_features::SummaryTable;
use cg_sampling::SampleTable;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Inputs `x` and target `y`, row-aligned and keyed by sample index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub parameters: Vec<String>,
    pub output: String,
    pub sample_indices: Vec<usize>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// CSV with `sample_index`, the parameter columns, then the target.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = Vec::with_capacity(self.parameters.len() + 2);
        header.push("sample_index".to_string());
        header.extend(self.parameters.iter().cloned());
        header.push(self.output.clone());
        writer.write_record(&header)?;

        for ((index, row), target) in self.sample_indices.iter().zip(&self.x).zip(&self.y) {
            let mut record = Vec::with_capacity(header.len());
            record.push(index.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            record.push(target.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Join `samples` and `summary` on `sample_index`.
///
/// `parameters` selects input columns (all sampled columns when `None`).
/// Rows whose target cell is empty are dropped.
pub fn build_training_set(
    samples: &SampleTable,
    summary: &SummaryTable,
    output: &str,
    parameters: Option<&[String]>,
) -> AppResult<TrainingSet> {
    let target = summary.column_index(output).ok_or_else(|| {
        AppError::Schema(format!(
            "summary has no column '{}' (available: {})",
            output,
            summary.columns().join(", ")
        ))
    })?;

    let parameters: Vec<String> = match parameters {
        Some(names) => names.to_vec(),
        None => samples.column_names().to_vec(),
    };
    if parameters.is_empty() {
        return Err(AppError::InvalidInput(
            "training set needs at least one parameter column".to_string(),
        ));
    }
    let inputs = samples.table().select(&parameters)?;

    let mut set = TrainingSet {
        parameters,
        output: output.to_string(),
        sample_indices: Vec::new(),
        x: Vec::new(),
        y: Vec::new(),
    };
    let mut dropped = 0usize;
    for (index, values) in summary.rows() {
        let Some(y) = values[target] else {
            dropped += 1;
            continue;
        };
        if *index >= samples.n_samples() {
            return Err(AppError::Schema(format!(
                "summary row for sample {} but only {} samples exist",
                index,
                samples.n_samples()
            )));
        }
        set.sample_indices.push(*index);
        set.x.push(inputs.row(*index)?);
        set.y.push(y);
    }

    debug!(rows = set.len(), dropped, output, "Built training set");
    Ok(set)
}
