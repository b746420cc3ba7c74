//! Interchange with the external Sobol analysis tool.

use std::path::{Path, PathBuf};

use cg_params::{ParameterSpec, SensitivityProblem};
use cg_results::RunStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Write `problem.json` (`{num_vars, names, bounds}`) for the parameter spec's free
/// parameters, using the bounds as declared in the parameter file.
pub fn export_problem(spec: &ParameterSpec, store: &RunStore) -> AppResult<(SensitivityProblem, PathBuf)> {
    let problem = spec.sensitivity_problem();
    let path = store.save_problem(&problem)?;
    info!(path = %path.display(), num_vars = problem.num_vars, "Wrote sensitivity problem");
    Ok((problem, path))
}

const REQUIRED_COLUMNS: [&str; 4] = ["index", "parameter", "output", "value"];

/// One Sobol index estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolIndexRow {
    /// Index kind, e.g. `S1` or `ST`.
    pub index: String,
    pub parameter: String,
    pub output: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SobolIndexTable {
    pub rows: Vec<SobolIndexRow>,
}

impl SobolIndexTable {
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Schema(format!(
                "{} is missing column(s): {}",
                path.display(),
                missing.join(", ")
            )));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<SobolIndexRow>().enumerate() {
            let row = record.map_err(|e| {
                AppError::Schema(format!("{} row {}: {}", path.display(), line + 1, e))
            })?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let has_confidence = self.rows.iter().any(|r| r.confidence.is_some());
        let mut writer = csv::Writer::from_path(path)?;
        let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        if has_confidence {
            header.push("confidence");
        }
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![
                row.index.clone(),
                row.parameter.clone(),
                row.output.clone(),
                row.value.to_string(),
            ];
            if has_confidence {
                record.push(row.confidence.map(|c| c.to_string()).unwrap_or_default());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching an index kind and/or output, in original order.
    pub fn filter(&self, index: Option<&str>, output: Option<&str>) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|r| index.is_none_or(|i| r.index == i))
                .filter(|r| output.is_none_or(|o| r.output == o))
                .cloned()
                .collect(),
        }
    }

    pub fn outputs(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.output.as_str()) {
                seen.push(&row.output);
            }
        }
        seen
    }

    /// Exchange the `S1` and `ST` labels. Works around plotting code that
    /// draws the two kinds under each other's label; all other rows are left
    /// alone. Applying it twice restores the table.
    pub fn swap_s1_st(&mut self) -> usize {
        let mut swapped = 0;
        for row in &mut self.rows {
            let label = match row.index.as_str() {
                "S1" => "ST",
                "ST" => "S1",
                _ => continue,
            };
            row.index = label.to_string();
            swapped += 1;
        }
        swapped
    }
}
