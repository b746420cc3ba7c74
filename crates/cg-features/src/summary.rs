//! The per-run feature table.

use std::collections::BTreeSet;
use std::path::Path;

use cg_core::csv_io::{read_optional_rows, write_optional_rows};

use crate::{FeatureError, FeatureResult};

/// Name of the join-key column in persisted summaries.
pub const SAMPLE_INDEX_COLUMN: &str = "sample_index";

/// One row per reduced run, keyed by the run's sample index. Cells are
/// `None` where a statistic is undefined or the run lacked the channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryTable {
    columns: Vec<String>,
    rows: Vec<(usize, Vec<Option<f64>>)>,
    indices: BTreeSet<usize>,
}

impl SummaryTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            indices: BTreeSet::new(),
        }
    }

    /// Feature column names, without the `sample_index` key.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[(usize, Vec<Option<f64>>)] {
        &self.rows
    }

    pub fn sample_indices(&self) -> Vec<usize> {
        self.rows.iter().map(|(i, _)| *i).collect()
    }

    pub fn push_row(&mut self, sample_index: usize, values: Vec<Option<f64>>) -> FeatureResult<()> {
        if values.len() != self.columns.len() {
            return Err(FeatureError::RowWidth {
                sample_index,
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        if !self.indices.insert(sample_index) {
            return Err(FeatureError::DuplicateSample { sample_index });
        }
        self.rows.push((sample_index, values));
        Ok(())
    }

    /// Append columns, leaving existing rows empty in them.
    pub fn extend_columns(&mut self, names: impl IntoIterator<Item = String>) {
        let before = self.columns.len();
        self.columns.extend(names);
        let added = self.columns.len() - before;
        for (_, values) in &mut self.rows {
            values.extend(std::iter::repeat_n(None, added));
        }
    }

    pub fn row_for_sample(&self, sample_index: usize) -> Option<&[Option<f64>]> {
        self.rows
            .iter()
            .find(|(i, _)| *i == sample_index)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let c = self.column_index(name)?;
        Some(self.rows.iter().map(|(_, v)| v[c]).collect())
    }

    pub fn value(&self, sample_index: usize, column: &str) -> Option<f64> {
        let c = self.column_index(column)?;
        self.row_for_sample(sample_index)?[c]
    }

    pub fn save(&self, path: &Path) -> FeatureResult<()> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(SAMPLE_INDEX_COLUMN.to_string());
        header.extend(self.columns.iter().cloned());

        let rows: Vec<Vec<Option<f64>>> = self
            .rows
            .iter()
            .map(|(index, values)| {
                let mut row = Vec::with_capacity(values.len() + 1);
                row.push(Some(*index as f64));
                row.extend(values.iter().copied());
                row
            })
            .collect();
        write_optional_rows(path, &header, &rows)?;
        Ok(())
    }

    pub fn load(path: &Path) -> FeatureResult<Self> {
        let (mut header, rows) = read_optional_rows(path)?;
        if header.first().map(String::as_str) != Some(SAMPLE_INDEX_COLUMN) {
            return Err(FeatureError::MissingIndexColumn);
        }
        header.remove(0);

        let mut table = SummaryTable::new(header);
        for mut row in rows {
            let key = row.remove(0);
            let index = match key {
                Some(v) if v >= 0.0 && v.fract() == 0.0 => v as usize,
                other => {
                    return Err(FeatureError::InvalidIndex {
                        value: other.map(|v| v.to_string()).unwrap_or_default(),
                    });
                }
            };
            table.push_row(index, row)?;
        }
        Ok(table)
    }
}
