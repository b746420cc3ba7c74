//! Named-column numeric table.
//!
//! Storage is column-major: every column holds exactly `n_rows` values. Column
//! names are unique and keep insertion order.

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> CoreResult<Self> {
        check_unique(&columns)?;
        let data = vec![Vec::new(); columns.len()];
        Ok(Self { columns, data })
    }

    /// Build a table from whole columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> CoreResult<Self> {
        let (names, data): (Vec<String>, Vec<Vec<f64>>) = columns.into_iter().unzip();
        check_unique(&names)?;
        if let Some(first) = data.first() {
            let expected = first.len();
            if let Some(bad) = data.iter().find(|c| c.len() != expected) {
                return Err(CoreError::RowLength {
                    expected,
                    got: bad.len(),
                });
            }
        }
        Ok(Self {
            columns: names,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.data.first().map(Vec::len).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0 || self.columns.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|i| self.data[i].as_slice())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        let index = self.column_index(name)?;
        Some(self.data[index].as_mut_slice())
    }

    /// Like [`Table::column`] but reports a missing column as an error.
    pub fn require_column(&self, name: &str) -> CoreResult<&[f64]> {
        self.column(name).ok_or_else(|| CoreError::MissingColumn {
            name: name.to_string(),
        })
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .zip(&self.data)
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn push_row(&mut self, row: &[f64]) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowLength {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        for (column, value) in self.data.iter_mut().zip(row) {
            column.push(*value);
        }
        Ok(())
    }

    pub fn row(&self, index: usize) -> CoreResult<Vec<f64>> {
        let len = self.n_rows();
        if index >= len {
            return Err(CoreError::IndexOob {
                what: "table row",
                index,
                len,
            });
        }
        Ok(self.data.iter().map(|c| c[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.n_rows()).map(move |i| self.data.iter().map(|c| c[i]).collect())
    }

    /// Append a whole column. Its length must match the current row count
    /// unless the table has no columns yet.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> CoreResult<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(CoreError::DuplicateColumn { name });
        }
        if !self.columns.is_empty() && values.len() != self.n_rows() {
            return Err(CoreError::RowLength {
                expected: self.n_rows(),
                got: values.len(),
            });
        }
        self.columns.push(name);
        self.data.push(values);
        Ok(())
    }

    /// Remove a column and return its values.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        Some(self.data.remove(index))
    }

    /// New table holding only `names`, in the order given.
    pub fn select(&self, names: &[String]) -> CoreResult<Table> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push((name.clone(), self.require_column(name)?.to_vec()));
        }
        Table::from_columns(columns)
    }
}

fn check_unique(names: &[String]) -> CoreResult<()> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(CoreError::DuplicateColumn { name: name.clone() });
        }
    }
    Ok(())
}
