//! CSV persistence for [`Table`] and for rows with optional cells.
//!
//! Numbers are written with Rust's shortest round-trip formatting so a table
//! read back compares equal to the one written. Empty cells stand for missing
//! values and are only accepted by the `optional` readers.

use std::path::Path;

use crate::{CoreError, CoreResult, Table};

pub fn write_table(path: &Path, table: &Table) -> CoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_table(path: &Path) -> CoreResult<Table> {
    let reader = csv::Reader::from_path(path)?;
    read_table_from(reader)
}

/// Parse a table from any CSV source, e.g. a child process's stdout.
pub fn read_table_from<R: std::io::Read>(mut reader: csv::Reader<R>) -> CoreResult<Table> {
    let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut table = Table::new(header)?;
    let mut row = Vec::with_capacity(table.n_columns());
    for record in reader.records() {
        let record = record?;
        row.clear();
        for (column, cell) in table.column_names().iter().zip(record.iter()) {
            row.push(parse_cell(column, cell)?);
        }
        table.push_row(&row)?;
    }
    Ok(table)
}

pub fn write_optional_rows(
    path: &Path,
    header: &[String],
    rows: &[Vec<Option<f64>>],
) -> CoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        if row.len() != header.len() {
            return Err(CoreError::RowLength {
                expected: header.len(),
                got: row.len(),
            });
        }
        writer.write_record(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_optional_rows(path: &Path) -> CoreResult<(Vec<String>, Vec<Vec<Option<f64>>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Vec::with_capacity(header.len());
        for (column, cell) in header.iter().zip(record.iter()) {
            if cell.trim().is_empty() {
                row.push(None);
            } else {
                row.push(Some(parse_cell(column, cell)?));
            }
        }
        rows.push(row);
    }
    Ok((header, rows))
}

fn parse_cell(column: &str, cell: &str) -> CoreResult<f64> {
    let trimmed = cell.trim();
    match trimmed {
        "nan" | "NaN" => Ok(f64::NAN),
        _ => trimmed.parse::<f64>().map_err(|_| CoreError::Parse {
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}
