//! Time series returned by a simulator.

use cg_core::{CoreError, CoreResult, Table};

/// Named output channels of equal length plus an optional time axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    time: Option<Vec<f64>>,
    channels: Table,
}

impl TimeSeries {
    pub fn new(channels: Table) -> Self {
        Self {
            time: None,
            channels,
        }
    }

    pub fn with_time(time: Vec<f64>, channels: Table) -> CoreResult<Self> {
        if channels.n_columns() > 0 && time.len() != channels.n_rows() {
            return Err(CoreError::RowLength {
                expected: channels.n_rows(),
                got: time.len(),
            });
        }
        Ok(Self {
            time: Some(time),
            channels,
        })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_channels<I, S>(channels: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let columns = channels
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();
        Ok(Self::new(Table::from_columns(columns)?))
    }

    /// Split a parsed table into channels and, if `time_column` is given,
    /// the time axis. A named time column that is absent is an error.
    pub fn from_table(mut table: Table, time_column: Option<&str>) -> CoreResult<Self> {
        match time_column {
            Some(name) => {
                let time = table.take_column(name).ok_or_else(|| CoreError::MissingColumn {
                    name: name.to_string(),
                })?;
                Self::with_time(time, table)
            }
            None => Ok(Self::new(table)),
        }
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    pub fn channels(&self) -> &Table {
        &self.channels
    }

    pub fn channel_names(&self) -> &[String] {
        self.channels.column_names()
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.column(name)
    }

    pub fn len(&self) -> usize {
        self.channels.n_rows()
    }

    /// No rows or no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Flatten back into a single table, time column first. The time axis
    /// is only kept when a column name for it is given.
    pub fn to_table(&self, time_column: Option<&str>) -> CoreResult<Table> {
        let mut columns = Vec::with_capacity(self.channels.n_columns() + 1);
        if let (Some(name), Some(time)) = (time_column, &self.time) {
            columns.push((name.to_string(), time.clone()));
        }
        columns.extend(
            self.channels
                .columns()
                .map(|(name, values)| (name.to_string(), values.to_vec())),
        );
        Table::from_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_column_is_split_off() {
        let table = Table::from_columns(vec![
            ("t".to_string(), vec![0.0, 1.0]),
            ("p".to_string(), vec![5.0, 6.0]),
        ])
        .unwrap();
        let series = TimeSeries::from_table(table, Some("t")).unwrap();
        assert_eq!(series.time(), Some(&[0.0, 1.0][..]));
        assert_eq!(series.channel_names(), &["p".to_string()]);
        assert_eq!(series.len(), 2);

        let flat = series.to_table(Some("t")).unwrap();
        assert_eq!(flat.column_names(), &["t".to_string(), "p".to_string()]);
        let channels_only = series.to_table(None).unwrap();
        assert_eq!(channels_only.column_names(), &["p".to_string()]);
    }

    #[test]
    fn time_name_clashing_with_channel_is_rejected() {
        let series = TimeSeries::from_channels([("time", vec![0.0, 1.0])]).unwrap();
        let series = TimeSeries::with_time(vec![0.0, 0.5], series.channels().clone()).unwrap();
        let err = series.to_table(Some("time")).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn missing_time_column_is_schema_error() {
        let table = Table::from_columns(vec![("p".to_string(), vec![1.0])]).unwrap();
        let err = TimeSeries::from_table(table, Some("time")).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn time_length_must_match() {
        let table = Table::from_columns(vec![("p".to_string(), vec![1.0, 2.0])]).unwrap();
        assert!(TimeSeries::with_time(vec![0.0], table).is_err());
    }

    #[test]
    fn no_channels_is_empty() {
        let series = TimeSeries::from_channels(Vec::<(String, Vec<f64>)>::new()).unwrap();
        assert!(series.is_empty());
        let series = TimeSeries::from_channels([("p", vec![])]).unwrap();
        assert!(series.is_empty());
    }
}
