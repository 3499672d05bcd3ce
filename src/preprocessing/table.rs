//! Canonical series table
//!
//! A thin typed wrapper around a polars [`DataFrame`] whose `ds` column has
//! already been validated and sorted. Every stage reads through these
//! accessors and produces a new table instead of mutating the one it got.

use crate::error::{DataPrepError, Result};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

/// Timestamp column
pub const DS_COLUMN: &str = "ds";
/// Raw value column
pub const Y_COLUMN: &str = "y";
/// Normalized time column
pub const T_COLUMN: &str = "t";
/// Normalized value column
pub const Y_SCALED_COLUMN: &str = "y_scaled";

pub(crate) const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Time-sorted table of `(ds, y)` observations.
///
/// Timestamps are stored as naive `Datetime(Microseconds)` values, values as
/// `Float64`. Normalized tables additionally carry `t` and `y_scaled`.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    df: DataFrame,
}

impl SeriesTable {
    /// Build a table from sorted timestamps (microseconds since the Unix epoch)
    pub(crate) fn from_micros(ds: Vec<i64>, y: Option<Vec<f64>>) -> Result<Self> {
        let ds_column = Column::new(DS_COLUMN.into(), ds)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        let mut columns = vec![ds_column];
        if let Some(values) = y {
            columns.push(Column::new(Y_COLUMN.into(), values));
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Underlying data frame
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Whether the table carries a `y` column
    pub fn has_values(&self) -> bool {
        self.has_column(Y_COLUMN)
    }

    /// Whether the table carries the normalized `t` column
    pub fn is_normalized(&self) -> bool {
        self.has_column(T_COLUMN)
    }

    /// Timestamps as microseconds since 1970-01-01
    pub fn timestamps_micros(&self) -> Result<Vec<i64>> {
        let column = self.required_column(DS_COLUMN)?;
        let physical = column.as_materialized_series().cast(&DataType::Int64)?;

        physical
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, ts)| {
                ts.ok_or_else(|| {
                    DataPrepError::DataError(format!("Found missing timestamp at row {}", row))
                })
            })
            .collect()
    }

    /// Timestamps as naive datetimes
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        self.timestamps_micros()?
            .into_iter()
            .map(micros_to_datetime)
            .collect()
    }

    /// Last (latest) timestamp
    pub fn last_timestamp(&self) -> Result<NaiveDateTime> {
        let micros = self.timestamps_micros()?;
        let last = micros
            .last()
            .copied()
            .ok_or_else(|| DataPrepError::SchemaError("Table has no rows".to_string()))?;
        micros_to_datetime(last)
    }

    /// Raw values
    pub fn values(&self) -> Result<Vec<f64>> {
        self.float_column(Y_COLUMN)
    }

    /// Normalized time
    pub fn time(&self) -> Result<Vec<f64>> {
        self.float_column(T_COLUMN)
    }

    /// Normalized values
    pub fn scaled_values(&self) -> Result<Vec<f64>> {
        self.float_column(Y_SCALED_COLUMN)
    }

    /// Read a numeric column, failing on absent columns or missing entries
    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.required_column(name)?;
        let series = column.as_materialized_series().cast(&DataType::Float64)?;

        series
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    DataPrepError::DataError(format!(
                        "Found missing value in column \"{}\" at row {}",
                        name, row
                    ))
                })
            })
            .collect()
    }

    fn required_column(&self, name: &str) -> Result<&Column> {
        self.df
            .column(name)
            .map_err(|_| DataPrepError::SchemaError(format!("Table has no column \"{}\"", name)))
    }

    /// Rows `[offset, offset + length)`, re-indexed from zero
    pub(crate) fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            df: self.df.slice(offset as i64, length),
        }
    }

    /// Copy of this table with `name` added or replaced
    pub(crate) fn with_float_column(&self, name: &str, values: Vec<f64>) -> Result<Self> {
        let mut df = self.df.clone();
        df.with_column(Column::new(name.into(), values))?;
        Ok(Self { df })
    }
}

pub(crate) fn micros_to_datetime(micros: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            DataPrepError::DataError(format!("Timestamp {}us is out of range", micros))
        })
}

pub(crate) fn datetime_to_micros(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_from_micros_roundtrip() {
        let ds: Vec<i64> = (1..=3).map(|d| datetime_to_micros(&day(d))).collect();
        let table = SeriesTable::from_micros(ds, Some(vec![1.0, 2.0, 3.0])).unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.has_values());
        assert!(!table.is_normalized());
        assert_eq!(table.timestamps().unwrap(), vec![day(1), day(2), day(3)]);
        assert_eq!(table.values().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(table.last_timestamp().unwrap(), day(3));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = SeriesTable::from_micros(vec![0, 1], None).unwrap();
        assert!(matches!(table.values(), Err(DataPrepError::SchemaError(_))));
    }

    #[test]
    fn test_slice_reindexes() {
        let ds: Vec<i64> = (1..=5).map(|d| datetime_to_micros(&day(d))).collect();
        let table = SeriesTable::from_micros(ds, Some(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();

        let tail = table.slice(3, 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.values().unwrap(), vec![4.0, 5.0]);
        assert_eq!(tail.timestamps().unwrap()[0], day(4));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_with_float_column_leaves_source_untouched() {
        let table = SeriesTable::from_micros(vec![0, 1], Some(vec![1.0, 2.0])).unwrap();
        let extended = table.with_float_column(T_COLUMN, vec![0.0, 1.0]).unwrap();

        assert!(extended.is_normalized());
        assert!(!table.is_normalized());
    }
}
