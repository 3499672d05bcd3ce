//! Structural checks and canonical ordering of raw series tables

use super::table::{datetime_to_micros, SeriesTable, DS_COLUMN, Y_COLUMN};
use crate::error::{DataPrepError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Naive datetime layouts accepted for string timestamps
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d%H%M%S",
];

/// Date-only layouts, interpreted as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Layouts carrying a UTC offset; these are recognized only to be rejected
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Check a raw training table and return it sorted by timestamp.
///
/// Requires a `ds` and a `y` column. Values are coerced to `Float64`,
/// timestamps to naive microsecond datetimes. Integer-encoded dates such as
/// `20200131` are converted to strings before parsing.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataPrepError::SchemaError`] | No rows, or `ds` / `y` column absent, or unsupported `ds` type |
/// | [`DataPrepError::DataError`] | Fewer than 2 present values, missing or non-finite values, missing or unparseable timestamps, timezone-aware timestamps, duplicate timestamps |
pub fn check_dataframe(df: &DataFrame) -> Result<SeriesTable> {
    check(df, true)
}

/// Check a table used at prediction time.
///
/// Same timestamp rules as [`check_dataframe`]; the `y` column is optional
/// and validated like training data when present.
pub fn check_future_dataframe(df: &DataFrame) -> Result<SeriesTable> {
    check(df, false)
}

fn check(df: &DataFrame, require_values: bool) -> Result<SeriesTable> {
    if df.height() == 0 {
        return Err(DataPrepError::SchemaError("Dataframe has no rows".to_string()));
    }

    let ds_column = df.column(DS_COLUMN).ok();
    let y_column = df.column(Y_COLUMN).ok();

    let ds_column = match ds_column {
        Some(column) => column,
        None => return Err(missing_columns_error()),
    };
    if require_values && y_column.is_none() {
        return Err(missing_columns_error());
    }

    let values = y_column
        .map(|column| check_values(column.as_materialized_series()))
        .transpose()?;
    let timestamps = check_timestamps(ds_column.as_materialized_series())?;

    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    order.sort_by_key(|&row| timestamps[row]);

    if let Some(pair) = order
        .windows(2)
        .find(|pair| timestamps[pair[0]] == timestamps[pair[1]])
    {
        return Err(DataPrepError::DataError(format!(
            "Found duplicate timestamp in column ds at rows {} and {}",
            pair[0], pair[1]
        )));
    }

    let sorted_ds: Vec<i64> = order.iter().map(|&row| timestamps[row]).collect();
    let sorted_y = values.map(|y| order.iter().map(|&row| y[row]).collect::<Vec<f64>>());

    debug!(
        rows = sorted_ds.len(),
        has_values = sorted_y.is_some(),
        "Validated series table"
    );

    SeriesTable::from_micros(sorted_ds, sorted_y)
}

fn missing_columns_error() -> DataPrepError {
    DataPrepError::SchemaError(
        "Dataframe must have columns \"ds\" and \"y\" with the dates and values respectively"
            .to_string(),
    )
}

fn check_values(series: &Series) -> Result<Vec<f64>> {
    let numeric = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = numeric.f64()?.into_iter().collect();

    let present = values
        .iter()
        .filter(|v| matches!(v, Some(x) if !x.is_nan()))
        .count();
    if present < 2 {
        return Err(DataPrepError::DataError(
            "Dataframe has less than 2 non-NaN rows".to_string(),
        ));
    }
    if present < values.len() {
        return Err(DataPrepError::DataError(
            "Dataframe contains NaN values in y".to_string(),
        ));
    }

    let values: Vec<f64> = values.into_iter().flatten().collect();
    if values.iter().any(|v| v.is_infinite()) {
        return Err(DataPrepError::DataError(
            "Found infinity in column y".to_string(),
        ));
    }

    Ok(values)
}

fn check_timestamps(series: &Series) -> Result<Vec<i64>> {
    if series.null_count() > 0 {
        return Err(DataPrepError::DataError("Found NaN in column ds".to_string()));
    }

    let parsed: Vec<Option<i64>> = match series.dtype() {
        DataType::Datetime(unit, tz) => {
            if tz.is_some() {
                return Err(timezone_error());
            }
            let unit = *unit;
            let physical = series.cast(&DataType::Int64)?;
            physical
                .i64()?
                .into_iter()
                .map(|raw| raw.map(|v| physical_to_micros(v, unit)))
                .collect()
        }
        DataType::Date => {
            let physical = series.cast(&DataType::Int32)?;
            physical
                .i32()?
                .into_iter()
                .map(|days| days.map(|d| d as i64 * MICROS_PER_DAY))
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .map(|raw| raw.map(parse_timestamp).transpose())
            .collect::<Result<Vec<_>>>()?,
        dtype if dtype.is_integer() => {
            let physical = series.cast(&DataType::Int64)?;
            physical
                .i64()?
                .into_iter()
                .map(|raw| raw.map(|v| parse_timestamp(&v.to_string())).transpose())
                .collect::<Result<Vec<_>>>()?
        }
        other => {
            return Err(DataPrepError::SchemaError(format!(
                "Column ds has unsupported type {}",
                other
            )))
        }
    };

    parsed
        .into_iter()
        .map(|ts| ts.ok_or_else(|| DataPrepError::DataError("Found NaN in column ds".to_string())))
        .collect()
}

fn physical_to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000),
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value * 1_000,
    }
}

fn timezone_error() -> DataPrepError {
    DataPrepError::DataError(
        "Column ds has timezone specified, which is not supported. Remove timezone.".to_string(),
    )
}

/// Parse one textual timestamp into microseconds since the epoch
fn parse_timestamp(raw: &str) -> Result<i64> {
    let text = raw.trim();

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Ok(datetime_to_micros(&dt));
    }

    if let Some(dt) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(datetime_to_micros(&dt));
    }

    let zoned = DateTime::parse_from_rfc3339(text).is_ok()
        || ZONED_FORMATS
            .iter()
            .any(|fmt| DateTime::parse_from_str(text, fmt).is_ok());
    if zoned {
        return Err(timezone_error());
    }

    Err(DataPrepError::DataError(format!(
        "Could not parse timestamp \"{}\" in column ds",
        raw
    )))
}
