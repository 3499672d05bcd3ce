//! Scale parameter estimation and normalization
//!
//! Time is mapped onto `[0, 1]` over the fitted range, values are
//! z-normalized. Parameters are estimated once (on the full table or on a
//! training prefix) and then applied unchanged to every later table.

use super::table::{micros_to_datetime, SeriesTable, T_COLUMN, Y_COLUMN, Y_SCALED_COLUMN};
use crate::error::{DataPrepError, Result};
use chrono::{Duration, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Shift and scale applied to the value column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueScale {
    /// Mean of the fitted range (0 when normalization is disabled)
    pub shift: f64,
    /// Population standard deviation of the fitted range (1 when disabled)
    pub scale: f64,
}

/// Immutable normalization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    time_origin: NaiveDateTime,
    time_span_us: i64,
    value: Option<ValueScale>,
}

impl ScaleParams {
    /// Earliest timestamp of the fitted range
    pub fn time_origin(&self) -> NaiveDateTime {
        self.time_origin
    }

    /// Latest minus earliest timestamp of the fitted range
    pub fn time_span(&self) -> Duration {
        Duration::microseconds(self.time_span_us)
    }

    /// Value scaling, present when the fitted table had a `y` column
    pub fn value_scale(&self) -> Option<ValueScale> {
        self.value
    }

    /// Normalized time of a single timestamp
    pub fn normalize_time(&self, ts: &NaiveDateTime) -> f64 {
        let offset = ts.and_utc().timestamp_micros() - self.origin_micros();
        offset as f64 / self.time_span_us as f64
    }

    /// Timestamp corresponding to a normalized time
    pub fn denormalize_time(&self, t: f64) -> Result<NaiveDateTime> {
        let offset = (t * self.time_span_us as f64).round();
        if !offset.is_finite() || offset.abs() > i64::MAX as f64 {
            return Err(DataPrepError::DataError(format!(
                "Normalized time {} is out of range",
                t
            )));
        }
        micros_to_datetime(self.origin_micros() + offset as i64)
    }

    /// Undo value normalization: `value = scaled * scale + shift`
    pub fn denormalize_values(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        let value = self.value.ok_or_else(|| {
            DataPrepError::ConfigError(
                "Scale parameters were fitted without a y column".to_string(),
            )
        })?;
        Ok(scaled.iter().map(|&v| v * value.scale + value.shift).collect())
    }

    /// Serialize to JSON for reuse at prediction time
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Check invariants of parameters that did not come from [`ScaleEstimator`]
    pub(crate) fn validate(&self) -> Result<()> {
        if self.time_span_us <= 0 {
            return Err(DataPrepError::ConfigError(
                "Scale parameters must have a positive time span".to_string(),
            ));
        }
        if let Some(value) = self.value {
            if !value.shift.is_finite() || !value.scale.is_finite() || value.scale == 0.0 {
                return Err(DataPrepError::ConfigError(format!(
                    "Invalid value scaling: shift {}, scale {}",
                    value.shift, value.scale
                )));
            }
        }
        Ok(())
    }

    fn origin_micros(&self) -> i64 {
        self.time_origin.and_utc().timestamp_micros()
    }
}

/// Estimates [`ScaleParams`] from a validated table
#[derive(Debug, Clone)]
pub struct ScaleEstimator {
    normalize_y: bool,
    split_idx: Option<usize>,
}

impl Default for ScaleEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleEstimator {
    pub fn new() -> Self {
        Self {
            normalize_y: true,
            split_idx: None,
        }
    }

    /// Enable or disable z-normalization of values
    pub fn with_normalize_y(mut self, normalize_y: bool) -> Self {
        self.normalize_y = normalize_y;
        self
    }

    /// Only use rows `[0, split_idx)` for estimation
    pub fn with_split_idx(mut self, split_idx: usize) -> Self {
        self.split_idx = Some(split_idx);
        self
    }

    /// Compute time origin/span and, when `y` is present, value shift/scale.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataPrepError::ConfigError`] | `split_idx` is 0 or beyond the table length |
    /// | [`DataPrepError::DataError`] | All timestamps in the range are equal |
    pub fn estimate(&self, table: &SeriesTable) -> Result<ScaleParams> {
        let micros = table.timestamps_micros()?;
        let end = match self.split_idx {
            None => micros.len(),
            Some(idx) if idx >= 1 && idx <= micros.len() => idx,
            Some(idx) => {
                return Err(DataPrepError::ConfigError(format!(
                    "split_idx must be in [1, {}], got {}",
                    micros.len(),
                    idx
                )))
            }
        };
        let range = &micros[..end];

        let (min, max) = match (range.iter().min(), range.iter().max()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => return Err(DataPrepError::SchemaError("Table has no rows".to_string())),
        };
        let time_span_us = max - min;
        if time_span_us <= 0 {
            return Err(DataPrepError::DataError(
                "Time span is zero: need at least two distinct timestamps to normalize time"
                    .to_string(),
            ));
        }

        let value = if table.has_values() {
            Some(self.value_scale(&table.slice(0, end))?)
        } else {
            None
        };

        let params = ScaleParams {
            time_origin: micros_to_datetime(min)?,
            time_span_us,
            value,
        };

        debug!(
            origin = %params.time_origin,
            span_days = time_span_us as f64 / 86_400_000_000.0,
            shift = params.value.map(|v| v.shift),
            scale = params.value.map(|v| v.scale),
            "Estimated scale parameters"
        );

        Ok(params)
    }

    fn value_scale(&self, range: &SeriesTable) -> Result<ValueScale> {
        if !self.normalize_y {
            return Ok(ValueScale {
                shift: 0.0,
                scale: 1.0,
            });
        }

        let series = range
            .frame()
            .column(Y_COLUMN)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = series.f64()?;

        let mean = ca.mean().ok_or_else(|| {
            DataPrepError::DataError("Cannot scale an empty value range".to_string())
        })?;
        // population std, ddof = 0
        let std = ca.std(0).unwrap_or(0.0);

        if std == 0.0 {
            warn!(mean, "Constant value range, using unit scale");
            Ok(ValueScale {
                shift: mean,
                scale: 1.0,
            })
        } else {
            Ok(ValueScale {
                shift: mean,
                scale: std,
            })
        }
    }
}

/// Add `t` and, when `y` is present, `y_scaled` using fixed parameters.
///
/// # Errors
///
/// [`DataPrepError::ConfigError`] when the table has a `y` column but the
/// parameters were fitted without one.
pub fn normalize(table: &SeriesTable, params: &ScaleParams) -> Result<SeriesTable> {
    let origin = params.origin_micros();
    let span = params.time_span_us as f64;

    let t: Vec<f64> = table
        .timestamps_micros()?
        .into_iter()
        .map(|ts| (ts - origin) as f64 / span)
        .collect();
    let mut normalized = table.with_float_column(T_COLUMN, t)?;

    if table.has_values() {
        let value = params.value.ok_or_else(|| {
            DataPrepError::ConfigError(
                "Table has a y column but scale parameters carry no value scaling".to_string(),
            )
        })?;
        let scaled: Vec<f64> = table
            .values()?
            .into_iter()
            .map(|v| (v - value.shift) / value.scale)
            .collect();
        normalized = normalized.with_float_column(Y_SCALED_COLUMN, scaled)?;
    }

    Ok(normalized)
}
