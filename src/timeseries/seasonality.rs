//! Periodic seasonality features
//!
//! Seasonalities are represented by Fourier series over days elapsed since
//! 1970-01-01: for harmonic `k = 1..=order` the columns are
//! `sin(2πkt/P)` and `cos(2πkt/P)`, interleaved.

use super::config::{SeasonConfig, SeasonalityBasis};
use crate::error::Result;
use crate::preprocessing::table::{datetime_to_micros, MICROS_PER_DAY};
use chrono::NaiveDateTime;
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Fourier components of the given period and order.
///
/// Returns a matrix of shape `(dates.len(), 2 * series_order)`.
pub fn fourier_series(dates: &[NaiveDateTime], period_days: f64, series_order: usize) -> Array2<f64> {
    let t_days: Vec<f64> = dates
        .iter()
        .map(|dt| datetime_to_micros(dt) as f64 / MICROS_PER_DAY)
        .collect();
    fourier_features(&t_days, period_days, series_order)
}

fn fourier_features(t_days: &[f64], period_days: f64, series_order: usize) -> Array2<f64> {
    Array2::from_shape_fn((t_days.len(), 2 * series_order), |(row, col)| {
        let harmonic = (col / 2 + 1) as f64;
        let angle = 2.0 * PI * harmonic * t_days[row] / period_days;
        if col % 2 == 0 {
            angle.sin()
        } else {
            angle.cos()
        }
    })
}

/// Feature matrix for every active period of `config`, keyed by name.
///
/// Periods with resolution 0 are skipped. Each matrix has shape
/// `(dates.len(), 2 * resolution)`.
pub fn seasonal_features_from_dates(
    dates: &[NaiveDateTime],
    config: &SeasonConfig,
) -> Result<BTreeMap<String, Array2<f64>>> {
    let micros: Vec<i64> = dates.iter().map(datetime_to_micros).collect();
    seasonal_features_from_micros(&micros, config)
}

pub(crate) fn seasonal_features_from_micros(
    micros: &[i64],
    config: &SeasonConfig,
) -> Result<BTreeMap<String, Array2<f64>>> {
    config.validate()?;

    let t_days: Vec<f64> = micros
        .iter()
        .map(|&us| us as f64 / MICROS_PER_DAY)
        .collect();

    let periods: Vec<_> = config.active_periods().collect();
    let features = periods
        .into_par_iter()
        .map(|(name, period)| {
            let matrix = match config.basis {
                SeasonalityBasis::Fourier => {
                    fourier_features(&t_days, period.period_days, period.resolution)
                }
            };
            (name.clone(), matrix)
        })
        .collect();

    Ok(features)
}
