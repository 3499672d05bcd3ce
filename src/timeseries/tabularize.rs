//! Sliding-window tabularization of a normalized series
//!
//! For `n_lags > 0`, sample `i` pairs the lag window `y_scaled[i..i + n_lags]`
//! with the forecast horizon `[i + n_lags, i + n_lags + n_forecasts)`. Time and
//! seasonality features are taken over the horizon rows, aligned with the
//! targets rather than with the lags. For `n_lags == 0` every row is its own
//! single-step sample.

use super::config::SeasonConfig;
use super::seasonality::seasonal_features_from_micros;
use crate::error::{DataPrepError, Result};
use crate::preprocessing::SeriesTable;
use ndarray::{Array2, Array3};
use std::collections::BTreeMap;
use tracing::debug;

/// Model inputs of a tabularized series.
///
/// All arrays share the same leading dimension `n_samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularInputs {
    /// Normalized time at each forecast step: `(n_samples, n_forecasts)`
    pub time: Array2<f64>,
    /// Scaled values preceding each horizon: `(n_samples, n_lags)`, absent
    /// when `n_lags == 0`
    pub lags: Option<Array2<f64>>,
    /// Seasonality features per period: `(n_samples, n_forecasts, 2 * resolution)`
    pub seasonalities: BTreeMap<String, Array3<f64>>,
}

impl TabularInputs {
    pub fn n_samples(&self) -> usize {
        self.time.nrows()
    }
}

/// Builds fixed-shape windows from a normalized [`SeriesTable`]
#[derive(Debug, Clone)]
pub struct Tabularizer {
    n_lags: usize,
    n_forecasts: usize,
    season_config: Option<SeasonConfig>,
}

impl Tabularizer {
    /// Create a tabularizer without seasonality features
    pub fn new(n_lags: usize, n_forecasts: usize) -> Self {
        Self {
            n_lags,
            n_forecasts,
            season_config: None,
        }
    }

    /// Add seasonality features
    pub fn with_season_config(mut self, config: SeasonConfig) -> Self {
        self.season_config = Some(config);
        self
    }

    pub fn n_lags(&self) -> usize {
        self.n_lags
    }

    pub fn n_forecasts(&self) -> usize {
        self.n_forecasts
    }

    pub fn season_config(&self) -> Option<&SeasonConfig> {
        self.season_config.as_ref()
    }

    /// Number of window positions in a table of `len` rows.
    ///
    /// # Errors
    ///
    /// [`DataPrepError::ConfigError`] when `n_forecasts` is 0, when
    /// `n_lags == 0` with `n_forecasts != 1`, or when no complete window fits.
    pub fn n_samples(&self, len: usize) -> Result<usize> {
        if self.n_forecasts < 1 {
            return Err(DataPrepError::ConfigError(
                "n_forecasts must be at least 1".to_string(),
            ));
        }
        if self.n_lags == 0 && self.n_forecasts != 1 {
            return Err(DataPrepError::ConfigError(format!(
                "n_lags = 0 requires n_forecasts = 1, got {}",
                self.n_forecasts
            )));
        }

        match (len + 1).checked_sub(self.n_lags + self.n_forecasts) {
            Some(n) if n >= 1 => Ok(n),
            _ => Err(DataPrepError::ConfigError(format!(
                "Window of n_lags={} and n_forecasts={} does not fit {} rows",
                self.n_lags, self.n_forecasts, len
            ))),
        }
    }

    /// Tabularize a normalized table with `t` and `y_scaled` columns.
    ///
    /// Returns the inputs and a `(n_samples, n_forecasts)` target array.
    pub fn tabularize(&self, table: &SeriesTable) -> Result<(TabularInputs, Array2<f64>)> {
        self.build(table, false)
    }

    /// Tabularize for prediction.
    ///
    /// `y_scaled` is only read when `n_lags > 0`. Targets keep their training
    /// shape but every entry is `NaN`.
    pub fn tabularize_for_prediction(
        &self,
        table: &SeriesTable,
    ) -> Result<(TabularInputs, Array2<f64>)> {
        self.build(table, true)
    }

    fn build(&self, table: &SeriesTable, predict_mode: bool) -> Result<(TabularInputs, Array2<f64>)> {
        let n_samples = self.n_samples(table.len())?;
        let n_lags = self.n_lags;
        let n_forecasts = self.n_forecasts;

        // With n_lags == 0 the horizon is one row and the offset vanishes,
        // so both cases share the same indexing.
        let t = table.time()?;
        let time = Array2::from_shape_fn((n_samples, n_forecasts), |(i, j)| t[n_lags + i + j]);

        let series = if n_lags > 0 || !predict_mode {
            Some(table.scaled_values()?)
        } else {
            None
        };

        let lags = match &series {
            Some(y) if n_lags > 0 => Some(Array2::from_shape_fn((n_samples, n_lags), |(i, j)| {
                y[i + j]
            })),
            _ => None,
        };

        let mut seasonalities = BTreeMap::new();
        if let Some(config) = &self.season_config {
            let micros = table.timestamps_micros()?;
            for (name, features) in seasonal_features_from_micros(&micros, config)? {
                let strided = Array3::from_shape_fn(
                    (n_samples, n_forecasts, features.ncols()),
                    |(i, j, c)| features[[n_lags + i + j, c]],
                );
                seasonalities.insert(name, strided);
            }
        }

        let targets = match (&series, predict_mode) {
            (Some(y), false) => {
                Array2::from_shape_fn((n_samples, n_forecasts), |(i, j)| y[n_lags + i + j])
            }
            _ => Array2::from_elem(time.dim(), f64::NAN),
        };

        debug!(
            n_samples,
            n_lags,
            n_forecasts,
            predict_mode,
            seasonalities = seasonalities.len(),
            "Tabularized series"
        );

        Ok((
            TabularInputs {
                time,
                lags,
                seasonalities,
            },
            targets,
        ))
    }
}
