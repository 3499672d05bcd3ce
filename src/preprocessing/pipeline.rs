//! Fitted preprocessing pipeline
//!
//! Holds the scale parameters estimated at training time so that every later
//! table is normalized with exactly the same shift, scale and time range.

use super::checker::{check_dataframe, check_future_dataframe};
use super::config::DataConfig;
use super::scaler::{normalize, ScaleEstimator, ScaleParams};
use super::table::SeriesTable;
use crate::error::{DataPrepError, Result};
use crate::timeseries::{split_df, Tabularizer, TimeDataset};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Validates, scales and tabularizes series tables with fixed parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesPreprocessor {
    config: DataConfig,
    params: Option<ScaleParams>,
    /// Seconds spent in the last fit call
    fit_time: Option<f64>,
}

impl TimeSeriesPreprocessor {
    /// Create an unfitted preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(DataConfig::default())
    }

    pub fn with_config(config: DataConfig) -> Self {
        Self {
            config,
            params: None,
            fit_time: None,
        }
    }

    /// Restore a preprocessor from persisted scale parameters
    pub fn from_params(config: DataConfig, params: ScaleParams) -> Self {
        Self {
            config,
            params: Some(params),
            fit_time: None,
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    pub fn scale_params(&self) -> Option<&ScaleParams> {
        self.params.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }

    fn estimator(&self) -> ScaleEstimator {
        ScaleEstimator::new().with_normalize_y(self.config.normalize_y)
    }

    fn fitted_params(&self) -> Result<&ScaleParams> {
        self.params.as_ref().ok_or(DataPrepError::NotFitted)
    }

    /// Validate a training table and estimate scale parameters over all rows
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();
        self.config.validate()?;

        let table = check_dataframe(df)?;
        self.params = Some(self.estimator().estimate(&table)?);

        let elapsed = start.elapsed().as_secs_f64();
        self.fit_time = Some(elapsed);
        info!(rows = table.len(), fit_time = elapsed, "Fitted time series preprocessor");
        Ok(self)
    }

    /// Validate with prediction rules (`y` optional) and normalize with the
    /// fitted parameters
    pub fn transform(&self, df: &DataFrame) -> Result<SeriesTable> {
        let params = self.fitted_params()?;
        let table = check_future_dataframe(df)?;
        normalize(&table, params)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<SeriesTable> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Map scaled predictions back to the original value range
    pub fn inverse_transform_values(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        self.fitted_params()?.denormalize_values(scaled)
    }

    /// Build training and validation datasets from one raw table.
    ///
    /// The table is split window-aware per [`DataConfig`], scale parameters
    /// are estimated on the training range only and then applied to both
    /// ranges. When the validation range is too short for a single window,
    /// the validation dataset is empty.
    pub fn prepare_datasets(
        &mut self,
        df: &DataFrame,
        tabularizer: &Tabularizer,
    ) -> Result<(TimeDataset, TimeDataset)> {
        let start = Instant::now();
        self.config.validate()?;

        let table = check_dataframe(df)?;
        let (train, valid) = split_df(
            &table,
            tabularizer.n_lags(),
            tabularizer.n_forecasts(),
            &self.config,
        )?;

        let params = self.estimator().estimate(&train)?;
        let train_set = TimeDataset::new(&normalize(&train, &params)?, tabularizer)?;
        let valid_set = if valid.len() >= tabularizer.n_lags() + tabularizer.n_forecasts() {
            TimeDataset::new(&normalize(&valid, &params)?, tabularizer)?
        } else {
            debug!(rows = valid.len(), "Validation range holds no complete window");
            TimeDataset::empty(tabularizer)
        };

        self.params = Some(params);
        let elapsed = start.elapsed().as_secs_f64();
        self.fit_time = Some(elapsed);
        info!(
            train_samples = train_set.inputs().n_samples(),
            valid_samples = valid_set.inputs().n_samples(),
            fit_time = elapsed,
            "Prepared training and validation datasets"
        );

        Ok((train_set, valid_set))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let preprocessor: Self = serde_json::from_str(json)?;
        preprocessor.config.validate()?;
        if let Some(params) = &preprocessor.params {
            params.validate()?;
        }
        Ok(preprocessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::WindowDataset;

    fn create_test_dataframe(n: usize) -> DataFrame {
        let ds: Vec<String> = (0..n)
            .map(|i| {
                (chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + chrono::Duration::days(i as i64))
                    .format("%Y-%m-%d")
                    .to_string()
            })
            .collect();
        let y: Vec<f64> = (0..n).map(|i| 10.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        df!("ds" => ds, "y" => y).unwrap()
    }

    #[test]
    fn test_transform_before_fit() {
        let preprocessor = TimeSeriesPreprocessor::new();
        assert!(!preprocessor.is_fitted());
        assert!(matches!(
            preprocessor.transform(&create_test_dataframe(5)),
            Err(DataPrepError::NotFitted)
        ));
        assert!(matches!(
            preprocessor.inverse_transform_values(&[0.0]),
            Err(DataPrepError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_transform() {
        let df = create_test_dataframe(20);
        let mut preprocessor = TimeSeriesPreprocessor::new();
        let table = preprocessor.fit_transform(&df).unwrap();

        assert!(preprocessor.is_fitted());
        assert!(preprocessor.fit_time().is_some());

        let scaled = table.scaled_values().unwrap();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;
        assert!(mean.abs() < 1e-10);

        let restored = preprocessor.inverse_transform_values(&scaled).unwrap();
        for (r, o) in restored.iter().zip(table.values().unwrap().iter()) {
            assert!((r - o).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_reuses_fitted_params() {
        let mut preprocessor = TimeSeriesPreprocessor::new();
        preprocessor.fit(&create_test_dataframe(10)).unwrap();

        let later = df!("ds" => &["2022-01-11", "2022-01-12"]).unwrap();
        let table = preprocessor.transform(&later).unwrap();
        let t = table.time().unwrap();
        assert!((t[0] - 10.0 / 9.0).abs() < 1e-12);
        assert!(!table.has_values());
    }

    #[test]
    fn test_from_params() {
        let mut fitted = TimeSeriesPreprocessor::new();
        fitted.fit(&create_test_dataframe(10)).unwrap();
        let params = fitted.scale_params().unwrap().clone();

        let restored = TimeSeriesPreprocessor::from_params(
            DataConfig::default(),
            ScaleParams::from_json(&params.to_json().unwrap()).unwrap(),
        );
        let df = create_test_dataframe(10);
        assert_eq!(
            restored.transform(&df).unwrap().scaled_values().unwrap(),
            fitted.transform(&df).unwrap().scaled_values().unwrap()
        );
    }

    #[test]
    fn test_prepare_datasets() {
        let df = create_test_dataframe(30);
        let mut preprocessor =
            TimeSeriesPreprocessor::with_config(DataConfig::new().with_valid_p(0.2));
        let (train, valid) = preprocessor
            .prepare_datasets(&df, &Tabularizer::new(4, 2))
            .unwrap();

        // 30 - 4 + 1 - 2 = 25 samples, 5 held out; the 24 training rows
        // hold 24 - 4 + 1 - 2 = 19 complete windows
        assert_eq!(train.len(), 19);
        assert_eq!(valid.len(), 5);

        // parameters come from the 24 training rows only
        let params = preprocessor.scale_params().unwrap();
        assert_eq!(params.time_span(), chrono::Duration::days(23));
    }

    #[test]
    fn test_prepare_datasets_without_validation() {
        let df = create_test_dataframe(12);
        let mut preprocessor =
            TimeSeriesPreprocessor::with_config(DataConfig::new().with_valid_p(0.0));
        let (train, valid) = preprocessor
            .prepare_datasets(&df, &Tabularizer::new(3, 1))
            .unwrap();

        assert_eq!(train.len(), 9);
        assert!(valid.is_empty());
        assert_eq!(valid.inputs().time.dim(), (0, 1));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut preprocessor = TimeSeriesPreprocessor::new();
        preprocessor.fit(&create_test_dataframe(8)).unwrap();

        let restored = TimeSeriesPreprocessor::from_json(&preprocessor.to_json().unwrap()).unwrap();
        assert_eq!(restored.scale_params(), preprocessor.scale_params());
        assert_eq!(restored.config(), preprocessor.config());
    }
}
