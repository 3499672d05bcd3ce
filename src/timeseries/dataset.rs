//! Indexable window datasets

use super::tabularize::{TabularInputs, Tabularizer};
use crate::error::{DataPrepError, Result};
use crate::preprocessing::SeriesTable;
use ndarray::{Array1, Array2, Array3, Axis};
use std::collections::BTreeMap;

/// Inputs of a single window position
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    /// Normalized time over the forecast horizon
    pub time: Array1<f64>,
    /// Lag window, absent when `n_lags == 0`
    pub lags: Option<Array1<f64>>,
    /// `(n_forecasts, 2 * resolution)` features per seasonality
    pub seasonalities: BTreeMap<String, Array2<f64>>,
}

/// Random access to fixed-shape training samples
pub trait WindowDataset {
    /// Number of samples
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inputs and targets of sample `index`, `None` when out of range
    fn sample_at(&self, index: usize) -> Option<(WindowSample, Array1<f64>)>;
}

/// Tabularized inputs and targets of one series
#[derive(Debug, Clone)]
pub struct TimeDataset {
    inputs: TabularInputs,
    targets: Array2<f64>,
}

impl TimeDataset {
    /// Tabularize a normalized table for training
    pub fn new(table: &SeriesTable, tabularizer: &Tabularizer) -> Result<Self> {
        let (inputs, targets) = tabularizer.tabularize(table)?;
        Ok(Self { inputs, targets })
    }

    /// Tabularize a normalized table for prediction; targets are `NaN`
    pub fn for_prediction(table: &SeriesTable, tabularizer: &Tabularizer) -> Result<Self> {
        let (inputs, targets) = tabularizer.tabularize_for_prediction(table)?;
        Ok(Self { inputs, targets })
    }

    /// Dataset with zero samples and the shapes `tabularizer` would produce
    pub fn empty(tabularizer: &Tabularizer) -> Self {
        let n_lags = tabularizer.n_lags();
        let n_forecasts = tabularizer.n_forecasts();
        let seasonalities = tabularizer
            .season_config()
            .map(|config| {
                config
                    .active_periods()
                    .map(|(name, period)| {
                        (name.clone(), Array3::zeros((0, n_forecasts, period.n_features())))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            inputs: TabularInputs {
                time: Array2::zeros((0, n_forecasts)),
                lags: (n_lags > 0).then(|| Array2::zeros((0, n_lags))),
                seasonalities,
            },
            targets: Array2::zeros((0, n_forecasts)),
        }
    }

    /// Wrap arrays produced elsewhere, checking that sample counts agree
    pub fn from_tabularized(inputs: TabularInputs, targets: Array2<f64>) -> Result<Self> {
        let n = inputs.n_samples();
        let mut leading = vec![("targets".to_string(), targets.nrows())];
        if let Some(lags) = &inputs.lags {
            leading.push(("lags".to_string(), lags.nrows()));
        }
        for (name, features) in &inputs.seasonalities {
            leading.push((format!("seasonality \"{}\"", name), features.len_of(Axis(0))));
        }

        for (name, rows) in leading {
            if rows != n {
                return Err(DataPrepError::ShapeError {
                    expected: format!("{} samples in {}", n, name),
                    actual: format!("{} samples", rows),
                });
            }
        }

        Ok(Self { inputs, targets })
    }

    pub fn inputs(&self) -> &TabularInputs {
        &self.inputs
    }

    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    pub fn into_parts(self) -> (TabularInputs, Array2<f64>) {
        (self.inputs, self.targets)
    }

    /// Samples in window order
    pub fn iter(&self) -> impl Iterator<Item = (WindowSample, Array1<f64>)> + '_ {
        (0..self.len()).filter_map(move |i| self.sample_at(i))
    }
}

impl WindowDataset for TimeDataset {
    fn len(&self) -> usize {
        self.inputs.n_samples()
    }

    fn sample_at(&self, index: usize) -> Option<(WindowSample, Array1<f64>)> {
        if index >= self.len() {
            return None;
        }

        let sample = WindowSample {
            time: self.inputs.time.row(index).to_owned(),
            lags: self.inputs.lags.as_ref().map(|l| l.row(index).to_owned()),
            seasonalities: self
                .inputs
                .seasonalities
                .iter()
                .map(|(name, f)| (name.clone(), f.index_axis(Axis(0), index).to_owned()))
                .collect(),
        };
        Some((sample, self.targets.row(index).to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{check_dataframe, normalize, ScaleEstimator};
    use crate::timeseries::SeasonConfig;
    use polars::prelude::*;

    fn dataset(n_lags: usize, n_forecasts: usize) -> TimeDataset {
        let ds: Vec<String> = (1..=12).map(|d| format!("2021-03-{:02}", d)).collect();
        let y: Vec<f64> = (0..12).map(|i| (i * 10) as f64).collect();
        let table = check_dataframe(&df!("ds" => ds, "y" => y).unwrap()).unwrap();
        let params = ScaleEstimator::new()
            .with_normalize_y(false)
            .estimate(&table)
            .unwrap();
        let tabularizer = Tabularizer::new(n_lags, n_forecasts)
            .with_season_config(SeasonConfig::new().with_weekly(2));
        TimeDataset::new(&normalize(&table, &params).unwrap(), &tabularizer).unwrap()
    }

    #[test]
    fn test_sample_at() {
        let dataset = dataset(4, 2);
        assert_eq!(dataset.len(), 7);
        assert!(!dataset.is_empty());

        let (sample, targets) = dataset.sample_at(2).unwrap();
        assert_eq!(sample.lags.unwrap().to_vec(), vec![20.0, 30.0, 40.0, 50.0]);
        assert_eq!(targets.to_vec(), vec![60.0, 70.0]);
        assert_eq!(sample.time.len(), 2);
        assert_eq!(sample.seasonalities["weekly"].dim(), (2, 4));
        assert_eq!(
            sample.seasonalities["weekly"],
            dataset.inputs().seasonalities["weekly"].index_axis(Axis(0), 2)
        );

        assert!(dataset.sample_at(7).is_none());
    }

    #[test]
    fn test_iter_visits_every_sample() {
        let dataset = dataset(0, 1);
        let samples: Vec<_> = dataset.iter().collect();
        assert_eq!(samples.len(), 12);
        assert!(samples[0].0.lags.is_none());
        assert_eq!(samples[11].1.to_vec(), vec![110.0]);
    }

    #[test]
    fn test_from_tabularized_rejects_mismatch() {
        let inputs = TabularInputs {
            time: Array2::zeros((3, 1)),
            lags: Some(Array2::zeros((3, 2))),
            seasonalities: BTreeMap::from([("weekly".to_string(), Array3::zeros((2, 1, 4)))]),
        };
        let result = TimeDataset::from_tabularized(inputs.clone(), Array2::zeros((3, 1)));
        assert!(matches!(result, Err(DataPrepError::ShapeError { .. })));

        let mut inputs = inputs;
        inputs.seasonalities.clear();
        assert!(TimeDataset::from_tabularized(inputs, Array2::zeros((3, 1))).is_ok());
    }

    #[test]
    fn test_empty_keeps_feature_shapes() {
        let tabularizer = Tabularizer::new(3, 2)
            .with_season_config(SeasonConfig::new().with_yearly(4).with_daily(0));
        let dataset = TimeDataset::empty(&tabularizer);

        assert!(dataset.is_empty());
        assert!(dataset.sample_at(0).is_none());
        assert_eq!(dataset.inputs().lags.as_ref().unwrap().dim(), (0, 3));
        assert_eq!(dataset.inputs().seasonalities["yearly"].dim(), (0, 2, 8));
        assert!(!dataset.inputs().seasonalities.contains_key("daily"));
    }
}
