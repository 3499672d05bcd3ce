//! Window-aware train/validation splitting

use crate::error::{DataPrepError, Result};
use crate::preprocessing::{DataConfig, SeriesTable};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Row ranges of a holdout split over a table of `len` rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldoutSplit {
    /// Number of window positions in the full table
    pub n_samples: usize,
    /// Number of window positions assigned to training
    pub n_train: usize,
    /// Exclusive end row of the training range
    pub train_end: usize,
    /// First row of the validation range
    pub valid_start: usize,
    /// Table length
    pub len: usize,
}

impl HoldoutSplit {
    /// Compute split boundaries.
    ///
    /// `n_samples = len - n_lags + 1 - n_forecasts`,
    /// `n_train = n_samples - floor(n_samples * valid_p)`. Training rows are
    /// `[0, n_train + n_lags)`. Validation starts at `n_train` when
    /// `inputs_overbleed` is set, at `n_train + n_lags` otherwise.
    pub fn compute(
        len: usize,
        n_lags: usize,
        n_forecasts: usize,
        valid_p: f64,
        inputs_overbleed: bool,
    ) -> Result<Self> {
        if n_forecasts < 1 {
            return Err(DataPrepError::ConfigError(
                "n_forecasts must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&valid_p) {
            return Err(DataPrepError::ConfigError(format!(
                "valid_p must be in [0, 1), got {}",
                valid_p
            )));
        }

        let n_samples = (len + 1).checked_sub(n_lags + n_forecasts).unwrap_or(0);
        if n_samples < 1 {
            return Err(DataPrepError::ConfigError(format!(
                "Cannot split {} rows with n_lags={} and n_forecasts={}: no complete window",
                len, n_lags, n_forecasts
            )));
        }

        let n_train = n_samples - (n_samples as f64 * valid_p).floor() as usize;
        let train_end = n_train + n_lags;
        let valid_start = if inputs_overbleed { n_train } else { train_end };

        Ok(Self {
            n_samples,
            n_train,
            train_end,
            valid_start,
            len,
        })
    }

    pub fn train_range(&self) -> Range<usize> {
        0..self.train_end
    }

    pub fn valid_range(&self) -> Range<usize> {
        self.valid_start..self.len
    }
}

/// Split a validated table into independent training and validation tables.
///
/// Both tables are re-indexed from zero. Tables are immutable and every
/// later stage builds a new one, so neither half can observe changes made
/// through the other.
pub fn split_df(
    table: &SeriesTable,
    n_lags: usize,
    n_forecasts: usize,
    config: &DataConfig,
) -> Result<(SeriesTable, SeriesTable)> {
    let split = HoldoutSplit::compute(
        table.len(),
        n_lags,
        n_forecasts,
        config.valid_p,
        config.inputs_overbleed,
    )?;

    debug!(
        n_train = split.n_train,
        n_samples = split.n_samples,
        valid_start = split.valid_start,
        "Split series table"
    );

    let train = split.train_range();
    let valid = split.valid_range();
    Ok((
        table.slice(train.start, train.len()),
        table.slice(valid.start, valid.len()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::check_dataframe;
    use polars::prelude::*;

    fn table(n: usize) -> SeriesTable {
        let ds: Vec<String> = (0..n)
            .map(|i| {
                (chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(i as i64))
                    .format("%Y-%m-%d")
                    .to_string()
            })
            .collect();
        let y: Vec<f64> = (0..n).map(|i| i as f64).collect();
        check_dataframe(&df!("ds" => ds, "y" => y).unwrap()).unwrap()
    }

    #[test]
    fn test_split_with_overbleed() {
        let split = HoldoutSplit::compute(20, 3, 1, 0.2, true).unwrap();

        // 20 - 3 + 1 - 1 = 17 samples, floor(17 * 0.2) = 3 held out
        assert_eq!(split.n_samples, 17);
        assert_eq!(split.n_train, 14);
        assert_eq!(split.train_range(), 0..17);
        assert_eq!(split.valid_start, split.n_train);
    }

    #[test]
    fn test_split_without_overbleed() {
        let split = HoldoutSplit::compute(20, 3, 1, 0.2, false).unwrap();
        assert_eq!(split.valid_start, split.n_train + 3);
        assert_eq!(split.valid_range(), 17..20);
    }

    #[test]
    fn test_split_lengths() {
        let table = table(30);
        for overbleed in [true, false] {
            let config = DataConfig::new().with_inputs_overbleed(overbleed);
            let (train, valid) = split_df(&table, 5, 2, &config).unwrap();

            let extra = if overbleed { 5 } else { 0 };
            assert_eq!(train.len() + valid.len(), table.len() + extra);
        }
    }

    #[test]
    fn test_split_tables_reindexed() {
        let table = table(10);
        let config = DataConfig::new().with_valid_p(0.5);
        let (train, valid) = split_df(&table, 2, 1, &config).unwrap();

        // 8 samples, 4 held out, n_train = 4
        assert_eq!(train.values().unwrap(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(valid.values().unwrap(), vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(valid.frame().height(), 6);
    }

    #[test]
    fn test_split_no_validation() {
        let config = DataConfig::new().with_valid_p(0.0);
        let (train, valid) = split_df(&table(10), 2, 1, &config).unwrap();
        assert_eq!(train.len(), 10);
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn test_split_too_short() {
        let result = HoldoutSplit::compute(6, 5, 5, 0.2, true);
        assert!(matches!(result, Err(DataPrepError::ConfigError(_))));
    }
}
