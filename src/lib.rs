//! Forecast data preparation
//!
//! This crate turns raw `(ds, y)` observations into fixed-shape supervised
//! learning windows for a forecasting model:
//! - Validation and canonical ordering of raw series tables
//! - Time and value normalization with persisted scale parameters
//! - Window-aware train/validation splitting
//! - Fourier seasonality features
//! - Sliding-window tabularization of lags, time and multi-step targets
//!
//! # Modules
//!
//! - [`preprocessing`] - Validation, scale estimation, normalization
//! - [`timeseries`] - Splitting, seasonality, tabularization, datasets
//!
//! # Example
//!
//! ```no_run
//! use forecast_dataprep::prelude::*;
//! use polars::prelude::*;
//!
//! # fn main() -> forecast_dataprep::Result<()> {
//! let df = df!(
//!     "ds" => &["2020-01-01", "2020-01-02", "2020-01-03", "2020-01-04", "2020-01-05"],
//!     "y" => &[1.0, 3.0, 2.0, 4.0, 3.0],
//! )?;
//!
//! let tabularizer = Tabularizer::new(2, 1)
//!     .with_season_config(SeasonConfig::new().with_weekly(3));
//! let mut preprocessor = TimeSeriesPreprocessor::with_config(DataConfig::new().with_valid_p(0.0));
//! let (train, _valid) = preprocessor.prepare_datasets(&df, &tabularizer)?;
//!
//! for (sample, targets) in train.iter() {
//!     println!("{:?} -> {:?}", sample.lags, targets);
//! }
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod preprocessing;
pub mod timeseries;

pub use error::{DataPrepError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{DataPrepError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        check_dataframe, check_future_dataframe, normalize, DataConfig, ScaleEstimator,
        ScaleParams, SeriesTable, TimeSeriesPreprocessor,
    };

    // Time series
    pub use crate::timeseries::{
        make_future_dataframe, split_df, Frequency, SeasonConfig, SeasonalityMode, TabularInputs,
        Tabularizer, TimeDataset, WindowDataset, WindowSample,
    };
}
