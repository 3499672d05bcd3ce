//! Time series windowing
//!
//! Provides the stages that turn a normalized table into model inputs:
//! - Window-aware train/validation splitting
//! - Fourier seasonality features
//! - Sliding-window tabularization of lags, time and targets
//! - Indexable datasets over the tabularized arrays
//! - Future timestamps and synthetic date ranges for prediction and plotting

mod config;
mod dataset;
mod future;
mod seasonality;
mod split;
mod tabularize;

pub use config::{
    Period, SeasonConfig, SeasonalityBasis, SeasonalityMode, DAILY_PERIOD_DAYS,
    WEEKLY_PERIOD_DAYS, YEARLY_PERIOD_DAYS,
};
pub use dataset::{TimeDataset, WindowDataset, WindowSample};
pub use future::{
    make_future_dataframe, seasonal_components, weekly_component_dates, yearly_component_dates,
    Frequency,
};
pub use seasonality::{fourier_series, seasonal_features_from_dates};
pub use split::{split_df, HoldoutSplit};
pub use tabularize::{TabularInputs, Tabularizer};
