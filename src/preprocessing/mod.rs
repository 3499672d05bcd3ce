//! Series table preprocessing
//!
//! Provides the stages that run before windowing:
//! - Structural validation and canonical ordering of raw tables
//! - Scale parameter estimation (time range, value mean/std)
//! - Normalization with fixed parameters and its inverse
//! - A fitted pipeline that keeps training-time parameters for prediction

mod checker;
mod config;
mod pipeline;
mod scaler;
pub mod table;

pub use checker::{check_dataframe, check_future_dataframe};
pub use config::DataConfig;
pub use pipeline::TimeSeriesPreprocessor;
pub use scaler::{normalize, ScaleEstimator, ScaleParams, ValueScale};
pub use table::{SeriesTable, DS_COLUMN, T_COLUMN, Y_COLUMN, Y_SCALED_COLUMN};
