//! Error types for time series preparation

use thiserror::Error;

/// Result type alias for data preparation operations
pub type Result<T> = std::result::Result<T, DataPrepError>;

/// Errors raised while validating, scaling, splitting or tabularizing a series
#[derive(Error, Debug)]
pub enum DataPrepError {
    /// Required columns are absent or the table is empty
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Missing or non-finite values, bad timestamps, too few rows
    #[error("Data error: {0}")]
    DataError(String),

    /// Incompatible window, split or seasonality configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Scale parameters not fitted")]
    NotFitted,

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for DataPrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        DataPrepError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DataPrepError {
    fn from(err: serde_json::Error) -> Self {
        DataPrepError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DataPrepError {
    fn from(err: ndarray::ShapeError) -> Self {
        DataPrepError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataPrepError::DataError("Found infinity in column y".to_string());
        assert_eq!(err.to_string(), "Data error: Found infinity in column y");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err: DataPrepError = json_err.into();
        assert!(matches!(err, DataPrepError::SerializationError(_)));
    }

    #[test]
    fn test_error_from_shape() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let err: DataPrepError = shape_err.into();
        assert!(matches!(err, DataPrepError::ShapeError { .. }));
    }
}
