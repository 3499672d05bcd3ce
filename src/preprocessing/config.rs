//! Preprocessing configuration

use crate::error::{DataPrepError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for scaling and train/validation splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Whether to z-normalize `y`; when false the shift is 0 and the scale 1
    pub normalize_y: bool,

    /// Fraction of window positions held out for validation
    pub valid_p: f64,

    /// Whether the last training targets may be reused as the first
    /// validation inputs
    pub inputs_overbleed: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            normalize_y: true,
            valid_p: 0.2,
            inputs_overbleed: true,
        }
    }
}

impl DataConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable or disable value normalization
    pub fn with_normalize_y(mut self, normalize_y: bool) -> Self {
        self.normalize_y = normalize_y;
        self
    }

    /// Builder method to set the validation fraction
    pub fn with_valid_p(mut self, valid_p: f64) -> Self {
        self.valid_p = valid_p;
        self
    }

    /// Builder method to allow or forbid input overbleed
    pub fn with_inputs_overbleed(mut self, inputs_overbleed: bool) -> Self {
        self.inputs_overbleed = inputs_overbleed;
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.valid_p) {
            return Err(DataPrepError::ConfigError(format!(
                "valid_p must be in [0, 1), got {}",
                self.valid_p
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DataConfig::default();
        assert!(config.normalize_y);
        assert!(config.inputs_overbleed);
        assert_eq!(config.valid_p, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = DataConfig::new()
            .with_normalize_y(false)
            .with_valid_p(0.1)
            .with_inputs_overbleed(false);

        assert!(!config.normalize_y);
        assert!(!config.inputs_overbleed);
        assert_eq!(config.valid_p, 0.1);
    }

    #[test]
    fn test_rejects_out_of_range_valid_p() {
        assert!(DataConfig::new().with_valid_p(1.0).validate().is_err());
        assert!(DataConfig::new().with_valid_p(-0.1).validate().is_err());
        assert!(DataConfig::new().with_valid_p(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let config = DataConfig::new().with_valid_p(0.25);
        let json = serde_json::to_string(&config).unwrap();
        let restored: DataConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
