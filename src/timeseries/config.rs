//! Seasonality configuration

use crate::error::{DataPrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const YEARLY_PERIOD_DAYS: f64 = 365.25;
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;
pub const DAILY_PERIOD_DAYS: f64 = 1.0;

/// Basis functions used to represent a periodic seasonality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SeasonalityBasis {
    /// Alternating sin/cos harmonics
    #[default]
    Fourier,
}

impl FromStr for SeasonalityBasis {
    type Err = DataPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fourier" => Ok(SeasonalityBasis::Fourier),
            other => Err(DataPrepError::ConfigError(format!(
                "Seasonality basis \"{}\" is not implemented, only \"fourier\" is supported",
                other
            ))),
        }
    }
}

impl TryFrom<String> for SeasonalityBasis {
    type Error = DataPrepError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// How seasonal components combine with the trend downstream.
/// Does not affect feature generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    #[default]
    Additive,
    Multiplicative,
}

/// One named periodic seasonality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// Period length in days
    pub period_days: f64,
    /// Fourier order: number of sin/cos pairs. 0 disables the period.
    pub resolution: usize,
}

impl Period {
    pub fn new(period_days: f64, resolution: usize) -> Self {
        Self {
            period_days,
            resolution,
        }
    }

    /// Number of feature columns generated for this period
    pub fn n_features(&self) -> usize {
        2 * self.resolution
    }
}

/// Named seasonalities and their shared basis and mode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub basis: SeasonalityBasis,
    pub mode: SeasonalityMode,
    pub periods: BTreeMap<String, Period>,
}

impl SeasonConfig {
    /// Empty Fourier configuration in additive mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty configuration with a basis given by name
    pub fn from_basis(name: &str) -> Result<Self> {
        Ok(Self {
            basis: name.parse()?,
            ..Self::default()
        })
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add or replace a named period
    pub fn with_period(mut self, name: impl Into<String>, period_days: f64, resolution: usize) -> Self {
        self.periods
            .insert(name.into(), Period::new(period_days, resolution));
        self
    }

    pub fn with_yearly(self, resolution: usize) -> Self {
        self.with_period("yearly", YEARLY_PERIOD_DAYS, resolution)
    }

    pub fn with_weekly(self, resolution: usize) -> Self {
        self.with_period("weekly", WEEKLY_PERIOD_DAYS, resolution)
    }

    pub fn with_daily(self, resolution: usize) -> Self {
        self.with_period("daily", DAILY_PERIOD_DAYS, resolution)
    }

    /// Periods that produce features (resolution > 0)
    pub fn active_periods(&self) -> impl Iterator<Item = (&String, &Period)> {
        self.periods.iter().filter(|(_, p)| p.resolution > 0)
    }

    /// Check that every period length is finite and positive
    pub fn validate(&self) -> Result<()> {
        for (name, period) in &self.periods {
            if !period.period_days.is_finite() || period.period_days <= 0.0 {
                return Err(DataPrepError::ConfigError(format!(
                    "Seasonality \"{}\" has invalid period {} days",
                    name, period.period_days
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let config = SeasonConfig::new()
            .with_yearly(6)
            .with_weekly(3)
            .with_daily(0)
            .with_mode(SeasonalityMode::Multiplicative);

        assert_eq!(config.periods.len(), 3);
        assert_eq!(config.periods["weekly"], Period::new(7.0, 3));
        assert_eq!(config.mode, SeasonalityMode::Multiplicative);

        let active: Vec<&String> = config.active_periods().map(|(name, _)| name).collect();
        assert_eq!(active, vec!["weekly", "yearly"]);
    }

    #[test]
    fn test_basis_parsing() {
        assert_eq!("Fourier".parse::<SeasonalityBasis>().unwrap(), SeasonalityBasis::Fourier);
        assert!(matches!(
            SeasonConfig::from_basis("wavelet"),
            Err(DataPrepError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_period_length() {
        assert!(SeasonConfig::new().with_weekly(3).validate().is_ok());
        assert!(SeasonConfig::new().with_period("broken", 0.0, 2).validate().is_err());
        assert!(SeasonConfig::new().with_period("broken", f64::NAN, 2).validate().is_err());
    }

    #[test]
    fn test_serde_rejects_unknown_basis() {
        let json = r#"{"basis":"spline","mode":"additive","periods":{}}"#;
        assert!(serde_json::from_str::<SeasonConfig>(json).is_err());

        let json = r#"{"basis":"fourier","mode":"multiplicative","periods":{"weekly":{"period_days":7.0,"resolution":3}}}"#;
        let config: SeasonConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, SeasonalityMode::Multiplicative);
        assert_eq!(config.periods["weekly"].n_features(), 6);
    }
}
