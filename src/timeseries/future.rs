//! Future timestamps and synthetic date ranges

use super::config::SeasonConfig;
use super::seasonality::seasonal_features_from_dates;
use crate::error::{DataPrepError, Result};
use crate::preprocessing::table::{datetime_to_micros, micros_to_datetime};
use crate::preprocessing::SeriesTable;
use chrono::{Duration, Months, NaiveDateTime};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 2017-01-01, a Sunday, as days since the Unix epoch
const COMPONENT_ORIGIN_DAYS: i64 = 17_167;
const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Spacing between consecutive future timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "unit", content = "every")]
pub enum Frequency {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Weeks(u32),
    /// Calendar months, clamped to the last day of shorter months
    Months(u32),
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Days(1)
    }
}

impl Frequency {
    fn count(&self) -> u32 {
        match *self {
            Frequency::Seconds(n)
            | Frequency::Minutes(n)
            | Frequency::Hours(n)
            | Frequency::Days(n)
            | Frequency::Weeks(n)
            | Frequency::Months(n) => n,
        }
    }

    /// `from` advanced by `k` steps
    fn advance(&self, from: NaiveDateTime, k: u32) -> Option<NaiveDateTime> {
        let steps = i64::from(self.count()) * i64::from(k);
        let delta = match *self {
            Frequency::Seconds(_) => Duration::try_seconds(steps),
            Frequency::Minutes(_) => Duration::try_minutes(steps),
            Frequency::Hours(_) => Duration::try_hours(steps),
            Frequency::Days(_) => Duration::try_days(steps),
            Frequency::Weeks(_) => Duration::try_weeks(steps),
            Frequency::Months(n) => {
                return from.checked_add_months(Months::new(n.checked_mul(k)?));
            }
        };
        from.checked_add_signed(delta?)
    }
}

/// Table of `periods` timestamps following the last row of `table`.
///
/// The result carries no `y` column and is meant for
/// [`check_future_dataframe`](crate::preprocessing::check_future_dataframe)
/// style prediction inputs.
///
/// # Errors
///
/// [`DataPrepError::ConfigError`] when `periods` is 0 or the frequency step is 0.
pub fn make_future_dataframe(
    table: &SeriesTable,
    periods: usize,
    freq: Frequency,
) -> Result<SeriesTable> {
    if periods == 0 {
        return Err(DataPrepError::ConfigError(
            "periods must be at least 1".to_string(),
        ));
    }
    if freq.count() == 0 {
        return Err(DataPrepError::ConfigError(format!(
            "Frequency step must be positive, got {:?}",
            freq
        )));
    }

    let last = table.last_timestamp()?;
    let ds = (1..=periods)
        .map(|k| {
            u32::try_from(k)
                .ok()
                .and_then(|k| freq.advance(last, k))
                .map(|dt| datetime_to_micros(&dt))
                .ok_or_else(|| {
                    DataPrepError::DataError(format!(
                        "Future timestamp {} after {} is out of range",
                        k, last
                    ))
                })
        })
        .collect::<Result<Vec<i64>>>()?;

    debug!(periods, last = %last, ?freq, "Extended series into the future");
    SeriesTable::from_micros(ds, None)
}

fn component_dates(offset_days: i64, n_days: i64) -> Result<Vec<NaiveDateTime>> {
    (0..n_days)
        .map(|d| {
            let micros = COMPONENT_ORIGIN_DAYS
                .checked_add(offset_days)
                .and_then(|days| days.checked_add(d))
                .and_then(|days| days.checked_mul(MICROS_PER_DAY))
                .ok_or_else(|| {
                    DataPrepError::DataError(format!(
                        "Component date offset of {} days is out of range",
                        offset_days
                    ))
                })?;
            micros_to_datetime(micros)
        })
        .collect()
}

/// One week of daily dates starting Sunday 2017-01-01, shifted by `weekly_start` days
pub fn weekly_component_dates(weekly_start: i64) -> Result<Vec<NaiveDateTime>> {
    component_dates(weekly_start, 7)
}

/// 365 daily dates starting 2017-01-01, shifted by `yearly_start` days
pub fn yearly_component_dates(yearly_start: i64) -> Result<Vec<NaiveDateTime>> {
    component_dates(yearly_start, 365)
}

/// Seasonality features over arbitrary dates, e.g. for plotting a single
/// period of each component
pub fn seasonal_components(
    dates: &[NaiveDateTime],
    config: &SeasonConfig,
) -> Result<BTreeMap<String, Array2<f64>>> {
    seasonal_features_from_dates(dates, config)
}
