//! Daily observations and the fixed-point encoding used to store their measurements.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One day of climate data for one station.
///
/// Every measurement is optional: a station that did not record a value on a
/// given day yields `None`, never `0.0`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyObservation {
    pub station_id: String,
    pub date: NaiveDate,
    /// Mean temperature in °C.
    pub temp_mean: Option<f64>,
    /// Minimum temperature in °C.
    pub temp_min: Option<f64>,
    /// Maximum temperature in °C.
    pub temp_max: Option<f64>,
    /// Total precipitation in mm.
    pub precip: Option<f64>,
}

impl DailyObservation {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

/// Converts a measurement to the stored fixed-point form, `round(value * 10)`.
///
/// Ties round to even (`f64::round_ties_even`), matching caches written by
/// earlier tooling: `23.45 * 10.0` is exactly `234.5` and scales to `234`,
/// while `28.55` (`285.5`) scales to `286`. Non-finite values are treated as
/// absent.
pub fn scale_measurement(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite())
        .map(|v| (v * 10.0).round_ties_even() as i64)
}

/// Inverse of [`scale_measurement`].
pub fn unscale_measurement(scaled: Option<i64>) -> Option<f64> {
    scaled.map(|s| s as f64 / 10.0)
}
