//! Contains `DailyDataset`, the merged result of a cached daily fetch.

use crate::types::observation::DailyObservation;
use chrono::NaiveDate;
use polars::prelude::{DataFrame, IntoLazy, LazyFrame, PolarsResult};

/// Column names of the frame produced by [`DailyDataset::to_frame`], in order.
pub const DAILY_COLUMNS: [&str; 9] = [
    "station_id",
    "date",
    "year",
    "month",
    "day",
    "temp_mean",
    "temp_min",
    "temp_max",
    "precip",
];

/// Daily observations for one or more stations, as read back from the cache.
///
/// Rows are grouped per station in request order and sorted by date within a
/// station. An empty dataset is a valid result meaning "no data for this range",
/// as opposed to a failed fetch, which is an `Err`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyDataset {
    observations: Vec<DailyObservation>,
}

impl DailyDataset {
    pub fn new(observations: Vec<DailyObservation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[DailyObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Appends another station's rows, keeping the per-station grouping.
    pub fn extend(&mut self, other: DailyDataset) {
        self.observations.extend(other.observations);
    }

    pub fn for_station<'a>(&'a self, station_id: &'a str) -> impl Iterator<Item = &'a DailyObservation> {
        self.observations
            .iter()
            .filter(move |obs| obs.station_id == station_id)
    }

    /// Rows with a date inside `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> DailyDataset {
        DailyDataset::new(
            self.observations
                .iter()
                .filter(|obs| start <= obs.date && obs.date <= end)
                .cloned()
                .collect(),
        )
    }

    /// Builds a polars `DataFrame` with the [`DAILY_COLUMNS`] schema.
    ///
    /// Missing measurements become nulls. Dates are `YYYY-MM-DD` strings with
    /// separate integer `year`, `month` and `day` columns for grouping.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let obs = &self.observations;
        polars::df!(
            DAILY_COLUMNS[0] => obs.iter().map(|o| o.station_id.clone()).collect::<Vec<_>>(),
            DAILY_COLUMNS[1] => obs.iter().map(|o| o.date.format("%Y-%m-%d").to_string()).collect::<Vec<_>>(),
            DAILY_COLUMNS[2] => obs.iter().map(|o| i64::from(o.year())).collect::<Vec<_>>(),
            DAILY_COLUMNS[3] => obs.iter().map(|o| i64::from(o.month())).collect::<Vec<_>>(),
            DAILY_COLUMNS[4] => obs.iter().map(|o| i64::from(o.day())).collect::<Vec<_>>(),
            DAILY_COLUMNS[5] => obs.iter().map(|o| o.temp_mean).collect::<Vec<_>>(),
            DAILY_COLUMNS[6] => obs.iter().map(|o| o.temp_min).collect::<Vec<_>>(),
            DAILY_COLUMNS[7] => obs.iter().map(|o| o.temp_max).collect::<Vec<_>>(),
            DAILY_COLUMNS[8] => obs.iter().map(|o| o.precip).collect::<Vec<_>>(),
        )
    }

    pub fn lazy(&self) -> PolarsResult<LazyFrame> {
        Ok(self.to_frame()?.lazy())
    }
}

impl FromIterator<DailyObservation> for DailyDataset {
    fn from_iter<T: IntoIterator<Item = DailyObservation>>(iter: T) -> Self {
        DailyDataset::new(iter.into_iter().collect())
    }
}
