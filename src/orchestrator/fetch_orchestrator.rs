//! Fills cache gaps from a remote [`DailySource`] and returns the merged result.

use crate::gap_resolver::resolve_gaps;
use crate::orchestrator::error::FetchError;
use crate::orchestrator::request_range::RequestRange;
use crate::remote::daily_source::DailySource;
use crate::store::error::StoreError;
use crate::store::observation_store::ObservationStore;
use crate::types::daily_dataset::DailyDataset;
use crate::types::date_block::DateBlock;
use crate::types::request_log::RequestStatus;
use chrono::Local;
use log::{debug, info};

/// Serves daily data from the store, fetching only what the store cannot answer.
///
/// Stations, blocks and pages are processed one at a time. The first failed
/// remote call aborts the whole fetch; blocks completed before it stay cached
/// and logged.
pub struct FetchOrchestrator<S> {
    store: ObservationStore,
    source: S,
}

impl<S: DailySource> FetchOrchestrator<S> {
    pub fn new(store: ObservationStore, source: S) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Daily data for every station in `start_year..=end_year`, or up to today
    /// when `end_year` is `None`.
    pub async fn fetch_daily_data(
        &self,
        station_ids: &[String],
        start_year: i32,
        end_year: Option<i32>,
    ) -> Result<DailyDataset, FetchError> {
        let today = Local::now().date_naive();
        let range = RequestRange::for_years(start_year, end_year, today)?;
        self.fetch_range(station_ids, range).await
    }

    /// Daily data for every station in `range`, concatenated in station order.
    pub async fn fetch_range(
        &self,
        station_ids: &[String],
        range: RequestRange,
    ) -> Result<DailyDataset, FetchError> {
        let mut dataset = DailyDataset::default();
        for station_id in station_ids {
            dataset.extend(self.fetch_station(station_id, range).await?);
        }
        Ok(dataset)
    }

    async fn fetch_station(
        &self,
        station_id: &str,
        range: RequestRange,
    ) -> Result<DailyDataset, FetchError> {
        let gaps = self.station_gaps(station_id, range).await?;
        for block in gaps {
            self.fetch_block(station_id, block).await?;
        }

        let id = station_id.to_string();
        let observations = self
            .with_store(move |store| store.get_daily_observations(&id, range.start, range.end))
            .await?;
        Ok(DailyDataset::new(observations))
    }

    async fn station_gaps(
        &self,
        station_id: &str,
        range: RequestRange,
    ) -> Result<Vec<DateBlock>, FetchError> {
        let id = station_id.to_string();
        let (cached, request_log) = self
            .with_store(move |store| {
                let cached = store.get_existing_dates(&id, range.start, range.end)?;
                let request_log = store.get_request_log(&id)?;
                Ok((cached, request_log))
            })
            .await?;

        let gaps = resolve_gaps(range.start, range.end, &cached, &request_log);
        let total_days = range.num_days();
        if gaps.is_empty() {
            info!("[{}] 100% cache hit ({} days)", station_id, total_days);
        } else {
            info!(
                "[{}] Cache match: {}/{} days found. Fetching {} gaps.",
                station_id,
                cached.len(),
                total_days,
                gaps.len()
            );
        }
        Ok(gaps)
    }

    /// Pages through one block, then saves the rows and logs the outcome.
    async fn fetch_block(&self, station_id: &str, block: DateBlock) -> Result<(), FetchError> {
        let mut observations = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .source
                .fetch_daily_page(station_id, block, offset)
                .await?;
            let returned = page.number_returned;
            observations.extend(page.observations);
            if returned == 0 {
                break;
            }
            offset += returned;
            if offset >= page.number_matched {
                break;
            }
        }

        let status = if observations.is_empty() {
            RequestStatus::Empty
        } else {
            RequestStatus::Success
        };
        info!(
            "[{}] {}: {} records ({})",
            station_id,
            block,
            observations.len(),
            status
        );

        let id = station_id.to_string();
        self.with_store(move |store| {
            if !observations.is_empty() {
                let written = store.save_daily_observations(&observations)?;
                debug!("[{}] Saved {} rows", id, written);
            }
            store.log_request(&id, block.start, block.end, status)
        })
        .await
    }

    /// Runs a store operation on the blocking thread pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnOnce(&ObservationStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || op(&store)).await?;
        Ok(result?)
    }
}
