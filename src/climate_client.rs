//! The main entry point: a cached client for daily climate data.

use crate::config::ClientConfig;
use crate::error::ClimateCacheError;
use crate::orchestrator::fetch_orchestrator::FetchOrchestrator;
use crate::remote::msc_client::MscClient;
use crate::store::observation_store::{ObservationStore, StoreConfig};
use crate::types::daily_dataset::DailyDataset;
use crate::types::station::{LatLon, Station, StationMatch};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use polars::prelude::LazyFrame;
use std::path::PathBuf;

const DEFAULT_SEARCH_RADIUS_KM: f64 = 100.0;

/// Daily climate data from the MSC GeoMet API, cached in a local SQLite file.
///
/// Every request first consults the cache; only date ranges that were never
/// fetched before go to the network. Ranges the API had no data for are
/// remembered too, so they are not asked for again.
///
/// # Examples
///
/// ```no_run
/// # use climate_cache::{ClimateClient, ClimateCacheError, LatLon};
/// # #[tokio::main]
/// # async fn main() -> Result<(), ClimateCacheError> {
/// let client = ClimateClient::new().await?;
///
/// let stations = client
///     .find_stations()
///     .location(LatLon(45.4215, -75.6972))
///     .radius_km(25.0)
///     .call()
///     .await?;
///
/// let ids: Vec<String> = stations.iter().map(|m| m.station.id.clone()).collect();
/// let data = client
///     .daily()
///     .station_ids(&ids)
///     .start_year(2020)
///     .end_year(2021)
///     .call()
///     .await?;
/// println!("{}", data.to_frame()?);
/// # Ok(())
/// # }
/// ```
pub struct ClimateClient {
    orchestrator: FetchOrchestrator<MscClient>,
}

#[bon]
impl ClimateClient {
    /// Creates a client with explicit store and remote settings.
    pub async fn with_config(
        store_config: StoreConfig,
        client_config: ClientConfig,
    ) -> Result<Self, ClimateCacheError> {
        let remote = MscClient::new(&client_config)?;
        let store = tokio::task::spawn_blocking(move || ObservationStore::open(store_config)).await??;
        Ok(Self {
            orchestrator: FetchOrchestrator::new(store, remote),
        })
    }

    /// Creates a client caching into `cache_folder`, which is created if missing.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, ClimateCacheError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ClimateCacheError::CacheDirCreation(cache_folder.clone(), e))?;
        Self::with_config(StoreConfig::in_dir(&cache_folder), ClientConfig::default()).await
    }

    /// Creates a client using the platform cache directory
    /// (e.g. `~/.cache/climate_cache_rs` on Linux).
    pub async fn new() -> Result<Self, ClimateCacheError> {
        let cache_folder = get_cache_dir().map_err(ClimateCacheError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    pub fn store(&self) -> &ObservationStore {
        self.orchestrator.store()
    }

    /// Finds stations within `radius_km` (default 100 km) of `location`,
    /// closest first, and saves them to the store so their data can be cached.
    #[builder]
    pub async fn find_stations(
        &self,
        location: LatLon,
        radius_km: Option<f64>,
    ) -> Result<Vec<StationMatch>, ClimateCacheError> {
        let radius_km = radius_km.unwrap_or(DEFAULT_SEARCH_RADIUS_KM);
        let matches = self
            .orchestrator
            .source()
            .find_stations_near(location, radius_km)
            .await?;

        let stations: Vec<Station> = matches.iter().map(|m| m.station.clone()).collect();
        let store = self.store().clone();
        tokio::task::spawn_blocking(move || store.upsert_stations(&stations)).await??;
        Ok(matches)
    }

    /// Daily observations for `station_ids` from January 1st of `start_year`
    /// through December 31st of `end_year`, or through today when `end_year`
    /// is not set.
    ///
    /// Only stations previously returned by [`Self::find_stations`] (or
    /// otherwise saved in the store) can be cached; data for other ids is
    /// fetched and then discarded.
    #[builder]
    pub async fn daily(
        &self,
        station_ids: &[String],
        start_year: i32,
        end_year: Option<i32>,
    ) -> Result<DailyDataset, ClimateCacheError> {
        Ok(self
            .orchestrator
            .fetch_daily_data(station_ids, start_year, end_year)
            .await?)
    }

    /// Same as [`Self::daily`], returned as a polars `LazyFrame`.
    #[builder]
    pub async fn daily_frame(
        &self,
        station_ids: &[String],
        start_year: i32,
        end_year: Option<i32>,
    ) -> Result<LazyFrame, ClimateCacheError> {
        let dataset = self
            .orchestrator
            .fetch_daily_data(station_ids, start_year, end_year)
            .await?;
        Ok(dataset.lazy()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, dir: &tempfile::TempDir) -> ClimateClient {
        ClimateClient::with_config(
            StoreConfig::in_dir(dir.path()),
            ClientConfig::builder().base_url(server.uri()).build(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn found_stations_are_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/climate-stations/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [
                    {"properties": {"CLIMATE_IDENTIFIER": "6106000", "STATION_NAME": "OTTAWA CDA"},
                     "geometry": {"coordinates": [-75.72, 45.38]}}
                ]
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&server, &dir).await;

        let matches = client
            .find_stations()
            .location(LatLon(45.4215, -75.6972))
            .call()
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        let stored = client.store().get_station("6106000").unwrap().unwrap();
        assert_eq!(stored.name, "OTTAWA CDA");
    }

    #[tokio::test]
    async fn daily_frame_has_expected_columns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/climate-daily/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "numberMatched": 1,
                "numberReturned": 1,
                "features": [
                    {"properties": {"CLIMATE_IDENTIFIER": "S1", "LOCAL_DATE": "2019-07-01 00:00:00",
                        "MEAN_TEMPERATURE": 21.5, "MIN_TEMPERATURE": 15.0,
                        "MAX_TEMPERATURE": 28.0, "TOTAL_PRECIPITATION": 1.2}}
                ]
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&server, &dir).await;
        client
            .store()
            .upsert_stations(&[Station::new("S1", "One", 45.0, -75.0)])
            .unwrap();

        let frame = client
            .daily_frame()
            .station_ids(&["S1".to_string()])
            .start_year(2019)
            .end_year(2019)
            .call()
            .await
            .unwrap()
            .collect()
            .unwrap();

        assert_eq!(frame.height(), 1);
        let names: Vec<&str> = frame.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, crate::types::daily_dataset::DAILY_COLUMNS.to_vec());
    }

    #[tokio::test]
    async fn missing_cache_folder_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested").join("cache");
        let client = ClimateClient::with_cache_folder(folder.clone()).await.unwrap();
        assert!(folder.is_dir());
        assert_eq!(client.store().path(), folder.join("climate_cache.sq3"));
    }
}
