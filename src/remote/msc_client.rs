//! HTTP client for the MSC GeoMet OGC API (`climate-stations` and `climate-daily`).

use crate::config::ClientConfig;
use crate::remote::daily_source::{DailyPage, DailySource};
use crate::remote::error::RemoteError;
use crate::remote::payload::{DailyProperties, FeatureCollection, StationProperties};
use crate::types::date_block::DateBlock;
use crate::types::station::{LatLon, StationMatch};
use haversine::{distance, Location as HaversineLocation, Units};
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

const COLLECTION_STATIONS: &str = "climate-stations";
const COLLECTION_DAILY: &str = "climate-daily";
/// Kilometers per degree of latitude, used to size the search bounding box.
const KM_PER_DEGREE: f64 = 111.0;

pub struct MscClient {
    client: Client,
    base_url: String,
    page_limit: usize,
    station_search_limit: usize,
}

impl MscClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(RemoteError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            station_search_limit: config.station_search_limit,
        })
    }

    fn items_url(&self, collection: &str) -> String {
        format!("{}/collections/{}/items", self.base_url, collection)
    }

    async fn get_collection<P: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<FeatureCollection<P>, RemoteError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RemoteError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(RemoteError::from_request(url, e));
            }
        };

        response
            .json::<FeatureCollection<P>>()
            .await
            .map_err(|e| RemoteError::Decode(url.to_string(), e))
    }

    /// Finds stations within `radius_km` of `location`, nearest first.
    ///
    /// Queries a bounding box around the point, then drops stations whose
    /// haversine distance exceeds the radius.
    pub async fn find_stations_near(
        &self,
        location: LatLon,
        radius_km: f64,
    ) -> Result<Vec<StationMatch>, RemoteError> {
        let LatLon(lat, lon) = location;
        let lat_buf = radius_km / KM_PER_DEGREE;
        let lon_buf = radius_km / (KM_PER_DEGREE * lat.to_radians().cos());
        let bbox = format!(
            "{},{},{},{}",
            (lon - lon_buf).max(-180.0),
            (lat - lat_buf).max(-90.0),
            (lon + lon_buf).min(180.0),
            (lat + lat_buf).min(90.0)
        );

        info!("Searching for stations near {}, {}...", lat, lon);
        let url = self.items_url(COLLECTION_STATIONS);
        let query = [
            ("f", "json".to_string()),
            ("bbox", bbox),
            ("limit", self.station_search_limit.to_string()),
        ];
        let collection: FeatureCollection<StationProperties> =
            self.get_collection(&url, &query).await?;

        let mut matches: Vec<StationMatch> = collection
            .features
            .into_iter()
            .filter_map(|feature| feature.into_station())
            .map(|station| {
                let distance_km = distance(
                    HaversineLocation {
                        latitude: lat,
                        longitude: lon,
                    },
                    HaversineLocation {
                        latitude: station.location.latitude,
                        longitude: station.location.longitude,
                    },
                    Units::Kilometers,
                );
                StationMatch {
                    station,
                    distance_km,
                }
            })
            .filter(|m| m.distance_km <= radius_km)
            .collect();
        matches.sort_by_key(|m| OrderedFloat(m.distance_km));

        info!("Found {} stations within {} km", matches.len(), radius_km);
        Ok(matches)
    }
}

impl DailySource for MscClient {
    async fn fetch_daily_page(
        &self,
        station_id: &str,
        block: DateBlock,
        offset: usize,
    ) -> Result<DailyPage, RemoteError> {
        let url = self.items_url(COLLECTION_DAILY);
        let query = [
            ("f", "json".to_string()),
            ("CLIMATE_IDENTIFIER", station_id.to_string()),
            ("datetime", block.as_interval()),
            ("limit", self.page_limit.to_string()),
            ("offset", offset.to_string()),
        ];
        debug!("[{}] Requesting {} at offset {}", station_id, block, offset);
        let collection: FeatureCollection<DailyProperties> =
            self.get_collection(&url, &query).await?;

        Ok(DailyPage {
            number_returned: collection.number_returned,
            number_matched: collection.number_matched,
            observations: collection
                .features
                .into_iter()
                .filter_map(|feature| feature.properties.into_observation())
                .collect(),
        })
    }
}
