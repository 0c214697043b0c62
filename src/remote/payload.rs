//! Wire types for the GeoMet OGC API feature collections.

use crate::types::date_key::DateKey;
use crate::types::observation::DailyObservation;
use crate::types::station::Station;
use log::warn;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
    #[serde(rename = "numberReturned", default)]
    pub number_returned: usize,
    #[serde(rename = "numberMatched", default)]
    pub number_matched: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature<P> {
    pub properties: P,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DailyProperties {
    #[serde(rename = "CLIMATE_IDENTIFIER")]
    pub climate_identifier: String,
    #[serde(rename = "LOCAL_DATE", default)]
    pub local_date: Option<String>,
    #[serde(rename = "MEAN_TEMPERATURE", default)]
    pub mean_temperature: Option<f64>,
    #[serde(rename = "MIN_TEMPERATURE", default)]
    pub min_temperature: Option<f64>,
    #[serde(rename = "MAX_TEMPERATURE", default)]
    pub max_temperature: Option<f64>,
    #[serde(rename = "TOTAL_PRECIPITATION", default)]
    pub total_precipitation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StationProperties {
    #[serde(rename = "CLIMATE_IDENTIFIER")]
    pub climate_identifier: String,
    #[serde(rename = "STATION_NAME", default)]
    pub station_name: Option<String>,
}

impl DailyProperties {
    /// `None` when `LOCAL_DATE` is missing or not a usable date; such records are dropped.
    pub fn into_observation(self) -> Option<DailyObservation> {
        let date = self
            .local_date
            .as_deref()
            .and_then(DateKey::parse)
            .and_then(DateKey::to_naive_date);
        let Some(date) = date else {
            warn!(
                "Dropping record for station {} with malformed date {:?}",
                self.climate_identifier, self.local_date
            );
            return None;
        };
        Some(DailyObservation {
            station_id: self.climate_identifier,
            date,
            temp_mean: self.mean_temperature,
            temp_min: self.min_temperature,
            temp_max: self.max_temperature,
            precip: self.total_precipitation,
        })
    }
}

impl Feature<StationProperties> {
    /// `None` when the feature has no point geometry.
    pub fn into_station(self) -> Option<Station> {
        let coordinates = self.geometry?.coordinates;
        let (&longitude, &latitude) = (coordinates.first()?, coordinates.get(1)?);
        Some(Station::new(
            self.properties.climate_identifier,
            self.properties.station_name.unwrap_or_default(),
            latitude,
            longitude,
        ))
    }
}
