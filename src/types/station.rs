//! Climate station metadata as stored in the cache and returned by station searches.

use serde::{Deserialize, Serialize};

/// A climate station.
///
/// The `id` is the station's climate identifier (e.g. `"6158355"` for Toronto City)
/// and is unique within the store; saving a station with a known id overwrites
/// its name and coordinates.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The climate identifier used by the remote API.
    pub id: String,
    /// Human readable station name.
    pub name: String,
    /// Geographical location of the station.
    pub location: Location,
}

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Positive for North, negative for South.
    pub latitude: f64,
    /// Positive for East, negative for West.
    pub longitude: f64,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: Location {
                latitude,
                longitude,
            },
        }
    }
}

/// A geographical coordinate: latitude first, longitude second, in decimal degrees.
///
/// # Examples
///
/// ```
/// use climate_cache::LatLon;
///
/// let ottawa = LatLon(45.4215, -75.6972);
/// assert_eq!(ottawa.0, 45.4215);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// A station found by a radius search, with its distance from the search point.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMatch {
    pub station: Station,
    /// Great-circle distance from the search point in kilometers.
    pub distance_km: f64,
}
