//! Settings for the remote client. The store has its own [`crate::StoreConfig`].

use bon::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.weather.gc.ca";
/// Largest page the GeoMet API serves for one request.
pub const DEFAULT_PAGE_LIMIT: usize = 10_000;
pub const DEFAULT_STATION_SEARCH_LIMIT: usize = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Remote API settings.
///
/// Every field has a default, so a config file only needs the values it changes.
///
/// # Examples
///
/// ```
/// use climate_cache::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8080")
///     .page_limit(500)
///     .build();
/// assert_eq!(config.page_limit, 500);
/// assert_eq!(config.station_search_limit, 1_000);
///
/// let from_json: ClientConfig = serde_json::from_str(r#"{"page_limit": 250}"#).unwrap();
/// assert_eq!(from_json.base_url, "https://api.weather.gc.ca");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ClientConfig {
    /// Root of the OGC API, without the `/collections` suffix.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `limit` sent with each daily page request.
    #[builder(default = DEFAULT_PAGE_LIMIT)]
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// `limit` sent with the station bounding-box query.
    #[builder(default = DEFAULT_STATION_SEARCH_LIMIT)]
    #[serde(default = "default_station_search_limit")]
    pub station_search_limit: usize,

    /// Per-request timeout. A timed out request fails the whole fetch.
    #[builder(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[builder(into, default = default_user_agent())]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::builder().build()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

const fn default_station_search_limit() -> usize {
    DEFAULT_STATION_SEARCH_LIMIT
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
