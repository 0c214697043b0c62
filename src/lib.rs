mod climate_client;
mod config;
mod error;
mod gap_resolver;
mod orchestrator;
mod remote;
mod store;
mod types;
mod utils;

pub use climate_client::ClimateClient;
pub use config::*;
pub use error::ClimateCacheError;
pub use gap_resolver::resolve_gaps;

pub use orchestrator::error::FetchError;
pub use orchestrator::fetch_orchestrator::FetchOrchestrator;
pub use orchestrator::request_range::RequestRange;

pub use remote::daily_source::{DailyPage, DailySource};
pub use remote::error::RemoteError;
pub use remote::msc_client::MscClient;

pub use store::error::StoreError;
pub use store::migrate::{migrate_legacy, MigrationReport};
pub use store::observation_store::{ObservationStore, StoreConfig, DEFAULT_DB_FILE_NAME};

pub use types::daily_dataset::{DailyDataset, DAILY_COLUMNS};
pub use types::date_block::DateBlock;
pub use types::date_key::DateKey;
pub use types::observation::{scale_measurement, unscale_measurement, DailyObservation};
pub use types::request_log::{RequestLogEntry, RequestStatus};
pub use types::station::{LatLon, Location, Station, StationMatch};
