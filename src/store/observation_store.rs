//! SQLite-backed storage for stations, daily observations and the request log.
//!
//! Every public operation opens its own connection and drops it before
//! returning, on success and on error alike. Writes spanning several rows run
//! inside a single transaction so readers never observe half of a batch.

use crate::store::error::StoreError;
use crate::store::schema::{self, TIMESTAMP_FORMAT};
use crate::types::date_key::DateKey;
use crate::types::observation::{scale_measurement, unscale_measurement, DailyObservation};
use crate::types::request_log::{RequestLogEntry, RequestStatus};
use crate::types::station::Station;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name used when only a directory is given for the cache.
pub const DEFAULT_DB_FILE_NAME: &str = "climate_cache.sq3";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the cache database lives and how connections to it are opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file. Created on first open.
    pub path: PathBuf,
    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// A database named [`DEFAULT_DB_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_DB_FILE_NAME))
    }
}

/// Durable cache of station metadata, daily observations and request history.
///
/// Cloning is cheap: the store only holds its configuration and connects per call.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    config: StoreConfig,
}

impl ObservationStore {
    /// Opens (creating if needed) the database file and its tables.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::DirCreation(parent.to_path_buf(), e))?;
        }
        let store = Self { config };
        let conn = store.connect()?;
        schema::create_all(&conn)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.config.path)
            .map_err(|e| StoreError::Open(self.config.path.clone(), e))?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        Ok(conn)
    }

    /// Inserts new stations and updates name/coordinates of known ones.
    pub fn upsert_stations(&self, stations: &[Station]) -> Result<(), StoreError> {
        if stations.is_empty() {
            return Ok(());
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO stations (station_id, name, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(station_id) DO UPDATE SET
                    name = excluded.name,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
            )?;
            for station in stations {
                stmt.execute(params![
                    station.id,
                    station.name,
                    station.location.latitude,
                    station.location.longitude
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} stations into {:?}", stations.len(), self.config.path);
        Ok(())
    }

    pub fn get_station(&self, station_id: &str) -> Result<Option<Station>, StoreError> {
        let conn = self.connect()?;
        let station = conn
            .query_row(
                "SELECT station_id, name, latitude, longitude FROM stations WHERE station_id = ?1",
                params![station_id],
                |row| {
                    Ok(Station::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                        row.get::<_, Option<f64>>(3)?.unwrap_or_default(),
                    ))
                },
            )
            .optional()?;
        Ok(station)
    }

    /// Cached rows for a station with dates in `[start, end]`, ascending by date.
    ///
    /// An unknown station or an uncached range gives an empty vector.
    pub fn get_daily_observations(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>, StoreError> {
        let conn = self.connect()?;
        let Some(key) = station_key(&conn, station_id)? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(
            "SELECT date, temp_mean, temp_min, temp_max, precip
             FROM daily_data
             WHERE station_key = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![key, date_param(start), date_param(end)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(date, temp_mean, temp_min, temp_max, precip)| {
                let date = stored_date(date, station_id)?;
                Some(DailyObservation {
                    station_id: station_id.to_string(),
                    date,
                    temp_mean: unscale_measurement(temp_mean),
                    temp_min: unscale_measurement(temp_min),
                    temp_max: unscale_measurement(temp_max),
                    precip: unscale_measurement(precip),
                })
            })
            .collect())
    }

    /// Dates in `[start, end]` that have a cached row, values not loaded.
    pub fn get_existing_dates(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let conn = self.connect()?;
        let Some(key) = station_key(&conn, station_id)? else {
            return Ok(BTreeSet::new());
        };

        let mut stmt = conn.prepare(
            "SELECT date FROM daily_data WHERE station_key = ?1 AND date BETWEEN ?2 AND ?3",
        )?;
        let dates = stmt
            .query_map(params![key, date_param(start), date_param(end)], |row| {
                row.get::<_, i64>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates
            .into_iter()
            .filter_map(|date| stored_date(date, station_id))
            .collect())
    }

    /// Appends one request log entry. Unknown stations are skipped.
    pub fn log_request(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let Some(key) = station_key(&conn, station_id)? else {
            debug!("Not logging request for unknown station {}", station_id);
            return Ok(());
        };
        conn.execute(
            "INSERT INTO station_requests (station_key, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, date_param(start), date_param(end), status.as_str()],
        )?;
        Ok(())
    }

    /// Every logged block for the station, in insertion order.
    pub fn get_request_log(&self, station_id: &str) -> Result<Vec<RequestLogEntry>, StoreError> {
        let conn = self.connect()?;
        let Some(key) = station_key(&conn, station_id)? else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(
            "SELECT start_date, end_date, status, timestamp
             FROM station_requests
             WHERE station_key = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![key], |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (start, end, status, timestamp) in rows {
            let status = status.unwrap_or_default();
            let status = status
                .parse::<RequestStatus>()
                .map_err(StoreError::UnknownRequestStatus)?;
            let (Some(start), Some(end)) = (
                start.and_then(|d| stored_date(d, station_id)),
                end.and_then(|d| stored_date(d, station_id)),
            ) else {
                continue;
            };
            entries.push(RequestLogEntry {
                start,
                end,
                status,
                logged_at: timestamp
                    .and_then(|ts| NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).ok()),
            });
        }
        Ok(entries)
    }

    /// Upserts observations, possibly for several stations at once.
    ///
    /// Rows whose station was never saved with [`Self::upsert_stations`] are
    /// skipped. Returns the number of rows written.
    pub fn save_daily_observations(
        &self,
        observations: &[DailyObservation],
    ) -> Result<usize, StoreError> {
        if observations.is_empty() {
            return Ok(0);
        }

        let mut by_station: BTreeMap<&str, Vec<&DailyObservation>> = BTreeMap::new();
        for obs in observations {
            by_station.entry(obs.station_id.as_str()).or_default().push(obs);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO daily_data
                    (station_key, date, temp_mean, temp_min, temp_max, precip)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(station_key, date) DO UPDATE SET
                    temp_mean = excluded.temp_mean,
                    temp_min = excluded.temp_min,
                    temp_max = excluded.temp_max,
                    precip = excluded.precip",
            )?;
            for (station_id, rows) in by_station {
                let Some(key) = station_key(&tx, station_id)? else {
                    warn!(
                        "Skipping {} observations for unknown station {}",
                        rows.len(),
                        station_id
                    );
                    continue;
                };
                for obs in rows {
                    written += stmt.execute(params![
                        key,
                        date_param(obs.date),
                        scale_measurement(obs.temp_mean),
                        scale_measurement(obs.temp_min),
                        scale_measurement(obs.temp_max),
                        scale_measurement(obs.precip),
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(written)
    }
}

fn station_key(conn: &Connection, station_id: &str) -> Result<Option<i64>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT key FROM stations WHERE station_id = ?1",
            params![station_id],
            |row| row.get(0),
        )
        .optional()?)
}

fn date_param(date: NaiveDate) -> u32 {
    DateKey::from(date).get()
}

fn stored_date(value: i64, station_id: &str) -> Option<NaiveDate> {
    let date = DateKey::from_int(value).and_then(DateKey::to_naive_date);
    if date.is_none() {
        warn!("Ignoring malformed stored date {} for station {}", value, station_id);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(station: &str, day: NaiveDate, temp_mean: Option<f64>) -> DailyObservation {
        DailyObservation {
            station_id: station.to_string(),
            date: day,
            temp_mean,
            temp_min: temp_mean.map(|t| t - 4.0),
            temp_max: temp_mean.map(|t| t + 4.0),
            precip: None,
        }
    }

    fn open_store() -> (TempDir, ObservationStore) {
        let dir = TempDir::new().unwrap();
        let store = ObservationStore::open(StoreConfig::in_dir(dir.path())).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.sq3");
        let store = ObservationStore::open(StoreConfig::new(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn upserting_a_known_station_overwrites_it() {
        let (_dir, store) = open_store();
        store
            .upsert_stations(&[Station::new("S1", "Old name", 45.0, -75.0)])
            .unwrap();
        store
            .upsert_stations(&[Station::new("S1", "New name", 45.5, -75.5)])
            .unwrap();

        let station = store.get_station("S1").unwrap().unwrap();
        assert_eq!(station, Station::new("S1", "New name", 45.5, -75.5));

        let conn = store.connect().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM stations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn observations_come_back_sorted_and_in_range() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        store
            .save_daily_observations(&[
                obs("S1", date(2020, 1, 3), Some(3.0)),
                obs("S1", date(2020, 1, 1), Some(1.0)),
                obs("S1", date(2020, 2, 1), Some(9.0)),
            ])
            .unwrap();

        let rows = store
            .get_daily_observations("S1", date(2020, 1, 1), date(2020, 1, 31))
            .unwrap();
        let dates: Vec<_> = rows.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 1, 3)]);
        assert_eq!(rows[1].temp_min, Some(-1.0));
    }

    #[test]
    fn absent_measurements_are_not_zero() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        store
            .save_daily_observations(&[obs("S1", date(2020, 1, 1), None)])
            .unwrap();

        let rows = store
            .get_daily_observations("S1", date(2020, 1, 1), date(2020, 1, 1))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temp_mean, None);
        assert_eq!(rows[0].precip, None);
    }

    #[test]
    fn scaled_values_round_ties_to_even() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        let mut row = obs("S1", date(2020, 7, 1), Some(23.45));
        row.precip = Some(0.25);
        store.save_daily_observations(&[row]).unwrap();

        let conn = store.connect().unwrap();
        let (temp_mean, precip): (i64, i64) = conn
            .query_row("SELECT temp_mean, precip FROM daily_data", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(temp_mean, 234);
        assert_eq!(precip, 2);

        let rows = store
            .get_daily_observations("S1", date(2020, 7, 1), date(2020, 7, 1))
            .unwrap();
        assert_eq!(rows[0].temp_mean, Some(23.4));
        assert_eq!(rows[0].precip, Some(0.2));
    }

    #[test]
    fn saving_twice_is_idempotent() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        let batch = vec![
            obs("S1", date(2020, 1, 1), Some(1.0)),
            obs("S1", date(2020, 1, 2), Some(2.0)),
        ];
        store.save_daily_observations(&batch).unwrap();
        let first = store
            .get_daily_observations("S1", date(2020, 1, 1), date(2020, 12, 31))
            .unwrap();
        store.save_daily_observations(&batch).unwrap();
        let second = store
            .get_daily_observations("S1", date(2020, 1, 1), date(2020, 12, 31))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn resaving_a_date_overwrites_every_measurement() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        store
            .save_daily_observations(&[obs("S1", date(2020, 1, 1), Some(5.0))])
            .unwrap();
        store
            .save_daily_observations(&[obs("S1", date(2020, 1, 1), None)])
            .unwrap();

        let rows = store
            .get_daily_observations("S1", date(2020, 1, 1), date(2020, 1, 1))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temp_mean, None);
        assert_eq!(rows[0].temp_max, None);
    }

    #[test]
    fn rows_for_unknown_stations_are_skipped() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        let written = store
            .save_daily_observations(&[
                obs("S1", date(2020, 1, 1), Some(1.0)),
                obs("GHOST", date(2020, 1, 1), Some(1.0)),
            ])
            .unwrap();

        assert_eq!(written, 1);
        assert!(store
            .get_daily_observations("GHOST", date(2020, 1, 1), date(2020, 1, 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn existing_dates_only_cover_the_requested_range() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        store
            .save_daily_observations(&[
                obs("S1", date(2020, 12, 31), None),
                obs("S1", date(2021, 1, 1), None),
                obs("S1", date(2021, 1, 5), None),
            ])
            .unwrap();

        let dates = store
            .get_existing_dates("S1", date(2021, 1, 1), date(2021, 1, 31))
            .unwrap();
        assert_eq!(
            dates.into_iter().collect::<Vec<_>>(),
            vec![date(2021, 1, 1), date(2021, 1, 5)]
        );
        assert!(store
            .get_existing_dates("NOPE", date(2021, 1, 1), date(2021, 1, 31))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn request_log_is_append_only() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        store
            .log_request("S1", date(2020, 1, 1), date(2020, 1, 5), RequestStatus::Success)
            .unwrap();
        store
            .log_request("S1", date(2020, 1, 1), date(2020, 1, 5), RequestStatus::Success)
            .unwrap();
        store
            .log_request("S1", date(2020, 1, 3), date(2020, 2, 1), RequestStatus::Empty)
            .unwrap();

        let log = store.get_request_log("S1").unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].status, RequestStatus::Empty);
        assert_eq!(log[2].start, date(2020, 1, 3));
        assert_eq!(log[2].end, date(2020, 2, 1));
        assert!(log.iter().all(|entry| entry.logged_at.is_some()));
    }

    #[test]
    fn logging_for_an_unknown_station_is_a_no_op() {
        let (_dir, store) = open_store();
        store
            .log_request("GHOST", date(2020, 1, 1), date(2020, 1, 5), RequestStatus::Empty)
            .unwrap();
        assert!(store.get_request_log("GHOST").unwrap().is_empty());
    }

    #[test]
    fn corrupt_status_is_reported() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        let conn = store.connect().unwrap();
        conn.execute(
            "INSERT INTO station_requests (station_key, start_date, end_date, status)
             SELECT key, 20200101, 20200102, 'MAYBE' FROM stations",
            [],
        )
        .unwrap();

        match store.get_request_log("S1") {
            Err(StoreError::UnknownRequestStatus(status)) => assert_eq!(status, "MAYBE"),
            other => panic!("expected unknown status error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_timestamp_is_reported() {
        let (_dir, store) = open_store();
        store.upsert_stations(&[Station::new("S1", "One", 0.0, 0.0)]).unwrap();
        let conn = store.connect().unwrap();
        conn.execute(
            "INSERT INTO station_requests (station_key, start_date, end_date, status, timestamp)
             SELECT key, 20200101, 20200102, 'SUCCESS', 1714557600 FROM stations",
            [],
        )
        .unwrap();

        assert!(matches!(
            store.get_request_log("S1"),
            Err(StoreError::Sqlite(_))
        ));
    }
}
