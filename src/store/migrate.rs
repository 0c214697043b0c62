//! One-time import of the older cache layout, which keyed every table by the
//! station's text identifier and stored dates as text and measurements as reals.

use crate::store::error::StoreError;
use crate::store::observation_store::{ObservationStore, StoreConfig};
use crate::store::schema::TIMESTAMP_FORMAT;
use crate::types::date_key::DateKey;
use crate::types::observation::scale_measurement;
use crate::types::request_log::RequestStatus;
use chrono::{DateTime, NaiveDateTime};
use log::{info, warn};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;

/// Row counts written by [`migrate_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub stations: usize,
    pub observations: usize,
    /// Daily rows dropped because of an unparseable date or an unknown station.
    pub skipped_observations: usize,
    pub requests: usize,
    /// Request log rows dropped because of an unknown station, an unparseable
    /// date or a status other than `SUCCESS`/`EMPTY`.
    pub skipped_requests: usize,
}

/// Copies a legacy cache database into a fresh store at `target`.
///
/// An existing file at the target path is replaced. Daily rows keep the first
/// row seen for a (station, date) pair. A legacy file without a
/// `station_requests` table migrates with an empty request log.
pub fn migrate_legacy(source: &Path, target: StoreConfig) -> Result<MigrationReport, StoreError> {
    if !source.exists() {
        return Err(StoreError::MigrationSourceMissing(source.to_path_buf()));
    }
    if target.path.exists() {
        warn!(
            "Target database {} already exists. It will be overwritten.",
            target.path.display()
        );
        std::fs::remove_file(&target.path).map_err(|e| StoreError::Io(target.path.clone(), e))?;
    }

    let legacy = Connection::open_with_flags(source, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| StoreError::Open(source.to_path_buf(), e))?;
    let store = ObservationStore::open(target)?;
    let mut conn = store.connect()?;
    let tx = conn.transaction()?;
    let mut report = MigrationReport::default();

    info!("Migrating stations...");
    {
        let mut select = legacy.prepare("SELECT id, name, latitude, longitude FROM stations")?;
        let mut insert = tx.prepare(
            "INSERT INTO stations (station_id, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut rows = select.query([])?;
        while let Some(row) = rows.next()? {
            insert.execute(params![
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ])?;
            report.stations += 1;
        }
    }

    let id_to_key: HashMap<String, i64> = {
        let mut stmt = tx.prepare("SELECT station_id, key FROM stations")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<_, _>>()?;
        pairs
    };

    info!("Migrating daily observations...");
    {
        let mut select = legacy.prepare(
            "SELECT station_id, date, temp_mean, temp_min, temp_max, precip FROM daily_data",
        )?;
        let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO daily_data
                (station_key, date, temp_mean, temp_min, temp_max, precip)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut rows = select.query([])?;
        while let Some(row) = rows.next()? {
            let key = id_to_key.get(&row.get::<_, String>(0)?).copied();
            let date = legacy_date(row.get_ref(1)?);
            let (Some(key), Some(date)) = (key, date) else {
                report.skipped_observations += 1;
                continue;
            };
            report.observations += insert.execute(params![
                key,
                date.get(),
                scale_measurement(row.get::<_, Option<f64>>(2)?),
                scale_measurement(row.get::<_, Option<f64>>(3)?),
                scale_measurement(row.get::<_, Option<f64>>(4)?),
                scale_measurement(row.get::<_, Option<f64>>(5)?),
            ])?;
        }
    }

    if has_table(&legacy, "station_requests")? {
        info!("Migrating request logs...");
        let mut select = legacy.prepare(
            "SELECT station_id, start_date, end_date, status, timestamp FROM station_requests",
        )?;
        let mut insert = tx.prepare(
            "INSERT INTO station_requests (station_key, start_date, end_date, status, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut rows = select.query([])?;
        while let Some(row) = rows.next()? {
            let key = id_to_key.get(&row.get::<_, String>(0)?).copied();
            let start = legacy_date(row.get_ref(1)?);
            let end = legacy_date(row.get_ref(2)?);
            let status = row
                .get::<_, Option<String>>(3)?
                .and_then(|s| s.parse::<RequestStatus>().ok());
            let (Some(key), Some(start), Some(end), Some(status)) = (key, start, end, status) else {
                report.skipped_requests += 1;
                continue;
            };
            insert.execute(params![
                key,
                start.get(),
                end.get(),
                status.as_str(),
                legacy_timestamp(row.get_ref(4)?),
            ])?;
            report.requests += 1;
        }
    }

    tx.commit()?;
    info!("Migration complete: {:?}", report);
    Ok(report)
}

fn has_table(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        ValueRef::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

fn legacy_date(value: ValueRef<'_>) -> Option<DateKey> {
    DateKey::parse(&text_value(value)?)
}

/// Normalises a legacy timestamp to `TIMESTAMP_FORMAT` text. Unix seconds are
/// converted; anything unreadable becomes `NULL`.
fn legacy_timestamp(value: ValueRef<'_>) -> Option<String> {
    let parsed = match value {
        ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc()),
        ValueRef::Text(_) => {
            let text = text_value(value)?;
            NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).ok()
        }
        _ => None,
    };
    parsed.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
}
