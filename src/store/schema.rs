//! Canonical cache schema: surrogate integer station keys, `YYYYMMDD` integer
//! dates and measurements stored as integers scaled by 10.

pub(crate) const CREATE_STATIONS: &str = "
    CREATE TABLE IF NOT EXISTS stations (
        key INTEGER PRIMARY KEY AUTOINCREMENT,
        station_id TEXT UNIQUE,
        name TEXT,
        latitude REAL,
        longitude REAL
    )";

pub(crate) const CREATE_DAILY_DATA: &str = "
    CREATE TABLE IF NOT EXISTS daily_data (
        station_key INTEGER,
        date INTEGER,
        temp_mean INTEGER,
        temp_min INTEGER,
        temp_max INTEGER,
        precip INTEGER,
        PRIMARY KEY (station_key, date)
    ) WITHOUT ROWID";

pub(crate) const CREATE_STATION_REQUESTS: &str = "
    CREATE TABLE IF NOT EXISTS station_requests (
        station_key INTEGER,
        start_date INTEGER,
        end_date INTEGER,
        status TEXT,
        timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )";

pub(crate) fn create_all(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "{CREATE_STATIONS};{CREATE_DAILY_DATA};{CREATE_STATION_REQUESTS};"
    ))
}

/// SQLite's `CURRENT_TIMESTAMP` format.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
