use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open cache database '{0}'")]
    Open(PathBuf, #[source] rusqlite::Error),

    #[error("Failed to create cache directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Cache database operation failed")]
    Sqlite(#[from] rusqlite::Error),

    // A status value this crate never writes, so the row is corrupt
    #[error("Unknown request status '{0}' in request log")]
    UnknownRequestStatus(String),

    #[error("Legacy cache database '{0}' does not exist")]
    MigrationSourceMissing(PathBuf),

    #[error("Failed to replace existing database file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),
}
