use crate::remote::error::RemoteError;
use crate::store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Background store task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid year range {start_year}..={end_year}")]
    InvalidYearRange { start_year: i32, end_year: i32 },
}
