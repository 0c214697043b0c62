use crate::remote::error::RemoteError;
use crate::types::date_block::DateBlock;
use crate::types::observation::DailyObservation;
use std::future::Future;

/// One page of a paginated daily query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPage {
    pub observations: Vec<DailyObservation>,
    /// Items the server says it put in this page (`numberReturned`).
    pub number_returned: usize,
    /// Items matching the whole query (`numberMatched`).
    pub number_matched: usize,
}

/// A remote source of daily observations, queried one page at a time.
///
/// Implemented by [`crate::MscClient`]; the fetch orchestrator only depends on
/// this trait so it can be driven by any paginated backend.
pub trait DailySource {
    /// Fetches the page starting at `offset` of the daily records for
    /// `station_id` inside `block`.
    fn fetch_daily_page(
        &self,
        station_id: &str,
        block: DateBlock,
        offset: usize,
    ) -> impl Future<Output = Result<DailyPage, RemoteError>> + Send;
}
