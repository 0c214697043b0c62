use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Outcome of one remote fetch over a date block.
///
/// Both variants mean the block was queried successfully; `Empty` records that
/// the remote had nothing for it, so it is never asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Success,
    Empty,
}

impl RequestStatus {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "SUCCESS",
            RequestStatus::Empty => "EMPTY",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(RequestStatus::Success),
            "EMPTY" => Ok(RequestStatus::Empty),
            other => Err(other.to_string()),
        }
    }
}

/// A logged request block, inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLogEntry {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: RequestStatus,
    /// When the entry was written, if the stored timestamp could be read.
    pub logged_at: Option<NaiveDateTime>,
}
