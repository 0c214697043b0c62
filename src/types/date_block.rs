use chrono::NaiveDate;
use std::fmt;

/// An inclusive, contiguous range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateBlock {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateBlock {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the block; zero when `start > end`.
    pub fn num_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    /// The `start/end` interval syntax understood by the OGC API `datetime` parameter.
    pub fn as_interval(&self) -> String {
        format!("{}/{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for DateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
