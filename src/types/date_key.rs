//! The compact `YYYYMMDD` representation used for every date that touches the store.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar date packed into an 8-digit integer, e.g. `20200131`.
///
/// Integer keys compare in calendar order, so range queries in SQLite are plain
/// `BETWEEN` comparisons on an `INTEGER` column.
///
/// # Examples
///
/// ```
/// use climate_cache::DateKey;
///
/// let key = DateKey::parse("2020-01-31T00:00:00").unwrap();
/// assert_eq!(key.get(), 20200131);
/// assert_eq!(key.to_string(), "2020-01-31");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(u32);

impl DateKey {
    /// Parses a loosely formatted date string.
    ///
    /// Anything after the first space or `T` is ignored (time components), then
    /// `-`, `/` and `.` separators are removed. The first 8 remaining characters
    /// must be digits naming a real calendar date. Everything else is `None`,
    /// never an error: a malformed date is treated as absent data.
    pub fn parse(raw: &str) -> Option<Self> {
        let date_part = raw.trim().split([' ', 'T']).next()?;
        let digits: String = date_part
            .chars()
            .filter(|c| !matches!(c, '-' | '/' | '.'))
            .collect();
        if digits.len() < 8 {
            return None;
        }
        let leading = digits.get(..8)?;
        if !leading.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::from_int(leading.parse::<i64>().ok()?)
    }

    /// Builds a key from its integer form, rejecting values that are not a real date.
    pub fn from_int(value: i64) -> Option<Self> {
        let value = u32::try_from(value).ok()?;
        let key = DateKey(value);
        key.to_naive_date().map(|_| key)
    }

    /// The integer form, `YYYYMMDD`.
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn year(self) -> i32 {
        (self.0 / 10_000) as i32
    }

    pub fn month(self) -> u32 {
        (self.0 / 100) % 100
    }

    pub fn day(self) -> u32 {
        self.0 % 100
    }

    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), self.day())
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        // Years before 0 or after 9999 don't occur in station records.
        let year = date.year().clamp(0, 9999) as u32;
        DateKey(year * 10_000 + date.month() * 100 + date.day())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        assert_eq!(DateKey::parse("1984-07-01").map(DateKey::get), Some(19840701));
    }

    #[test]
    fn strips_time_components() {
        assert_eq!(
            DateKey::parse("1984-07-01 00:00:00").map(DateKey::get),
            Some(19840701)
        );
        assert_eq!(
            DateKey::parse("1984-07-01T12:30:00Z").map(DateKey::get),
            Some(19840701)
        );
    }

    #[test]
    fn accepts_slash_and_dot_separators() {
        assert_eq!(DateKey::parse("2021/03/15").map(DateKey::get), Some(20210315));
        assert_eq!(DateKey::parse("2021.03.15").map(DateKey::get), Some(20210315));
        assert_eq!(DateKey::parse("20210315").map(DateKey::get), Some(20210315));
    }

    #[test]
    fn malformed_dates_are_absent() {
        assert_eq!(DateKey::parse(""), None);
        assert_eq!(DateKey::parse("2021-3-5"), None);
        assert_eq!(DateKey::parse("not a date"), None);
        assert_eq!(DateKey::parse("2021-13-01"), None);
        assert_eq!(DateKey::parse("2021-02-30"), None);
    }

    #[test]
    fn round_trips_through_naive_date() {
        let date = NaiveDate::from_ymd_opt(2019, 6, 10).unwrap();
        let key = DateKey::from(date);
        assert_eq!(key.get(), 20190610);
        assert_eq!(key.to_naive_date(), Some(date));
        assert_eq!(key.to_string(), "2019-06-10");
    }

    #[test]
    fn integer_form_rejects_non_dates() {
        assert!(DateKey::from_int(20200229).is_some());
        assert!(DateKey::from_int(20190229).is_none());
        assert!(DateKey::from_int(-1).is_none());
        assert!(DateKey::from_int(2020).is_none());
    }
}
