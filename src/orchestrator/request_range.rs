use crate::orchestrator::error::FetchError;
use crate::types::date_block::DateBlock;
use chrono::NaiveDate;

/// The inclusive date range a caller asked for, with the end clamped to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RequestRange {
    /// A range that never reaches past `today`.
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        Self {
            start,
            end: end.min(today),
        }
    }

    /// January 1st of `start_year` through December 31st of `end_year`, or
    /// through `today` when no end year is given.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use climate_cache::RequestRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    /// let range = RequestRange::for_years(2020, Some(2030), today).unwrap();
    /// assert_eq!(range.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    /// assert_eq!(range.end, today);
    /// ```
    pub fn for_years(
        start_year: i32,
        end_year: Option<i32>,
        today: NaiveDate,
    ) -> Result<Self, FetchError> {
        let invalid = || FetchError::InvalidYearRange {
            start_year,
            end_year: end_year.unwrap_or(start_year),
        };
        if end_year.is_some_and(|end| end < start_year) {
            return Err(invalid());
        }

        let start = NaiveDate::from_ymd_opt(start_year, 1, 1).ok_or_else(invalid)?;
        let end = match end_year {
            Some(year) => NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
            None => today,
        };
        Ok(Self::new(start, end, today))
    }

    /// Days in the range; zero when it starts after it ends.
    pub fn num_days(&self) -> i64 {
        self.as_block().num_days()
    }

    pub fn as_block(&self) -> DateBlock {
        DateBlock::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_past_years() {
        let range = RequestRange::for_years(2018, Some(2019), date(2024, 1, 1)).unwrap();
        assert_eq!(range.start, date(2018, 1, 1));
        assert_eq!(range.end, date(2019, 12, 31));
        assert_eq!(range.num_days(), 730);
    }

    #[test]
    fn open_end_runs_to_today() {
        let today = date(2024, 3, 2);
        let range = RequestRange::for_years(2024, None, today).unwrap();
        assert_eq!(range.end, today);
        assert_eq!(range.num_days(), 62);
    }

    #[test]
    fn current_year_is_clamped() {
        let today = date(2024, 3, 2);
        let range = RequestRange::for_years(2023, Some(2024), today).unwrap();
        assert_eq!(range.end, today);
    }

    #[test]
    fn reversed_years_are_rejected() {
        let err = RequestRange::for_years(2022, Some(2020), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InvalidYearRange {
                start_year: 2022,
                end_year: 2020
            }
        ));
    }

    #[test]
    fn future_start_is_an_empty_range() {
        let range = RequestRange::for_years(2030, None, date(2024, 1, 1)).unwrap();
        assert_eq!(range.num_days(), 0);
    }
}
