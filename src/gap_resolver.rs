//! Works out which parts of a requested date range still have to be fetched.
//!
//! A date needs fetching only if it has no cached row *and* no logged request
//! block covers it. Logged blocks count regardless of their status, so a range
//! that came back empty once is never queried again.

use crate::types::date_block::DateBlock;
use crate::types::request_log::RequestLogEntry;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Returns the missing dates of `[start, end]` as maximal contiguous blocks in
/// ascending order.
///
/// Two returned blocks are never adjacent: any run of consecutive unsatisfied
/// days forms exactly one block. An empty result means the cache already
/// satisfies the whole request. `start > end` is an empty request.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use climate_cache::{resolve_gaps, DateBlock};
/// use std::collections::BTreeSet;
///
/// let day = |d| NaiveDate::from_ymd_opt(2021, 3, d).unwrap();
/// let cached: BTreeSet<_> = (1..=10).chain(20..=31).map(day).collect();
///
/// let gaps = resolve_gaps(day(1), day(31), &cached, &[]);
/// assert_eq!(gaps, vec![DateBlock::new(day(11), day(19))]);
/// ```
pub fn resolve_gaps(
    start: NaiveDate,
    end: NaiveDate,
    cached: &BTreeSet<NaiveDate>,
    request_log: &[RequestLogEntry],
) -> Vec<DateBlock> {
    if start > end {
        return Vec::new();
    }

    let coverage = merge_logged_blocks(request_log);
    let mut coverage = coverage.iter().peekable();
    let mut gaps: Vec<DateBlock> = Vec::new();

    for date in start.iter_days().take_while(|d| *d <= end) {
        // Coverage is sorted and dates ascend, so blocks behind us are done.
        while coverage.next_if(|block| block.end < date).is_some() {}
        let logged = coverage.peek().is_some_and(|block| block.contains(date));
        if logged || cached.contains(&date) {
            continue;
        }
        match gaps.last_mut() {
            Some(last) if last.end.succ_opt() == Some(date) => last.end = date,
            _ => gaps.push(DateBlock::new(date, date)),
        }
    }
    gaps
}

/// Sorts logged blocks and merges overlapping or touching ones.
fn merge_logged_blocks(request_log: &[RequestLogEntry]) -> Vec<DateBlock> {
    let mut blocks: Vec<DateBlock> = request_log
        .iter()
        .filter(|entry| entry.start <= entry.end)
        .map(|entry| DateBlock::new(entry.start, entry.end))
        .collect();
    blocks.sort();

    let mut merged: Vec<DateBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last) if last.end.succ_opt().map_or(true, |next| block.start <= next) => {
                last.end = last.end.max(block.end);
            }
            _ => merged.push(block),
        }
    }
    merged
}
