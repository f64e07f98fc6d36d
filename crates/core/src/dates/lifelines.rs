//! Lifelines dates: `YYYY-M`, month not zero-padded.

use cdf_types::PartialDate;
use chrono::{DateTime, Datelike, NaiveDate};

fn year_month(date: &str) -> Option<(i32, u32)> {
    let (year, month) = date.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    Some((year, month))
}

fn month_start_timestamp(date: &str) -> Option<i64> {
    let (year, month) = year_month(date)?;
    let start = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    Some(start.and_utc().timestamp())
}

/// Parse a Lifelines date into a year-month partial date.
///
/// Malformed text and months outside 1..=12 yield `None`.
pub fn to_iso(date: &str) -> Option<PartialDate> {
    let (year, month) = year_month(date)?;
    PartialDate::from_year_month(year, month).ok()
}

/// Calendar year of a Lifelines date.
pub fn survey_year(date: &str) -> Option<i32> {
    to_iso(date).map(|d| d.year())
}

/// Midpoint of two Lifelines dates, in Lifelines format.
///
/// The mean of the two month-start instants, reported as the month it falls in.
pub fn mean_date(first: &str, second: &str) -> Option<String> {
    let first = month_start_timestamp(first)?;
    let second = month_start_timestamp(second)?;
    let mean = first.checked_add(second)?.div_euclid(2);
    let instant = DateTime::from_timestamp(mean, 0)?;
    Some(format!("{}-{}", instant.year(), instant.month()))
}
