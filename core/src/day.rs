//! Logical days: the calendar date an instant counts towards once the
//! user's day-start hour is taken into account.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Maps `instant` to its logical day: `day_start_hour` hours are subtracted
/// and the result is truncated to a date in `tz`.
///
/// The offset is trusted as-is; clamping to 0..=23 happens when settings are
/// loaded.
#[must_use]
pub fn logical_day<Tz: TimeZone>(instant: &DateTime<Utc>, day_start_hour: u32, tz: &Tz) -> NaiveDate {
    let shifted = *instant - Duration::hours(i64::from(day_start_hour));
    shifted.with_timezone(tz).date_naive()
}

/// Plain calendar date of `instant` in `tz`.
#[must_use]
pub fn calendar_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    logical_day(instant, 0, tz)
}

/// The logical day it currently is.
#[must_use]
pub fn today<Tz: TimeZone>(day_start_hour: u32, tz: &Tz) -> NaiveDate {
    logical_day(&Utc::now(), day_start_hour, tz)
}
