//! Business-day (Mon-Fri) calendar helpers used for series alignment and
//! forecast date stepping.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut d = date + Duration::days(1);
    while !is_business_day(d) {
        d += Duration::days(1);
    }
    d
}

/// All business days in `[start, end]`, in order.
pub fn business_day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut d = start;
    while d <= end {
        if is_business_day(d) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

/// The next `count` business days strictly after `last`.
pub fn future_business_days(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(count);
    let mut d = last;
    for _ in 0..count {
        d = next_business_day(d);
        out.push(d);
    }
    out
}
