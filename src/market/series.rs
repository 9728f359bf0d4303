//! Daily closing-price series aligned to the business-day calendar.

use chrono::NaiveDate;

use crate::calendar::business_day_range;

/// An immutable daily price series: strictly increasing business-day dates,
/// no gaps (forward-filled), all prices positive.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from raw (date, close) observations.
    ///
    /// Observations are sorted, duplicates keep the last value, non-finite or
    /// non-positive prices are discarded, and the result is reindexed onto the
    /// business-day range of the remaining dates with gaps forward-filled.
    pub fn from_daily(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.retain(|(_, p)| p.is_finite() && *p > 0.0);
        if points.is_empty() {
            return Self::default();
        }
        points.sort_by_key(|(d, _)| *d);

        let first = points.first().map(|(d, _)| *d).unwrap_or_default();
        let last = points.last().map(|(d, _)| *d).unwrap_or_default();

        let mut dates = Vec::new();
        let mut prices = Vec::new();
        let mut idx = 0usize;
        let mut current: Option<f64> = None;
        for day in business_day_range(first, last) {
            while idx < points.len() && points[idx].0 <= day {
                current = Some(points[idx].1);
                idx += 1;
            }
            if let Some(price) = current {
                dates.push(day);
                prices.push(price);
            }
        }
        Self { dates, prices }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// A copy truncated to observations dated at or before `cutoff`.
    pub fn truncate_after(&self, cutoff: NaiveDate) -> Self {
        let keep = self.dates.iter().take_while(|d| **d <= cutoff).count();
        Self {
            dates: self.dates[..keep].to_vec(),
            prices: self.prices[..keep].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn forward_fills_missing_business_days() {
        // Monday and Thursday observed; Tuesday and Wednesday filled.
        let s = PriceSeries::from_daily(vec![
            (date(2024, 6, 3), 100.0),
            (date(2024, 6, 6), 103.0),
        ]);
        assert_eq!(s.len(), 4);
        assert_eq!(s.prices(), &[100.0, 100.0, 100.0, 103.0]);
        assert_eq!(s.dates()[1], date(2024, 6, 4));
    }

    #[test]
    fn weekend_observations_fill_forward_onto_monday() {
        let s = PriceSeries::from_daily(vec![
            (date(2024, 5, 31), 100.0),
            (date(2024, 6, 1), 99.0), // Saturday
            (date(2024, 6, 4), 101.0),
        ]);
        // Saturday itself is not indexed; Monday carries its value forward.
        assert_eq!(s.dates()[1], date(2024, 6, 3));
        assert_eq!(s.prices()[1], 99.0);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let s = PriceSeries::from_daily(vec![
            (date(2024, 6, 4), 101.0),
            (date(2024, 6, 3), 100.0),
        ]);
        assert_eq!(s.prices(), &[100.0, 101.0]);
    }

    #[test]
    fn invalid_prices_are_dropped() {
        let s = PriceSeries::from_daily(vec![
            (date(2024, 6, 3), f64::NAN),
            (date(2024, 6, 4), -5.0),
            (date(2024, 6, 5), 0.0),
        ]);
        assert!(s.is_empty());
    }

    #[test]
    fn truncate_after_keeps_prefix() {
        let s = PriceSeries::from_daily(vec![
            (date(2024, 6, 3), 100.0),
            (date(2024, 6, 4), 101.0),
            (date(2024, 6, 5), 102.0),
        ]);
        let t = s.truncate_after(date(2024, 6, 4));
        assert_eq!(t.len(), 2);
        assert_eq!(t.last_date(), Some(date(2024, 6, 4)));
    }
}
