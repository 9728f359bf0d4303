use std::collections::HashMap;

use chrono::NaiveDate;

use forecast_service::calendar::{business_day_range, is_business_day};
use forecast_service::error::ForecastError;
use forecast_service::forecast::{clamp_horizon, run_forecast, MAX_HORIZON, MIN_HORIZON};
use forecast_service::market::{PriceSeries, PriceSource};

/// In-memory source with fixed per-symbol histories.
struct FixedSource {
    data: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl FixedSource {
    fn single(symbol: &str, points: Vec<(NaiveDate, f64)>) -> Self {
        let mut data = HashMap::new();
        data.insert(symbol.to_string(), points);
        Self { data }
    }
}

impl PriceSource for FixedSource {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> Result<PriceSeries, ForecastError> {
        let points = self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .copied()
                    .filter(|(d, _)| *d >= start)
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::from_daily(points))
    }
}

/// Serves one primary symbol, answers one auxiliary with an empty series and
/// every other symbol with an error.
struct PartialAuxSource {
    primary_symbol: &'static str,
    empty_symbol: &'static str,
    primary: Vec<(NaiveDate, f64)>,
}

impl PriceSource for PartialAuxSource {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> Result<PriceSeries, ForecastError> {
        if symbol == self.primary_symbol {
            Ok(PriceSeries::from_daily(
                self.primary
                    .iter()
                    .copied()
                    .filter(|(d, _)| *d >= start)
                    .collect(),
            ))
        } else if symbol == self.empty_symbol {
            Ok(PriceSeries::from_daily(Vec::new()))
        } else {
            Err(ForecastError::Pipeline(format!("no route to {symbol}")))
        }
    }
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// `count` sessions of wavy but positive prices ending well in the past.
fn synthetic_history(count: usize) -> Vec<(NaiveDate, f64)> {
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let mut days = business_day_range(start_date(), end);
    days.truncate(count);
    assert_eq!(days.len(), count);
    days.into_iter()
        .enumerate()
        .map(|(i, d)| (d, 100.0 + 0.05 * i as f64 + 2.0 * (i as f64 * 0.31).sin()))
        .collect()
}

#[test]
fn clamp_horizon_bounds() {
    assert_eq!(clamp_horizon(1), MIN_HORIZON);
    assert_eq!(clamp_horizon(3), 3);
    assert_eq!(clamp_horizon(10), 10);
    assert_eq!(clamp_horizon(30), 30);
    assert_eq!(clamp_horizon(100), MAX_HORIZON);
}

#[test]
fn forecast_end_to_end() {
    let history = synthetic_history(500);
    let last_session = history.last().unwrap().0;
    let source = FixedSource::single("TEST", history);

    let result = run_forecast(&source, "TEST", 5, start_date()).unwrap();

    assert_eq!(result.ticker, "TEST");
    assert_eq!(result.forecast.dates.len(), 5);
    assert_eq!(result.forecast.prices.len(), 5);
    assert!(result.forecast.prices.iter().all(|p| p.is_finite() && *p > 0.0));

    // History context is capped at 60 trailing sessions.
    assert_eq!(result.history.dates.len(), 60);
    assert_eq!(result.history.prices.len(), 60);
    assert_eq!(
        result.history.dates.last().unwrap(),
        &last_session.to_string()
    );

    // Forecast dates are strictly increasing business days after the last
    // historical session.
    let mut prev = last_session;
    for date in &result.forecast.dates {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        assert!(parsed > prev);
        assert!(is_business_day(parsed));
        prev = parsed;
    }
}

#[test]
fn small_horizon_is_raised_to_minimum() {
    let source = FixedSource::single("TEST", synthetic_history(200));

    let result = run_forecast(&source, "TEST", 1, start_date()).unwrap();

    assert_eq!(result.forecast.dates.len(), MIN_HORIZON as usize);
    assert_eq!(result.forecast.prices.len(), MIN_HORIZON as usize);
}

#[test]
fn unavailable_auxiliaries_are_skipped() {
    let history = synthetic_history(200);
    // "AAPL" carries the SPY and GC=F auxiliaries; here SPY has no data and
    // GC=F fails outright, so both must be dropped rather than aborting.
    let partial = PartialAuxSource {
        primary_symbol: "AAPL",
        empty_symbol: "SPY",
        primary: history.clone(),
    };
    let plain = FixedSource::single("TEST", history);

    let with_aux_map = run_forecast(&partial, "AAPL", 3, start_date()).unwrap();
    let without = run_forecast(&plain, "TEST", 3, start_date()).unwrap();

    assert_eq!(with_aux_map.ticker, "AAPL");
    assert_eq!(with_aux_map.forecast.prices.len(), 3);
    // With both auxiliaries skipped the feature set matches a symbol that
    // has no auxiliary map at all, and so does the forecast.
    assert_eq!(with_aux_map.forecast.prices, without.forecast.prices);
    assert_eq!(with_aux_map.forecast.dates, without.forecast.dates);
}

#[test]
fn unknown_symbol_is_insufficient_data() {
    let source = FixedSource::single("TEST", synthetic_history(200));

    let err = run_forecast(&source, "NOPE", 5, start_date()).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData(_)));
}

#[test]
fn short_history_is_insufficient_data() {
    let source = FixedSource::single("TEST", synthetic_history(90));

    let err = run_forecast(&source, "TEST", 5, start_date()).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData(_)));
}

#[test]
fn identical_requests_are_deterministic() {
    let history = synthetic_history(200);
    let a_source = FixedSource::single("TEST", history.clone());
    let b_source = FixedSource::single("TEST", history);

    let a = run_forecast(&a_source, "TEST", 3, start_date()).unwrap();
    let b = run_forecast(&b_source, "TEST", 3, start_date()).unwrap();

    assert_eq!(a.forecast.prices, b.forecast.prices);
    assert_eq!(a.forecast.dates, b.forecast.dates);
}
