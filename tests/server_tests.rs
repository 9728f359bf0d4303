use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;

use forecast_service::error::ForecastError;
use forecast_service::market::{PriceSeries, PriceSource};
use forecast_service::server::{forecast, AppState, ForecastRequest};

struct EmptySource;

impl PriceSource for EmptySource {
    fn fetch_daily(&self, _symbol: &str, _start: NaiveDate) -> Result<PriceSeries, ForecastError> {
        Ok(PriceSeries::from_daily(Vec::new()))
    }
}

struct FailingSource;

impl PriceSource for FailingSource {
    fn fetch_daily(&self, _symbol: &str, _start: NaiveDate) -> Result<PriceSeries, ForecastError> {
        Err(ForecastError::Pipeline("source unavailable".to_string()))
    }
}

fn state_with(source: Arc<dyn PriceSource + Send + Sync>) -> AppState {
    AppState {
        source,
        start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
    }
}

fn request(ticker: &str, horizon: u32) -> Json<ForecastRequest> {
    Json(ForecastRequest {
        ticker: ticker.to_string(),
        horizon,
    })
}

#[test]
fn blank_ticker_is_bad_request() {
    let state = state_with(Arc::new(EmptySource));
    let err = tokio_test::block_on(forecast(State(state), request("   ", 5))).unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[test]
fn symbol_without_data_is_unprocessable() {
    let state = state_with(Arc::new(EmptySource));
    let err = tokio_test::block_on(forecast(State(state), request("NOPE", 5))).unwrap_err();
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn pipeline_failure_is_internal_error() {
    let state = state_with(Arc::new(FailingSource));
    let err = tokio_test::block_on(forecast(State(state), request("TEST", 5))).unwrap_err();
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
}
