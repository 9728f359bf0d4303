//! Thin HTTP boundary over the blocking forecast pipeline.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::error::ForecastError;
use crate::forecast::{run_forecast, Forecast};
use crate::market::PriceSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PriceSource + Send + Sync>,
    /// First calendar date of fetched history.
    pub start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    /// Clamped into [3, 30] by the pipeline.
    pub horizon: u32,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        let status = match &err {
            ForecastError::InsufficientData(_) | ForecastError::InsufficientSequence(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ForecastError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/symbols", get(symbols))
        .route("/api/forecast", post(forecast))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn symbols() -> Json<serde_json::Value> {
    Json(json!({
        "symbols": [
            { "value": "AAPL", "label": "Apple Inc. (AAPL)" },
            { "value": "MSFT", "label": "Microsoft (MSFT)" },
            { "value": "GOOGL", "label": "Alphabet Class A (GOOGL)" },
            { "value": "AMZN", "label": "Amazon (AMZN)" },
            { "value": "SPY", "label": "SPDR S&P 500 ETF (SPY)" },
            { "value": "^GSPC", "label": "S&P 500 Index (^GSPC)" },
            { "value": "USDRUB=X", "label": "USD/RUB (USDRUB=X)" },
            { "value": "EURUSD=X", "label": "EUR/USD (EURUSD=X)" },
            { "value": "GBPUSD=X", "label": "GBP/USD (GBPUSD=X)" },
            { "value": "GC=F", "label": "Gold Futures (GC=F)" },
            { "value": "BZ=F", "label": "Brent Crude Oil (BZ=F)" },
        ]
    }))
}

/// Runs one full train-and-forecast cycle on the blocking pool.
pub async fn forecast(
    State(state): State<AppState>,
    Json(req): Json<ForecastRequest>,
) -> Result<Json<Forecast>, ApiError> {
    let ticker = req.ticker.trim().to_string();
    if ticker.is_empty() {
        return Err(ApiError::bad_request("ticker must not be empty"));
    }

    let source = Arc::clone(&state.source);
    let start = state.start_date;
    let horizon = req.horizon;
    let result =
        tokio::task::spawn_blocking(move || run_forecast(source.as_ref(), &ticker, horizon, start))
            .await
            .map_err(|e| ApiError::internal(format!("forecast task failed: {e}")))??;
    Ok(Json(result))
}
