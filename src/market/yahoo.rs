//! Blocking Yahoo Finance chart-API client.
//!
//! The pipeline is synchronous end to end, so this client uses
//! `reqwest::blocking` and runs on the caller's thread.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::error::ForecastError;
use crate::market::{PriceSeries, PriceSource};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = concat!("forecast-service/", env!("CARGO_PKG_VERSION"));

pub struct YahooClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self, ForecastError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ForecastError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceSource for YahooClient {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> Result<PriceSeries, ForecastError> {
        let period1 = start
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp()
            .to_string();
        let period2 = Utc::now().timestamp().to_string();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()?;

        // Yahoo answers 404 for unknown symbols; the contract is an empty series.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(symbol, "symbol not found upstream");
            return Ok(PriceSeries::default());
        }
        let envelope: ChartEnvelope = resp.error_for_status()?.json()?;

        let Some(result) = envelope.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) else {
            return Ok(PriceSeries::default());
        };
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let points: Vec<(NaiveDate, f64)> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                close.map(|c| (date, c))
            })
            .collect();

        let series = PriceSeries::from_daily(points);
        tracing::debug!(symbol, rows = series.len(), "fetched daily closes");
        Ok(series)
    }
}
