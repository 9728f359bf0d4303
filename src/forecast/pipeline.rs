//! End-to-end forecast pipeline: fetch, feature engineering, per-request
//! training, recursive multi-step inference, result assembly.
//!
//! Everything runs synchronously on the calling thread. Each call trains a
//! fresh model; nothing is cached or shared across requests.

use chrono::{NaiveDate, Utc};
use ndarray::{s, Array2};
use serde::Serialize;

use crate::calendar::future_business_days;
use crate::error::ForecastError;
use crate::feature::builder::build_table;
use crate::feature::scaler::ScalerPair;
use crate::feature::window::{build_training_set, WINDOW};
use crate::forecast::simulate::SimulationState;
use crate::market::{auxiliary_symbols, PriceSource};
use crate::model::{GruRegressor, SequenceModel};

pub const MIN_HORIZON: u32 = 3;
pub const MAX_HORIZON: u32 = 30;
/// Trailing historical rows returned for display context.
pub const HISTORY_CONTEXT: usize = 60;

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoints {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub ticker: String,
    pub history: SeriesPoints,
    pub forecast: SeriesPoints,
}

pub fn clamp_horizon(horizon_days: u32) -> u32 {
    horizon_days.clamp(MIN_HORIZON, MAX_HORIZON)
}

/// Produce a multi-step forecast for `symbol`, training a fresh model on
/// history fetched from `start` onward.
pub fn run_forecast(
    source: &dyn PriceSource,
    symbol: &str,
    horizon_days: u32,
    start: NaiveDate,
) -> Result<Forecast, ForecastError> {
    let horizon = clamp_horizon(horizon_days) as usize;
    let today = Utc::now().date_naive();

    let primary = source.fetch_daily(symbol, start)?.truncate_after(today);
    if primary.is_empty() {
        return Err(ForecastError::InsufficientData(format!(
            "no price data for symbol {symbol}"
        )));
    }

    let mut aux = Vec::new();
    for name in auxiliary_symbols(symbol) {
        match source.fetch_daily(name, start) {
            Ok(series) if !series.is_empty() => {
                aux.push((name.to_string(), series.truncate_after(today)));
            }
            Ok(_) => tracing::debug!(auxiliary = name, "auxiliary series empty, skipping"),
            Err(e) => {
                tracing::warn!(auxiliary = name, error = %e, "auxiliary fetch failed, skipping")
            }
        }
    }

    let table = build_table(symbol, &primary, &aux)?;
    let x = table.feature_matrix();
    let y = table.targets();

    let scalers = ScalerPair::fit(&x, &y);
    let x_scaled = scalers.features.transform(&x);
    let y_scaled = scalers.target.transform(&y);
    let training = build_training_set(&x_scaled, &y_scaled)?;

    tracing::info!(
        symbol,
        rows = table.len(),
        samples = training.len(),
        horizon,
        "training forecast model"
    );
    let mut model = GruRegressor::new(table.feature_dim());
    let report = model.fit(&training.windows, &training.targets)?;
    tracing::info!(
        symbol,
        train_loss = report.train_loss,
        val_loss = ?report.val_loss,
        "model trained"
    );

    // Recursive multi-step inference: the input window starts as the last
    // WINDOW scaled historical rows and slides by one per predicted step.
    let dim = table.feature_dim();
    let mut window = x_scaled
        .slice(s![x_scaled.nrows() - WINDOW.., ..])
        .to_owned();
    let mut sim = SimulationState::seed(&table);
    for _ in 0..horizon {
        let pred_scaled = model.predict(window.view());
        let ret = scalers.target.inverse(pred_scaled);
        sim.advance(ret);

        let row = sim.feature_vector(table.aux_count);
        let scaled_row = scalers.features.transform_row(&row);
        let mut next = Array2::zeros((WINDOW, dim));
        next.slice_mut(s![..WINDOW - 1, ..])
            .assign(&window.slice(s![1.., ..]));
        next.row_mut(WINDOW - 1).assign(&scaled_row);
        window = next;
    }

    let last_date = table
        .last_date()
        .ok_or_else(|| ForecastError::Pipeline("feature table has no rows".to_string()))?;
    let future_dates = future_business_days(last_date, horizon);

    let hist_n = table.len().min(HISTORY_CONTEXT);
    let hist_rows = &table.rows[table.len() - hist_n..];
    let history = SeriesPoints {
        dates: hist_rows.iter().map(|r| r.date.to_string()).collect(),
        prices: hist_rows.iter().map(|r| r.price).collect(),
    };
    let forecast = SeriesPoints {
        dates: future_dates.iter().map(|d| d.to_string()).collect(),
        prices: sim.tail_prices(horizon).to_vec(),
    };

    Ok(Forecast {
        ticker: symbol.to_string(),
        history,
        forecast,
    })
}
