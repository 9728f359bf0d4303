//! Derives the engineered feature table from aligned price series.

use std::collections::HashMap;

use chrono::NaiveDate;
use ndarray::{Array1, Array2};

use crate::error::ForecastError;
use crate::indicator::{RollingMax, RollingStd, Rsi, Sma};
use crate::market::PriceSeries;

pub const VOL_PERIOD: usize = 20;
pub const MA_SHORT: usize = 5;
pub const MA_MID: usize = 20;
pub const MA_LONG: usize = 60;
pub const RSI_PERIOD: usize = 14;
pub const DRAWDOWN_PERIOD: usize = 60;
pub const RETURN_LAGS: [usize; 4] = [1, 2, 3, 5];

/// Minimum number of fully defined rows the cleaned table must retain.
pub const MIN_CLEAN_ROWS: usize = 120;

/// Engineered features per retained row count, excluding auxiliary returns.
pub const INDICATOR_FEATURES: usize = 10;

/// One fully defined feature row. Every field is a real value; rows with any
/// undefined input never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// Target close on this date (joined series, used to seed the simulation).
    pub price: f64,
    /// Day-over-day log return of the target, the training label.
    pub target_return: f64,
    /// Log returns of the auxiliary symbols, in auxiliary-map order.
    pub aux_returns: Vec<f64>,
    pub vol20: f64,
    pub ma5: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub rsi14: f64,
    pub dd60: f64,
    pub lag1: f64,
    pub lag2: f64,
    pub lag3: f64,
    pub lag5: f64,
}

impl FeatureRow {
    /// Model input vector: auxiliary returns first, then the technical
    /// indicators and lags in fixed order.
    pub fn features(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.aux_returns.len() + INDICATOR_FEATURES);
        out.extend_from_slice(&self.aux_returns);
        out.extend_from_slice(&[
            self.vol20, self.ma5, self.ma20, self.ma60, self.rsi14, self.dd60, self.lag1,
            self.lag2, self.lag3, self.lag5,
        ]);
        out
    }
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub symbol: String,
    pub aux_count: usize,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn feature_dim(&self) -> usize {
        self.aux_count + INDICATOR_FEATURES
    }

    pub fn feature_matrix(&self) -> Array2<f64> {
        let dim = self.feature_dim();
        let mut x = Array2::zeros((self.rows.len(), dim));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, v) in row.features().into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }
        x
    }

    pub fn targets(&self) -> Array1<f64> {
        self.rows.iter().map(|r| r.target_return).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Build the cleaned feature table for `symbol` from its price series and the
/// auxiliary series that were successfully fetched.
///
/// All series are inner-joined on common dates. Rows keep only dates where the
/// target return, every auxiliary return, every rolling indicator, and every
/// lag are defined; everything else is dropped. Fails when the primary series
/// is empty or fewer than [`MIN_CLEAN_ROWS`] rows survive.
pub fn build_table(
    symbol: &str,
    target: &PriceSeries,
    aux: &[(String, PriceSeries)],
) -> Result<FeatureTable, ForecastError> {
    if target.is_empty() {
        return Err(ForecastError::InsufficientData(format!(
            "no price data for symbol {symbol}"
        )));
    }

    let aux_maps: Vec<HashMap<NaiveDate, f64>> = aux
        .iter()
        .map(|(_, series)| {
            series
                .dates()
                .iter()
                .copied()
                .zip(series.prices().iter().copied())
                .collect()
        })
        .collect();

    // Inner join on the target's dates.
    let mut joined: Vec<(NaiveDate, f64, Vec<f64>)> = Vec::with_capacity(target.len());
    'dates: for (date, price) in target.dates().iter().zip(target.prices()) {
        let mut aux_prices = Vec::with_capacity(aux.len());
        for map in &aux_maps {
            match map.get(date) {
                Some(p) => aux_prices.push(*p),
                None => continue 'dates,
            }
        }
        joined.push((*date, *price, aux_prices));
    }

    let mut ma5 = Sma::new(MA_SHORT);
    let mut ma20 = Sma::new(MA_MID);
    let mut ma60 = Sma::new(MA_LONG);
    let mut vol20 = RollingStd::new(VOL_PERIOD);
    let mut max60 = RollingMax::new(DRAWDOWN_PERIOD);
    let mut rsi14 = Rsi::new(RSI_PERIOD);

    // Per-row target returns, indexed like `joined`; row 0 has none.
    let mut returns: Vec<Option<f64>> = vec![None; joined.len()];
    let mut rows = Vec::new();

    for i in 0..joined.len() {
        let (date, price, ref aux_prices) = joined[i];

        let target_return = if i > 0 {
            Some((price / joined[i - 1].1).ln())
        } else {
            None
        };
        returns[i] = target_return;

        let aux_returns: Option<Vec<f64>> = if i > 0 {
            aux_prices
                .iter()
                .zip(&joined[i - 1].2)
                .map(|(cur, prev)| Some((cur / prev).ln()))
                .collect()
        } else {
            None
        };

        let v_ma5 = ma5.push(price);
        let v_ma20 = ma20.push(price);
        let v_ma60 = ma60.push(price);
        let v_max60 = max60.push(price);
        let v_rsi = rsi14.push(price);
        let v_vol = match target_return {
            Some(r) => vol20.push(r),
            None => None,
        };
        let v_dd = v_max60.map(|m| price / m - 1.0);

        let lag = |k: usize| -> Option<f64> {
            if i >= k {
                returns[i - k]
            } else {
                None
            }
        };

        let row = (|| {
            Some(FeatureRow {
                date,
                price,
                target_return: target_return?,
                aux_returns: aux_returns?,
                vol20: v_vol?,
                ma5: v_ma5?,
                ma20: v_ma20?,
                ma60: v_ma60?,
                rsi14: v_rsi?,
                dd60: v_dd?,
                lag1: lag(1)?,
                lag2: lag(2)?,
                lag3: lag(3)?,
                lag5: lag(5)?,
            })
        })();
        if let Some(row) = row {
            rows.push(row);
        }
    }

    if rows.len() < MIN_CLEAN_ROWS {
        return Err(ForecastError::InsufficientData(format!(
            "cleaned feature table for {symbol} has {} rows, need at least {MIN_CLEAN_ROWS}",
            rows.len()
        )));
    }

    tracing::debug!(
        symbol,
        joined = joined.len(),
        retained = rows.len(),
        aux = aux.len(),
        "built feature table"
    );

    Ok(FeatureTable {
        symbol: symbol.to_string(),
        aux_count: aux.len(),
        rows,
    })
}
