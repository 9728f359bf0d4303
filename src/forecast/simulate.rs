//! Working state of the recursive forecast loop.

use crate::feature::builder::{
    FeatureTable, DRAWDOWN_PERIOD, INDICATOR_FEATURES, MA_LONG, MA_MID, MA_SHORT, RSI_PERIOD,
    VOL_PERIOD,
};
use crate::indicator::{RollingMax, RollingStd, Rsi, Sma};

/// Running lists of simulated prices and log-returns, seeded with the cleaned
/// historical rows and extended by one element per forecast step. The
/// streaming indicators stay warm across steps, so each feature recomputation
/// sees exactly the history-plus-simulation series.
#[derive(Debug, Clone)]
pub struct SimulationState {
    prices: Vec<f64>,
    returns: Vec<f64>,
    ma5: Sma,
    ma20: Sma,
    ma60: Sma,
    vol20: RollingStd,
    max60: RollingMax,
    rsi14: Rsi,
}

impl SimulationState {
    /// Seed from the feature table the model was trained on.
    pub fn seed(table: &FeatureTable) -> Self {
        let prices: Vec<f64> = table.rows.iter().map(|r| r.price).collect();
        let returns: Vec<f64> = table.rows.iter().map(|r| r.target_return).collect();

        let mut ma5 = Sma::new(MA_SHORT);
        let mut ma20 = Sma::new(MA_MID);
        let mut ma60 = Sma::new(MA_LONG);
        let mut vol20 = RollingStd::new(VOL_PERIOD);
        let mut max60 = RollingMax::new(DRAWDOWN_PERIOD);
        let mut rsi14 = Rsi::new(RSI_PERIOD);
        for p in &prices {
            ma5.push(*p);
            ma20.push(*p);
            ma60.push(*p);
            max60.push(*p);
            rsi14.push(*p);
        }
        for r in &returns {
            vol20.push(*r);
        }

        Self {
            prices,
            returns,
            ma5,
            ma20,
            ma60,
            vol20,
            max60,
            rsi14,
        }
    }

    pub fn last_price(&self) -> f64 {
        *self.prices.last().expect("seeded with at least one price")
    }

    /// Apply one predicted log-return: extend the price/return lists and all
    /// indicators. Returns the new simulated price.
    pub fn advance(&mut self, predicted_return: f64) -> f64 {
        let next_price = self.last_price() * predicted_return.exp();
        self.prices.push(next_price);
        self.returns.push(predicted_return);
        self.ma5.push(next_price);
        self.ma20.push(next_price);
        self.ma60.push(next_price);
        self.max60.push(next_price);
        self.rsi14.push(next_price);
        self.vol20.push(predicted_return);
        next_price
    }

    /// The feature vector of the newest simulated row, in training column
    /// order. Auxiliary returns are not simulated and stay at zero.
    ///
    /// Indicators without enough history (and an RSI window with no losses)
    /// are written as 0.0 instead of dropping the step: recursive inference
    /// cannot drop rows the way the builder does. With short histories this
    /// can bias the first few steps.
    pub fn feature_vector(&self, aux_count: usize) -> Vec<f64> {
        let price = self.last_price();
        let dd60 = match self.max60.value() {
            Some(m) if m != 0.0 => price / m - 1.0,
            _ => 0.0,
        };
        let lag = |k: usize| -> f64 {
            if self.returns.len() >= k {
                self.returns[self.returns.len() - k]
            } else {
                0.0
            }
        };

        let mut out = Vec::with_capacity(aux_count + INDICATOR_FEATURES);
        out.resize(aux_count, 0.0);
        out.extend_from_slice(&[
            self.vol20.value().unwrap_or(0.0),
            self.ma5.value().unwrap_or(0.0),
            self.ma20.value().unwrap_or(0.0),
            self.ma60.value().unwrap_or(0.0),
            self.rsi14.value().unwrap_or(0.0),
            dd60,
            lag(1),
            lag(2),
            lag(3),
            lag(5),
        ]);
        out
    }

    /// The last `count` simulated prices, oldest first.
    pub fn tail_prices(&self, count: usize) -> &[f64] {
        let start = self.prices.len().saturating_sub(count);
        &self.prices[start..]
    }
}
