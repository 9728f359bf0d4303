use std::collections::VecDeque;

/// Relative Strength Index over rolling simple means of gains and losses.
///
/// `rs = mean(gains over period) / mean(losses over period)` and
/// `rsi = 100 - 100 / (1 + rs)`. A zero loss mean makes the ratio undefined,
/// so `value` is `None` both while warming up and on windows with no losses.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    deltas: VecDeque<f64>,
    last_price: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RSI period must be > 0");
        Self {
            period,
            deltas: VecDeque::with_capacity(period + 1),
            last_price: None,
        }
    }

    /// Push the next price in the series.
    pub fn push(&mut self, price: f64) -> Option<f64> {
        if let Some(prev) = self.last_price {
            self.deltas.push_back(price - prev);
            if self.deltas.len() > self.period {
                self.deltas.pop_front();
            }
        }
        self.last_price = Some(price);
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.deltas.len() < self.period {
            return None;
        }
        let n = self.deltas.len() as f64;
        let gains: f64 = self.deltas.iter().filter(|d| **d > 0.0).sum();
        let losses: f64 = self.deltas.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
        let avg_loss = losses / n;
        if avg_loss == 0.0 {
            return None;
        }
        let rs = (gains / n) / avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }

    pub fn is_ready(&self) -> bool {
        self.deltas.len() >= self.period
    }
}
