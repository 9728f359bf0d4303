use std::collections::VecDeque;

/// Rolling sample standard deviation (ddof = 1) over the last `period` values.
///
/// The window is small (at most 60 in this pipeline), so the value is computed
/// from the buffer on demand rather than from running sums.
#[derive(Debug, Clone)]
pub struct RollingStd {
    period: usize,
    window: VecDeque<f64>,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "rolling std period must be > 1");
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.window.len() < self.period {
            return None;
        }
        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let ss = self
            .window
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>();
        Some((ss / (n - 1.0)).sqrt())
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }
}
