use std::collections::VecDeque;

/// Rolling maximum over the last `period` values.
#[derive(Debug, Clone)]
pub struct RollingMax {
    period: usize,
    window: VecDeque<f64>,
}

impl RollingMax {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "rolling max period must be > 0");
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
        self.window.iter().copied().reduce(f64::max)
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_maximum_of_window() {
        let mut max = RollingMax::new(3);
        assert_eq!(max.push(5.0), None);
        assert_eq!(max.push(3.0), None);
        assert_eq!(max.push(4.0), Some(5.0));
        // 5.0 leaves the window
        assert_eq!(max.push(1.0), Some(4.0));
        assert_eq!(max.push(2.0), Some(4.0));
        assert_eq!(max.push(0.5), Some(2.0));
    }
}
