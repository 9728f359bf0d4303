//! Slices the scaled feature table into fixed-length training windows.

use ndarray::{s, Array1, Array2, Array3};

use crate::error::ForecastError;

/// Rows per model input window.
pub const WINDOW: usize = 30;

/// Minimum number of (window, target) pairs required to train.
pub const MIN_SAMPLES: usize = 10;

#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// Shape (samples, WINDOW, features).
    pub windows: Array3<f64>,
    /// Scaled next-step target per window.
    pub targets: Array1<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// For every index `i` in `WINDOW..len`, pair the `WINDOW` scaled rows ending
/// just before `i` with row `i`'s scaled target.
pub fn build_training_set(
    x_scaled: &Array2<f64>,
    y_scaled: &Array1<f64>,
) -> Result<TrainingSet, ForecastError> {
    let rows = x_scaled.nrows();
    let dim = x_scaled.ncols();
    let samples = rows.saturating_sub(WINDOW);
    if samples < MIN_SAMPLES {
        return Err(ForecastError::InsufficientSequence(format!(
            "{samples} training windows from {rows} rows, need at least {MIN_SAMPLES}"
        )));
    }

    let mut windows = Array3::zeros((samples, WINDOW, dim));
    let mut targets = Array1::zeros(samples);
    for (n, i) in (WINDOW..rows).enumerate() {
        windows
            .slice_mut(s![n, .., ..])
            .assign(&x_scaled.slice(s![i - WINDOW..i, ..]));
        targets[n] = y_scaled[i];
    }
    Ok(TrainingSet { windows, targets })
}
