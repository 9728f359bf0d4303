//! Recurrent sequence regressor trained per forecast request.

pub mod adam;
pub mod dense;
pub mod gru;
pub mod regressor;

pub use regressor::GruRegressor;

use ndarray::{Array1, Array2, Array3, ArrayView2};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::ForecastError;

pub const HIDDEN_UNITS: usize = 64;
pub const DENSE_UNITS: usize = 32;
pub const EPOCHS: usize = 20;
pub const BATCH_SIZE: usize = 64;
pub const LEARNING_RATE: f64 = 5e-4;
/// Fraction of samples held out from the chronological tail, never shuffled.
pub const VALIDATION_SPLIT: f64 = 0.2;
/// Fixed seed for weight initialization and batch order.
pub const SEED: u64 = 123;

#[derive(Debug, Clone, Copy)]
pub struct FitReport {
    pub epochs: usize,
    pub train_loss: f64,
    pub val_loss: Option<f64>,
}

/// Capability seam for the sequence model, so the numeric implementation is
/// swappable without touching feature engineering, scaling, or the recursive
/// forecaster.
pub trait SequenceModel {
    /// Train on (window, next-step scaled target) pairs.
    fn fit(
        &mut self,
        windows: &Array3<f64>,
        targets: &Array1<f64>,
    ) -> Result<FitReport, ForecastError>;

    /// Scaled next-step log-return predicted from one (WINDOW, features) slice.
    fn predict(&self, window: ArrayView2<'_, f64>) -> f64;
}

/// Xavier-initialized weight matrix drawn from the shared seeded generator.
pub(crate) fn xavier_normal(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    let std_dev = (2.0 / (rows + cols) as f64).sqrt();
    let normal = Normal::new(0.0, std_dev).expect("finite std dev");
    Array2::from_shape_fn((rows, cols), |_| normal.sample(rng))
}
