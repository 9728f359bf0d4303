//! Standardization transforms fit once on the full feature/target table.

use ndarray::{Array1, Array2, Axis};

/// Per-column zero-mean unit-variance transform for the feature matrix.
///
/// Uses population statistics; a zero-variance column keeps a scale of 1 so
/// the transform stays invertible and finite.
#[derive(Debug, Clone)]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows() as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let mut scale = Array1::zeros(x.ncols());
        for (j, col) in x.axis_iter(Axis(1)).enumerate() {
            let var = col.iter().map(|v| (v - mean[j]).powi(2)).sum::<f64>() / n;
            let s = var.sqrt();
            scale[j] = if s > 0.0 { s } else { 1.0 };
        }
        Self { mean, scale }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            row -= &self.mean;
            row /= &self.scale;
        }
        out
    }

    pub fn transform_row(&self, row: &[f64]) -> Array1<f64> {
        let v = Array1::from_iter(row.iter().copied());
        (v - &self.mean) / &self.scale
    }
}

/// Standardization for the scalar target, with the inverse needed to map
/// model output back into log-return space.
#[derive(Debug, Clone)]
pub struct TargetScaler {
    mean: f64,
    scale: f64,
}

impl TargetScaler {
    pub fn fit(y: &Array1<f64>) -> Self {
        let n = y.len() as f64;
        let mean = y.sum() / n;
        let var = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let s = var.sqrt();
        Self {
            mean,
            scale: if s > 0.0 { s } else { 1.0 },
        }
    }

    pub fn transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| (v - self.mean) / self.scale)
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.scale + self.mean
    }
}

/// The two fitted transforms of one forecast request. Fit exactly once, then
/// reused for the training table, every recursive-step row, and the inverse
/// transform of predictions.
#[derive(Debug, Clone)]
pub struct ScalerPair {
    pub features: Scaler,
    pub target: TargetScaler,
}

impl ScalerPair {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Self {
        Self {
            features: Scaler::fit(x),
            target: TargetScaler::fit(y),
        }
    }
}
