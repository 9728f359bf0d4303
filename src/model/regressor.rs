//! The fixed GRU(64) -> Dense(32, ReLU) -> Dense(1) regressor and its
//! training loop.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ForecastError;
use crate::model::adam::Adam;
use crate::model::dense::{Activation, Dense};
use crate::model::gru::Gru;
use crate::model::{
    FitReport, SequenceModel, BATCH_SIZE, DENSE_UNITS, EPOCHS, HIDDEN_UNITS, LEARNING_RATE, SEED,
    VALIDATION_SPLIT,
};

pub struct GruRegressor {
    gru: Gru,
    hidden: Dense,
    output: Dense,
    adam: Adam,
    rng: StdRng,
}

impl GruRegressor {
    /// Freshly initialized model for `input_dim` features per window row.
    /// Weight initialization and batch order derive from the fixed seed, so
    /// two models built for the same data train identically.
    pub fn new(input_dim: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);
        let gru = Gru::new(input_dim, HIDDEN_UNITS, &mut rng);
        let hidden = Dense::new(HIDDEN_UNITS, DENSE_UNITS, Activation::Relu, &mut rng);
        let output = Dense::new(DENSE_UNITS, 1, Activation::Linear, &mut rng);
        Self {
            gru,
            hidden,
            output,
            adam: Adam::new(LEARNING_RATE),
            rng,
        }
    }

    fn forward_train(&mut self, windows: &Array3<f64>) -> Array2<f64> {
        let h = self.gru.forward_train(windows);
        let a = self.hidden.forward_train(&h);
        self.output.forward_train(&a)
    }

    fn backward(&mut self, grad_out: &Array2<f64>) {
        let da = self.output.backward(grad_out);
        let dh = self.hidden.backward(&da);
        self.gru.backward(&dh);
    }

    fn mse(&self, windows: &Array3<f64>, targets: &Array1<f64>) -> f64 {
        let h = self.gru.forward_batch(windows);
        let a = self.hidden.forward(&h);
        let out = self.output.forward(&a);
        let diff = out.index_axis(Axis(1), 0).to_owned() - targets;
        diff.mapv(|d| d * d).mean().unwrap_or(0.0)
    }
}

impl SequenceModel for GruRegressor {
    fn fit(
        &mut self,
        windows: &Array3<f64>,
        targets: &Array1<f64>,
    ) -> Result<FitReport, ForecastError> {
        let n = targets.len();
        if n == 0 || windows.shape()[0] != n {
            return Err(ForecastError::Pipeline(format!(
                "training set mismatch: {} windows vs {} targets",
                windows.shape()[0],
                n
            )));
        }

        // Chronological split: the validation slice is the unshuffled tail.
        let split = ((n as f64) * (1.0 - VALIDATION_SPLIT)) as usize;
        let split = split.max(1);
        let val_windows = windows.slice(s![split.., .., ..]).to_owned();
        let val_targets = targets.slice(s![split..]).to_owned();

        let mut indices: Vec<usize> = (0..split).collect();
        let mut train_loss = f64::NAN;
        for epoch in 0..EPOCHS {
            indices.shuffle(&mut self.rng);
            let mut loss_sum = 0.0;
            let mut seen = 0usize;
            for chunk in indices.chunks(BATCH_SIZE) {
                let xb = windows.select(Axis(0), chunk);
                let yb = targets.select(Axis(0), chunk);

                let pred = self.forward_train(&xb);
                let diff = pred.index_axis(Axis(1), 0).to_owned() - &yb;
                loss_sum += diff.mapv(|d| d * d).sum();
                seen += chunk.len();

                let scale = 2.0 / chunk.len() as f64;
                let grad_out = diff
                    .mapv(|d| d * scale)
                    .into_shape_with_order((chunk.len(), 1))
                    .map_err(|e| ForecastError::Pipeline(e.to_string()))?;
                self.backward(&grad_out);

                self.adam.begin_step();
                self.output.apply_gradients(&self.adam);
                self.hidden.apply_gradients(&self.adam);
                self.gru.apply_gradients(&self.adam);
            }
            train_loss = loss_sum / seen.max(1) as f64;
            if !val_targets.is_empty() {
                let val_loss = self.mse(&val_windows, &val_targets);
                tracing::debug!(epoch, train_loss, val_loss, "epoch finished");
            } else {
                tracing::debug!(epoch, train_loss, "epoch finished");
            }
        }

        let val_loss = if val_targets.is_empty() {
            None
        } else {
            Some(self.mse(&val_windows, &val_targets))
        };
        Ok(FitReport {
            epochs: EPOCHS,
            train_loss,
            val_loss,
        })
    }

    fn predict(&self, window: ArrayView2<'_, f64>) -> f64 {
        let h = self.gru.forward(window);
        let a = self.hidden.forward_one(&h);
        let out = self.output.forward_one(&a);
        out[0]
    }
}
