//! Fully connected layer with manual forward/backward passes.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;

use crate::model::adam::{Adam, Moments};
use crate::model::xavier_normal;

#[derive(Debug, Clone, Copy)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Linear => x,
        }
    }

    /// Derivative with respect to the pre-activation value.
    fn derivative(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct DenseCache {
    /// Layer input, shape (batch, in).
    input: Array2<f64>,
    /// Pre-activation output, shape (batch, out).
    preact: Array2<f64>,
}

#[derive(Debug, Clone)]
pub struct Dense {
    w: Array2<f64>,
    b: Array1<f64>,
    activation: Activation,
    cache: Option<DenseCache>,
    grad_w: Option<Array2<f64>>,
    grad_b: Option<Array1<f64>>,
    opt_w: Moments<ndarray::Ix2>,
    opt_b: Moments<ndarray::Ix1>,
}

impl Dense {
    pub fn new(input_dim: usize, output_dim: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let w = xavier_normal(rng, input_dim, output_dim);
        let b = Array1::zeros(output_dim);
        let opt_w = Moments::zeros_like(&w);
        let opt_b = Moments::zeros_like(&b);
        Self {
            w,
            b,
            activation,
            cache: None,
            grad_w: None,
            grad_b: None,
            opt_w,
            opt_b,
        }
    }

    /// Inference forward for a batch, no caching.
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        let z = x.dot(&self.w) + &self.b;
        z.mapv(|v| self.activation.apply(v))
    }

    /// Inference forward for a single vector.
    pub fn forward_one(&self, x: &Array1<f64>) -> Array1<f64> {
        let z = x.dot(&self.w) + &self.b;
        z.mapv(|v| self.activation.apply(v))
    }

    /// Training forward: caches input and pre-activation for backward.
    pub fn forward_train(&mut self, x: &Array2<f64>) -> Array2<f64> {
        let preact = x.dot(&self.w) + &self.b;
        let out = preact.mapv(|v| self.activation.apply(v));
        self.cache = Some(DenseCache {
            input: x.clone(),
            preact,
        });
        out
    }

    /// Backward from the post-activation gradient; stores parameter gradients
    /// and returns the gradient with respect to the layer input.
    pub fn backward(&mut self, grad_out: &Array2<f64>) -> Array2<f64> {
        let cache = self.cache.take().expect("forward_train before backward");
        let act = self.activation;
        let dz = grad_out * &cache.preact.mapv(|v| act.derivative(v));
        self.grad_w = Some(cache.input.t().dot(&dz));
        self.grad_b = Some(dz.sum_axis(Axis(0)));
        dz.dot(&self.w.t())
    }

    pub fn apply_gradients(&mut self, adam: &Adam) {
        if let (Some(gw), Some(gb)) = (self.grad_w.take(), self.grad_b.take()) {
            adam.apply(&mut self.w, &gw, &mut self.opt_w);
            adam.apply(&mut self.b, &gb, &mut self.opt_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LEARNING_RATE;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn relu_zeroes_negative_preactivations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = Dense::new(2, 2, Activation::Relu, &mut rng);
        layer.w = array![[1.0, -1.0], [0.0, 0.0]];
        layer.b = Array1::zeros(2);
        let out = layer.forward(&array![[2.0, 0.0]]);
        assert_eq!(out[[0, 0]], 2.0);
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = Dense::new(3, 1, Activation::Linear, &mut rng);
        let x = array![[0.3, -0.5, 0.9], [1.0, 0.2, -0.1]];
        let y = array![[0.5], [-0.25]];

        // loss = mean((out - y)^2)
        let out = layer.forward_train(&x);
        let dout = (&out - &y).mapv(|v| 2.0 * v / 2.0);
        layer.backward(&dout);
        let grad_w = layer.grad_w.clone().unwrap();

        let eps = 1e-6;
        let mut probe = layer.clone();
        probe.w[[1, 0]] += eps;
        let loss_plus = (&probe.forward(&x) - &y).mapv(|v| v * v).mean().unwrap();
        probe.w[[1, 0]] -= 2.0 * eps;
        let loss_minus = (&probe.forward(&x) - &y).mapv(|v| v * v).mean().unwrap();
        let numeric = (loss_plus - loss_minus) / (2.0 * eps);
        assert!(
            (grad_w[[1, 0]] - numeric).abs() < 1e-5,
            "analytic {} vs numeric {}",
            grad_w[[1, 0]],
            numeric
        );
    }

    #[test]
    fn training_step_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut layer = Dense::new(2, 1, Activation::Linear, &mut rng);
        let mut adam = Adam::new(LEARNING_RATE * 100.0);
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![[1.0], [2.0], [3.0]];

        let first = (&layer.forward(&x) - &y).mapv(|v| v * v).mean().unwrap();
        for _ in 0..200 {
            let out = layer.forward_train(&x);
            let dout = (&out - &y).mapv(|v| 2.0 * v / 3.0);
            layer.backward(&dout);
            adam.begin_step();
            layer.apply_gradients(&adam);
        }
        let last = (&layer.forward(&x) - &y).mapv(|v| v * v).mean().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
    }
}
