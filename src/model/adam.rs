//! Adam optimizer shared by every trainable tensor in the model.

use ndarray::{Array, Dimension};

/// First/second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
pub struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    pub fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }
}

/// Adam with a single timestep shared across all tensors; call [`Adam::begin_step`]
/// once per batch before applying gradients.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
        }
    }

    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    /// In-place parameter update:
    /// `m = b1*m + (1-b1)*g`, `v = b2*v + (1-b2)*g^2`,
    /// `p -= lr * m_hat / (sqrt(v_hat) + eps)` with bias-corrected moments.
    pub fn apply<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        state: &mut Moments<D>,
    ) {
        debug_assert!(self.t > 0, "begin_step before apply");
        let t = self.t as i32;
        let corr1 = 1.0 - self.beta1.powi(t);
        let corr2 = 1.0 - self.beta2.powi(t);
        for (((p, g), m), v) in param
            .iter_mut()
            .zip(grad.iter())
            .zip(state.m.iter_mut())
            .zip(state.v.iter_mut())
        {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / corr1;
            let v_hat = *v / corr2;
            *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}
