//! GRU layer with backpropagation through time.
//!
//! Gate math, batch-major sequence handling:
//!   z_t = sigmoid(x_t W_z + h_{t-1} U_z + b_z)
//!   r_t = sigmoid(x_t W_r + h_{t-1} U_r + b_r)
//!   c_t = tanh(x_t W_h + (r_t * h_{t-1}) U_h + b_h)
//!   h_t = (1 - z_t) * h_{t-1} + z_t * c_t
//! Only the final hidden state is exposed; input gradients are not needed
//! because this is the bottom layer.

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use rand::rngs::StdRng;

use crate::model::adam::{Adam, Moments};
use crate::model::xavier_normal;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone)]
struct GruCache {
    input: Array3<f64>,
    /// Hidden state entering each step; index 0 is the zero state.
    h_prev: Vec<Array2<f64>>,
    update: Vec<Array2<f64>>,
    reset: Vec<Array2<f64>>,
    candidate: Vec<Array2<f64>>,
}

#[derive(Debug, Clone, Default)]
struct GruGrads {
    w_z: Option<Array2<f64>>,
    u_z: Option<Array2<f64>>,
    b_z: Option<Array1<f64>>,
    w_r: Option<Array2<f64>>,
    u_r: Option<Array2<f64>>,
    b_r: Option<Array1<f64>>,
    w_h: Option<Array2<f64>>,
    u_h: Option<Array2<f64>>,
    b_h: Option<Array1<f64>>,
}

#[derive(Debug, Clone)]
pub struct Gru {
    input_dim: usize,
    hidden_dim: usize,
    w_z: Array2<f64>,
    u_z: Array2<f64>,
    b_z: Array1<f64>,
    w_r: Array2<f64>,
    u_r: Array2<f64>,
    b_r: Array1<f64>,
    w_h: Array2<f64>,
    u_h: Array2<f64>,
    b_h: Array1<f64>,
    cache: Option<GruCache>,
    grads: GruGrads,
    opt: Vec<Moments<ndarray::Ix2>>,
    opt_b: Vec<Moments<ndarray::Ix1>>,
}

impl Gru {
    pub fn new(input_dim: usize, hidden_dim: usize, rng: &mut StdRng) -> Self {
        let w_z = xavier_normal(rng, input_dim, hidden_dim);
        let u_z = xavier_normal(rng, hidden_dim, hidden_dim);
        let w_r = xavier_normal(rng, input_dim, hidden_dim);
        let u_r = xavier_normal(rng, hidden_dim, hidden_dim);
        let w_h = xavier_normal(rng, input_dim, hidden_dim);
        let u_h = xavier_normal(rng, hidden_dim, hidden_dim);
        let b = || Array1::zeros(hidden_dim);
        let opt = vec![
            Moments::zeros_like(&w_z),
            Moments::zeros_like(&u_z),
            Moments::zeros_like(&w_r),
            Moments::zeros_like(&u_r),
            Moments::zeros_like(&w_h),
            Moments::zeros_like(&u_h),
        ];
        let opt_b = vec![
            Moments::zeros_like(&b()),
            Moments::zeros_like(&b()),
            Moments::zeros_like(&b()),
        ];
        Self {
            input_dim,
            hidden_dim,
            w_z,
            u_z,
            b_z: b(),
            w_r,
            u_r,
            b_r: b(),
            w_h,
            u_h,
            b_h: b(),
            cache: None,
            grads: GruGrads::default(),
            opt,
            opt_b,
        }
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Final hidden state for a single (steps, input_dim) window.
    pub fn forward(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        debug_assert_eq!(x.ncols(), self.input_dim);
        let mut h = Array1::zeros(self.hidden_dim);
        for t in 0..x.nrows() {
            let x_t = x.row(t);
            let z = (x_t.dot(&self.w_z) + h.dot(&self.u_z) + &self.b_z).mapv(sigmoid);
            let r = (x_t.dot(&self.w_r) + h.dot(&self.u_r) + &self.b_r).mapv(sigmoid);
            let rh = &r * &h;
            let c = (x_t.dot(&self.w_h) + rh.dot(&self.u_h) + &self.b_h).mapv(f64::tanh);
            h = z.mapv(|v| 1.0 - v) * &h + &z * &c;
        }
        h
    }

    /// Final hidden states for a (batch, steps, input_dim) tensor, no caching.
    pub fn forward_batch(&self, x: &Array3<f64>) -> Array2<f64> {
        let batch = x.shape()[0];
        let steps = x.shape()[1];
        let mut h = Array2::zeros((batch, self.hidden_dim));
        for t in 0..steps {
            let x_t = x.index_axis(Axis(1), t);
            let (z, r, c) = self.step(&x_t, &h);
            h = z.mapv(|v| 1.0 - v) * &h + &z * &c;
        }
        h
    }

    /// Training forward; caches everything backward needs.
    pub fn forward_train(&mut self, x: &Array3<f64>) -> Array2<f64> {
        let batch = x.shape()[0];
        let steps = x.shape()[1];
        debug_assert_eq!(x.shape()[2], self.input_dim);

        let mut h = Array2::zeros((batch, self.hidden_dim));
        let mut cache = GruCache {
            input: x.clone(),
            h_prev: Vec::with_capacity(steps),
            update: Vec::with_capacity(steps),
            reset: Vec::with_capacity(steps),
            candidate: Vec::with_capacity(steps),
        };
        for t in 0..steps {
            let x_t = x.index_axis(Axis(1), t);
            let (z, r, c) = self.step(&x_t, &h);
            let h_new = z.mapv(|v| 1.0 - v) * &h + &z * &c;
            cache.h_prev.push(h);
            cache.update.push(z);
            cache.reset.push(r);
            cache.candidate.push(c);
            h = h_new;
        }
        self.cache = Some(cache);
        h
    }

    fn step(
        &self,
        x_t: &ArrayView2<'_, f64>,
        h: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        let z = (x_t.dot(&self.w_z) + h.dot(&self.u_z) + &self.b_z).mapv(sigmoid);
        let r = (x_t.dot(&self.w_r) + h.dot(&self.u_r) + &self.b_r).mapv(sigmoid);
        let rh = &r * h;
        let c = (x_t.dot(&self.w_h) + rh.dot(&self.u_h) + &self.b_h).mapv(f64::tanh);
        (z, r, c)
    }

    /// Backpropagate through time from the gradient of the final hidden state.
    pub fn backward(&mut self, dh_final: &Array2<f64>) {
        let cache = self.cache.take().expect("forward_train before backward");
        let steps = cache.update.len();

        let mut g_w_z = Array2::zeros(self.w_z.raw_dim());
        let mut g_u_z = Array2::zeros(self.u_z.raw_dim());
        let mut g_b_z = Array1::zeros(self.b_z.raw_dim());
        let mut g_w_r = Array2::zeros(self.w_r.raw_dim());
        let mut g_u_r = Array2::zeros(self.u_r.raw_dim());
        let mut g_b_r = Array1::zeros(self.b_r.raw_dim());
        let mut g_w_h = Array2::zeros(self.w_h.raw_dim());
        let mut g_u_h = Array2::zeros(self.u_h.raw_dim());
        let mut g_b_h = Array1::zeros(self.b_h.raw_dim());

        let mut dh = dh_final.clone();
        for t in (0..steps).rev() {
            let x_t = cache.input.index_axis(Axis(1), t);
            let h_prev = &cache.h_prev[t];
            let z = &cache.update[t];
            let r = &cache.reset[t];
            let c = &cache.candidate[t];

            // h_t = (1 - z) * h_prev + z * c
            let dz = &dh * &(c - h_prev);
            let dc = &dh * z;
            let mut dh_prev = &dh * &z.mapv(|v| 1.0 - v);

            // candidate branch, through tanh
            let da_c = &dc * &c.mapv(|v| 1.0 - v * v);
            g_w_h += &x_t.t().dot(&da_c);
            let rh = r * h_prev;
            g_u_h += &rh.t().dot(&da_c);
            g_b_h += &da_c.sum_axis(Axis(0));
            let d_rh = da_c.dot(&self.u_h.t());
            let dr = &d_rh * h_prev;
            dh_prev += &(&d_rh * r);

            // gates, through sigmoid
            let da_z = &dz * &(z * &z.mapv(|v| 1.0 - v));
            let da_r = &dr * &(r * &r.mapv(|v| 1.0 - v));
            g_w_z += &x_t.t().dot(&da_z);
            g_u_z += &h_prev.t().dot(&da_z);
            g_b_z += &da_z.sum_axis(Axis(0));
            g_w_r += &x_t.t().dot(&da_r);
            g_u_r += &h_prev.t().dot(&da_r);
            g_b_r += &da_r.sum_axis(Axis(0));

            dh_prev += &da_z.dot(&self.u_z.t());
            dh_prev += &da_r.dot(&self.u_r.t());
            dh = dh_prev;
        }

        self.grads = GruGrads {
            w_z: Some(g_w_z),
            u_z: Some(g_u_z),
            b_z: Some(g_b_z),
            w_r: Some(g_w_r),
            u_r: Some(g_u_r),
            b_r: Some(g_b_r),
            w_h: Some(g_w_h),
            u_h: Some(g_u_h),
            b_h: Some(g_b_h),
        };
    }

    pub fn apply_gradients(&mut self, adam: &Adam) {
        let grads = std::mem::take(&mut self.grads);
        let weights = [
            (&mut self.w_z, grads.w_z),
            (&mut self.u_z, grads.u_z),
            (&mut self.w_r, grads.w_r),
            (&mut self.u_r, grads.u_r),
            (&mut self.w_h, grads.w_h),
            (&mut self.u_h, grads.u_h),
        ];
        for ((param, grad), state) in weights.into_iter().zip(self.opt.iter_mut()) {
            if let Some(grad) = grad {
                adam.apply(param, &grad, state);
            }
        }
        let biases = [
            (&mut self.b_z, grads.b_z),
            (&mut self.b_r, grads.b_r),
            (&mut self.b_h, grads.b_h),
        ];
        for ((param, grad), state) in biases.into_iter().zip(self.opt_b.iter_mut()) {
            if let Some(grad) = grad {
                adam.apply(param, &grad, state);
            }
        }
    }
}
