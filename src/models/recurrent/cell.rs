//! Single-layer GRU over a scalar input sequence with a linear read-out.
//!
//! ```text
//! z_t = σ(w_z·x_t + U_z·h_{t-1} + b_z)
//! r_t = σ(w_r·x_t + U_r·h_{t-1} + b_r)
//! c_t = tanh(w_h·x_t + U_h·(r_t ⊙ h_{t-1}) + b_h)
//! h_t = (1 - z_t) ⊙ c_t + z_t ⊙ h_{t-1}
//! ŷ   = w_out·h_T + b_out
//! ```

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// GRU parameters. Also used as the gradient and momentum accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GruWeights {
    pub hidden_size: usize,
    pub w_z: Vec<f64>,
    pub w_r: Vec<f64>,
    pub w_h: Vec<f64>,
    pub u_z: Vec<Vec<f64>>,
    pub u_r: Vec<Vec<f64>>,
    pub u_h: Vec<Vec<f64>>,
    pub b_z: Vec<f64>,
    pub b_r: Vec<f64>,
    pub b_h: Vec<f64>,
    pub w_out: Vec<f64>,
    pub b_out: f64,
}

/// Activations of one time step, kept for backpropagation.
#[derive(Debug, Clone)]
pub(crate) struct StepCache {
    x: f64,
    h_prev: Vec<f64>,
    z: Vec<f64>,
    r: Vec<f64>,
    c: Vec<f64>,
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn uniform(rng: &mut StdRng, limit: f64, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-limit..limit)).collect()
}

impl GruWeights {
    /// All-zero parameters of the given size.
    pub fn zeros(hidden_size: usize) -> Self {
        let h = hidden_size;
        Self {
            hidden_size: h,
            w_z: vec![0.0; h],
            w_r: vec![0.0; h],
            w_h: vec![0.0; h],
            u_z: vec![vec![0.0; h]; h],
            u_r: vec![vec![0.0; h]; h],
            u_h: vec![vec![0.0; h]; h],
            b_z: vec![0.0; h],
            b_r: vec![0.0; h],
            b_h: vec![0.0; h],
            w_out: vec![0.0; h],
            b_out: 0.0,
        }
    }

    /// Xavier-uniform weights and zero biases.
    pub fn xavier(hidden_size: usize, rng: &mut StdRng) -> Self {
        let h = hidden_size;
        let input_limit = (6.0 / (1 + h) as f64).sqrt();
        let recurrent_limit = (6.0 / (2 * h) as f64).sqrt();

        let mut weights = Self::zeros(h);
        weights.w_z = uniform(rng, input_limit, h);
        weights.w_r = uniform(rng, input_limit, h);
        weights.w_h = uniform(rng, input_limit, h);
        weights.u_z = (0..h).map(|_| uniform(rng, recurrent_limit, h)).collect();
        weights.u_r = (0..h).map(|_| uniform(rng, recurrent_limit, h)).collect();
        weights.u_h = (0..h).map(|_| uniform(rng, recurrent_limit, h)).collect();
        weights.w_out = uniform(rng, input_limit, h);
        weights
    }

    /// One GRU step from `h_prev` on input `x`.
    fn step(&self, x: f64, h_prev: &[f64]) -> StepCache {
        let n = self.hidden_size;
        let mut z = vec![0.0; n];
        let mut r = vec![0.0; n];
        for i in 0..n {
            let mut a_z = self.w_z[i] * x + self.b_z[i];
            let mut a_r = self.w_r[i] * x + self.b_r[i];
            for j in 0..n {
                a_z += self.u_z[i][j] * h_prev[j];
                a_r += self.u_r[i][j] * h_prev[j];
            }
            z[i] = sigmoid(a_z);
            r[i] = sigmoid(a_r);
        }

        let mut c = vec![0.0; n];
        for i in 0..n {
            let mut a_h = self.w_h[i] * x + self.b_h[i];
            for j in 0..n {
                a_h += self.u_h[i][j] * r[j] * h_prev[j];
            }
            c[i] = a_h.tanh();
        }

        StepCache {
            x,
            h_prev: h_prev.to_vec(),
            z,
            r,
            c,
        }
    }

    fn next_hidden(cache: &StepCache) -> Vec<f64> {
        cache
            .z
            .iter()
            .zip(&cache.c)
            .zip(&cache.h_prev)
            .map(|((z, c), h)| (1.0 - z) * c + z * h)
            .collect()
    }

    fn read_out(&self, h: &[f64]) -> f64 {
        self.w_out.iter().zip(h).map(|(w, v)| w * v).sum::<f64>() + self.b_out
    }

    /// Run the sequence and return the read-out of the final hidden state.
    pub fn forward(&self, inputs: &[f64]) -> f64 {
        let mut h = vec![0.0; self.hidden_size];
        for &x in inputs {
            h = Self::next_hidden(&self.step(x, &h));
        }
        self.read_out(&h)
    }

    /// Forward pass that keeps every step for [`backward`](Self::backward).
    pub(crate) fn forward_with_cache(&self, inputs: &[f64]) -> (f64, Vec<StepCache>) {
        let mut h = vec![0.0; self.hidden_size];
        let mut caches = Vec::with_capacity(inputs.len());
        for &x in inputs {
            let cache = self.step(x, &h);
            h = Self::next_hidden(&cache);
            caches.push(cache);
        }
        (self.read_out(&h), caches)
    }

    /// Gradients of the loss with respect to every parameter, given
    /// `d_out = ∂loss/∂ŷ`, by backpropagation through time.
    pub(crate) fn backward(&self, caches: &[StepCache], d_out: f64) -> GruWeights {
        let n = self.hidden_size;
        let mut grad = GruWeights::zeros(n);

        let h_last = caches
            .last()
            .map(Self::next_hidden)
            .unwrap_or_else(|| vec![0.0; n]);
        for i in 0..n {
            grad.w_out[i] = d_out * h_last[i];
        }
        grad.b_out = d_out;

        let mut dh: Vec<f64> = self.w_out.iter().map(|w| d_out * w).collect();

        for cache in caches.iter().rev() {
            let StepCache { x, h_prev, z, r, c } = cache;
            let mut dh_prev = vec![0.0; n];
            let mut da_z = vec![0.0; n];
            let mut da_h = vec![0.0; n];

            for i in 0..n {
                let dc = dh[i] * (1.0 - z[i]);
                let dz = dh[i] * (h_prev[i] - c[i]);
                dh_prev[i] += dh[i] * z[i];
                da_h[i] = dc * (1.0 - c[i] * c[i]);
                da_z[i] = dz * z[i] * (1.0 - z[i]);
            }

            // candidate path through r ⊙ h_prev
            let mut da_r = vec![0.0; n];
            for j in 0..n {
                let mut d_rh = 0.0;
                for i in 0..n {
                    d_rh += self.u_h[i][j] * da_h[i];
                    grad.u_h[i][j] += da_h[i] * r[j] * h_prev[j];
                }
                dh_prev[j] += d_rh * r[j];
                da_r[j] = d_rh * h_prev[j] * r[j] * (1.0 - r[j]);
            }

            for i in 0..n {
                grad.w_h[i] += da_h[i] * x;
                grad.b_h[i] += da_h[i];
                grad.w_z[i] += da_z[i] * x;
                grad.b_z[i] += da_z[i];
                grad.w_r[i] += da_r[i] * x;
                grad.b_r[i] += da_r[i];
                for j in 0..n {
                    grad.u_z[i][j] += da_z[i] * h_prev[j];
                    grad.u_r[i][j] += da_r[i] * h_prev[j];
                    dh_prev[j] += self.u_z[i][j] * da_z[i] + self.u_r[i][j] * da_r[i];
                }
            }

            dh = dh_prev;
        }

        grad
    }

    /// Apply `f(param, other_param)` to every pair of matching parameters.
    pub(crate) fn zip_apply(&mut self, other: &GruWeights, mut f: impl FnMut(&mut f64, f64)) {
        let vectors = [
            (&mut self.w_z, &other.w_z),
            (&mut self.w_r, &other.w_r),
            (&mut self.w_h, &other.w_h),
            (&mut self.b_z, &other.b_z),
            (&mut self.b_r, &other.b_r),
            (&mut self.b_h, &other.b_h),
            (&mut self.w_out, &other.w_out),
        ];
        for (mine, theirs) in vectors {
            for (a, b) in mine.iter_mut().zip(theirs) {
                f(a, *b);
            }
        }

        let matrices = [
            (&mut self.u_z, &other.u_z),
            (&mut self.u_r, &other.u_r),
            (&mut self.u_h, &other.u_h),
        ];
        for (mine, theirs) in matrices {
            for (row_a, row_b) in mine.iter_mut().zip(theirs) {
                for (a, b) in row_a.iter_mut().zip(row_b) {
                    f(a, *b);
                }
            }
        }

        f(&mut self.b_out, other.b_out);
    }

    /// Euclidean norm over all parameters.
    pub(crate) fn norm(&self) -> f64 {
        let mut sum = 0.0;
        let mut probe = self.clone();
        probe.zip_apply(self, |_, v| sum += v * v);
        sum.sqrt()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        let snapshot = self.clone();
        self.zip_apply(&snapshot, |a, _| *a *= factor);
    }

    /// Total number of scalar parameters.
    pub fn num_params(&self) -> usize {
        let h = self.hidden_size;
        7 * h + 3 * h * h + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn loss(weights: &GruWeights, inputs: &[f64], target: f64) -> f64 {
        (weights.forward(inputs) - target).powi(2)
    }

    #[test]
    fn zero_weights_predict_bias() {
        let mut weights = GruWeights::zeros(4);
        weights.b_out = 0.3;
        assert_relative_eq!(weights.forward(&[1.0, -2.0, 0.5]), 0.3);
    }

    #[test]
    fn cached_forward_matches_plain_forward() {
        let weights = GruWeights::xavier(5, &mut StdRng::seed_from_u64(1));
        let inputs = [0.2, -0.4, 1.1, 0.0, -0.7];
        let (out, caches) = weights.forward_with_cache(&inputs);
        assert_eq!(caches.len(), inputs.len());
        assert_relative_eq!(out, weights.forward(&inputs), epsilon = 1e-15);
    }

    #[test]
    fn xavier_is_seeded_and_bounded() {
        let a = GruWeights::xavier(6, &mut StdRng::seed_from_u64(9));
        let b = GruWeights::xavier(6, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        let limit = (6.0_f64 / 7.0).sqrt();
        assert!(a.w_z.iter().all(|w| w.abs() <= limit));
        assert!(a.b_h.iter().all(|b| *b == 0.0));
        assert_eq!(a.num_params(), 7 * 6 + 3 * 36 + 1);
    }

    #[test]
    fn analytic_gradient_matches_finite_difference() {
        let mut weights = GruWeights::xavier(3, &mut StdRng::seed_from_u64(4));
        weights.b_z = vec![0.1, -0.2, 0.05];
        weights.b_r = vec![-0.1, 0.3, 0.0];
        weights.b_out = 0.2;
        let inputs = [0.5, -1.0, 0.25, 0.8];
        let target = 0.4;

        let (out, caches) = weights.forward_with_cache(&inputs);
        let grad = weights.backward(&caches, 2.0 * (out - target));

        let eps = 1e-6;
        let mut numeric = GruWeights::zeros(3);
        // perturb one parameter at a time through zip_apply's visiting order
        let total = weights.num_params();
        for index in 0..total {
            let perturbed = |delta: f64| {
                let mut w = weights.clone();
                let mut k = 0;
                let snapshot = w.clone();
                w.zip_apply(&snapshot, |a, _| {
                    if k == index {
                        *a += delta;
                    }
                    k += 1;
                });
                loss(&w, &inputs, target)
            };
            let slope = (perturbed(eps) - perturbed(-eps)) / (2.0 * eps);
            let mut k = 0;
            let snapshot = numeric.clone();
            numeric.zip_apply(&snapshot, |a, _| {
                if k == index {
                    *a = slope;
                }
                k += 1;
            });
        }

        let mut max_diff = 0.0_f64;
        let mut probe = grad.clone();
        probe.zip_apply(&numeric, |a, b| max_diff = max_diff.max((*a - b).abs()));
        assert!(max_diff < 1e-6, "max gradient error {max_diff}");
    }

    #[test]
    fn norm_and_scale() {
        let mut weights = GruWeights::zeros(2);
        weights.b_out = 3.0;
        weights.w_out = vec![4.0, 0.0];
        assert_relative_eq!(weights.norm(), 5.0);
        weights.scale(0.5);
        assert_relative_eq!(weights.norm(), 2.5);
    }
}
