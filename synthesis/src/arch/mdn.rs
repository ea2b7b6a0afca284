use ndarray::{Array1, ArrayView1, s};

use super::{
    activations::{Sigmoid, softmax},
    layers::Dense,
};

/// Lower bound of every emitted standard deviation.
pub const SIGMA_EPS: f32 = 1e-4;

/// Bound on the magnitude of every emitted correlation.
pub const RHO_MAX: f32 = 1. - 1e-5;

/// `exp` floored at `SIGMA_EPS`. `f32::max` would turn a NaN logit into the floor.
fn sigma(logit: f32) -> f32 {
    if logit.is_nan() {
        logit
    } else {
        logit.exp().max(SIGMA_EPS)
    }
}

/// A bivariate Gaussian mixture over the next offset plus the pen-lift probability.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParams {
    /// Mixture weights, summing to one.
    pub pi: Array1<f32>,
    pub mu_x: Array1<f32>,
    pub mu_y: Array1<f32>,
    /// Standard deviations, at least `SIGMA_EPS`.
    pub sigma_x: Array1<f32>,
    pub sigma_y: Array1<f32>,
    /// Correlations, strictly inside (-1, 1).
    pub rho: Array1<f32>,
    pub lift: f32,
}

impl MixtureParams {
    pub fn components(&self) -> usize {
        self.pi.len()
    }

    /// Whether any parameter overflowed or turned into NaN.
    pub fn is_finite(&self) -> bool {
        let arrays = [
            &self.pi,
            &self.mu_x,
            &self.mu_y,
            &self.sigma_x,
            &self.sigma_y,
            &self.rho,
        ];

        self.lift.is_finite() && arrays.iter().all(|a| a.iter().all(|v| v.is_finite()))
    }
}

/// Projects the recurrent outputs to mixture parameters.
///
/// The raw projection of width `6M + 1` is read as `[pi, mu_x, mu_y, sigma_x, sigma_y, rho,
/// lift]`, each block `M` wide except the last scalar.
#[derive(Debug, Clone)]
pub struct MixtureDensityHead {
    components: usize,
    projection: Dense,
}

impl MixtureDensityHead {
    pub fn new(components: usize, projection: Dense) -> Self {
        Self {
            components,
            projection,
        }
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn forward(&self, outputs: ArrayView1<f32>) -> MixtureParams {
        let m = self.components;
        let y = self.projection.forward(outputs);
        let block = |i: usize| y.slice(s![i * m..(i + 1) * m]);

        MixtureParams {
            pi: softmax(block(0)),
            mu_x: block(1).to_owned(),
            mu_y: block(2).to_owned(),
            sigma_x: block(3).mapv(sigma),
            sigma_y: block(4).mapv(sigma),
            rho: block(5).mapv(|v| v.tanh().clamp(-RHO_MAX, RHO_MAX)),
            lift: Sigmoid.f(y[6 * m]),
        }
    }
}
