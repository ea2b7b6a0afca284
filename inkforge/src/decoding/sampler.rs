use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, weighted::WeightedIndex};
use serde::{Deserialize, Serialize};
use synthesis::{
    MixtureParams, PenState,
    arch::activations::{Sigmoid, softmax},
};

/// How much randomness each half of a sample keeps.
///
/// `0` makes that half deterministic: the heaviest component's mean for the offset and a
/// `p > 0.5` threshold for the lift. `1` samples the model's distribution as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub offset: f32,
    pub lift: f32,
}

impl Default for Temperature {
    fn default() -> Self {
        Self::uniform(1.)
    }
}

impl Temperature {
    pub fn new(offset: f32, lift: f32) -> Self {
        Self { offset, lift }
    }

    pub fn uniform(t: f32) -> Self {
        Self::new(t, t)
    }

    /// Why this temperature is unusable, if it is.
    pub fn check(&self) -> Result<(), String> {
        for (name, t) in [("offset", self.offset), ("lift", self.lift)] {
            if !t.is_finite() || t < 0. {
                return Err(format!(
                    "{name} temperature must be finite and non-negative, got {t}"
                ));
            }
        }
        Ok(())
    }

    /// Caps both temperatures at `floor`.
    pub fn capped(&self, floor: f32) -> Self {
        Self::new(self.offset.min(floor), self.lift.min(floor))
    }
}

/// Draws pen states from mixture parameters with a seeded generator.
///
/// For a given temperature every call consumes the same amount of random values, so two
/// samplers with the same seed stay in lockstep whatever the model outputs.
pub struct Sampler<R: Rng> {
    rng: R,
    temperature: Temperature,
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R, temperature: Temperature) -> Self {
        Self { rng, temperature }
    }

    /// Samples the next pen state.
    ///
    /// # Returns
    /// The point, or `None` if the parameters can't be sampled or yield a non-finite offset.
    pub fn sample(&mut self, params: &MixtureParams) -> Option<PenState> {
        let (dx, dy) = self.offset(params)?;
        let lift = self.lift(params.lift);
        Some(PenState::new(dx, dy, lift)).filter(PenState::is_finite)
    }

    fn offset(&mut self, params: &MixtureParams) -> Option<(f32, f32)> {
        let t = self.temperature.offset;

        if t == 0. {
            let k = argmax(&params.pi)?;
            return Some((params.mu_x[k], params.mu_y[k]));
        }

        let weights = softmax(params.pi.mapv(|p| p.ln() / t).view());
        let k = WeightedIndex::new(weights.iter().copied())
            .ok()?
            .sample(&mut self.rng);

        let spread = t.sqrt();
        let (sx, sy, rho) = (
            params.sigma_x[k] * spread,
            params.sigma_y[k] * spread,
            params.rho[k],
        );

        let z1: f32 = StandardNormal.sample(&mut self.rng);
        let z2: f32 = StandardNormal.sample(&mut self.rng);

        Some((
            params.mu_x[k] + sx * z1,
            params.mu_y[k] + sy * (rho * z1 + (1. - rho * rho).sqrt() * z2),
        ))
    }

    fn lift(&mut self, p: f32) -> bool {
        let t = self.temperature.lift;

        if t == 0. {
            return p > 0.5;
        }

        let u: f32 = self.rng.random();
        u < lift_probability(p, t)
    }
}

/// Sharpens (`t < 1`) or flattens (`t > 1`) a Bernoulli probability through its logit.
pub fn lift_probability(p: f32, t: f32) -> f32 {
    let logit = p.ln() - (1. - p).ln();
    Sigmoid.f(logit / t)
}

/// Index of the largest value, the first one on ties.
fn argmax(values: &Array1<f32>) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn params() -> MixtureParams {
        MixtureParams {
            pi: array![0.3, 0.7],
            mu_x: array![-2., 1.],
            mu_y: array![0., 0.5],
            sigma_x: array![1., 2.],
            sigma_y: array![1., 1.5],
            rho: array![0., 0.4],
            lift: 0.3,
        }
    }

    fn variance(t: f32) -> f32 {
        let mut sampler = Sampler::new(StdRng::seed_from_u64(9), Temperature::new(t, 1.));
        let xs: Vec<f32> = (0..4000)
            .map(|_| sampler.sample(&params()).unwrap().dx)
            .collect();
        let mean = xs.iter().sum::<f32>() / xs.len() as f32;
        xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / xs.len() as f32
    }

    #[test]
    fn zero_temperature_is_the_mode() {
        let mut sampler = Sampler::new(StdRng::seed_from_u64(1), Temperature::uniform(0.));
        for _ in 0..5 {
            assert_eq!(sampler.sample(&params()), Some(PenState::new(1., 0.5, false)));
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let draw = || {
            let mut sampler = Sampler::new(StdRng::seed_from_u64(42), Temperature::default());
            (0..50)
                .map(|_| sampler.sample(&params()).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn variance_shrinks_with_temperature() {
        let variances: Vec<f32> = [1., 0.5, 0.1, 0.01].into_iter().map(variance).collect();
        assert!(variances.windows(2).all(|w| w[0] > w[1]), "{variances:?}");
    }

    #[test]
    fn lift_temperature_sharpens() {
        assert!((lift_probability(0.3, 1.) - 0.3).abs() < 1e-6);
        assert!(lift_probability(0.3, 0.1) < 0.01);
        assert!((lift_probability(0.3, 100.) - 0.5).abs() < 0.01);
        assert_eq!(lift_probability(1., 0.5), 1.);
        assert_eq!(lift_probability(0., 0.5), 0.);
    }

    #[test]
    fn non_finite_offsets_are_rejected() {
        let mut params = params();
        params.sigma_x = array![f32::INFINITY, f32::INFINITY];
        let mut sampler = Sampler::new(StdRng::seed_from_u64(3), Temperature::default());
        assert_eq!(sampler.sample(&params), None);
    }

    #[test]
    fn temperature_checks() {
        assert!(Temperature::uniform(0.).check().is_ok());
        assert!(Temperature::new(-0.1, 1.).check().is_err());
        assert!(Temperature::new(1., f32::NAN).check().is_err());
        assert_eq!(Temperature::new(1., 0.).capped(0.01), Temperature::new(0.01, 0.));
    }
}
