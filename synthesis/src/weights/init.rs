use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::TensorSlot;
use crate::Result;

/// Fills a tensor of the flat parameter buffer.
pub trait WeightGen {
    /// Writes the initial values of `slot` into `params`, which is exactly the slot's range.
    fn fill(&mut self, slot: &TensorSlot, params: &mut [f32]) -> Result<()>;
}

/// A weight generator that writes the same value everywhere.
pub struct ConstWeightGen {
    value: f32,
}

impl ConstWeightGen {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl WeightGen for ConstWeightGen {
    fn fill(&mut self, _slot: &TensorSlot, params: &mut [f32]) -> Result<()> {
        params.fill(self.value);
        Ok(())
    }
}

/// Xavier normal initialization for matrices, zeroed biases.
///
/// Recurrent biases get their forget gate opened to 1 so an untrained stack keeps its memory
/// instead of halving it each step.
pub struct XavierWeightGen<R: Rng> {
    rng: R,
}

impl<R: Rng> XavierWeightGen<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> WeightGen for XavierWeightGen<R> {
    fn fill(&mut self, slot: &TensorSlot, params: &mut [f32]) -> Result<()> {
        if slot.is_bias() {
            params.fill(0.0);
            if slot.name.starts_with("lstm.") {
                let hidden = params.len() / 4;
                params[hidden..2 * hidden].fill(1.0);
            }
            return Ok(());
        }

        let fan_out = slot.shape[0];
        let fan_in = slot.shape[1..].iter().product::<usize>();
        let std_dev = (2. / (fan_in + fan_out) as f32).sqrt();
        let normal = Normal::new(0., std_dev)?;

        params
            .iter_mut()
            .for_each(|p| *p = normal.sample(&mut self.rng));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn slot(name: &str, shape: Vec<usize>) -> TensorSlot {
        let size = shape.iter().product();
        TensorSlot {
            name: name.into(),
            shape,
            range: 0..size,
        }
    }

    #[test]
    fn lstm_bias_opens_forget_gate() {
        let slot = slot("lstm.0.bias", vec![8]);
        let mut params = vec![5.0; 8];
        let mut weight_gen = XavierWeightGen::new(StdRng::seed_from_u64(42));
        weight_gen.fill(&slot, &mut params).unwrap();

        assert_eq!(params, [0., 0., 1., 1., 0., 0., 0., 0.]);
    }

    #[test]
    fn matrices_are_seeded() {
        let slot = slot("mdn.weight", vec![4, 6]);
        let mut a = vec![0.0; 24];
        let mut b = vec![0.0; 24];

        XavierWeightGen::new(StdRng::seed_from_u64(7))
            .fill(&slot, &mut a)
            .unwrap();
        XavierWeightGen::new(StdRng::seed_from_u64(7))
            .fill(&slot, &mut b)
            .unwrap();

        assert_eq!(a, b);
        assert!(a.iter().any(|p| *p != 0.0));
    }

    #[test]
    fn const_fills_everything() {
        let slot = slot("window.weight", vec![2, 3]);
        let mut params = vec![0.0; 6];
        ConstWeightGen::new(0.25).fill(&slot, &mut params).unwrap();
        assert!(params.iter().all(|p| *p == 0.25));
    }
}
