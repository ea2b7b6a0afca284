use ndarray::{Array1, ArrayView1, s};

use super::Dense;
use crate::{
    Result,
    arch::activations::{Sigmoid, Tanh},
    state::LayerState,
};

/// A single LSTM layer. The four gates share one projection of `[x, h]` and are laid out as
/// input, forget, cell and output.
#[derive(Debug, Clone)]
pub struct Lstm {
    hidden_dim: usize,
    gates: Dense,
}

impl Lstm {
    /// Creates a new `Lstm` from its raw `(4H, in + H)` weights and `4H` biases.
    pub fn new(
        input_dim: usize,
        hidden_dim: usize,
        weights: &[f32],
        biases: &[f32],
    ) -> Result<Self> {
        let gates = Dense::new((input_dim + hidden_dim, 4 * hidden_dim), weights, biases)?;
        Ok(Self { hidden_dim, gates })
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Advances the layer one step.
    ///
    /// # Arguments
    /// * `state` - The layer's previous state, consumed.
    /// * `x` - The layer input for this step.
    ///
    /// # Returns
    /// The next state of the layer.
    pub fn forward(&self, state: LayerState, x: ArrayView1<f32>) -> LayerState {
        let h = self.hidden_dim;
        let xh: Array1<f32> = x.iter().chain(state.h.iter()).copied().collect();
        let z = self.gates.forward(xh.view());

        let sigmoid = Sigmoid;
        let tanh = Tanh;

        let i = z.slice(s![0..h]).mapv(|v| sigmoid.f(v));
        let f = z.slice(s![h..2 * h]).mapv(|v| sigmoid.f(v));
        let g = z.slice(s![2 * h..3 * h]).mapv(|v| tanh.f(v));
        let o = z.slice(s![3 * h..4 * h]).mapv(|v| sigmoid.f(v));

        let c = &f * &state.c + &i * &g;
        let h = &o * &c.mapv(|v| tanh.f(v));

        LayerState { h, c }
    }
}
