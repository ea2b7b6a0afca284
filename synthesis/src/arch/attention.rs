use ndarray::{Array1, Array2, ArrayView1, s};

use super::layers::Dense;
use crate::state::AttentionState;

/// The embedded characters of the text being written, one row per symbol.
#[derive(Debug, Clone)]
pub struct TextContext {
    embeddings: Array2<f32>,
}

impl TextContext {
    pub(crate) fn new(embeddings: Array2<f32>) -> Self {
        Self { embeddings }
    }

    /// Amount of symbols, end-of-text sentinel included.
    pub fn len(&self) -> usize {
        self.embeddings.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }
}

/// A mixture of `K` Gaussian bumps sliding over character positions.
///
/// Every step the bottom recurrent layer emits `(weight, scale, step)` for each component in
/// log space. Locations only move forward: `location_k += exp(step_k)`.
#[derive(Debug, Clone)]
pub struct AttentionWindow {
    components: usize,
    projection: Dense,
}

impl AttentionWindow {
    pub fn new(components: usize, projection: Dense) -> Self {
        Self {
            components,
            projection,
        }
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Computes the window for the current step.
    ///
    /// # Arguments
    /// * `prev` - The window of the previous step.
    /// * `h` - Output of the bottom recurrent layer as of the previous step.
    /// * `text` - The embedded characters.
    ///
    /// # Returns
    /// The new window parameters together with the context vector they read.
    pub fn advance(
        &self,
        prev: &AttentionState,
        h: ArrayView1<f32>,
        text: &TextContext,
    ) -> AttentionState {
        let k = self.components;
        let p = self.projection.forward(h);

        let weight = p.slice(s![0..k]).mapv(f32::exp);
        let scale = p.slice(s![k..2 * k]).mapv(f32::exp);
        let location = &prev.location + &p.slice(s![2 * k..3 * k]).mapv(f32::exp);

        let mut next = AttentionState {
            location,
            scale,
            weight,
            context: Array1::zeros(text.embeddings.ncols()),
        };

        let phi = self.density(&next, text.len());
        next.context = text.embeddings.t().dot(&phi);
        next
    }

    /// Evaluates the window over positions `0..len`.
    pub fn density(&self, state: &AttentionState, len: usize) -> Array1<f32> {
        (0..len)
            .map(|u| {
                let u = u as f32;
                state
                    .weight
                    .iter()
                    .zip(&state.scale)
                    .zip(&state.location)
                    .map(|((alpha, beta), kappa)| alpha * (-beta * (kappa - u).powi(2)).exp())
                    .sum::<f32>()
            })
            .collect()
    }
}
