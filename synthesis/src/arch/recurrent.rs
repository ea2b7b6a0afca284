use ndarray::ArrayView1;

use super::layers::Lstm;
use crate::state::{HiddenState, LayerState};

/// A stack of LSTM layers with skip connections: the pen input and the window context reach
/// every layer, not only the bottom one, and layers above the first also see the output of the
/// layer right below.
#[derive(Debug, Clone)]
pub struct RecurrentCore {
    layers: Vec<Lstm>,
}

impl RecurrentCore {
    pub fn new(layers: Vec<Lstm>) -> Self {
        Self { layers }
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Advances every layer one step.
    ///
    /// # Arguments
    /// * `hidden` - The memory as of the previous step, consumed.
    /// * `pen` - The pen input of this step.
    /// * `context` - The attention context of this step.
    ///
    /// # Returns
    /// The memory after this step.
    pub fn forward(
        &self,
        hidden: HiddenState,
        pen: &[f32],
        context: ArrayView1<f32>,
    ) -> HiddenState {
        let mut next: Vec<LayerState> = Vec::with_capacity(self.layers.len());

        for (lstm, state) in self.layers.iter().zip(hidden.into_layers()) {
            let mut x: Vec<f32> = pen.iter().chain(context.iter()).copied().collect();
            if let Some(below) = next.last() {
                x.extend(below.h.iter());
            }

            next.push(lstm.forward(state, ArrayView1::from(&x)));
        }

        HiddenState::from_layers(next)
    }
}
