use ndarray::Array1;

use crate::spec::ModelSpec;

/// The memory of a single recurrent layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub h: Array1<f32>,
    pub c: Array1<f32>,
}

impl LayerState {
    pub fn zeros(hidden_dim: usize) -> Self {
        Self {
            h: Array1::zeros(hidden_dim),
            c: Array1::zeros(hidden_dim),
        }
    }

    fn is_finite(&self) -> bool {
        self.h.iter().chain(self.c.iter()).all(|v| v.is_finite())
    }
}

/// The recurrent memory of the whole stack, one entry per layer.
///
/// Owned by a single generation; a style's primed state is cloned into each request, never
/// shared mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenState {
    layers: Vec<LayerState>,
}

impl HiddenState {
    pub fn zeros(spec: &ModelSpec) -> Self {
        Self {
            layers: (0..spec.layers)
                .map(|_| LayerState::zeros(spec.hidden_dim))
                .collect(),
        }
    }

    pub(crate) fn from_layers(layers: Vec<LayerState>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerState] {
        &self.layers
    }

    pub(crate) fn into_layers(self) -> Vec<LayerState> {
        self.layers
    }

    /// Output of the bottom layer, which drives the attention window.
    pub fn first(&self) -> &LayerState {
        &self.layers[0]
    }

    /// Concatenation of every layer's output, bottom first.
    pub fn outputs(&self) -> Array1<f32> {
        self.layers
            .iter()
            .flat_map(|layer| layer.h.iter().copied())
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(LayerState::is_finite)
    }
}

/// Per-step parameters of the soft window over the character sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionState {
    /// Centre of every component in character positions. Never decreases.
    pub location: Array1<f32>,
    /// Inverse width of every component.
    pub scale: Array1<f32>,
    /// Importance of every component.
    pub weight: Array1<f32>,
    /// Weighted mixture of character embeddings the window currently reads.
    pub context: Array1<f32>,
}

impl AttentionState {
    pub fn zeros(spec: &ModelSpec) -> Self {
        let k = spec.attention_components;
        Self {
            location: Array1::zeros(k),
            scale: Array1::zeros(k),
            weight: Array1::zeros(k),
            context: Array1::zeros(spec.embedding_dim),
        }
    }

    /// The average location of the window components.
    ///
    /// The components are averaged with equal weight: each location is monotonic, so their
    /// mean is as well, whereas a mean weighted by the per-step `weight` could move backwards.
    pub fn mean_location(&self) -> f32 {
        self.location.mean().unwrap_or_default()
    }
}

/// Everything a generation carries from one step to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    pub hidden: HiddenState,
    pub attention: AttentionState,
    pub step: usize,
}

impl ModelState {
    /// Zero memory, window at the start of the text.
    pub fn initial(spec: &ModelSpec) -> Self {
        Self::primed(spec, HiddenState::zeros(spec))
    }

    /// Starts from an existing recurrent memory with the window reset to the start of the
    /// text.
    pub fn primed(spec: &ModelSpec, hidden: HiddenState) -> Self {
        Self {
            hidden,
            attention: AttentionState::zeros(spec),
            step: 0,
        }
    }
}
