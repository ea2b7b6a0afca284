use std::ops::Range;

use crate::spec::ModelSpec;

/// A named tensor inside the flat parameter buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSlot {
    pub name: String,
    pub shape: Vec<usize>,
    pub range: Range<usize>,
}

impl TensorSlot {
    /// Whether the tensor is a bias vector.
    pub fn is_bias(&self) -> bool {
        self.shape.len() == 1
    }
}

/// Maps a flat parameter buffer into named tensors.
///
/// Tensors are laid out back to back in declaration order: the embedding, every recurrent
/// layer (weight then bias), the window projection and the mixture density head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    slots: Vec<TensorSlot>,
    len: usize,
}

impl ParameterLayout {
    pub fn new(spec: &ModelSpec) -> Self {
        let h = spec.hidden_dim;
        let mut shapes = vec![(
            "embedding".to_string(),
            vec![spec.vocab_size, spec.embedding_dim],
        )];

        for layer in 0..spec.layers {
            let fan_in = spec.lstm_input_dim(layer) + h;
            shapes.push((format!("lstm.{layer}.weight"), vec![4 * h, fan_in]));
            shapes.push((format!("lstm.{layer}.bias"), vec![4 * h]));
        }

        shapes.push(("window.weight".into(), vec![spec.window_dim(), h]));
        shapes.push(("window.bias".into(), vec![spec.window_dim()]));
        shapes.push((
            "mdn.weight".into(),
            vec![spec.mdn_dim(), spec.head_input_dim()],
        ));
        shapes.push(("mdn.bias".into(), vec![spec.mdn_dim()]));

        let mut len = 0;
        let slots = shapes
            .into_iter()
            .map(|(name, shape)| {
                let size: usize = shape.iter().product();
                let range = len..len + size;
                len += size;
                TensorSlot { name, shape, range }
            })
            .collect();

        Self { slots, len }
    }

    /// Returns the total amount of parameters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slots(&self) -> &[TensorSlot] {
        &self.slots
    }

    /// Looks up a tensor by name.
    pub fn slot(&self, name: &str) -> Option<&TensorSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}
