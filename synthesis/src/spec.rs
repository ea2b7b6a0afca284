use serde::{Deserialize, Serialize};

use crate::{Result, SynthErr};

/// Per-axis statistics the offsets were normalized with at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeNormalization {
    pub mean: [f32; 2],
    pub std: [f32; 2],
}

impl Default for StrokeNormalization {
    fn default() -> Self {
        Self {
            mean: [0.0, 0.0],
            std: [1.0, 1.0],
        }
    }
}

impl StrokeNormalization {
    /// Maps a raw offset into the model's input space.
    pub fn normalize(&self, dx: f32, dy: f32) -> (f32, f32) {
        (
            (dx - self.mean[0]) / self.std[0],
            (dy - self.mean[1]) / self.std[1],
        )
    }

    /// Maps a model-space offset back into drawing units.
    pub fn denormalize(&self, dx: f32, dy: f32) -> (f32, f32) {
        (
            dx * self.std[0] + self.mean[0],
            dy * self.std[1] + self.mean[1],
        )
    }
}

/// The hyperparameters of a handwriting model, agreed at build time and stored next to the
/// weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub layers: usize,
    pub attention_components: usize,
    pub mixture_components: usize,
    /// The characters embedding rows stand for, after the rows the runtime reserves. The
    /// runtime's default alphabet applies when absent.
    #[serde(default)]
    pub alphabet: Option<String>,
    #[serde(default)]
    pub normalization: StrokeNormalization,
}

impl ModelSpec {
    /// Width of a pen state fed back into the recurrence: `(dx, dy, lift)`.
    pub const PEN_DIM: usize = 3;

    /// Returns the input width of the `layer`-th recurrent layer.
    ///
    /// Every layer sees the pen state and the window context, the deeper ones also see the
    /// output of the layer right below them.
    pub fn lstm_input_dim(&self, layer: usize) -> usize {
        let skip = Self::PEN_DIM + self.embedding_dim;
        if layer == 0 {
            skip
        } else {
            skip + self.hidden_dim
        }
    }

    /// Returns the amount of outputs the window projection has.
    pub fn window_dim(&self) -> usize {
        3 * self.attention_components
    }

    /// Returns the amount of outputs the mixture density head has.
    pub fn mdn_dim(&self) -> usize {
        6 * self.mixture_components + 1
    }

    /// Width of the concatenated hidden outputs the head projects from.
    pub fn head_input_dim(&self) -> usize {
        self.layers * self.hidden_dim
    }

    /// Checks every dimension is usable.
    ///
    /// # Returns
    /// An `InvalidSpec` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("vocab_size", self.vocab_size),
            ("embedding_dim", self.embedding_dim),
            ("hidden_dim", self.hidden_dim),
            ("layers", self.layers),
            ("attention_components", self.attention_components),
            ("mixture_components", self.mixture_components),
        ];

        if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(SynthErr::InvalidSpec(format!("{name} must be greater than 0")));
        }

        let std = self.normalization.std;
        if std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SynthErr::InvalidSpec(
                "normalization std must be finite and positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ModelSpec {
        ModelSpec {
            vocab_size: 10,
            embedding_dim: 4,
            hidden_dim: 8,
            layers: 3,
            attention_components: 2,
            mixture_components: 5,
            alphabet: None,
            normalization: StrokeNormalization::default(),
        }
    }

    #[test]
    fn skip_connection_widens_deeper_layers() {
        let spec = spec();
        assert_eq!(spec.lstm_input_dim(0), 3 + 4);
        assert_eq!(spec.lstm_input_dim(1), 3 + 4 + 8);
        assert_eq!(spec.lstm_input_dim(2), 3 + 4 + 8);
        assert_eq!(spec.head_input_dim(), 24);
        assert_eq!(spec.mdn_dim(), 31);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut spec = spec();
        spec.layers = 0;
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("layers"));
    }

    #[test]
    fn normalization_inverts() {
        let norm = StrokeNormalization {
            mean: [0.5, -1.0],
            std: [2.0, 4.0],
        };
        let (x, y) = norm.normalize(3.0, 7.0);
        assert_eq!(norm.denormalize(x, y), (3.0, 7.0));
    }
}
