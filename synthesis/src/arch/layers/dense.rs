use ndarray::{Array1, Array2, ArrayView1};

use crate::{Result, SynthErr};

/// A fully connected projection `y = W x + b` with `W` stored as `(out, in)`.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    w: Array2<f32>,
    b: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` copying its parameters out of raw slices.
    ///
    /// # Arguments
    /// * `dim` - The input and output sizes.
    /// * `weights` - Row-major `(out, in)` weights.
    /// * `biases` - One bias per output.
    ///
    /// # Returns
    /// The layer or a `SizeMismatch` if the slices don't match `dim`.
    pub fn new(dim: (usize, usize), weights: &[f32], biases: &[f32]) -> Result<Self> {
        let (dim_in, dim_out) = dim;

        if weights.len() != dim_in * dim_out {
            return Err(SynthErr::SizeMismatch {
                what: "dense weights",
                got: weights.len(),
                expected: dim_in * dim_out,
            });
        }

        if biases.len() != dim_out {
            return Err(SynthErr::SizeMismatch {
                what: "dense biases",
                got: biases.len(),
                expected: dim_out,
            });
        }

        let w = Array2::from_shape_vec((dim_out, dim_in), weights.to_vec())?;
        let b = Array1::from_vec(biases.to_vec());

        Ok(Self { dim, w, b })
    }

    /// Returns the input and output sizes.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    pub fn forward(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.w.dot(&x) + &self.b
    }
}
