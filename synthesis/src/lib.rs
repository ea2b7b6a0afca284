//! The numeric core of handwriting synthesis: the model hyperparameters, its weights and the
//! pure per-step network that turns a pen state and a text into a distribution over the next
//! pen state.

pub mod arch;
mod error;
pub mod pen;
pub mod spec;
pub mod state;
pub mod weights;

pub use arch::{HandwritingModel, MixtureParams, StepOutput, TextContext};
pub use error::{Result, SynthErr};
pub use pen::PenState;
pub use spec::{ModelSpec, StrokeNormalization};
pub use state::{AttentionState, HiddenState, LayerState, ModelState};
pub use weights::ModelWeights;
