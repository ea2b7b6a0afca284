pub mod activations;
pub mod attention;
pub mod layers;
pub mod mdn;
pub mod model;
pub mod recurrent;

pub use attention::{AttentionWindow, TextContext};
pub use mdn::{MixtureDensityHead, MixtureParams, RHO_MAX, SIGMA_EPS};
pub use model::{HandwritingModel, StepOutput};
pub use recurrent::RecurrentCore;
