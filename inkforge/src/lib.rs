//! Handwriting synthesis: text and a style in, pen strokes out.
//!
//! The [`Engine`] ties the pieces together. A request is validated, its style is resolved
//! through the [`StyleStore`] cache, the text is encoded by the [`Vocabulary`], the
//! [`Decoder`](decoding::Decoder) samples one pen state per step until the attention window
//! moves past the text, and the [`PostProcessor`] turns the offsets into strokes.

pub mod config;
pub mod decoding;
pub mod engine;
mod error;
pub mod postprocess;
pub mod request;
pub mod styles;
pub mod vocab;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{InkErr, Result};
pub use postprocess::{Humanization, PostProcessor, Stroke};
pub use request::{GenerationRequest, GenerationResponse, GenerationResult};
pub use styles::{StyleProfile, StyleStore};
pub use synthesis::PenState;
pub use vocab::{CharacterSequence, Vocabulary};
