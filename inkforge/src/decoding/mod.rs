mod decoder;
pub mod priming;
mod sampler;

pub use decoder::{DecodeOptions, DecodeStatus, Decoded, Decoder};
pub use sampler::{Sampler, Temperature, lift_probability};
