#![allow(dead_code)]

use inkforge::{
    Engine, EngineConfig, PenState, Vocabulary,
    styles::{MemorySource, PrimingSample, StyleDefinition},
};
use synthesis::{HandwritingModel, ModelSpec, ModelWeights, StrokeNormalization};

pub fn spec(attention_components: usize, mixture_components: usize) -> ModelSpec {
    ModelSpec {
        vocab_size: Vocabulary::default().size(),
        embedding_dim: 8,
        hidden_dim: 16,
        layers: 2,
        attention_components,
        mixture_components,
        alphabet: None,
        normalization: StrokeNormalization::default(),
    }
}

pub fn styles() -> MemorySource {
    let loopy = StyleDefinition {
        name: Some("Loopy".into()),
        description: Some("round cursive".into()),
        priming: Some(PrimingSample {
            text: "lo".into(),
            strokes: vec![
                PenState::origin(),
                PenState::new(0.6, 1.2, false),
                PenState::new(0.4, -1.1, false),
                PenState::new(0.3, 0.2, true),
                PenState::new(0.5, 0.4, false),
            ],
        }),
    };

    MemorySource::new()
        .with("plain", StyleDefinition::default())
        .with("loopy", loopy)
}

/// A hand-built model whose every step emits the offset `(1, 0.5)` without lifting and moves
/// the window by exactly one character.
pub fn golden_weights() -> ModelWeights {
    let mut weights = ModelWeights::zeros(spec(1, 1)).unwrap();
    weights
        .tensor_mut("mdn.bias")
        .unwrap()
        .copy_from_slice(&[0., 1., 0.5, 0., 0., 0., -5.]);
    weights
}

/// Like `golden_weights` but centred at zero with unit spread, and a window that creeps by
/// `window_step` characters per step.
pub fn noise_weights(window_step: f32) -> ModelWeights {
    let mut weights = ModelWeights::zeros(spec(1, 1)).unwrap();
    weights
        .tensor_mut("mdn.bias")
        .unwrap()
        .copy_from_slice(&[0., 0., 0., 0., 0., 0., -5.]);
    weights
        .tensor_mut("window.bias")
        .unwrap()
        .copy_from_slice(&[0., 0., window_step.ln()]);
    weights
}

pub fn random_weights() -> ModelWeights {
    ModelWeights::random(spec(3, 4), 7).unwrap()
}

pub fn engine(weights: &ModelWeights) -> Engine {
    engine_with(weights, EngineConfig::default())
}

pub fn engine_with(weights: &ModelWeights, config: EngineConfig) -> Engine {
    let model = HandwritingModel::new(weights).unwrap();
    Engine::new(model, styles(), config).unwrap()
}
