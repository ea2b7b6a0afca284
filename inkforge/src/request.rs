use serde::{Deserialize, Serialize};
use synthesis::PenState;

use crate::{
    decoding::Temperature,
    postprocess::{Humanization, Stroke},
};

fn default_temperature() -> f32 {
    1.
}

/// What to write and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub text: String,
    pub style_id: String,
    #[serde(default = "default_temperature")]
    pub offset_temperature: f32,
    #[serde(default = "default_temperature")]
    pub lift_temperature: f32,
    /// Step budget, the configured default when absent.
    #[serde(default)]
    pub max_steps: Option<usize>,
    /// Makes the generation reproducible; one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Wall-clock budget in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Slant, baseline drift and fatigue applied to the finished strokes.
    #[serde(default)]
    pub humanize: Humanization,
}

impl GenerationRequest {
    pub fn new(text: &str, style_id: &str) -> Self {
        Self {
            text: text.to_string(),
            style_id: style_id.to_string(),
            offset_temperature: default_temperature(),
            lift_temperature: default_temperature(),
            max_steps: None,
            seed: None,
            deadline_ms: None,
            humanize: Humanization::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_temperature(mut self, offset: f32, lift: f32) -> Self {
        self.offset_temperature = offset;
        self.lift_temperature = lift;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_humanize(mut self, humanize: Humanization) -> Self {
        self.humanize = humanize;
        self
    }

    pub fn temperature(&self) -> Temperature {
        Temperature::new(self.offset_temperature, self.lift_temperature)
    }
}

/// Everything a generation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub strokes: Vec<Stroke>,
    /// The raw offsets in drawing units, starting with the origin.
    pub trace: Vec<PenState>,
    pub truncated: bool,
    pub steps_used: usize,
    /// Characters of the text the window moved past.
    pub characters_consumed: usize,
    /// The seed the generation ran with, whether requested or drawn.
    pub seed: u64,
    /// The average window location after every step.
    pub alignment: Vec<f32>,
    /// Whether the generation diverged once and was run again with capped temperatures.
    pub retried: bool,
}

impl GenerationResult {
    /// The result of a text with no characters.
    pub fn empty(seed: u64) -> Self {
        Self {
            strokes: Vec::new(),
            trace: Vec::new(),
            truncated: false,
            steps_used: 0,
            characters_consumed: 0,
            seed,
            alignment: Vec::new(),
            retried: false,
        }
    }

    pub fn response(&self) -> GenerationResponse {
        GenerationResponse {
            strokes: self.strokes.clone(),
            truncated: self.truncated,
            steps_used: self.steps_used,
            seed: self.seed,
        }
    }
}

/// The wire form of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub strokes: Vec<Stroke>,
    pub truncated: bool,
    pub steps_used: usize,
    pub seed: u64,
}
