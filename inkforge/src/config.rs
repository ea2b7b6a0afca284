use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{InkErr, Result};

/// Points at the config file.
pub const CONFIG_ENV: &str = "INKFORGE_CONFIG";
/// Overrides `weights_path`.
pub const WEIGHTS_ENV: &str = "INKFORGE_WEIGHTS";
/// Overrides `styles_dir`.
pub const STYLES_ENV: &str = "INKFORGE_STYLES";

/// Largest slant the post-processor applies, in degrees either way.
pub const MAX_SLANT_DEGREES: f32 = 30.;

/// Smallest resampling spacing accepted, in drawing units.
pub const MIN_RESAMPLE_SPACING: f32 = 1e-3;

/// Bounds and policies of the decoding loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    pub end_of_text_slack: f32,
    /// Budget of requests that don't bring their own.
    pub default_max_steps: usize,
    /// Whether a diverged generation is tried again with capped temperatures.
    pub retry_on_divergence: bool,
    pub retry_temperature: f32,
    /// Longest text accepted, in characters.
    pub max_text_len: usize,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            end_of_text_slack: 0.5,
            default_max_steps: 1200,
            retry_on_divergence: true,
            retry_temperature: 0.01,
            max_text_len: 2000,
        }
    }
}

/// Geometry applied to generated strokes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    /// Resamples every stroke to this arc-length spacing when set.
    pub resample_spacing: Option<f32>,
    /// Width of the moving average, `0` or `1` to disable.
    pub smoothing_window: usize,
    /// Shear applied to the whole drawing, clamped to `MAX_SLANT_DEGREES`.
    pub slant_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights_path: PathBuf,
    pub styles_dir: PathBuf,
    pub decoding: DecodingConfig,
    pub postprocess: PostProcessConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("model.safetensors"),
            styles_dir: PathBuf::from("styles"),
            decoding: DecodingConfig::default(),
            postprocess: PostProcessConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file; missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the config from the environment: the file at `INKFORGE_CONFIG` if set, then the
    /// path overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(path) = env::var_os(WEIGHTS_ENV) {
            config.weights_path = path.into();
        }
        if let Some(dir) = env::var_os(STYLES_ENV) {
            config.styles_dir = dir.into();
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks every bound is usable.
    ///
    /// # Returns
    /// A `Config` error describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        let decoding = &self.decoding;
        let post = &self.postprocess;

        let slack = decoding.end_of_text_slack;

        let problem = if !(slack.is_finite() && slack >= 0.) {
            Some("decoding.end_of_text_slack must be finite and non-negative")
        } else if decoding.default_max_steps == 0 {
            Some("decoding.default_max_steps must be greater than 0")
        } else if !(decoding.retry_temperature.is_finite() && decoding.retry_temperature > 0.) {
            Some("decoding.retry_temperature must be finite and positive")
        } else if decoding.max_text_len == 0 {
            Some("decoding.max_text_len must be greater than 0")
        } else if post
            .resample_spacing
            .is_some_and(|s| !(s.is_finite() && s >= MIN_RESAMPLE_SPACING))
        {
            Some("postprocess.resample_spacing must be finite and at least 0.001")
        } else if !post.slant_degrees.is_finite() {
            Some("postprocess.slant_degrees must be finite")
        } else {
            None
        };

        match problem {
            Some(msg) => Err(InkErr::Config(msg.into())),
            None => Ok(()),
        }
    }
}
