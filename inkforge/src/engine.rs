use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use synthesis::{HandwritingModel, ModelWeights};
use tokio_util::sync::CancellationToken;

use crate::{
    InkErr, Result,
    config::{DecodingConfig, EngineConfig},
    decoding::{DecodeOptions, DecodeStatus, Decoded, Decoder, Temperature},
    postprocess::{PostProcessor, denormalize},
    request::{GenerationRequest, GenerationResult},
    styles::{DirectorySource, StyleSource, StyleStore},
    vocab::Vocabulary,
};

/// The entry point of generation: owns the model, the style cache and the vocabulary, and
/// turns requests into strokes.
///
/// Shared by reference across threads; every request runs on its own state.
pub struct Engine {
    model: Arc<HandwritingModel>,
    vocab: Arc<Vocabulary>,
    styles: StyleStore,
    postprocessor: PostProcessor,
    config: EngineConfig,
}

impl Engine {
    /// Creates a new `Engine`.
    ///
    /// # Arguments
    /// * `model` - The network.
    /// * `source` - Where styles are read from.
    /// * `config` - Decoding and post-processing settings.
    ///
    /// # Returns
    /// The engine or a `Config` error if the settings are invalid or the model's embedding
    /// table doesn't match its alphabet one row per symbol.
    pub fn new<S: StyleSource + 'static>(
        model: HandwritingModel,
        source: S,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let vocab = match &model.spec().alphabet {
            Some(alphabet) => Vocabulary::new(alphabet)?,
            None => Vocabulary::default(),
        };

        let vocab_size = model.spec().vocab_size;
        if vocab.size() != vocab_size {
            return Err(InkErr::Config(format!(
                "the model knows {vocab_size} symbols but the vocabulary has {}",
                vocab.size()
            )));
        }

        let model = Arc::new(model);
        let vocab = Arc::new(vocab);

        Ok(Self {
            styles: StyleStore::new(source, model.clone(), vocab.clone()),
            postprocessor: PostProcessor::new(config.postprocess.clone()),
            model,
            vocab,
            config,
        })
    }

    /// Loads the weights and styles the config points at.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let weights = ModelWeights::load(&config.weights_path)?;
        let model = HandwritingModel::new(&weights)?;
        let source = DirectorySource::new(&config.styles_dir);

        info!(
            params = weights.params().len();
            "engine ready, styles from {}",
            config.styles_dir.display()
        );
        Self::new(model, source, config)
    }

    pub fn model(&self) -> &HandwritingModel {
        &self.model
    }

    pub fn styles(&self) -> &StyleStore {
        &self.styles
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates handwriting for `request` to completion.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.generate_with(request, &CancellationToken::new())
    }

    /// Generates handwriting for `request`, giving up at the next step once `cancel` fires.
    ///
    /// The request is validated and its style resolved before the first step. A divergence is
    /// retried once with capped temperatures when the config allows it.
    pub fn generate_with(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let (temperature, max_steps) = self.check(request)?;
        let style = self.styles.load(&request.style_id)?;
        let sequence = self.vocab.encode(&request.text);
        let seed = request.seed.unwrap_or_else(|| rand::rng().random());

        if sequence.is_empty() {
            return Ok(GenerationResult::empty(seed));
        }

        let text = self.model.embed(sequence.symbols())?;
        let base = DecodeOptions {
            temperature,
            max_steps,
            end_of_text_slack: self.config.decoding.end_of_text_slack,
            deadline: request
                .deadline_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        };

        debug!(
            style = style.id.as_str(),
            chars = sequence.text_len(),
            seed = seed,
            max_steps = max_steps;
            "generating"
        );

        let decode = |temperature| {
            let options = DecodeOptions {
                temperature,
                ..base.clone()
            };
            Decoder::new(&self.model, &text, &options).run(style.bias.clone(), seed, cancel)
        };
        let (decoded, retried) = retry_diverged(&self.config.decoding, temperature, decode)?;

        let text_len = sequence.text_len();
        let characters_consumed = match decoded.status {
            DecodeStatus::Done => text_len,
            _ => (decoded.final_location().max(0.) as usize).min(text_len),
        };

        let trace = denormalize(&decoded.trace, &self.model.spec().normalization);
        let strokes = self
            .postprocessor
            .process_with(&trace, &request.humanize, seed);

        debug!(
            style = style.id.as_str(),
            steps = decoded.steps_used(),
            strokes = strokes.len(),
            truncated = decoded.status == DecodeStatus::Truncated;
            "generated"
        );

        Ok(GenerationResult {
            strokes,
            truncated: decoded.status == DecodeStatus::Truncated,
            steps_used: decoded.steps_used(),
            characters_consumed,
            seed,
            alignment: decoded.alignment,
            retried,
            trace,
        })
    }

    /// Runs independent requests in parallel, results in request order.
    pub fn generate_batch(&self, requests: &[GenerationRequest]) -> Vec<Result<GenerationResult>> {
        requests.par_iter().map(|r| self.generate(r)).collect()
    }

    fn check(&self, request: &GenerationRequest) -> Result<(Temperature, usize)> {
        let temperature = request.temperature();
        temperature.check().map_err(InkErr::InvalidRequest)?;
        request.humanize.check().map_err(InkErr::InvalidRequest)?;

        let max_steps = request
            .max_steps
            .unwrap_or(self.config.decoding.default_max_steps);
        if max_steps == 0 {
            return Err(InkErr::InvalidRequest(
                "max_steps must be greater than 0".into(),
            ));
        }

        let len = request.text.chars().count();
        let max_len = self.config.decoding.max_text_len;
        if len > max_len {
            return Err(InkErr::InvalidRequest(format!(
                "text has {len} characters, at most {max_len} are accepted"
            )));
        }

        Ok((temperature, max_steps))
    }
}

/// Runs `decode` and, on divergence, once more with the temperature capped at
/// `retry_temperature`.
///
/// # Returns
/// The decoded trace and whether it took a retry.
fn retry_diverged<F>(
    config: &DecodingConfig,
    temperature: Temperature,
    mut decode: F,
) -> Result<(Decoded, bool)>
where
    F: FnMut(Temperature) -> Result<Decoded>,
{
    match decode(temperature) {
        Err(InkErr::GenerationDiverged { step }) if config.retry_on_divergence => {
            let capped = temperature.capped(config.retry_temperature);
            warn!(step = step, temperature = capped.offset; "generation diverged, retrying");
            decode(capped).map(|decoded| (decoded, true))
        }
        other => other.map(|decoded| (decoded, false)),
    }
}
