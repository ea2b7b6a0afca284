use ndarray::Array2;

use super::{
    attention::{AttentionWindow, TextContext},
    layers::{Dense, Lstm},
    mdn::{MixtureDensityHead, MixtureParams},
    recurrent::RecurrentCore,
};
use crate::{
    Result, SynthErr,
    pen::PenState,
    spec::ModelSpec,
    state::{HiddenState, ModelState},
    weights::ModelWeights,
};

/// What a single step of the model yields.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// The state to feed into the next step.
    pub state: ModelState,
    /// The distribution over the next pen state.
    pub mixture: MixtureParams,
}

/// The full handwriting network: character embedding, attention window, recurrent core and
/// mixture density head.
///
/// Immutable once built, so a single instance can be shared by every concurrent generation.
#[derive(Debug, Clone)]
pub struct HandwritingModel {
    spec: ModelSpec,
    embedding: Array2<f32>,
    window: AttentionWindow,
    core: RecurrentCore,
    head: MixtureDensityHead,
}

impl HandwritingModel {
    /// Builds the network out of its named tensors.
    ///
    /// # Arguments
    /// * `weights` - The parameters of every layer.
    ///
    /// # Returns
    /// The model or an error if a tensor is missing or has the wrong size.
    pub fn new(weights: &ModelWeights) -> Result<Self> {
        let spec = weights.spec().clone();
        spec.validate()?;

        let h = spec.hidden_dim;
        let embedding = Array2::from_shape_vec(
            (spec.vocab_size, spec.embedding_dim),
            weights.tensor("embedding")?.to_vec(),
        )?;

        let layers = (0..spec.layers)
            .map(|l| {
                Lstm::new(
                    spec.lstm_input_dim(l),
                    h,
                    weights.tensor(&format!("lstm.{l}.weight"))?,
                    weights.tensor(&format!("lstm.{l}.bias"))?,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let window = Dense::new(
            (h, spec.window_dim()),
            weights.tensor("window.weight")?,
            weights.tensor("window.bias")?,
        )?;

        let head = Dense::new(
            (spec.head_input_dim(), spec.mdn_dim()),
            weights.tensor("mdn.weight")?,
            weights.tensor("mdn.bias")?,
        )?;

        Ok(Self {
            window: AttentionWindow::new(spec.attention_components, window),
            core: RecurrentCore::new(layers),
            head: MixtureDensityHead::new(spec.mixture_components, head),
            embedding,
            spec,
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Looks up the embedding of every symbol.
    ///
    /// # Returns
    /// The text the window slides over or `SymbolOutOfRange` for an id the model doesn't know.
    pub fn embed(&self, symbols: &[usize]) -> Result<TextContext> {
        let vocab_size = self.spec.vocab_size;
        let mut embeddings = Array2::zeros((symbols.len(), self.spec.embedding_dim));

        for (row, &symbol) in symbols.iter().enumerate() {
            if symbol >= vocab_size {
                return Err(SynthErr::SymbolOutOfRange { symbol, vocab_size });
            }
            embeddings.row_mut(row).assign(&self.embedding.row(symbol));
        }

        Ok(TextContext::new(embeddings))
    }

    /// Zero memory with the window at the first character.
    pub fn initial_state(&self) -> ModelState {
        ModelState::initial(&self.spec)
    }

    /// Runs one timestep.
    ///
    /// The window is placed from the bottom layer's output of the previous step, then every
    /// recurrent layer advances with the pen input and the new context, and finally the head
    /// reads all layer outputs.
    ///
    /// # Arguments
    /// * `state` - The state after the previous step, consumed.
    /// * `input` - The previous pen state, in model space.
    /// * `text` - The embedded text.
    pub fn step(&self, state: ModelState, input: &PenState, text: &TextContext) -> StepOutput {
        let attention = self
            .window
            .advance(&state.attention, state.hidden.first().h.view(), text);

        let hidden = self.core.forward(
            state.hidden,
            &input.as_input(),
            attention.context.view(),
        );

        let mixture = self.head.forward(hidden.outputs().view());

        StepOutput {
            state: ModelState {
                hidden,
                attention,
                step: state.step + 1,
            },
            mixture,
        }
    }

    /// Teacher-forced replay: feeds `inputs` through the network without sampling, starting from
    /// zero memory.
    ///
    /// # Arguments
    /// * `inputs` - The pen states to replay, in model space.
    /// * `text` - The text the replayed trace was written for.
    ///
    /// # Returns
    /// The recurrent memory left behind by the replay.
    pub fn replay(&self, inputs: &[PenState], text: &TextContext) -> HiddenState {
        inputs
            .iter()
            .fold(self.initial_state(), |state, input| {
                self.step(state, input, text).state
            })
            .hidden
    }
}
