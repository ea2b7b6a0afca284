use std::time::Instant;

use log::trace;
use rand::{SeedableRng, rngs::StdRng};
use synthesis::{HandwritingModel, HiddenState, ModelState, PenState, StepOutput, TextContext};
use tokio_util::sync::CancellationToken;

use super::{Sampler, Temperature};
use crate::{InkErr, Result};

/// Where a generation stands after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Running,
    /// The window moved past the end of the text.
    Done,
    /// The step budget ran out first.
    Truncated,
}

impl DecodeStatus {
    /// The status after `steps` steps with the window averaging `location`.
    ///
    /// Reaching the end of the text wins over running out of steps on the same step.
    pub fn after_step(location: f32, end: f32, steps: usize, max_steps: usize) -> Self {
        if location > end {
            DecodeStatus::Done
        } else if steps >= max_steps {
            DecodeStatus::Truncated
        } else {
            DecodeStatus::Running
        }
    }
}

/// Knobs of a single decoding run.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub temperature: Temperature,
    pub max_steps: usize,
    /// How far past the last symbol the window must average before the text counts as
    /// written.
    pub end_of_text_slack: f32,
    pub deadline: Option<Instant>,
}

/// The raw output of a decoding run.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The origin followed by one point per step, in model space.
    pub trace: Vec<PenState>,
    /// The average window location after every step.
    pub alignment: Vec<f32>,
    pub status: DecodeStatus,
}

impl Decoded {
    pub fn steps_used(&self) -> usize {
        self.alignment.len()
    }

    pub fn final_location(&self) -> f32 {
        self.alignment.last().copied().unwrap_or_default()
    }
}

/// Drives the model one step at a time until the text is written or the budget runs out.
pub struct Decoder<'a> {
    model: &'a HandwritingModel,
    text: &'a TextContext,
    options: &'a DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(
        model: &'a HandwritingModel,
        text: &'a TextContext,
        options: &'a DecodeOptions,
    ) -> Self {
        Self {
            model,
            text,
            options,
        }
    }

    /// Runs the loop to completion.
    ///
    /// Cancellation and the deadline are checked at the top of every step, divergence right
    /// after it.
    ///
    /// # Arguments
    /// * `initial` - The recurrent memory to start from, zero or a style's primed memory.
    /// * `seed` - Seed of the sampling generator.
    /// * `cancel` - Aborts the run at the next step once cancelled.
    ///
    /// # Returns
    /// The decoded trace or the error that stopped it.
    pub fn run(
        &self,
        initial: HiddenState,
        seed: u64,
        cancel: &CancellationToken,
    ) -> Result<Decoded> {
        let options = self.options;
        let end = self.text.len() as f32 + options.end_of_text_slack;

        let mut sampler = Sampler::new(StdRng::seed_from_u64(seed), options.temperature);
        let mut state = ModelState::primed(self.model.spec(), initial);
        let mut input = PenState::origin();
        let mut trace = vec![input];
        let mut alignment = Vec::new();
        let mut status = DecodeStatus::Running;

        while status == DecodeStatus::Running {
            let step = state.step;

            if cancel.is_cancelled() {
                return Err(InkErr::Cancelled { step });
            }

            if options.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(InkErr::DeadlineExceeded { step });
            }

            let StepOutput { state: next, mixture } = self.model.step(state, &input, self.text);
            if !mixture.is_finite() || !next.hidden.is_finite() {
                return Err(InkErr::GenerationDiverged { step });
            }

            input = sampler
                .sample(&mixture)
                .ok_or(InkErr::GenerationDiverged { step })?;

            let location = next.attention.mean_location();
            trace!(step = step, location = location, lift = input.lift; "decoded point");

            trace.push(input);
            alignment.push(location);
            status = DecodeStatus::after_step(location, end, next.step, options.max_steps);
            state = next;
        }

        Ok(Decoded {
            trace,
            alignment,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use synthesis::{ModelSpec, ModelWeights, StrokeNormalization};

    use super::*;

    fn model() -> HandwritingModel {
        let spec = ModelSpec {
            vocab_size: 10,
            embedding_dim: 3,
            hidden_dim: 5,
            layers: 2,
            attention_components: 2,
            mixture_components: 3,
            alphabet: None,
            normalization: StrokeNormalization::default(),
        };
        HandwritingModel::new(&ModelWeights::random(spec, 21).unwrap()).unwrap()
    }

    fn options(max_steps: usize) -> DecodeOptions {
        DecodeOptions {
            temperature: Temperature::default(),
            max_steps,
            end_of_text_slack: 0.5,
            deadline: None,
        }
    }

    fn run(options: &DecodeOptions, cancel: &CancellationToken) -> Result<Decoded> {
        let model = model();
        let text = model.embed(&[3, 4, 5, 6, 7, 8, 0]).unwrap();
        let initial = HiddenState::zeros(model.spec());
        Decoder::new(&model, &text, options).run(initial, 8, cancel)
    }

    #[test]
    fn status_transitions() {
        assert_eq!(DecodeStatus::after_step(1., 3.5, 1, 10), DecodeStatus::Running);
        assert_eq!(DecodeStatus::after_step(3.6, 3.5, 10, 10), DecodeStatus::Done);
        assert_eq!(DecodeStatus::after_step(3.5, 3.5, 10, 10), DecodeStatus::Truncated);
    }

    #[test]
    fn budget_bounds_the_run() {
        let decoded = run(&options(3), &CancellationToken::new()).unwrap();

        assert_eq!(decoded.status, DecodeStatus::Truncated);
        assert_eq!(decoded.steps_used(), 3);
        assert_eq!(decoded.trace.len(), 4);
        assert_eq!(decoded.trace[0], PenState::origin());
    }

    #[test]
    fn alignment_is_monotonic() {
        let decoded = run(&options(500), &CancellationToken::new()).unwrap();

        assert!(decoded.steps_used() <= 500);
        assert!(decoded.alignment.windows(2).all(|w| w[0] <= w[1]));
        if decoded.status == DecodeStatus::Done {
            assert!(decoded.final_location() > 7.5);
        }
    }

    #[test]
    fn cancelled_before_the_first_step() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run(&options(10), &cancel).unwrap_err();
        assert!(matches!(err, InkErr::Cancelled { step: 0 }));
    }

    #[test]
    fn past_deadline_stops() {
        let mut options = options(10);
        options.deadline = Instant::now().checked_sub(Duration::from_millis(1));

        let err = run(&options, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, InkErr::DeadlineExceeded { step: 0 }));
    }
}
