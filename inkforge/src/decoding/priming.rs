use synthesis::{HandwritingModel, HiddenState, PenState};

use crate::{Result, vocab::CharacterSequence};

/// Why a priming trace can't be replayed, if it can't.
pub fn check_trace(trace: &[PenState]) -> std::result::Result<(), &'static str> {
    match trace.first() {
        None => Err("the priming trace is empty"),
        Some(first) if first.lift => Err("the priming trace starts with a lift"),
        _ if !trace.iter().all(PenState::is_finite) => {
            Err("the priming trace has non-finite offsets")
        }
        _ => Ok(()),
    }
}

/// Replays a recorded trace through the model in teacher-forced mode and returns the memory it
/// leaves behind.
///
/// The first point is the origin anchor and enters the network as the zero input every
/// generation starts with; the remaining offsets are normalized into model space.
///
/// # Arguments
/// * `model` - The network.
/// * `trace` - The recorded trace, in drawing units.
/// * `sequence` - The text the trace spells.
///
/// # Returns
/// The primed memory or a model error if the text has symbols the model doesn't know.
pub fn prime(
    model: &HandwritingModel,
    trace: &[PenState],
    sequence: &CharacterSequence,
) -> Result<HiddenState> {
    let text = model.embed(sequence.symbols())?;
    let norm = model.spec().normalization;

    let inputs: Vec<PenState> = trace
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == 0 {
                return PenState::origin();
            }
            let (dx, dy) = norm.normalize(p.dx, p.dy);
            PenState::new(dx, dy, p.lift)
        })
        .collect();

    Ok(model.replay(&inputs, &text))
}
