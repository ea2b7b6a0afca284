use serde::{Deserialize, Serialize};
use synthesis::{HiddenState, PenState};

use crate::vocab::CharacterSequence;

/// A priming sample as stored on disk: a stroke trace in drawing units and the text it spells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimingSample {
    pub text: String,
    pub strokes: Vec<PenState>,
}

/// The serialized form of a style, `<id>.json` in a styles directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priming: Option<PrimingSample>,
}

/// The id, name and description of a style, without its priming data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A loaded style, immutable and shared by every request that asks for it.
#[derive(Debug, Clone)]
pub struct StyleProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    /// The priming trace and its encoded text.
    pub priming: Option<(Vec<PenState>, CharacterSequence)>,
    /// The recurrent memory the priming trace leaves behind, zero for unprimed styles.
    pub bias: HiddenState,
}

impl StyleProfile {
    pub fn is_primed(&self) -> bool {
        self.priming.is_some()
    }

    pub fn summary(&self) -> StyleSummary {
        StyleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}
