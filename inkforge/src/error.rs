use std::{error::Error, fmt, io};

use synthesis::SynthErr;

/// The inkforge crate's result type.
pub type Result<T> = std::result::Result<T, InkErr>;

/// Everything a generation can fail with.
#[derive(Debug)]
pub enum InkErr {
    /// No style with the given id exists.
    StyleNotFound(String),
    /// The request was rejected before any step ran.
    InvalidRequest(String),
    /// The network produced a non-finite value at the given step.
    GenerationDiverged {
        step: usize,
    },
    Cancelled {
        step: usize,
    },
    DeadlineExceeded {
        step: usize,
    },
    /// A style exists but its definition is unusable.
    InvalidStyle {
        id: String,
        reason: String,
    },
    Config(String),
    Model(SynthErr),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for InkErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InkErr::StyleNotFound(id) => write!(f, "style not found: {id}"),
            InkErr::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            InkErr::GenerationDiverged { step } => {
                write!(f, "generation diverged at step {step}")
            }
            InkErr::Cancelled { step } => write!(f, "generation cancelled at step {step}"),
            InkErr::DeadlineExceeded { step } => {
                write!(f, "deadline exceeded at step {step}")
            }
            InkErr::InvalidStyle { id, reason } => write!(f, "style {id} is invalid: {reason}"),
            InkErr::Config(msg) => write!(f, "invalid configuration: {msg}"),
            InkErr::Model(e) => write!(f, "model error: {e}"),
            InkErr::Io(e) => write!(f, "io error: {e}"),
            InkErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for InkErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InkErr::Model(e) => Some(e),
            InkErr::Io(e) => Some(e),
            InkErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SynthErr> for InkErr {
    fn from(value: SynthErr) -> Self {
        Self::Model(value)
    }
}

impl From<io::Error> for InkErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for InkErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
