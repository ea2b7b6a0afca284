use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire synthesis module.
pub type Result<T> = std::result::Result<T, SynthErr>;

/// The synthesis module's error type.
#[derive(Debug)]
pub enum SynthErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidSpec(String),
    SymbolOutOfRange {
        symbol: usize,
        vocab_size: usize,
    },
    MissingTensor(String),
    UnsupportedDtype {
        name: String,
        dtype: String,
    },
    SafeTensors(String),
    Rand(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for SynthErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            SynthErr::InvalidSpec(msg) => write!(f, "invalid model spec: {msg}"),
            SynthErr::SymbolOutOfRange { symbol, vocab_size } => {
                write!(f, "symbol {symbol} is outside a vocabulary of {vocab_size}")
            }
            SynthErr::MissingTensor(name) => {
                write!(f, "the weights file has no tensor named `{name}`")
            }
            SynthErr::UnsupportedDtype { name, dtype } => {
                write!(f, "tensor `{name}` has dtype {dtype}, only F32 is supported")
            }
            SynthErr::SafeTensors(msg) => write!(f, "safetensors error: {msg}"),
            SynthErr::Rand(msg) => write!(f, "random initialization error: {msg}"),
            SynthErr::Io(e) => write!(f, "io error: {e}"),
            SynthErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for SynthErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SynthErr::Io(e) => Some(e),
            SynthErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SynthErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SynthErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<safetensors::SafeTensorError> for SynthErr {
    fn from(value: safetensors::SafeTensorError) -> Self {
        Self::SafeTensors(value.to_string())
    }
}

impl From<ndarray::ShapeError> for SynthErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::InvalidSpec(value.to_string())
    }
}

impl From<rand_distr::NormalError> for SynthErr {
    fn from(value: rand_distr::NormalError) -> Self {
        Self::Rand(value.to_string())
    }
}
