use serde::{Deserialize, Serialize};

/// One timestep of a stroke trace: the offset from the previous pen position and whether the
/// pen leaves the paper at this point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PenState {
    pub dx: f32,
    pub dy: f32,
    pub lift: bool,
}

impl PenState {
    pub fn new(dx: f32, dy: f32, lift: bool) -> Self {
        Self { dx, dy, lift }
    }

    /// The anchor every trace starts with.
    pub fn origin() -> Self {
        Self::default()
    }

    /// The recurrent input encoding of this point.
    pub fn as_input(&self) -> [f32; 3] {
        [self.dx, self.dy, if self.lift { 1. } else { 0. }]
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}
