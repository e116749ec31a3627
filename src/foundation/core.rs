use crate::foundation::error::{RevealError, RevealResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Width of the virtual composition frame. Every size and offset in a [`crate::Frame`] is
/// expressed in this coordinate space and only scaled uniformly at presentation time.
pub const VIRTUAL_WIDTH: f64 = 1920.0;
/// Height of the virtual composition frame.
pub const VIRTUAL_HEIGHT: f64 = 1080.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// The canonical 1920x1080 design frame.
    pub const VIRTUAL: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    /// Pixel size of the virtual frame scaled by `scale`, rounded and never zero.
    pub fn scaled(scale: f64) -> RevealResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RevealError::validation("capture scale must be finite and > 0"));
        }
        let width = (VIRTUAL_WIDTH * scale).round().max(1.0);
        let height = (VIRTUAL_HEIGHT * scale).round().max(1.0);
        if width > f64::from(u16::MAX) || height > f64::from(u16::MAX) {
            return Err(RevealError::validation(format!(
                "capture size {width}x{height} exceeds {}",
                u16::MAX
            )));
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> RevealResult<Self> {
        if den == 0 {
            return Err(RevealError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(RevealError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_ms(self) -> f64 {
        1000.0 * f64::from(self.den) / f64::from(self.num)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 10, den: 1 }
    }
}

/// Elapsed timeline time as seen by the compositor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Elapsed {
    /// No playback and no manual time: the composition shows its resting frame.
    Stopped,
    /// Milliseconds since the start of the timeline.
    At(f64),
}

impl Elapsed {
    pub fn ms(self) -> Option<f64> {
        match self {
            Self::Stopped => None,
            Self::At(t) => Some(t),
        }
    }
}
