use crate::eval::compositor::Frame;
use crate::foundation::core::Elapsed;
use crate::foundation::error::RevealResult;

/// Straight-alpha RGBA8 raster, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Proof that a committed frame is visible on the capture surface.
///
/// A capture must present the ack of the frame it expects to read back; this replaces waiting a
/// fixed delay after each commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommitAck {
    pub elapsed: Elapsed,
    /// Monotonic commit counter of the surface.
    pub seq: u64,
}

/// Surface that displays composed frames and reads them back as rasters.
pub trait FrameCapture {
    fn commit(&mut self, frame: &Frame) -> RevealResult<CommitAck>;
    /// Rasterize the committed frame at `scale` times the 1920x1080 virtual size.
    fn capture(&mut self, ack: CommitAck, scale: f64) -> RevealResult<RasterFrame>;
}

/// Turns an ordered raster sequence into one encoded blob.
pub trait SequenceEncoder {
    /// `delay_ms` is the per-frame display time.
    fn encode(&mut self, frames: &[RasterFrame], delay_ms: u32) -> RevealResult<Vec<u8>>;
}
