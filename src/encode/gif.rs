use image::codecs::gif::{GifEncoder as ImageGifEncoder, Repeat};
use image::{Delay, Frame as ImageFrame, RgbaImage};

use crate::export::sink::{RasterFrame, SequenceEncoder};
use crate::foundation::error::{RevealError, RevealResult};

/// Animated GIF encoder. Loops forever.
#[derive(Clone, Debug)]
pub struct GifEncoder {
    /// Quantization speed, 1 (best) to 30 (fastest).
    pub speed: i32,
}

impl Default for GifEncoder {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl SequenceEncoder for GifEncoder {
    #[tracing::instrument(skip(self, frames), fields(frames = frames.len()))]
    fn encode(&mut self, frames: &[RasterFrame], delay_ms: u32) -> RevealResult<Vec<u8>> {
        if frames.is_empty() {
            return Err(RevealError::capture("no frames to encode"));
        }
        let mut out = Vec::new();
        {
            let mut enc = ImageGifEncoder::new_with_speed(&mut out, self.speed.clamp(1, 30));
            enc.set_repeat(Repeat::Infinite)
                .map_err(|e| RevealError::capture(format!("set gif repeat: {e}")))?;
            let delay = Delay::from_numer_denom_ms(delay_ms.max(1), 1);
            for (k, f) in frames.iter().enumerate() {
                let img = RgbaImage::from_raw(f.width, f.height, f.data.clone()).ok_or_else(|| {
                    RevealError::capture(format!("frame {k} has a malformed buffer"))
                })?;
                enc.encode_frame(ImageFrame::from_parts(img, 0, 0, delay))
                    .map_err(|e| RevealError::capture(format!("encode gif frame {k}: {e}")))?;
            }
        }
        Ok(out)
    }
}
