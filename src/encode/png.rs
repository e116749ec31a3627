use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::export::sink::RasterFrame;
use crate::foundation::error::{RevealError, RevealResult};

/// Encode one straight-alpha raster as PNG.
pub fn encode_png(frame: &RasterFrame) -> RevealResult<Vec<u8>> {
    let img = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| RevealError::capture("snapshot buffer does not match its size"))?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| RevealError::capture(format!("encode png: {e}")))?;
    Ok(out)
}
