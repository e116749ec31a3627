use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{RevealError, RevealResult};
use crate::foundation::math::premultiply_px;

#[derive(Clone, Debug, PartialEq)]
/// Decoded image in premultiplied RGBA8, ready to become a paint.
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> RevealResult<Self> {
        if width == 0 || height == 0 {
            return Err(RevealError::validation("image must be at least 1x1"));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(RevealError::validation("image byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Decode any raster format the `image` crate recognizes.
pub fn decode_image(bytes: &[u8]) -> RevealResult<PreparedImage> {
    let decoded = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        premultiply_px(px);
    }
    PreparedImage::from_premul(width, height, data)
}

pub fn parse_svg(bytes: &[u8]) -> RevealResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}
