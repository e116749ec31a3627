use crate::assets::decode::PreparedImage;
use crate::foundation::error::{RevealError, RevealResult};

/// Longest side an SVG asset is rasterized to. Glyph cells never exceed the virtual frame height.
pub const SVG_RASTER_MAX_DIM: u32 = 1080;

/// Raster size for an SVG so its longest side equals `max_dim`, keeping the aspect ratio.
pub fn svg_raster_size(tree: &usvg::Tree, max_dim: u32) -> RevealResult<(u32, u32)> {
    let size = tree.size();
    let (w, h) = (f64::from(size.width()), f64::from(size.height()));
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(RevealError::validation("svg has invalid width/height"));
    }
    let k = f64::from(max_dim.max(1)) / w.max(h);
    Ok((
        (w * k).round().max(1.0) as u32,
        (h * k).round().max(1.0) as u32,
    ))
}

pub fn rasterize_svg(tree: &usvg::Tree, max_dim: u32) -> RevealResult<PreparedImage> {
    let (width, height) = svg_raster_size(tree, max_dim)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RevealError::unsupported("failed to allocate svg pixmap"))?;

    let sx = width as f32 / tree.size().width();
    let sy = height as f32 / tree.size().height();
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    // tiny-skia pixmaps are already premultiplied RGBA8.
    PreparedImage::from_premul(width, height, pixmap.data().to_vec())
}
