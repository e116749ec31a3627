//! Colors and image preparation (raster decode, SVG rasterization, the image store).

pub mod color;
pub mod decode;
pub mod store;
pub mod svg_raster;
