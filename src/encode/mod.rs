//! Sequence and still-image encoders for captured rasters.

pub mod gif;
pub mod png;
