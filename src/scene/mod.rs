//! Input data model: settings, the ordered asset list, and per-character mappings.

pub mod asset;
pub mod mapping;
pub mod project;
pub mod settings;
