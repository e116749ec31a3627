//! Deterministic timeline sweep: sample, capture, encode.

pub mod naming;
pub mod sampler;
pub mod sink;
