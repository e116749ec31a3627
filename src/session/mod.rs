//! Live session: owns the inputs, the playback clock, tilt, and audio.

pub mod reveal;
