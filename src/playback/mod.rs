//! Wall-clock playback state and the audio collaborator.

pub mod audio;
pub mod clock;
