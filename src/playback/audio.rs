use crate::foundation::error::RevealResult;

/// Playback-only audio collaborator. Never driven during scrubbing or export.
pub trait AudioHandle {
    /// Load (or replace) the track. `None` unloads it.
    fn load(&mut self, source: Option<&str>) -> RevealResult<()>;
    fn play(&mut self);
    fn pause(&mut self);
    /// `volume` is already clamped to `[0, 1]`.
    fn set_volume(&mut self, volume: f64);
    fn seek(&mut self, position_ms: f64);
}

/// No-op audio for headless sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioHandle for SilentAudio {
    fn load(&mut self, _source: Option<&str>) -> RevealResult<()> {
        Ok(())
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f64) {}

    fn seek(&mut self, _position_ms: f64) {}
}
