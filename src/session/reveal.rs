use crate::eval::compositor::{Frame, compose, compose_slot_preview};
use crate::export::naming::snapshot_file_name;
use crate::export::sampler::{ExportArtifact, ExportJob, ExportOpts};
use crate::export::sink::{FrameCapture, RasterFrame, SequenceEncoder};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::RevealResult;
use crate::playback::audio::{AudioHandle, SilentAudio};
use crate::playback::clock::{PlaybackClock, end_time_ms};
use crate::scene::asset::AssetList;
use crate::scene::mapping::{CharMapping, MappingPatch, rebuild_mappings, update_mapping};
use crate::scene::project::Project;
use crate::scene::settings::{Settings, SettingsPatch, TiltAngles};
use crate::tilt::{TiltController, TiltMode};

/// Single-writer session over one project.
///
/// Every mutation goes through `&mut self`; frames are composed from an immutable view of the
/// current inputs, so a frame never observes a half-applied update.
pub struct RevealSession {
    settings: Settings,
    assets: AssetList,
    mappings: Vec<CharMapping>,
    clock: PlaybackClock,
    tilt: TiltController,
    audio: Box<dyn AudioHandle>,
}

impl RevealSession {
    pub fn new(project: Project) -> Self {
        let Project {
            settings,
            assets,
            mappings,
        } = project;
        let clock = PlaybackClock::new(end_time_ms(&settings, &mappings));
        let tilt = TiltController::new(TiltMode::from_motion(&settings.motion), settings.tilt_angles);
        Self {
            settings,
            assets,
            mappings,
            clock,
            tilt,
            audio: Box::new(SilentAudio),
        }
    }

    /// Attach an audio backend and load the project's track into it.
    pub fn with_audio(mut self, mut audio: Box<dyn AudioHandle>) -> RevealResult<Self> {
        audio.load(self.settings.scene.audio.as_deref())?;
        audio.set_volume(self.settings.scene.volume);
        self.audio = audio;
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn assets(&self) -> &AssetList {
        &self.assets
    }

    pub fn mappings(&self) -> &[CharMapping] {
        &self.mappings
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn tilt(&self) -> &TiltController {
        &self.tilt
    }

    pub fn end_time_ms(&self) -> f64 {
        self.clock.end_ms()
    }

    pub fn set_playing(&mut self, playing: bool, now_ms: f64) {
        if playing {
            self.clock.start(now_ms);
            self.audio.seek(0.0);
            self.audio.play();
        } else {
            self.clock.stop();
            self.rewind_audio();
        }
    }

    /// Enter (`Some`) or leave (`None`) manual time. Audio never plays while scrubbing.
    pub fn scrub_to(&mut self, t: Option<f64>) {
        tracing::debug!(t = ?t, "scrub");
        self.rewind_audio();
        self.clock.scrub(t);
    }

    /// Live frame at wall-clock `now_ms`, with the tilt controller's orientation.
    pub fn tick(&mut self, now_ms: f64) -> Frame {
        let tick = self.clock.tick(now_ms);
        if tick.finished {
            self.rewind_audio();
        }
        let mut frame = compose(tick.elapsed, &self.settings, &self.assets, &self.mappings);
        frame.orientation = self.tilt.orientation(now_ms / 1000.0);
        frame
    }

    /// Frame at the clock's current time with the persisted orientation.
    pub fn frame(&self) -> Frame {
        compose(
            self.clock.elapsed(),
            &self.settings,
            &self.assets,
            &self.mappings,
        )
    }

    /// Resting frame with every slot showing asset `slot`.
    pub fn slot_preview(&self, slot: usize) -> RevealResult<Frame> {
        compose_slot_preview(slot, &self.settings, &self.assets)
    }

    /// Capture the current frame.
    #[tracing::instrument(skip(self, capture))]
    pub fn snapshot(&mut self, capture: &mut dyn FrameCapture, scale: f64) -> RevealResult<RasterFrame> {
        let frame = self.frame();
        let ack = capture.commit(&frame)?;
        capture.capture(ack, scale)
    }

    pub fn snapshot_file_name(&self) -> String {
        snapshot_file_name(&self.settings.text)
    }

    /// Stop playback and plan a step-wise export over a frozen copy of the inputs.
    pub fn export_job<'a>(
        &mut self,
        capture: &'a mut dyn FrameCapture,
        encoder: &'a mut dyn SequenceEncoder,
        opts: ExportOpts,
    ) -> RevealResult<ExportJob<'a>> {
        self.clock.stop();
        self.rewind_audio();
        ExportJob::new(
            &self.settings,
            &self.assets,
            &self.mappings,
            capture,
            encoder,
            opts,
        )
    }

    /// Sweep the whole timeline and encode it.
    #[tracing::instrument(skip(self, capture, encoder))]
    pub fn export_sequence(
        &mut self,
        capture: &mut dyn FrameCapture,
        encoder: &mut dyn SequenceEncoder,
        opts: ExportOpts,
    ) -> RevealResult<ExportArtifact> {
        let artifact = self.export_job(capture, encoder, opts)?.run()?;
        tracing::info!(file = %artifact.file_name, frames = artifact.frame_count, "exported");
        Ok(artifact)
    }

    /// Apply a settings patch. Text, duration, and stagger changes rebuild the mappings.
    ///
    /// On error the session is left unchanged.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> RevealResult<()> {
        let next = self.settings.patched(patch)?;
        if next.scene.audio != self.settings.scene.audio {
            self.audio.load(next.scene.audio.as_deref())?;
        }
        let prev = std::mem::replace(&mut self.settings, next);
        let s = &self.settings;

        if s.text != prev.text
            || s.motion.duration_ms != prev.motion.duration_ms
            || s.motion.stagger_ms != prev.motion.stagger_ms
        {
            self.mappings = rebuild_mappings(&s.text, &self.assets, &self.mappings);
        }
        if s.motion.tilt != prev.motion.tilt
            || s.motion.tilt_auto != prev.motion.tilt_auto
            || s.tilt_angles != prev.tilt_angles
        {
            self.tilt
                .reconfigure(TiltMode::from_motion(&s.motion), s.tilt_angles);
        }
        if s.scene.audio != prev.scene.audio || s.scene.volume != prev.scene.volume {
            self.audio.set_volume(s.scene.volume);
        }
        self.refresh_end();
        Ok(())
    }

    pub fn set_assets(&mut self, assets: AssetList) {
        self.assets = assets;
        self.mappings = rebuild_mappings(&self.settings.text, &self.assets, &self.mappings);
        self.refresh_end();
    }

    pub fn update_mapping(&mut self, index: usize, patch: &MappingPatch) -> RevealResult<()> {
        self.mappings = update_mapping(&self.mappings, index, patch, &self.assets)?;
        self.refresh_end();
        Ok(())
    }

    pub fn pointer_down(&mut self, pos: Point, surface: Rect) -> bool {
        self.tilt.pointer_down(pos, surface)
    }

    pub fn pointer_move(&mut self, pos: Point) {
        self.tilt.pointer_move(pos);
    }

    /// End a tilt drag and persist the released angles.
    pub fn pointer_up(&mut self) -> Option<TiltAngles> {
        let released = self.tilt.pointer_up()?;
        tracing::debug!(x = released.x, y = released.y, "tilt released");
        self.settings.tilt_angles = released;
        Some(released)
    }

    fn rewind_audio(&mut self) {
        self.audio.pause();
        self.audio.seek(0.0);
    }

    fn refresh_end(&mut self) {
        self.clock
            .set_end_ms(end_time_ms(&self.settings, &self.mappings));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/reveal.rs"]
mod tests;
