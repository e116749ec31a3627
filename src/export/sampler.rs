use crate::eval::compositor::compose;
use crate::export::naming::export_file_name;
use crate::export::sink::{FrameCapture, RasterFrame, SequenceEncoder};
use crate::foundation::core::Fps;
use crate::foundation::error::{RevealError, RevealResult};
use crate::playback::clock::{PlaybackClock, end_time_ms};
use crate::scene::asset::AssetList;
use crate::scene::mapping::CharMapping;
use crate::scene::settings::Settings;

/// Options controlling an export sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOpts {
    pub fps: Fps,
    /// Capture scale relative to the 1920x1080 virtual frame.
    pub scale: f64,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            scale: 0.5,
        }
    }
}

/// Most frames a single sweep may sample.
pub const MAX_EXPORT_FRAMES: u64 = 20_000;

/// Sample instants `k * step` for `k = 0..=floor(end / step)`, `step = 1000 / fps`.
///
/// Fails with [`RevealError::Validation`] when the sweep would exceed [`MAX_EXPORT_FRAMES`].
pub fn sample_times(end_ms: f64, fps: Fps) -> RevealResult<Vec<f64>> {
    let step = fps.frame_duration_ms();
    if end_ms.is_nan() || end_ms <= 0.0 {
        return Ok(vec![0.0]);
    }
    // Absorb float error so an exact multiple of the step is included.
    let last = ((end_ms / step) + 1e-9).floor();
    if !last.is_finite() || last >= MAX_EXPORT_FRAMES as f64 {
        return Err(RevealError::validation(format!(
            "export of {end_ms} ms at {step:.3} ms per frame exceeds {MAX_EXPORT_FRAMES} frames"
        )));
    }
    let last = last as u64;
    Ok((0..=last).map(|k| k as f64 * step).collect())
}

/// Encoded export result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub frame_count: usize,
    pub delay_ms: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportProgress {
    Pending { done: usize, total: usize },
    Finished(ExportArtifact),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JobState {
    Sweeping,
    Finished,
    Failed,
}

/// Step-wise export sweep over a frozen copy of the inputs.
///
/// Each [`ExportJob::step`] renders one sample. The final step encodes the sequence. Any failure
/// discards the frames captured so far and leaves the job failed.
pub struct ExportJob<'a> {
    settings: Settings,
    assets: AssetList,
    mappings: Vec<CharMapping>,
    clock: PlaybackClock,
    capture: &'a mut dyn FrameCapture,
    encoder: &'a mut dyn SequenceEncoder,
    opts: ExportOpts,
    times: Vec<f64>,
    frames: Vec<RasterFrame>,
    state: JobState,
}

impl<'a> ExportJob<'a> {
    pub fn new(
        settings: &Settings,
        assets: &AssetList,
        mappings: &[CharMapping],
        capture: &'a mut dyn FrameCapture,
        encoder: &'a mut dyn SequenceEncoder,
        opts: ExportOpts,
    ) -> RevealResult<Self> {
        if settings.motion.slot_effect && assets.is_empty() {
            return Err(RevealError::NoAssetsForSlotEffect);
        }
        if !opts.scale.is_finite() || opts.scale <= 0.0 {
            return Err(RevealError::validation("export scale must be finite and > 0"));
        }
        let end = end_time_ms(settings, mappings);
        let times = sample_times(end, opts.fps)?;
        tracing::debug!(end_ms = end, frames = times.len(), "export sweep planned");
        Ok(Self {
            settings: settings.clone(),
            assets: assets.clone(),
            mappings: mappings.to_vec(),
            clock: PlaybackClock::new(end),
            capture,
            encoder,
            opts,
            frames: Vec::with_capacity(times.len()),
            times,
            state: JobState::Sweeping,
        })
    }

    pub fn total(&self) -> usize {
        self.times.len()
    }

    pub fn done(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_times(&self) -> &[f64] {
        &self.times
    }

    /// Render the next sample, or encode once every sample is captured.
    pub fn step(&mut self) -> RevealResult<ExportProgress> {
        match self.state {
            JobState::Sweeping => {}
            JobState::Finished => {
                return Err(RevealError::validation("export job already finished"));
            }
            JobState::Failed => {
                return Err(RevealError::capture("export job was aborted"));
            }
        }
        match self.try_step() {
            Ok(p) => Ok(p),
            Err(e) => {
                let discarded = self.frames.len();
                self.frames.clear();
                self.clock.scrub(None);
                self.state = JobState::Failed;
                tracing::warn!(discarded, error = %e, "export aborted");
                Err(match e {
                    e @ RevealError::CaptureFailure(_) => e,
                    other => RevealError::capture(other.to_string()),
                })
            }
        }
    }

    /// Drive the job to completion.
    pub fn run(mut self) -> RevealResult<ExportArtifact> {
        loop {
            if let ExportProgress::Finished(artifact) = self.step()? {
                return Ok(artifact);
            }
        }
    }

    fn try_step(&mut self) -> RevealResult<ExportProgress> {
        let total = self.times.len();
        let k = self.frames.len();
        if k < total {
            let t = self.times[k];
            self.clock.scrub(Some(t));
            let elapsed = self.clock.elapsed();
            let frame = compose(elapsed, &self.settings, &self.assets, &self.mappings);
            let ack = self.capture.commit(&frame)?;
            if ack.elapsed != elapsed {
                return Err(RevealError::capture(format!(
                    "commit acknowledged {:?}, expected {elapsed:?}",
                    ack.elapsed
                )));
            }
            let raster = self.capture.capture(ack, self.opts.scale)?;
            if raster.data.len() != raster.byte_len() {
                return Err(RevealError::capture(format!(
                    "raster {}x{} carries {} bytes",
                    raster.width,
                    raster.height,
                    raster.data.len()
                )));
            }
            if let Some(first) = self.frames.first() {
                if (first.width, first.height) != (raster.width, raster.height) {
                    return Err(RevealError::capture("raster size changed mid-sweep"));
                }
            }
            tracing::trace!(k, t, "export frame captured");
            self.frames.push(raster);
            return Ok(ExportProgress::Pending {
                done: k + 1,
                total,
            });
        }

        let delay_ms = self.opts.fps.frame_duration_ms().round().max(1.0) as u32;
        let bytes = self.encoder.encode(&self.frames, delay_ms)?;
        let (width, height) = self
            .frames
            .first()
            .map_or((0, 0), |f| (f.width, f.height));
        let artifact = ExportArtifact {
            file_name: export_file_name(&self.settings.text),
            bytes,
            frame_count: self.frames.len(),
            delay_ms,
            width,
            height,
        };
        self.frames.clear();
        self.clock.scrub(None);
        self.state = JobState::Finished;
        tracing::debug!(
            file = %artifact.file_name,
            frames = artifact.frame_count,
            bytes = artifact.bytes.len(),
            "export finished"
        );
        Ok(ExportProgress::Finished(artifact))
    }
}

impl Drop for ExportJob<'_> {
    fn drop(&mut self) {
        if self.state == JobState::Sweeping && !self.frames.is_empty() {
            tracing::warn!(
                captured = self.frames.len(),
                total = self.times.len(),
                "export job dropped before finishing; capture orphaned"
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sampler.rs"]
mod tests;
