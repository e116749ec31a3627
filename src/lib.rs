#![forbid(unsafe_code)]
//! Slot-machine logo reveal: a pure timeline compositor shared by a live session and a
//! deterministic GIF exporter.

pub mod assets;
pub mod encode;
pub mod eval;
pub mod export;
pub mod foundation;
pub mod playback;
pub mod render;
pub mod scene;
pub mod session;
pub mod tilt;

pub use assets::color::Color;
pub use assets::store::ImageStore;
pub use encode::gif::GifEncoder;
pub use encode::png::encode_png;
pub use eval::compositor::{
    CharFill, CharLayer, Frame, ShadowTerm, SolidReason, TitleLayer, compose, compose_slot_preview,
};
pub use eval::lock::{LockPhase, char_phase, lock_time_ms};
pub use export::naming::{export_file_name, snapshot_file_name, title_slug};
pub use export::sampler::{
    ExportArtifact, ExportJob, ExportOpts, ExportProgress, MAX_EXPORT_FRAMES, sample_times,
};
pub use export::sink::{CommitAck, FrameCapture, RasterFrame, SequenceEncoder};
pub use foundation::core::{Canvas, Elapsed, Fps, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};
pub use foundation::error::{RevealError, RevealResult};
pub use playback::audio::{AudioHandle, SilentAudio};
pub use playback::clock::{ClockTick, PlaybackClock, end_time_ms};
pub use render::cpu::CpuCapture;
pub use render::text::{FONT_DIR_ENV, FontBook};
pub use scene::asset::{Asset, AssetId, AssetList};
pub use scene::mapping::{CharMapping, MappingPatch, rebuild_mappings, update_mapping};
pub use scene::project::Project;
pub use scene::settings::{Settings, SettingsPatch, TiltAngles};
pub use session::reveal::RevealSession;
pub use tilt::{TiltController, TiltMode};
