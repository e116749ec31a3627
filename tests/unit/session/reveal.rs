use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::eval::compositor::TitleLayer;
use crate::eval::lock::LockPhase;
use crate::export::sink::CommitAck;
use crate::foundation::core::Elapsed;
use crate::foundation::error::RevealError;
use crate::scene::asset::{Asset, AssetId};

#[derive(Clone, Default)]
struct RecordingAudio(Rc<RefCell<Vec<String>>>);

impl AudioHandle for RecordingAudio {
    fn load(&mut self, source: Option<&str>) -> RevealResult<()> {
        self.0.borrow_mut().push(format!("load {source:?}"));
        Ok(())
    }
    fn play(&mut self) {
        self.0.borrow_mut().push("play".into());
    }
    fn pause(&mut self) {
        self.0.borrow_mut().push("pause".into());
    }
    fn set_volume(&mut self, volume: f64) {
        self.0.borrow_mut().push(format!("volume {volume}"));
    }
    fn seek(&mut self, position_ms: f64) {
        self.0.borrow_mut().push(format!("seek {position_ms}"));
    }
}

struct BrokenAudio;

impl AudioHandle for BrokenAudio {
    fn load(&mut self, source: Option<&str>) -> RevealResult<()> {
        match source {
            Some(src) => Err(RevealError::unsupported(format!("cannot decode {src}"))),
            None => Ok(()),
        }
    }
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn set_volume(&mut self, _volume: f64) {}
    fn seek(&mut self, _position_ms: f64) {}
}

struct NullCapture;

impl FrameCapture for NullCapture {
    fn commit(&mut self, frame: &Frame) -> RevealResult<CommitAck> {
        Ok(CommitAck {
            elapsed: frame.elapsed,
            seq: 1,
        })
    }
    fn capture(&mut self, _ack: CommitAck, _scale: f64) -> RevealResult<RasterFrame> {
        Ok(RasterFrame {
            width: 1,
            height: 1,
            data: vec![0, 0, 0, 255],
        })
    }
}

struct NullEncoder;

impl SequenceEncoder for NullEncoder {
    fn encode(&mut self, frames: &[RasterFrame], _delay_ms: u32) -> RevealResult<Vec<u8>> {
        Ok(vec![frames.len() as u8])
    }
}

fn project(text: &str) -> Project {
    let mut settings = Settings {
        text: text.to_owned(),
        ..Settings::default()
    };
    settings.motion.duration_ms = 1000.0;
    settings.motion.stagger_ms = 200.0;
    let assets = AssetList::new(vec![Asset::new("x", "x.png"), Asset::new("y", "y.png")]).unwrap();
    Project::new(settings, assets, &[]).unwrap()
}

fn slot_phase(frame: &Frame, i: usize) -> LockPhase {
    match &frame.title {
        TitleLayer::Slots(l) => l[i].phase,
        other => panic!("expected slots, got {other:?}"),
    }
}

#[test]
fn playback_runs_then_finishes_and_rewinds_audio() {
    let log = RecordingAudio::default();
    let mut s = RevealSession::new(project("AB"))
        .with_audio(Box::new(log.clone()))
        .unwrap();
    assert_eq!(s.end_time_ms(), 1000.0 + 400.0 + 500.0);

    s.set_playing(true, 5000.0);
    let f = s.tick(5500.0);
    assert_eq!(f.elapsed, Elapsed::At(500.0));
    assert_eq!(slot_phase(&f, 0), LockPhase::Spinning);

    let f = s.tick(5000.0 + 1900.0 + 1.0);
    assert_eq!(f.elapsed, Elapsed::Stopped);
    assert!(!s.clock().is_running());

    let calls = log.0.borrow();
    assert_eq!(calls[0], "load None");
    assert!(calls.iter().any(|c| c == "play"));
    assert_eq!(calls[calls.len() - 2..], ["pause".to_owned(), "seek 0".to_owned()]);
}

#[test]
fn scrubbing_pauses_audio_and_freezes_time() {
    let log = RecordingAudio::default();
    let mut s = RevealSession::new(project("AB"))
        .with_audio(Box::new(log.clone()))
        .unwrap();
    s.set_playing(true, 0.0);
    s.scrub_to(Some(1100.0));
    let f = s.tick(99_999.0);
    assert_eq!(f.elapsed, Elapsed::At(1100.0));
    assert_eq!(slot_phase(&f, 0), LockPhase::Locked);
    assert_eq!(slot_phase(&f, 1), LockPhase::Spinning);
    assert_eq!(log.0.borrow().last().map(String::as_str), Some("seek 0"));
}

#[test]
fn text_change_rebuilds_mappings_and_end_time() {
    let mut s = RevealSession::new(project("AB"));
    s.update_mapping(
        0,
        &MappingPatch {
            asset: Some(Some(AssetId::new("y"))),
            ..MappingPatch::default()
        },
    )
    .unwrap();

    let patch = SettingsPatch::new().set("text", "ABC").unwrap();
    s.update_settings(&patch).unwrap();
    assert_eq!(s.mappings().len(), 3);
    assert_eq!(s.mappings()[0].asset, Some(AssetId::new("y")));
    assert_eq!(s.end_time_ms(), 1000.0 + 600.0 + 500.0);
}

#[test]
fn removing_an_asset_resets_its_mappings() {
    let mut s = RevealSession::new(project("AB"));
    s.update_mapping(
        1,
        &MappingPatch {
            asset: Some(Some(AssetId::new("x"))),
            ..MappingPatch::default()
        },
    )
    .unwrap();
    s.set_assets(AssetList::new(vec![Asset::new("y", "y.png")]).unwrap());
    assert_eq!(s.mappings()[1].asset, None);
}

#[test]
fn mapping_update_validates() {
    let mut s = RevealSession::new(project("AB"));
    let missing = MappingPatch {
        asset: Some(Some(AssetId::new("nope"))),
        ..MappingPatch::default()
    };
    assert!(matches!(
        s.update_mapping(0, &missing),
        Err(RevealError::AssetMissing(_))
    ));
    assert!(matches!(
        s.update_mapping(9, &MappingPatch::default()),
        Err(RevealError::Validation(_))
    ));
}

#[test]
fn explicit_lock_time_extends_timeline() {
    let mut s = RevealSession::new(project("AB"));
    s.update_mapping(
        1,
        &MappingPatch {
            lock_time_s: Some(Some(4.0)),
            ..MappingPatch::default()
        },
    )
    .unwrap();
    assert_eq!(s.end_time_ms(), 4500.0);
}

#[test]
fn manual_tilt_release_is_persisted() {
    let mut s = RevealSession::new(project("AB"));
    let patch = SettingsPatch::new()
        .set("motion.tilt", true)
        .unwrap()
        .set("motion.tiltAuto", false)
        .unwrap();
    s.update_settings(&patch).unwrap();
    assert_eq!(s.tilt().mode(), TiltMode::Manual);

    let surface = Rect::new(0.0, 0.0, 800.0, 450.0);
    assert!(s.pointer_down(Point::new(100.0, 100.0), surface));
    s.pointer_move(Point::new(140.0, 100.0));
    let released = s.pointer_up().unwrap();
    assert_eq!(released, TiltAngles::new(0.0, 20.0));
    assert_eq!(s.settings().tilt_angles, released);
    assert_eq!(s.tick(0.0).orientation, released);
}

#[test]
fn auto_tilt_follows_wall_clock() {
    let mut s = RevealSession::new(project("AB"));
    s.update_settings(&SettingsPatch::new().set("motion.tilt", true).unwrap())
        .unwrap();
    let o = s.tick(2000.0).orientation;
    assert!((o.x - 5.0 * 1.0f64.sin()).abs() < 1e-12);
    assert!((o.y - 5.0 * 0.6f64.cos()).abs() < 1e-12);
}

#[test]
fn export_stops_playback_and_counts_frames() {
    let log = RecordingAudio::default();
    let mut s = RevealSession::new(project("AB"))
        .with_audio(Box::new(log.clone()))
        .unwrap();
    s.set_playing(true, 0.0);
    let artifact = s
        .export_sequence(&mut NullCapture, &mut NullEncoder, ExportOpts::default())
        .unwrap();
    // end = 1900 ms at 100 ms steps
    assert_eq!(artifact.frame_count, 20);
    assert_eq!(artifact.bytes, vec![20]);
    assert_eq!(artifact.file_name, "ab-intro.gif");
    assert!(!s.clock().is_running());
    assert_eq!(log.0.borrow().last().map(String::as_str), Some("seek 0"));
}

#[test]
fn snapshot_captures_resting_frame() {
    let mut s = RevealSession::new(project("Hello World"));
    let raster = s.snapshot(&mut NullCapture, 0.5).unwrap();
    assert_eq!(raster.width, 1);
    assert_eq!(s.snapshot_file_name(), "hello-world-snapshot.png");
    assert_eq!(s.frame().elapsed, Elapsed::Stopped);
}

#[test]
fn failed_audio_load_leaves_session_untouched() {
    let mut s = RevealSession::new(project("AB"))
        .with_audio(Box::new(BrokenAudio))
        .unwrap();
    let before_settings = s.settings().clone();
    let before_mappings = s.mappings().to_vec();
    let before_end = s.clock().end_ms();

    let patch = SettingsPatch::new()
        .set("text", "ABCDEFGH")
        .unwrap()
        .set("scene.audio", "bad.mp3")
        .unwrap();
    assert!(matches!(
        s.update_settings(&patch),
        Err(RevealError::UnsupportedEnvironment(_))
    ));

    assert_eq!(s.settings(), &before_settings);
    assert_eq!(s.mappings(), before_mappings.as_slice());
    assert_eq!(s.clock().end_ms(), before_end);
    assert_eq!(s.clock().end_ms(), end_time_ms(s.settings(), s.mappings()));

    s.update_settings(&SettingsPatch::new().set("text", "ABCDEFGH").unwrap())
        .unwrap();
    assert_eq!(s.mappings().len(), 8);
    assert_eq!(s.clock().end_ms(), end_time_ms(s.settings(), s.mappings()));
}
