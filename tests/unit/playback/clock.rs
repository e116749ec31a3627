use super::*;
use crate::scene::asset::AssetList;
use crate::scene::mapping::rebuild_mappings;

fn settings(text: &str, duration: f64, stagger: f64) -> Settings {
    let mut s = Settings {
        text: text.to_owned(),
        ..Settings::default()
    };
    s.motion.duration_ms = duration;
    s.motion.stagger_ms = stagger;
    s
}

#[test]
fn end_time_adds_hold_after_default_schedule() {
    let s = settings("AB", 1000.0, 200.0);
    let m = rebuild_mappings("AB", &AssetList::empty(), &[]);
    assert_eq!(end_time_ms(&s, &m), 1000.0 + 2.0 * 200.0 + 500.0);

    let s = settings("LOGO", 1000.0, 0.0);
    let m = rebuild_mappings("LOGO", &AssetList::empty(), &[]);
    assert_eq!(end_time_ms(&s, &m), 1500.0);
}

#[test]
fn end_time_honours_late_explicit_lock() {
    let s = settings("AB", 1000.0, 200.0);
    let mut m = rebuild_mappings("AB", &AssetList::empty(), &[]);
    m[0].lock_time_ms = Some(3000.0);
    assert_eq!(end_time_ms(&s, &m), 3500.0);
}

#[test]
fn empty_text_still_has_a_timeline() {
    let s = settings("", 800.0, 100.0);
    assert_eq!(end_time_ms(&s, &[]), 1300.0);
}

#[test]
fn running_clock_reports_wall_time_and_finishes_once() {
    let mut c = PlaybackClock::new(1500.0);
    assert_eq!(c.elapsed(), Elapsed::Stopped);

    c.start(10_000.0);
    let t = c.tick(10_250.0);
    assert_eq!(t.elapsed, Elapsed::At(250.0));
    assert!(!t.finished);
    assert_eq!(c.elapsed(), Elapsed::At(250.0));

    // Exactly at the end is still playing.
    assert!(!c.tick(11_500.0).finished);

    let t = c.tick(11_501.0);
    assert!(t.finished);
    assert_eq!(t.elapsed, Elapsed::Stopped);
    assert_eq!(c.state(), ClockState::Idle);
    assert!(!c.tick(12_000.0).finished);
}

#[test]
fn scrubbing_ignores_wall_clock() {
    let mut c = PlaybackClock::new(1500.0);
    c.start(0.0);
    c.scrub(Some(420.0));
    assert_eq!(c.tick(99_999.0).elapsed, Elapsed::At(420.0));
    assert!(!c.is_running());
    c.scrub(None);
    assert_eq!(c.elapsed(), Elapsed::Stopped);
}

#[test]
fn stop_returns_to_idle() {
    let mut c = PlaybackClock::new(1000.0);
    c.start(5.0);
    c.stop();
    assert_eq!(c.tick(100.0).elapsed, Elapsed::Stopped);
}
