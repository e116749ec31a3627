use super::*;

fn surface() -> Rect {
    Rect::new(0.0, 0.0, 400.0, 300.0)
}

fn manual() -> TiltController {
    TiltController::new(TiltMode::Manual, TiltAngles::ZERO)
}

#[test]
fn mode_follows_motion_flags() {
    let mut m = Motion::default();
    assert_eq!(TiltMode::from_motion(&m), TiltMode::Off);
    m.tilt = true;
    assert_eq!(TiltMode::from_motion(&m), TiltMode::Auto);
    m.tilt_auto = false;
    assert_eq!(TiltMode::from_motion(&m), TiltMode::Manual);
}

#[test]
fn auto_mode_wobbles_within_five_degrees() {
    let c = TiltController::new(TiltMode::Auto, TiltAngles::new(30.0, 30.0));
    assert_eq!(c.orientation(0.0), TiltAngles::new(0.0, 5.0));
    for k in 0..200 {
        let o = c.orientation(f64::from(k) * 0.37);
        assert!(o.x.abs() <= 5.0 && o.y.abs() <= 5.0);
    }
}

#[test]
fn drag_accumulates_half_degree_per_pixel() {
    let mut c = manual();
    assert!(c.pointer_down(Point::new(100.0, 100.0), surface()));
    c.pointer_move(Point::new(120.0, 90.0));
    assert_eq!(c.orientation(0.0), TiltAngles::new(5.0, 10.0));
    c.pointer_move(Point::new(130.0, 90.0));
    assert_eq!(c.pointer_up(), Some(TiltAngles::new(5.0, 15.0)));
    assert!(!c.is_dragging());
}

#[test]
fn drag_outside_surface_is_ignored() {
    let mut c = manual();
    assert!(!c.pointer_down(Point::new(500.0, 10.0), surface()));
    c.pointer_move(Point::new(600.0, 10.0));
    assert_eq!(c.pointer_up(), None);
    assert_eq!(c.orientation(0.0), TiltAngles::ZERO);
}

#[test]
fn released_angles_are_clamped() {
    let mut c = manual();
    c.pointer_down(Point::new(10.0, 10.0), surface());
    c.pointer_move(Point::new(10_000.0, -10_000.0));
    let released = c.pointer_up().unwrap();
    assert_eq!(released, TiltAngles::new(60.0, 60.0));
}

#[test]
fn off_mode_ignores_pointer() {
    let mut c = TiltController::new(TiltMode::Off, TiltAngles::new(20.0, 0.0));
    assert!(!c.pointer_down(Point::new(10.0, 10.0), surface()));
    assert_eq!(c.orientation(3.0), TiltAngles::ZERO);
}

#[test]
fn reconfigure_resets_drag() {
    let mut c = manual();
    c.pointer_down(Point::new(10.0, 10.0), surface());
    c.reconfigure(TiltMode::Manual, TiltAngles::new(7.0, -7.0));
    assert!(!c.is_dragging());
    assert_eq!(c.orientation(0.0), TiltAngles::new(7.0, -7.0));
}
