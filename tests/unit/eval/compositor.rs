use super::*;
use crate::scene::asset::{Asset, AssetId};
use crate::scene::mapping::rebuild_mappings;
use crate::scene::settings::StartStyle;

fn ab_setup() -> (Settings, AssetList, Vec<CharMapping>) {
    let mut settings = Settings {
        text: "AB".to_owned(),
        ..Settings::default()
    };
    settings.motion.duration_ms = 1000.0;
    settings.motion.stagger_ms = 200.0;
    settings.motion.start_scale_pct = 80.0;
    let assets = AssetList::new(vec![Asset::new("x", "x.png"), Asset::new("y", "y.png")]).unwrap();
    let mappings = rebuild_mappings("AB", &assets, &[]);
    (settings, assets, mappings)
}

fn slots(frame: &Frame) -> &[CharLayer] {
    match &frame.title {
        TitleLayer::Slots(v) => v,
        other => panic!("expected slots, got {other:?}"),
    }
}

fn image_asset(layer: &CharLayer) -> &str {
    match &layer.fill {
        CharFill::Image(f) => f.asset.as_str(),
        other => panic!("expected image fill, got {other:?}"),
    }
}

#[test]
fn compose_is_deterministic() {
    let (s, a, m) = ab_setup();
    for t in [0.0, 37.5, 512.0, 999.9, 1000.0, 1250.0, 5000.0] {
        assert_eq!(
            compose(Elapsed::At(t), &s, &a, &m),
            compose(Elapsed::At(t), &s, &a, &m)
        );
    }
    assert_eq!(
        compose(Elapsed::Stopped, &s, &a, &m),
        compose(Elapsed::Stopped, &s, &a, &m)
    );
}

#[test]
fn scale_grows_from_start_scale_to_one() {
    let (s, a, m) = ab_setup();
    let at = |t: f64| compose(Elapsed::At(t), &s, &a, &m).transform.scale;
    assert!((at(0.0) - 0.8).abs() < 1e-12);
    assert!((at(500.0) - 0.9).abs() < 1e-12);
    assert!((at(1000.0) - 1.0).abs() < 1e-12);
    assert!((at(4000.0) - 1.0).abs() < 1e-12);
    assert!((at(-50.0) - 0.8).abs() < 1e-12);

    let mut last = 0.0;
    for k in 0..=20 {
        let v = at(f64::from(k) * 75.0);
        assert!((0.8..=1.0).contains(&v));
        assert!(v >= last);
        last = v;
    }
}

#[test]
fn zero_duration_is_fully_grown() {
    let (mut s, a, m) = ab_setup();
    s.motion.duration_ms = 0.0;
    assert_eq!(compose(Elapsed::At(0.0), &s, &a, &m).transform.scale, 1.0);
}

#[test]
fn two_character_scenario_locks_in_order() {
    let (s, a, m) = ab_setup();

    let f = compose(Elapsed::At(500.0), &s, &a, &m);
    let l = slots(&f);
    assert_eq!(l.len(), 2);
    assert!(l.iter().all(|c| c.phase == LockPhase::Spinning));

    let f = compose(Elapsed::At(1100.0), &s, &a, &m);
    let l = slots(&f);
    assert_eq!(l[0].phase, LockPhase::Locked);
    assert_eq!(image_asset(&l[0]), "x");
    assert_eq!(l[1].phase, LockPhase::Spinning);

    let f = compose(Elapsed::At(1300.0), &s, &a, &m);
    let l = slots(&f);
    assert_eq!(l[1].phase, LockPhase::Locked);
    assert_eq!(image_asset(&l[1]), "y");
}

#[test]
fn scrubbing_backwards_spins_again() {
    let (s, a, m) = ab_setup();
    let late = compose(Elapsed::At(2000.0), &s, &a, &m);
    assert!(slots(&late).iter().all(|c| c.phase == LockPhase::Locked));
    let early = compose(Elapsed::At(900.0), &s, &a, &m);
    assert!(slots(&early).iter().all(|c| c.phase == LockPhase::Spinning));
}

#[test]
fn solid_start_style_pre_rolls() {
    let (mut s, a, m) = ab_setup();
    s.motion.start_style = StartStyle::Solid;
    let f = compose(Elapsed::At(400.0), &s, &a, &m);
    assert_eq!(
        f.title,
        TitleLayer::Solid {
            color: s.text_color,
            reason: SolidReason::PreRoll
        }
    );
    // Slot 1 is still spinning once the pre-roll ends.
    let f = compose(Elapsed::At(1000.0), &s, &a, &m);
    assert_eq!(slots(&f)[1].phase, LockPhase::Spinning);
}

#[test]
fn stopped_frame_follows_end_style() {
    let (mut s, a, m) = ab_setup();
    let f = compose(Elapsed::Stopped, &s, &a, &m);
    let l = slots(&f);
    assert_eq!(image_asset(&l[0]), "x");
    assert_eq!(image_asset(&l[1]), "y");
    assert_eq!(f.transform.scale, 1.0);

    s.motion.end_style = EndStyle::Solid;
    let f = compose(Elapsed::Stopped, &s, &a, &m);
    assert!(matches!(
        f.title,
        TitleLayer::Solid {
            reason: SolidReason::Resting,
            ..
        }
    ));
}

#[test]
fn stopped_without_assets_renders_solid_cells() {
    let (s, _, _) = ab_setup();
    let empty = AssetList::empty();
    let m = rebuild_mappings("AB", &empty, &[]);
    let f = compose(Elapsed::Stopped, &s, &empty, &m);
    assert!(
        slots(&f)
            .iter()
            .all(|c| c.fill == CharFill::Solid(s.text_color))
    );
}

#[test]
fn disabled_slot_effect_is_static_text() {
    let (mut s, a, m) = ab_setup();
    s.motion.slot_effect = false;
    for e in [Elapsed::Stopped, Elapsed::At(0.0), Elapsed::At(1200.0)] {
        assert!(matches!(
            compose(e, &s, &a, &m).title,
            TitleLayer::Solid {
                reason: SolidReason::StaticText,
                ..
            }
        ));
    }
}

#[test]
fn mapping_to_removed_asset_falls_back_to_round_robin() {
    let (s, a, mut m) = ab_setup();
    m[1].asset = Some(AssetId::new("gone"));
    let f = compose(Elapsed::At(5000.0), &s, &a, &m);
    assert_eq!(image_asset(&slots(&f)[1]), "y");
}

#[test]
fn shadows_put_glow_before_extrusion() {
    let (mut s, _, _) = ab_setup();
    assert!(shadow_terms(&s).is_empty());

    s.glow_radius = 12.0;
    s.extrusion_depth = 3;
    let terms = shadow_terms(&s);
    assert_eq!(terms.len(), 4);
    assert!(matches!(terms[0], ShadowTerm::Glow { radius, .. } if radius == 12.0));
    assert!(matches!(terms[3], ShadowTerm::Offset { dx, dy, .. } if dx == 3.0 && dy == 3.0));
}

#[test]
fn extrusion_depth_is_capped_even_without_validation() {
    let (mut s, a, m) = ab_setup();
    s.extrusion_depth = u32::MAX;
    let f = compose(Elapsed::At(0.0), &s, &a, &m);
    assert_eq!(f.shadows.len(), MAX_EXTRUSION_DEPTH as usize);
    assert!(matches!(
        f.shadows.last(),
        Some(ShadowTerm::Offset { dx, .. }) if *dx == f64::from(MAX_EXTRUSION_DEPTH)
    ));
}

#[test]
fn metrics_are_percentages_of_virtual_width() {
    let (s, a, m) = ab_setup();
    let f = compose(Elapsed::Stopped, &s, &a, &m);
    assert!((f.metrics.title_px - 288.0).abs() < 1e-9);
    assert!((f.metrics.letter_spacing_px - 9.6).abs() < 1e-9);
}

#[test]
fn orientation_only_when_tilt_enabled() {
    let (mut s, a, m) = ab_setup();
    s.tilt_angles = TiltAngles::new(10.0, -5.0);
    assert_eq!(compose(Elapsed::Stopped, &s, &a, &m).orientation, TiltAngles::ZERO);
    s.motion.tilt = true;
    assert_eq!(
        compose(Elapsed::Stopped, &s, &a, &m).orientation,
        TiltAngles::new(10.0, -5.0)
    );
}

#[test]
fn subtitle_requires_enabled_and_text() {
    let (mut s, a, m) = ab_setup();
    assert!(compose(Elapsed::Stopped, &s, &a, &m).subtitle.is_none());
    s.subtitle.enabled = true;
    assert!(compose(Elapsed::Stopped, &s, &a, &m).subtitle.is_none());
    s.subtitle.text = "est. 2024".to_owned();
    let sub = compose(Elapsed::Stopped, &s, &a, &m).subtitle.unwrap();
    assert_eq!(sub.text, "est. 2024");
    assert!((sub.px - 48.0).abs() < 1e-9);
    assert!((sub.spacing_px - s.subtitle.spacing_pct / 100.0 * 1920.0).abs() < 1e-9);
    assert_eq!(sub.margin_px, s.subtitle.margin_px);
    assert_eq!(sub.color, s.text_color);
}

#[test]
fn slot_preview_locks_every_slot_on_one_asset() {
    let (s, a, _) = ab_setup();
    let f = compose_slot_preview(1, &s, &a).unwrap();
    assert!(slots(&f).iter().all(|c| image_asset(c) == "y"));
    assert!(compose_slot_preview(2, &s, &a).is_err());
}

#[test]
fn transform_anchor_is_fixed() {
    let t = TitleTransform {
        scale: 0.5,
        offset_y: 10.0,
    };
    let anchor = Point::new(960.0, 540.0);
    let p = t.to_affine(anchor) * anchor;
    assert!((p.x - 960.0).abs() < 1e-9);
    assert!((p.y - 550.0).abs() < 1e-9);
}
