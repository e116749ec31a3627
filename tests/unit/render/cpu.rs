use super::*;
use crate::eval::compositor::compose;
use crate::foundation::core::Elapsed;
use crate::scene::asset::{Asset, AssetList};
use crate::scene::mapping::rebuild_mappings;
use crate::scene::settings::Settings;

const SCALE: f64 = 0.05;

fn settings(text: &str) -> Settings {
    Settings {
        text: text.to_owned(),
        background_color: Color::BLACK,
        text_color: Color::WHITE,
        ..Settings::default()
    }
}

fn red_store() -> ImageStore {
    let mut store = ImageStore::new(".");
    let red = [255u8, 0, 0, 255].repeat(16);
    store.insert_asset(
        AssetId::new("red"),
        PreparedImage::from_premul(4, 4, red).unwrap(),
    );
    store
}

fn px(frame: &RasterFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| (i32::from(*x) - i32::from(y)).abs() <= 3)
}

#[test]
fn output_is_scaled_virtual_frame_with_background() {
    let mut s = settings("M");
    s.background_color = Color::from_rgba8(11, 11, 18, 255);
    let frame = compose(Elapsed::Stopped, &s, &AssetList::empty(), &[]);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    assert_eq!((out.width, out.height), (96, 54));
    assert_eq!(out.data.len(), out.byte_len());
    assert!(close(px(&out, 0, 0), [11, 11, 18, 255]));
}

#[test]
fn solid_title_without_font_draws_cells() {
    let mut s = settings("M");
    s.motion.slot_effect = false;
    let frame = compose(Elapsed::Stopped, &s, &AssetList::empty(), &[]);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    assert!(close(px(&out, 48, 27), [255, 255, 255, 255]));
    assert!(close(px(&out, 2, 27), [0, 0, 0, 255]));
}

#[test]
fn locked_slot_shows_its_image() {
    let s = settings("M");
    let assets = AssetList::new(vec![Asset::new("red", "red.png")]).unwrap();
    let m = rebuild_mappings("M", &assets, &[]);
    let frame = compose(Elapsed::Stopped, &s, &assets, &m);
    let mut cap = CpuCapture::new(red_store(), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    assert!(close(px(&out, 48, 27), [255, 0, 0, 255]));
}

#[test]
fn undecoded_asset_falls_back_to_text_color() {
    let s = settings("M");
    let assets = AssetList::new(vec![Asset::new("blue", "blue.png")]).unwrap();
    let m = rebuild_mappings("M", &assets, &[]);
    let frame = compose(Elapsed::Stopped, &s, &assets, &m);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    assert!(close(px(&out, 48, 27), [255, 255, 255, 255]));
}

#[test]
fn letterbox_bars_cover_top_and_bottom() {
    let mut s = settings("");
    s.background_color = Color::WHITE;
    s.scene.letterbox = true;
    let frame = compose(Elapsed::Stopped, &s, &AssetList::empty(), &[]);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    assert!(close(px(&out, 40, 1), [0, 0, 0, 255]));
    assert!(close(px(&out, 40, 52), [0, 0, 0, 255]));
    assert!(close(px(&out, 40, 27), [255, 255, 255, 255]));
}

#[test]
fn dimmer_darkens_background() {
    let mut s = settings("");
    s.background_color = Color::WHITE;
    s.scene.dimmer_pct = 50.0;
    let frame = compose(Elapsed::Stopped, &s, &AssetList::empty(), &[]);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());
    let out = cap.render(&frame, SCALE).unwrap();
    let p = px(&out, 5, 5);
    assert!((120..=135).contains(&p[0]), "{p:?}");
}

#[test]
fn capture_requires_the_current_ack() {
    let s = settings("A");
    let frame = compose(Elapsed::At(10.0), &s, &AssetList::empty(), &[]);
    let mut cap = CpuCapture::new(ImageStore::new("."), FontBook::new());

    let stale = CommitAck {
        elapsed: Elapsed::At(10.0),
        seq: 0,
    };
    assert!(cap.capture(stale, SCALE).is_err());

    let ack = cap.commit(&frame).unwrap();
    assert_eq!(ack.elapsed, Elapsed::At(10.0));
    assert!(cap.capture(stale, SCALE).is_err());
    let out = cap.capture(ack, SCALE).unwrap();
    assert_eq!(out.width, 96);
}

#[test]
fn tilt_foreshortens_about_pivot() {
    let pivot = Point::new(100.0, 50.0);
    let a = tilt_affine(TiltAngles::new(60.0, 0.0), pivot);
    let p = a * Point::new(100.0, 150.0);
    assert!((p.y - 100.0).abs() < 1e-9);
    assert!((p.x - 100.0).abs() < 1e-9);
}
