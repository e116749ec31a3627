use std::io::Cursor;

use super::*;
use crate::scene::asset::Asset;

fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slotreveal_store_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn rel_paths_are_normalized() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn prepare_decodes_and_skips_broken_assets() {
    let root = temp_root("prepare");
    write_png(&root.join("red.png"), [255, 0, 0, 255]);
    std::fs::write(root.join("broken.png"), b"nope").unwrap();
    std::fs::write(
        root.join("mark.svg"),
        br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#00f"/></svg>"##,
    )
    .unwrap();

    let assets = AssetList::new(vec![
        Asset::new("red", "red.png"),
        Asset::new("broken", "broken.png"),
        Asset::new("mark", "mark.svg"),
        Asset::new("gone", "missing.png"),
    ])
    .unwrap();
    let store = ImageStore::prepare(&assets, Some("red.png"), &root);

    assert_eq!(store.asset_count(), 2);
    let red = store.asset(&AssetId::new("red")).unwrap();
    assert_eq!((red.width, red.height), (3, 2));
    let mark = store.asset(&AssetId::new("mark")).unwrap();
    assert_eq!(mark.width, SVG_RASTER_MAX_DIM);
    assert!(store.asset(&AssetId::new("broken")).is_none());
    assert!(store.path("red.png").is_some());
}
