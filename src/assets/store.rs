use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::{PreparedImage, decode_image, parse_svg};
use crate::assets::svg_raster::{SVG_RASTER_MAX_DIM, rasterize_svg};
use crate::foundation::error::{RevealError, RevealResult};
use crate::scene::asset::{AssetId, AssetList};

/// Normalize a root-relative image reference.
///
/// Uses `/` separators, drops `.` segments, and rejects absolute paths and `..` traversal.
pub fn normalize_rel_path(source: &str) -> RevealResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(RevealError::validation("image paths must be relative"));
    }
    let mut parts = Vec::new();
    for part in s.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(RevealError::validation("image paths must not contain '..'")),
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        return Err(RevealError::validation("image path must contain a file name"));
    }
    Ok(parts.join("/"))
}

/// Decoded images for the asset list and the scene background, keyed for the raster backend.
#[derive(Debug, Default)]
pub struct ImageStore {
    root: PathBuf,
    by_asset: HashMap<AssetId, PreparedImage>,
    by_path: HashMap<String, PreparedImage>,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Decode every asset plus the optional background image under `root`.
    ///
    /// Assets that fail to load are skipped with a warning; the backend then draws those slots
    /// in solid color.
    #[tracing::instrument(skip(assets), fields(assets = assets.len()))]
    pub fn prepare(assets: &AssetList, background: Option<&str>, root: &Path) -> Self {
        let mut store = Self::new(root);
        for asset in assets {
            match store.load_source(&asset.source) {
                Ok(img) => {
                    store.by_asset.insert(asset.id.clone(), img);
                }
                Err(e) => {
                    tracing::warn!(asset = %asset.id, source = %asset.source, error = %e, "asset not decodable; slot falls back to solid fill");
                }
            }
        }
        if let Some(bg) = background {
            if let Err(e) = store.ensure_path(bg) {
                tracing::warn!(source = bg, error = %e, "background image not decodable");
            }
        }
        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn insert_asset(&mut self, id: AssetId, image: PreparedImage) {
        self.by_asset.insert(id, image);
    }

    pub fn insert_path(&mut self, source: impl Into<String>, image: PreparedImage) {
        self.by_path.insert(source.into(), image);
    }

    pub fn asset(&self, id: &AssetId) -> Option<&PreparedImage> {
        self.by_asset.get(id)
    }

    pub fn path(&self, source: &str) -> Option<&PreparedImage> {
        self.by_path.get(source)
    }

    pub fn asset_count(&self) -> usize {
        self.by_asset.len()
    }

    /// Load a path-keyed image once.
    pub fn ensure_path(&mut self, source: &str) -> RevealResult<()> {
        if !self.by_path.contains_key(source) {
            let img = self.load_source(source)?;
            self.by_path.insert(source.to_owned(), img);
        }
        Ok(())
    }

    fn load_source(&self, source: &str) -> RevealResult<PreparedImage> {
        let rel = normalize_rel_path(source)?;
        let path = self.root.join(&rel);
        let bytes = std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        let is_svg = Path::new(&rel)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            let tree = parse_svg(&bytes)?;
            return rasterize_svg(&tree, SVG_RASTER_MAX_DIM);
        }
        decode_image(&bytes).map_err(|e| {
            RevealError::unsupported(format!("cannot decode '{rel}': {e}"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
