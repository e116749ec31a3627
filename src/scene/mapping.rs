use serde::{Deserialize, Deserializer, Serialize};

use crate::foundation::error::{RevealError, RevealResult};
use crate::scene::asset::{AssetId, AssetList};
use crate::scene::settings::MAX_TIMELINE_MS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Per-character slot configuration, positionally aligned with the title text.
pub struct CharMapping {
    /// The character this slot belongs to (display/debugging only).
    pub ch: char,
    /// Final asset. `None` means the round-robin default for this slot.
    #[serde(default)]
    pub asset: Option<AssetId>,
    /// Locked image size in percent. `100` with width fit means "cover the glyph cell".
    #[serde(default = "default_scale_pct")]
    pub scale_pct: f64,
    #[serde(default)]
    pub offset_x_pct: f64,
    #[serde(default)]
    pub offset_y_pct: f64,
    /// Size the locked image by cell height instead of cell width.
    #[serde(default)]
    pub fit_height: bool,
    /// Explicit lock time. `None` derives `duration + index * stagger`.
    #[serde(default)]
    pub lock_time_ms: Option<f64>,
}

fn default_scale_pct() -> f64 {
    100.0
}

impl CharMapping {
    /// Fresh mapping: round-robin asset, cover sizing, default lock time.
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            asset: None,
            scale_pct: default_scale_pct(),
            offset_x_pct: 0.0,
            offset_y_pct: 0.0,
            fit_height: false,
            lock_time_ms: None,
        }
    }

    /// Whether the locked image covers the glyph cell rather than using explicit sizing.
    pub fn is_cover(&self) -> bool {
        self.scale_pct == 100.0 && !self.fit_height
    }
}

/// Rebuild mappings for `text` against `assets`.
///
/// Slot `i` keeps `prior[i]` only when its character is unchanged and its asset (if any) is still
/// present; otherwise it gets a fresh default. Rebuilding with unchanged inputs returns `prior`
/// unchanged.
pub fn rebuild_mappings(text: &str, assets: &AssetList, prior: &[CharMapping]) -> Vec<CharMapping> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| match prior.get(i) {
            Some(p) if p.ch == ch && p.asset.as_ref().is_none_or(|id| assets.contains(id)) => {
                p.clone()
            }
            _ => CharMapping::new(ch),
        })
        .collect()
}

/// Round-robin default for slot `index`: `assets[index % len]`.
pub fn default_asset_for(index: usize, assets: &AssetList) -> Option<&AssetId> {
    assets.round_robin(index).map(|a| &a.id)
}

/// Partial edit of one mapping. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MappingPatch {
    /// `Some(None)` resets the slot to its round-robin default.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub asset: Option<Option<AssetId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_height: Option<bool>,
    /// Lock time in seconds as entered by the user; `Some(None)` restores the default.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub lock_time_s: Option<Option<f64>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Apply `patch` to slot `index`, returning the new mapping array.
pub fn update_mapping(
    mappings: &[CharMapping],
    index: usize,
    patch: &MappingPatch,
    assets: &AssetList,
) -> RevealResult<Vec<CharMapping>> {
    let Some(current) = mappings.get(index) else {
        return Err(RevealError::validation(format!(
            "mapping index {index} out of range (len {})",
            mappings.len()
        )));
    };

    let mut next = current.clone();
    if let Some(asset) = &patch.asset {
        if let Some(id) = asset {
            assets.require(id)?;
        }
        next.asset = asset.clone();
    }
    if let Some(v) = patch.scale_pct {
        if !v.is_finite() || v < 0.0 {
            return Err(RevealError::validation("scalePct must be finite and >= 0"));
        }
        next.scale_pct = v;
    }
    if let Some(v) = patch.offset_x_pct {
        next.offset_x_pct = finite("offsetXPct", v)?;
    }
    if let Some(v) = patch.offset_y_pct {
        next.offset_y_pct = finite("offsetYPct", v)?;
    }
    if let Some(v) = patch.fit_height {
        next.fit_height = v;
    }
    if let Some(lock) = patch.lock_time_s {
        next.lock_time_ms = match lock {
            Some(secs) if !(0.0..=MAX_TIMELINE_MS / 1000.0).contains(&secs) => {
                return Err(RevealError::validation(format!(
                    "lockTimeS must be within [0, {}]",
                    MAX_TIMELINE_MS / 1000.0
                )));
            }
            Some(secs) => Some(secs * 1000.0),
            None => None,
        };
    }

    let mut out = mappings.to_vec();
    out[index] = next;
    Ok(out)
}

fn finite(name: &str, v: f64) -> RevealResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RevealError::validation(format!("{name} must be finite")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mapping.rs"]
mod tests;
