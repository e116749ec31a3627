//! Per-character slot state as a pure function of elapsed time.
//!
//! There is no "already locked" flag anywhere: every query recomputes the state from `t` and the
//! lock time, so scrubbing backwards reproduces the spinning visual for that `t`.

use serde::Serialize;

use crate::foundation::math::{Fnv1a64, Rng64};
use crate::scene::asset::{Asset, AssetId, AssetList};
use crate::scene::mapping::CharMapping;
use crate::scene::settings::{Motion, Settings, StartStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LockPhase {
    /// Forced solid color while the global pre-roll guard applies.
    PreRoll,
    /// `t < lock_time`: cycling through assets.
    Spinning,
    /// `t >= lock_time`: showing the final asset.
    Locked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FitMode {
    Width,
    Height,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
/// How an image is sized inside its glyph cell.
pub enum Sizing {
    /// Scale to fully cover the cell, cropping the excess.
    Cover,
    /// `scale_pct` of the cell extent along `fit`; the other axis keeps the aspect ratio.
    Explicit { scale_pct: f64, fit: FitMode },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Image region shown through one glyph.
pub struct ImageFill {
    pub asset: AssetId,
    pub sizing: Sizing,
    /// Anchor position in percent of the free space (50 = centered), CSS `background-position`
    /// semantics.
    pub position_pct: (f64, f64),
}

/// Lock time for slot `index`: the mapping's explicit value, else `duration + index * stagger`.
pub fn lock_time_ms(index: usize, mapping: Option<&CharMapping>, motion: &Motion) -> f64 {
    mapping
        .and_then(|m| m.lock_time_ms)
        .unwrap_or(motion.duration_ms + index as f64 * motion.stagger_ms)
}

/// Whether the global pre-roll guard applies at `t`.
pub fn in_pre_roll(t: f64, settings: &Settings) -> bool {
    settings.motion.start_style == StartStyle::Solid && t < settings.motion.duration_ms
}

/// State of slot `index` at `t`.
pub fn char_phase(t: f64, index: usize, mapping: Option<&CharMapping>, settings: &Settings) -> LockPhase {
    if in_pre_roll(t, settings) {
        return LockPhase::PreRoll;
    }
    if t < lock_time_ms(index, mapping, &settings.motion) {
        LockPhase::Spinning
    } else {
        LockPhase::Locked
    }
}

/// Final asset for slot `index`: the mapped id when it is still present, else the round-robin
/// default. A dangling id therefore behaves exactly like `None`.
pub fn resolve_locked_asset<'a>(
    index: usize,
    mapping: Option<&CharMapping>,
    assets: &'a AssetList,
) -> Option<&'a Asset> {
    let mapped = mapping
        .and_then(|m| m.asset.as_ref())
        .and_then(|id| assets.index_of(id))
        .and_then(|i| assets.get(i));
    if mapped.is_none()
        && let Some(id) = mapping.and_then(|m| m.asset.as_ref())
    {
        tracing::trace!(slot = index, asset = %id, "mapped asset missing; using default");
    }
    mapped.or_else(|| assets.round_robin(index))
}

/// Fill of a locked slot, or `None` when there are no assets (solid color).
pub fn locked_fill(index: usize, mapping: Option<&CharMapping>, assets: &AssetList) -> Option<ImageFill> {
    let asset = resolve_locked_asset(index, mapping, assets)?;
    let (sizing, position_pct) = match mapping {
        Some(m) if !m.is_cover() => (
            Sizing::Explicit {
                scale_pct: m.scale_pct,
                fit: if m.fit_height {
                    FitMode::Height
                } else {
                    FitMode::Width
                },
            },
            (50.0 + m.offset_x_pct, 50.0 + m.offset_y_pct),
        ),
        Some(m) => (Sizing::Cover, (50.0 + m.offset_x_pct, 50.0 + m.offset_y_pct)),
        None => (Sizing::Cover, (50.0, 50.0)),
    };
    Some(ImageFill {
        asset: asset.id.clone(),
        sizing,
        position_pct,
    })
}

/// Fill of a spinning slot at `t`, or `None` when there are no assets.
///
/// The asset and jitter come from a hash of `(seed, index, floor(t / speed))`, so a slot picks a
/// new image every `speed_ms` and the same `t` always yields the same pick, in live playback and
/// export alike.
pub fn spin_fill(t: f64, index: usize, motion: &Motion, assets: &AssetList) -> Option<ImageFill> {
    if assets.is_empty() {
        return None;
    }
    let bucket = (t.max(0.0) / motion.speed_ms.max(f64::EPSILON)).floor() as u64;
    let mut h = Fnv1a64::new_default();
    h.write_u64(motion.seed);
    h.write_u64(index as u64);
    h.write_u64(bucket);
    let mut rng = Rng64::new(h.finish());

    let pick = (rng.next_u64() % assets.len() as u64) as usize;
    let jx = rng.next_f64_signed() * motion.jitter_pct;
    let jy = rng.next_f64_signed() * motion.jitter_pct;
    let asset = assets.get(pick)?;
    Some(ImageFill {
        asset: asset.id.clone(),
        sizing: Sizing::Cover,
        position_pct: (50.0 + jx, 50.0 + jy),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/eval/lock.rs"]
mod tests;
