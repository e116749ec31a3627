use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::foundation::error::{RevealError, RevealResult};

/// Largest tilt angle (degrees) on either axis.
pub const MAX_TILT_DEG: f64 = 60.0;
/// Largest accepted `extrusionDepth`.
pub const MAX_EXTRUSION_DEPTH: u32 = 64;
/// Upper bound for `durationMs`, `staggerMs` and explicit lock times (one hour).
pub const MAX_TIMELINE_MS: f64 = 3_600_000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Everything the compositor needs besides assets and mappings.
///
/// A `Settings` value is never edited in place while a frame is being composed; updates go
/// through [`Settings::patched`], which returns a new value.
pub struct Settings {
    /// Title text. Each Unicode scalar value is one slot.
    pub text: String,
    /// Font identifier, resolved by the raster backend's font book.
    pub font: String,
    pub background_color: Color,
    pub text_color: Color,
    /// Color shared by the glow and extrusion terms.
    pub shadow_color: Color,
    /// Title size as a percentage of the virtual frame width.
    pub font_size_pct: f64,
    /// Letter spacing as a percentage of the virtual frame width.
    pub letter_spacing_pct: f64,
    /// Number of stacked 1px extrusion copies.
    pub extrusion_depth: u32,
    /// Glow radius in virtual pixels; 0 disables the glow.
    pub glow_radius: f64,
    pub subtitle: Subtitle,
    pub motion: Motion,
    pub scene: Scene,
    /// Persisted tilt, written back when a manual drag is released.
    pub tilt_angles: TiltAngles,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text: "REVEAL".to_owned(),
            font: "default".to_owned(),
            background_color: Color::from_rgba8(11, 11, 18, 255),
            text_color: Color::WHITE,
            shadow_color: Color::from_rgba8(255, 51, 102, 255),
            font_size_pct: 15.0,
            letter_spacing_pct: 0.5,
            extrusion_depth: 0,
            glow_radius: 0.0,
            subtitle: Subtitle::default(),
            motion: Motion::default(),
            scene: Scene::default(),
            tilt_angles: TiltAngles::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subtitle {
    pub enabled: bool,
    pub text: String,
    /// Subtitle size as a percentage of the virtual frame width.
    pub size_pct: f64,
    /// Letter spacing as a percentage of the virtual frame width.
    pub spacing_pct: f64,
    /// Gap between the title block and the subtitle, in virtual pixels.
    pub margin_px: f64,
}

impl Default for Subtitle {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            size_pct: 2.5,
            spacing_pct: 0.8,
            margin_px: 24.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How the title looks before the growth phase completes.
pub enum StartStyle {
    /// Flat solid-color text until `duration` (pre-roll).
    Solid,
    /// Slots spin from the first frame.
    #[default]
    Image,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// What the resting (stopped) frame shows.
pub enum EndStyle {
    /// Every character frozen on its locked image.
    #[default]
    Image,
    /// The whole title reverts to solid color.
    Solid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Motion {
    pub slot_effect: bool,
    pub tilt: bool,
    pub tilt_auto: bool,
    /// Growth duration; also the default lock time of the first character.
    pub duration_ms: f64,
    /// Per-character lock delay.
    pub stagger_ms: f64,
    /// Flicker interval: a spinning slot picks a new image every `speed_ms`.
    pub speed_ms: f64,
    /// Spinning image position jitter, in percent around center.
    pub jitter_pct: f64,
    /// Scale at `t = 0`, in percent. Grows linearly to 100 at `duration`.
    pub start_scale_pct: f64,
    pub offset_y_px: f64,
    pub start_style: StartStyle,
    pub end_style: EndStyle,
    /// Seed for the spinning-slot selection and jitter.
    pub seed: u64,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            slot_effect: true,
            tilt: false,
            tilt_auto: true,
            duration_ms: 2000.0,
            stagger_ms: 150.0,
            speed_ms: 80.0,
            jitter_pct: 10.0,
            start_scale_pct: 80.0,
            offset_y_px: 0.0,
            start_style: StartStyle::default(),
            end_style: EndStyle::default(),
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    /// Optional background image path (relative to the asset root).
    pub background_image: Option<String>,
    /// Black overlay opacity over the background image, in percent.
    pub dimmer_pct: f64,
    /// Background image blur radius in virtual pixels.
    pub blur_px: f64,
    pub halftone: bool,
    pub letterbox: bool,
    /// Optional audio track path, played by the live session only.
    pub audio: Option<String>,
    pub volume: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background_image: None,
            dimmer_pct: 0.0,
            blur_px: 0.0,
            halftone: false,
            letterbox: false,
            audio: None,
            volume: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Orientation in degrees around the horizontal (`x`) and vertical (`y`) axes.
pub struct TiltAngles {
    pub x: f64,
    pub y: f64,
}

impl TiltAngles {
    pub const ZERO: TiltAngles = TiltAngles { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes to `[-60, 60]`; non-finite values collapse to 0.
    pub fn clamped(self) -> Self {
        fn clamp(v: f64) -> f64 {
            if v.is_finite() {
                v.clamp(-MAX_TILT_DEG, MAX_TILT_DEG)
            } else {
                0.0
            }
        }
        Self {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }
}

impl Settings {
    /// Number of slots (characters) in the title.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check numeric invariants. Values that have a natural clamp are handled by
    /// [`Settings::normalized`] instead of being rejected.
    pub fn validate(&self) -> RevealResult<()> {
        let m = &self.motion;
        if !(0.0..=MAX_TIMELINE_MS).contains(&m.duration_ms) {
            return Err(RevealError::validation(format!(
                "motion.durationMs must be within [0, {MAX_TIMELINE_MS}]"
            )));
        }
        if !(0.0..=MAX_TIMELINE_MS).contains(&m.stagger_ms) {
            return Err(RevealError::validation(format!(
                "motion.staggerMs must be within [0, {MAX_TIMELINE_MS}]"
            )));
        }
        if !m.speed_ms.is_finite() || m.speed_ms <= 0.0 {
            return Err(RevealError::validation("motion.speedMs must be finite and > 0"));
        }
        if !(0.0..=300.0).contains(&m.start_scale_pct) {
            return Err(RevealError::validation(
                "motion.startScalePct must be within [0, 300]",
            ));
        }
        if !m.jitter_pct.is_finite() || m.jitter_pct < 0.0 {
            return Err(RevealError::validation("motion.jitterPct must be finite and >= 0"));
        }
        if !m.offset_y_px.is_finite() {
            return Err(RevealError::validation("motion.offsetYPx must be finite"));
        }
        if self.extrusion_depth > MAX_EXTRUSION_DEPTH {
            return Err(RevealError::validation(format!(
                "extrusionDepth must be <= {MAX_EXTRUSION_DEPTH}"
            )));
        }
        if !self.font_size_pct.is_finite() || self.font_size_pct <= 0.0 {
            return Err(RevealError::validation("fontSizePct must be finite and > 0"));
        }
        for (name, v) in [
            ("letterSpacingPct", self.letter_spacing_pct),
            ("glowRadius", self.glow_radius),
            ("subtitle.sizePct", self.subtitle.size_pct),
            ("subtitle.spacingPct", self.subtitle.spacing_pct),
            ("subtitle.marginPx", self.subtitle.margin_px),
            ("scene.dimmerPct", self.scene.dimmer_pct),
            ("scene.blurPx", self.scene.blur_px),
        ] {
            if !v.is_finite() {
                return Err(RevealError::validation(format!("{name} must be finite")));
            }
        }
        if self.glow_radius < 0.0 || self.scene.blur_px < 0.0 {
            return Err(RevealError::validation(
                "glowRadius and scene.blurPx must be >= 0",
            ));
        }
        Ok(())
    }

    /// Apply the clamping invariants: tilt in `[-60, 60]`, volume and dimmer in range.
    pub fn normalized(mut self) -> Self {
        self.tilt_angles = self.tilt_angles.clamped();
        self.scene.volume = if self.scene.volume.is_finite() {
            self.scene.volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.scene.dimmer_pct = self.scene.dimmer_pct.clamp(0.0, 100.0);
        self
    }

    /// Return a new value with `patch` merged in. `self` is left untouched.
    pub fn patched(&self, patch: &SettingsPatch) -> RevealResult<Self> {
        let mut doc = serde_json::to_value(self).map_err(|e| RevealError::serde(e.to_string()))?;
        merge_json(&mut doc, &patch.0);
        let next: Settings = serde_json::from_value(doc)
            .map_err(|e| RevealError::serde(format!("apply settings patch: {e}")))?;
        let next = next.normalized();
        next.validate()?;
        Ok(next)
    }
}

/// Partial settings update expressed as a JSON merge document.
///
/// Keys use the same camelCase names as the serialized [`Settings`]. Nested objects merge
/// recursively; `null` resets a field to its default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsPatch(serde_json::Value);

impl SettingsPatch {
    pub fn new() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn from_value(value: serde_json::Value) -> RevealResult<Self> {
        if !value.is_object() {
            return Err(RevealError::validation("settings patch must be a JSON object"));
        }
        Ok(Self(value))
    }

    /// Set one field by dotted path, e.g. `set("motion.durationMs", 1500.0)`.
    pub fn set(mut self, path: &str, value: impl Serialize) -> RevealResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| RevealError::serde(e.to_string()))?;
        let mut cursor = &mut self.0;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if part.is_empty() {
                return Err(RevealError::validation(format!("invalid patch path '{path}'")));
            }
            let obj = cursor
                .as_object_mut()
                .ok_or_else(|| RevealError::validation(format!("invalid patch path '{path}'")))?;
            if parts.peek().is_none() {
                obj.insert(part.to_owned(), value);
                break;
            }
            cursor = obj
                .entry(part.to_owned())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(self)
    }

    /// Whether the patch names the given top-level or dotted key.
    pub fn touches(&self, path: &str) -> bool {
        let mut cursor = &self.0;
        for part in path.split('.') {
            match cursor.get(part) {
                Some(v) => cursor = v,
                None => return false,
            }
        }
        true
    }
}

fn merge_json(target: &mut serde_json::Value, patch: &serde_json::Value) {
    let serde_json::Value::Object(patch_obj) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = serde_json::Value::Object(serde_json::Map::new());
    }
    let Some(target_obj) = target.as_object_mut() else {
        return;
    };
    for (k, v) in patch_obj {
        if v.is_null() {
            target_obj.remove(k);
        } else {
            merge_json(
                target_obj.entry(k.clone()).or_insert(serde_json::Value::Null),
                v,
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/settings.rs"]
mod tests;
