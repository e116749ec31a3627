use serde::Serialize;

use crate::assets::color::Color;
use crate::eval::lock::{
    ImageFill, LockPhase, Sizing, char_phase, in_pre_roll, locked_fill, spin_fill,
};
use crate::foundation::core::{Affine, Elapsed, Point, VIRTUAL_WIDTH, Vec2};
use crate::foundation::error::{RevealError, RevealResult};
use crate::scene::asset::AssetList;
use crate::scene::mapping::CharMapping;
use crate::scene::settings::{EndStyle, MAX_EXTRUSION_DEPTH, Settings, TiltAngles};

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Complete visual state of the composition at one instant, in virtual 1920x1080 space.
pub struct Frame {
    pub elapsed: Elapsed,
    /// Title text, one glyph per slot.
    pub text: String,
    /// Fallback fill for slots whose image cannot be drawn.
    pub text_color: Color,
    /// Shared by the title layer and its shadow/extrusion layer.
    pub transform: TitleTransform,
    pub title: TitleLayer,
    /// Glow term first, then extrusion copies.
    pub shadows: Vec<ShadowTerm>,
    pub metrics: FontMetrics,
    /// Orientation in degrees. The live session substitutes the tilt controller's value.
    pub orientation: TiltAngles,
    pub scene: SceneLayer,
    pub subtitle: Option<SubtitleLayer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TitleTransform {
    pub scale: f64,
    pub offset_y: f64,
}

impl TitleTransform {
    pub const IDENTITY: TitleTransform = TitleTransform {
        scale: 1.0,
        offset_y: 0.0,
    };

    /// Uniform scale about `anchor`, followed by the vertical offset.
    pub fn to_affine(self, anchor: Point) -> Affine {
        Affine::translate(Vec2::new(0.0, self.offset_y))
            * Affine::translate(anchor.to_vec2())
            * Affine::scale(self.scale)
            * Affine::translate(-anchor.to_vec2())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolidReason {
    /// The slot effect is disabled.
    StaticText,
    /// `t < duration` with a solid start style.
    PreRoll,
    /// Stopped with a solid end style.
    Resting,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TitleLayer {
    /// The whole title as one flat block of color.
    Solid { color: Color, reason: SolidReason },
    /// One independently composited layer per character.
    Slots(Vec<CharLayer>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CharLayer {
    pub index: usize,
    pub ch: char,
    pub phase: LockPhase,
    pub fill: CharFill,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CharFill {
    Solid(Color),
    Image(ImageFill),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ShadowTerm {
    /// Soft blurred copy of the glyphs.
    Glow { radius: f64, color: Color },
    /// Hard copy offset by `(dx, dy)` virtual pixels.
    Offset { dx: f64, dy: f64, color: Color },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Pixel sizes derived from percentages of the virtual frame width.
pub struct FontMetrics {
    pub font: String,
    pub title_px: f64,
    pub letter_spacing_px: f64,
}

impl FontMetrics {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            font: settings.font.clone(),
            title_px: width_pct(settings.font_size_pct),
            letter_spacing_px: width_pct(settings.letter_spacing_pct),
        }
    }
}

fn width_pct(p: f64) -> f64 {
    p / 100.0 * VIRTUAL_WIDTH
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneLayer {
    pub background_color: Color,
    pub background_image: Option<String>,
    /// Black overlay opacity in `[0, 1]`.
    pub dimmer: f64,
    pub blur_px: f64,
    pub halftone: bool,
    pub letterbox: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Line under the title, drawn with the title font.
pub struct SubtitleLayer {
    pub text: String,
    pub color: Color,
    pub px: f64,
    pub spacing_px: f64,
    /// Gap between the title and the subtitle.
    pub margin_px: f64,
}

/// Scale of the title at `elapsed`: grows linearly from `startScale / 100` to 1 over `duration`.
pub fn title_transform(elapsed: Elapsed, settings: &Settings) -> TitleTransform {
    let m = &settings.motion;
    let p = match elapsed {
        Elapsed::Stopped => 1.0,
        Elapsed::At(_) if m.duration_ms <= 0.0 => 1.0,
        Elapsed::At(t) => (t / m.duration_ms).clamp(0.0, 1.0),
    };
    let s0 = m.start_scale_pct / 100.0;
    TitleTransform {
        scale: s0 + (1.0 - s0) * p,
        offset_y: m.offset_y_px,
    }
}

/// Glow and extrusion terms. Either may be absent. Depth is capped at [`MAX_EXTRUSION_DEPTH`].
pub fn shadow_terms(settings: &Settings) -> Vec<ShadowTerm> {
    let color = settings.shadow_color;
    let depth = settings.extrusion_depth.min(MAX_EXTRUSION_DEPTH);
    let mut out = Vec::with_capacity(depth as usize + 1);
    if settings.glow_radius > 0.0 {
        out.push(ShadowTerm::Glow {
            radius: settings.glow_radius,
            color,
        });
    }
    for k in 1..=depth {
        let d = f64::from(k);
        out.push(ShadowTerm::Offset {
            dx: d,
            dy: d,
            color,
        });
    }
    out
}

/// Compose the frame at `elapsed`.
///
/// Pure: the output depends only on the arguments, so the live player and the exporter share
/// this function and the same `elapsed` always yields the same frame.
pub fn compose(
    elapsed: Elapsed,
    settings: &Settings,
    assets: &AssetList,
    mappings: &[CharMapping],
) -> Frame {
    let title = title_layer(elapsed, settings, assets, mappings);
    frame_with_title(elapsed, settings, title)
}

/// Resting frame with every slot locked onto asset `slot` (cover sizing). Used for per-asset
/// previews in asset-list order.
pub fn compose_slot_preview(
    slot: usize,
    settings: &Settings,
    assets: &AssetList,
) -> RevealResult<Frame> {
    let asset = assets.get(slot).ok_or_else(|| {
        RevealError::validation(format!(
            "slot preview index {slot} out of range (len {})",
            assets.len()
        ))
    })?;
    let layers = settings
        .text
        .chars()
        .enumerate()
        .map(|(index, ch)| CharLayer {
            index,
            ch,
            phase: LockPhase::Locked,
            fill: CharFill::Image(ImageFill {
                asset: asset.id.clone(),
                sizing: Sizing::Cover,
                position_pct: (50.0, 50.0),
            }),
        })
        .collect();
    Ok(frame_with_title(
        Elapsed::Stopped,
        settings,
        TitleLayer::Slots(layers),
    ))
}

fn frame_with_title(elapsed: Elapsed, settings: &Settings, title: TitleLayer) -> Frame {
    Frame {
        elapsed,
        text: settings.text.clone(),
        text_color: settings.text_color,
        transform: title_transform(elapsed, settings),
        title,
        shadows: shadow_terms(settings),
        metrics: FontMetrics::from_settings(settings),
        orientation: if settings.motion.tilt {
            settings.tilt_angles.clamped()
        } else {
            TiltAngles::ZERO
        },
        scene: SceneLayer {
            background_color: settings.background_color,
            background_image: settings.scene.background_image.clone(),
            dimmer: (settings.scene.dimmer_pct / 100.0).clamp(0.0, 1.0),
            blur_px: settings.scene.blur_px.max(0.0),
            halftone: settings.scene.halftone,
            letterbox: settings.scene.letterbox,
        },
        subtitle: (settings.subtitle.enabled && !settings.subtitle.text.is_empty()).then(|| {
            SubtitleLayer {
                text: settings.subtitle.text.clone(),
                color: settings.text_color,
                px: width_pct(settings.subtitle.size_pct),
                spacing_px: width_pct(settings.subtitle.spacing_pct),
                margin_px: settings.subtitle.margin_px,
            }
        }),
    }
}

fn title_layer(
    elapsed: Elapsed,
    settings: &Settings,
    assets: &AssetList,
    mappings: &[CharMapping],
) -> TitleLayer {
    let solid = |reason| TitleLayer::Solid {
        color: settings.text_color,
        reason,
    };

    if !settings.motion.slot_effect {
        return solid(SolidReason::StaticText);
    }

    let t = match elapsed {
        Elapsed::Stopped => {
            if settings.motion.end_style != EndStyle::Image {
                return solid(SolidReason::Resting);
            }
            return TitleLayer::Slots(
                settings
                    .text
                    .chars()
                    .enumerate()
                    .map(|(index, ch)| {
                        let fill = locked_fill(index, mappings.get(index), assets);
                        CharLayer {
                            index,
                            ch,
                            phase: LockPhase::Locked,
                            fill: fill.map_or(CharFill::Solid(settings.text_color), CharFill::Image),
                        }
                    })
                    .collect(),
            );
        }
        Elapsed::At(t) => t,
    };

    if in_pre_roll(t, settings) {
        return solid(SolidReason::PreRoll);
    }

    TitleLayer::Slots(
        settings
            .text
            .chars()
            .enumerate()
            .map(|(index, ch)| {
                let mapping = mappings.get(index);
                let phase = char_phase(t, index, mapping, settings);
                let fill = match phase {
                    LockPhase::Spinning => spin_fill(t, index, &settings.motion, assets),
                    LockPhase::Locked => locked_fill(index, mapping, assets),
                    LockPhase::PreRoll => None,
                };
                CharLayer {
                    index,
                    ch,
                    phase,
                    fill: fill.map_or(CharFill::Solid(settings.text_color), CharFill::Image),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/eval/compositor.rs"]
mod tests;
