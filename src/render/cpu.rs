use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use vello_cpu::kurbo as vk;

use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::assets::store::ImageStore;
use crate::eval::compositor::{CharFill, Frame, ShadowTerm, TitleLayer};
use crate::eval::lock::{FitMode, ImageFill, Sizing};
use crate::export::sink::{CommitAck, FrameCapture, RasterFrame};
use crate::foundation::core::{Affine, Canvas, Point, VIRTUAL_HEIGHT, VIRTUAL_WIDTH, Vec2};
use crate::foundation::error::{RevealError, RevealResult};
use crate::foundation::math::unpremultiply_px;
use crate::render::blur::{device_radius, gaussian_blur_premul};
use crate::render::composite::{fill, over_in_place, over_px};
use crate::render::text::{FontBook, GlyphShaper};
use crate::scene::asset::AssetId;
use crate::scene::settings::TiltAngles;

/// Share of the frame height covered by each letterbox bar.
const LETTERBOX_PCT: f64 = 10.0;
/// Halftone dot pitch and radius in virtual pixels.
const HALFTONE_PITCH: f64 = 8.0;
const HALFTONE_RADIUS: f64 = 1.6;
const HALFTONE_ALPHA: u8 = 46;

/// CPU capture surface: rasterizes committed frames with `vello_cpu` and shapes text with
/// `parley`.
pub struct CpuCapture {
    images: ImageStore,
    fonts: FontBook,
    shaper: GlyphShaper,
    font_data: HashMap<String, vello_cpu::peniko::FontData>,
    asset_paints: HashMap<AssetId, Paint>,
    path_paints: HashMap<String, Paint>,
    warned_fonts: HashSet<String>,
    broken_fonts: HashSet<String>,
    committed: Option<(Frame, CommitAck)>,
    seq: u64,
}

#[derive(Clone)]
struct Paint {
    image: vello_cpu::Image,
    width: f64,
    height: f64,
}

/// Character cells in virtual space, before the title transform.
struct TextBlock {
    font: Option<vello_cpu::peniko::FontData>,
    size_px: f32,
    cells: Vec<Cell>,
    bounds: vk::Rect,
}

struct Cell {
    rect: vk::Rect,
    glyphs: Vec<vello_cpu::Glyph>,
    blank: bool,
}

impl CpuCapture {
    pub fn new(images: ImageStore, fonts: FontBook) -> Self {
        Self {
            images,
            fonts,
            shaper: GlyphShaper::new(),
            font_data: HashMap::new(),
            asset_paints: HashMap::new(),
            path_paints: HashMap::new(),
            warned_fonts: HashSet::new(),
            broken_fonts: HashSet::new(),
            committed: None,
            seq: 0,
        }
    }

    /// Replace the decoded images (after the asset list changed).
    pub fn set_images(&mut self, images: ImageStore) {
        self.images = images;
        self.asset_paints.clear();
        self.path_paints.clear();
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Rasterize `frame` at `scale` times the virtual size. Straight-alpha RGBA8.
    #[tracing::instrument(skip(self, frame), fields(elapsed = ?frame.elapsed))]
    pub fn render(&mut self, frame: &Frame, scale: f64) -> RevealResult<RasterFrame> {
        let canvas = Canvas::scaled(scale)?;
        let (w16, h16) = (canvas.width as u16, canvas.height as u16);
        let s = f64::from(canvas.width) / VIRTUAL_WIDTH;
        let view = vk::Affine::scale(s);

        let mut buf = vec![0u8; canvas.width as usize * canvas.height as usize * 4];
        fill(&mut buf, premul(frame.scene.background_color));

        if let Some(src) = frame.scene.background_image.as_deref()
            && let Some(paint) = self.path_paint(src)
        {
            let layer = draw_layer(w16, h16, |ctx| {
                let frame_rect = vk::Rect::new(0.0, 0.0, VIRTUAL_WIDTH, VIRTUAL_HEIGHT);
                ctx.set_transform(view);
                ctx.set_paint(paint.image.clone());
                ctx.set_paint_transform(cover_transform(frame_rect, &paint, (50.0, 50.0)));
                ctx.fill_rect(&frame_rect);
            });
            let layer = gaussian_blur_premul(
                &layer,
                canvas.width,
                canvas.height,
                device_radius(frame.scene.blur_px, s),
            )?;
            over_in_place(&mut buf, &layer, 1.0)?;
        }
        if frame.scene.dimmer > 0.0 {
            let dim = [0, 0, 0, 255];
            for px in buf.chunks_exact_mut(4) {
                let out = over_px([px[0], px[1], px[2], px[3]], dim, frame.scene.dimmer as f32);
                px.copy_from_slice(&out);
            }
        }

        let (title, subtitle) = self.layout_text(frame)?;
        let pivot = vk::Point::new(
            (title.bounds.x0 + title.bounds.x1) / 2.0,
            (title.bounds.y0 + title.bounds.y1) / 2.0,
        );
        let tilt = tilt_affine(frame.orientation, Point::new(pivot.x, pivot.y));
        let title_xf = view
            * to_cpu(tilt)
            * to_cpu(frame.transform.to_affine(Point::new(pivot.x, pivot.y)));

        for term in &frame.shadows {
            if let ShadowTerm::Glow { radius, color } = *term {
                let layer = draw_layer(w16, h16, |ctx| {
                    ctx.set_transform(title_xf);
                    ctx.set_paint(cpu_color(color));
                    draw_cells(ctx, &title);
                });
                let layer = gaussian_blur_premul(
                    &layer,
                    canvas.width,
                    canvas.height,
                    device_radius(radius, s),
                )?;
                over_in_place(&mut buf, &layer, 1.0)?;
            }
        }

        let char_paints: Vec<Option<Paint>> = match &frame.title {
            TitleLayer::Slots(layers) => layers
                .iter()
                .map(|l| match &l.fill {
                    CharFill::Image(f) => self.asset_paint(&f.asset),
                    CharFill::Solid(_) => None,
                })
                .collect(),
            TitleLayer::Solid { .. } => Vec::new(),
        };

        let main = draw_layer(w16, h16, |ctx| {
            // Deepest extrusion copy first so nearer copies overlap it.
            for term in frame.shadows.iter().rev() {
                if let ShadowTerm::Offset { dx, dy, color } = *term {
                    ctx.set_transform(title_xf * vk::Affine::translate((dx, dy)));
                    ctx.set_paint(cpu_color(color));
                    draw_cells(ctx, &title);
                }
            }

            ctx.set_transform(title_xf);
            match &frame.title {
                TitleLayer::Solid { color, .. } => {
                    ctx.set_paint(cpu_color(*color));
                    draw_cells(ctx, &title);
                }
                TitleLayer::Slots(layers) => {
                    for (layer, paint) in layers.iter().zip(&char_paints) {
                        let Some(cell) = title.cells.get(layer.index) else {
                            continue;
                        };
                        match (&layer.fill, paint) {
                            (CharFill::Image(f), Some(p)) => {
                                ctx.set_paint(p.image.clone());
                                ctx.set_paint_transform(image_fill_transform(cell.rect, p, f));
                            }
                            (CharFill::Solid(c), _) => ctx.set_paint(cpu_color(*c)),
                            // Decoding failed for this asset.
                            (CharFill::Image(_), None) => {
                                ctx.set_paint(cpu_color(frame.text_color));
                            }
                        }
                        draw_cell(ctx, &title, cell);
                        ctx.set_paint_transform(vk::Affine::IDENTITY);
                    }
                }
            }

            if let (Some(sub), Some(block)) = (&frame.subtitle, &subtitle) {
                let anchor = Affine::translate(Vec2::new(0.0, frame.transform.offset_y));
                ctx.set_transform(view * to_cpu(tilt) * to_cpu(anchor));
                ctx.set_paint(cpu_color(sub.color));
                draw_cells(ctx, block);
            }

            if frame.scene.halftone {
                ctx.set_transform(view);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, HALFTONE_ALPHA));
                ctx.fill_path(&halftone_path());
            }
            if frame.scene.letterbox {
                let bar = VIRTUAL_HEIGHT * LETTERBOX_PCT / 100.0;
                ctx.set_transform(view);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
                ctx.fill_rect(&vk::Rect::new(0.0, 0.0, VIRTUAL_WIDTH, bar));
                ctx.fill_rect(&vk::Rect::new(
                    0.0,
                    VIRTUAL_HEIGHT - bar,
                    VIRTUAL_WIDTH,
                    VIRTUAL_HEIGHT,
                ));
            }
        });
        over_in_place(&mut buf, &main, 1.0)?;

        for px in buf.chunks_exact_mut(4) {
            unpremultiply_px(px);
        }
        Ok(RasterFrame {
            width: canvas.width,
            height: canvas.height,
            data: buf,
        })
    }

    fn layout_text(&mut self, frame: &Frame) -> RevealResult<(TextBlock, Option<TextBlock>)> {
        let font = self.font(&frame.metrics.font);
        if font.is_some() {
            match self.layout_blocks(frame, font.as_ref()) {
                Ok(blocks) => return Ok(blocks),
                Err(e) => {
                    tracing::warn!(font = %frame.metrics.font, error = %e, "font cannot be shaped; drawing glyph cells");
                    self.font_data.remove(&frame.metrics.font);
                    self.warned_fonts.insert(frame.metrics.font.clone());
                    self.broken_fonts.insert(frame.metrics.font.clone());
                }
            }
        }
        self.layout_blocks(frame, None)
    }

    fn layout_blocks(
        &mut self,
        frame: &Frame,
        font: Option<&vello_cpu::peniko::FontData>,
    ) -> RevealResult<(TextBlock, Option<TextBlock>)> {
        let m = &frame.metrics;
        let mut title = self.layout_line(&m.font, font, &frame.text, m.title_px, m.letter_spacing_px)?;
        let mut subtitle = match &frame.subtitle {
            Some(sub) => Some(self.layout_line(
                &m.font,
                font,
                &sub.text,
                sub.px,
                sub.spacing_px,
            )?),
            None => None,
        };

        // Center the title block (title plus optional subtitle) in the virtual frame.
        let title_h = title.bounds.height();
        let (block_h, sub_top) = match (&subtitle, &frame.subtitle) {
            (Some(b), Some(sub)) => (
                title_h + sub.margin_px + b.bounds.height(),
                title_h + sub.margin_px,
            ),
            _ => (title_h, 0.0),
        };
        let top = (VIRTUAL_HEIGHT - block_h) / 2.0;
        place(&mut title, top);
        if let Some(b) = subtitle.as_mut() {
            place(b, top + sub_top);
        }
        Ok((title, subtitle))
    }

    /// Lay out one line at the origin; [`place`] moves it into the frame.
    fn layout_line(
        &mut self,
        font_id: &str,
        font: Option<&vello_cpu::peniko::FontData>,
        text: &str,
        size_px: f64,
        spacing_px: f64,
    ) -> RevealResult<TextBlock> {
        let bytes = match font {
            Some(_) => Some(self.fonts.get(font_id)?),
            None => None,
        };
        let mut cells = Vec::new();
        let mut x = 0.0;
        let mut height: f64 = 0.0;
        for (i, ch) in text.chars().enumerate() {
            if i > 0 {
                x += spacing_px;
            }
            let (advance, h, glyphs) = match &bytes {
                Some(bytes) => {
                    let shaped = self
                        .shaper
                        .shape_char(font_id, bytes, ch, size_px as f32)?;
                    (shaped.advance, shaped.height, shaped.glyphs)
                }
                // Rectangular cells stand in for glyphs without a font.
                None => (size_px * 0.6, size_px * 1.2, Vec::new()),
            };
            let rect = vk::Rect::new(x, 0.0, x + advance, h);
            cells.push(Cell {
                rect,
                glyphs,
                blank: ch.is_whitespace(),
            });
            height = height.max(h);
            x += advance;
        }
        if cells.is_empty() {
            height = size_px * 1.2;
        }
        Ok(TextBlock {
            font: font.cloned(),
            size_px: size_px as f32,
            cells,
            bounds: vk::Rect::new(0.0, 0.0, x, height),
        })
    }

    /// Font data for `id`, or `None` (logged once per id) when the font book lacks it.
    fn font(&mut self, id: &str) -> Option<vello_cpu::peniko::FontData> {
        if let Some(f) = self.font_data.get(id) {
            return Some(f.clone());
        }
        if self.broken_fonts.contains(id) {
            return None;
        }
        match self.fonts.get(id) {
            Ok(bytes) => {
                let font = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                );
                self.font_data.insert(id.to_owned(), font.clone());
                Some(font)
            }
            Err(e) => {
                if self.warned_fonts.insert(id.to_owned()) {
                    tracing::warn!(font = id, error = %e, "font unavailable; drawing glyph cells");
                }
                None
            }
        }
    }

    fn asset_paint(&mut self, id: &AssetId) -> Option<Paint> {
        if let Some(p) = self.asset_paints.get(id) {
            return Some(p.clone());
        }
        let paint = paint_from(self.images.asset(id)?).ok()?;
        self.asset_paints.insert(id.clone(), paint.clone());
        Some(paint)
    }

    fn path_paint(&mut self, source: &str) -> Option<Paint> {
        if let Some(p) = self.path_paints.get(source) {
            return Some(p.clone());
        }
        if let Err(e) = self.images.ensure_path(source) {
            tracing::warn!(source, error = %e, "background image unavailable");
            return None;
        }
        let paint = paint_from(self.images.path(source)?).ok()?;
        self.path_paints.insert(source.to_owned(), paint.clone());
        Some(paint)
    }
}

impl FrameCapture for CpuCapture {
    fn commit(&mut self, frame: &Frame) -> RevealResult<CommitAck> {
        self.seq += 1;
        let ack = CommitAck {
            elapsed: frame.elapsed,
            seq: self.seq,
        };
        self.committed = Some((frame.clone(), ack));
        Ok(ack)
    }

    fn capture(&mut self, ack: CommitAck, scale: f64) -> RevealResult<RasterFrame> {
        let Some((frame, committed)) = self.committed.take() else {
            return Err(RevealError::capture("capture requested before any commit"));
        };
        if committed != ack {
            self.committed = Some((frame, committed));
            return Err(RevealError::capture(format!(
                "stale commit ack #{} (surface is at #{})",
                ack.seq, committed.seq
            )));
        }
        let out = self.render(&frame, scale);
        self.committed = Some((frame, committed));
        out
    }
}

fn place(block: &mut TextBlock, top: f64) {
    let dx = (VIRTUAL_WIDTH - block.bounds.width()) / 2.0;
    let offset = vk::Vec2::new(dx, top);
    block.bounds = block.bounds + offset;
    for cell in &mut block.cells {
        cell.rect = cell.rect + offset;
        for g in &mut cell.glyphs {
            g.x += dx as f32;
            g.y += top as f32;
        }
    }
}

fn draw_layer(width: u16, height: u16, draw: impl FnOnce(&mut vello_cpu::RenderContext)) -> Vec<u8> {
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    draw(&mut ctx);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data_as_u8_slice().to_vec()
}

fn draw_cells(ctx: &mut vello_cpu::RenderContext, block: &TextBlock) {
    for cell in &block.cells {
        draw_cell(ctx, block, cell);
    }
}

fn draw_cell(ctx: &mut vello_cpu::RenderContext, block: &TextBlock, cell: &Cell) {
    if cell.blank {
        return;
    }
    match &block.font {
        Some(font) => {
            if cell.glyphs.is_empty() {
                return;
            }
            let glyphs = cell.glyphs.iter().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font).font_size(block.size_px).fill_glyphs(glyphs);
        }
        None => ctx.fill_rect(&cell.rect),
    }
}

/// Foreshortening approximation of a rotation about the x and y axes through `pivot`.
fn tilt_affine(o: TiltAngles, pivot: Point) -> Affine {
    let sx = o.y.to_radians().cos();
    let sy = o.x.to_radians().cos();
    Affine::translate(pivot.to_vec2())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-pivot.to_vec2())
}

/// Paint transform mapping image pixels onto `cell` the way CSS `background-size` /
/// `background-position` would.
fn image_fill_transform(cell: vk::Rect, paint: &Paint, fill: &ImageFill) -> vk::Affine {
    let (cw, ch) = (cell.width(), cell.height());
    let k = match fill.sizing {
        Sizing::Cover => (cw / paint.width).max(ch / paint.height),
        Sizing::Explicit {
            scale_pct,
            fit: FitMode::Width,
        } => cw * scale_pct / 100.0 / paint.width,
        Sizing::Explicit {
            scale_pct,
            fit: FitMode::Height,
        } => ch * scale_pct / 100.0 / paint.height,
    };
    place_image(cell, paint, k, fill.position_pct)
}

fn cover_transform(area: vk::Rect, paint: &Paint, position_pct: (f64, f64)) -> vk::Affine {
    let k = (area.width() / paint.width).max(area.height() / paint.height);
    place_image(area, paint, k, position_pct)
}

fn place_image(area: vk::Rect, paint: &Paint, k: f64, (px, py): (f64, f64)) -> vk::Affine {
    let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
    let (dw, dh) = (paint.width * k, paint.height * k);
    let x = area.x0 + (area.width() - dw) * px / 100.0;
    let y = area.y0 + (area.height() - dh) * py / 100.0;
    vk::Affine::translate((x, y)) * vk::Affine::scale(k)
}

fn halftone_path() -> vk::BezPath {
    use vk::Shape;

    let mut path = vk::BezPath::new();
    let mut y = HALFTONE_PITCH / 2.0;
    while y < VIRTUAL_HEIGHT {
        let mut x = HALFTONE_PITCH / 2.0;
        while x < VIRTUAL_WIDTH {
            path.extend(vk::Circle::new((x, y), HALFTONE_RADIUS).path_elements(0.1));
            x += HALFTONE_PITCH;
        }
        y += HALFTONE_PITCH;
    }
    path
}

fn to_cpu(a: Affine) -> vk::Affine {
    vk::Affine::new(a.as_coeffs())
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn premul(c: Color) -> [u8; 4] {
    let mut px = c.to_rgba8();
    crate::foundation::math::premultiply_px(&mut px);
    px
}

fn paint_from(img: &PreparedImage) -> RevealResult<Paint> {
    let w: u16 = img
        .width
        .try_into()
        .map_err(|_| RevealError::unsupported("image width exceeds u16"))?;
    let h: u16 = img
        .height
        .try_into()
        .map_err(|_| RevealError::unsupported("image height exceeds u16"))?;
    let mut may_have_opacities = false;
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = img
        .rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(Paint {
        image: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        width: f64::from(img.width),
        height: f64::from(img.height),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
