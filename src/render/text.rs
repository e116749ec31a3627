use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{RevealError, RevealResult};

/// Environment variable consulted for a font directory when none is given explicitly.
pub const FONT_DIR_ENV: &str = "SLOTREVEAL_FONT_DIR";

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Font bytes keyed by identifier (the font file's stem).
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    fonts: HashMap<String, Arc<Vec<u8>>>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font file in `dir` (non-recursive).
    pub fn from_dir(dir: &Path) -> RevealResult<Self> {
        let mut book = Self::new();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("read font dir '{}'", dir.display()))?;
        for entry in entries {
            let path = entry.context("read font dir entry")?.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_font {
                continue;
            }
            let bytes =
                std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
            book.insert(stem, bytes);
        }
        tracing::debug!(dir = %dir.display(), fonts = book.len(), "font book loaded");
        Ok(book)
    }

    /// `dir` if given, else [`FONT_DIR_ENV`], else an empty book.
    pub fn discover(dir: Option<&Path>) -> RevealResult<Self> {
        if let Some(dir) = dir {
            return Self::from_dir(dir);
        }
        match std::env::var_os(FONT_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::from_dir(Path::new(&dir)),
            _ => Ok(Self::new()),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) {
        self.fonts.insert(id.into(), Arc::new(bytes));
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Sorted identifiers.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fonts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, id: &str) -> RevealResult<Arc<Vec<u8>>> {
        self.fonts
            .get(id)
            .cloned()
            .ok_or_else(|| RevealError::unsupported(format!("font '{id}' is not available")))
    }
}

/// One shaped character in layout space (origin at the layout's top-left).
#[derive(Clone)]
pub(crate) struct ShapedChar {
    pub(crate) advance: f64,
    pub(crate) height: f64,
    pub(crate) glyphs: Vec<vello_cpu::Glyph>,
}

/// Parley contexts plus a per-(font, char, size) cache of shaped characters.
pub(crate) struct GlyphShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    families: HashMap<String, String>,
    cache: HashMap<(String, char, u32), ShapedChar>,
}

impl GlyphShaper {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    fn family_for(&mut self, font_id: &str, bytes: &[u8]) -> RevealResult<String> {
        if let Some(name) = self.families.get(font_id) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| RevealError::unsupported(format!("font '{font_id}' has no families")))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RevealError::unsupported(format!("font '{font_id}' has no family name")))?
            .to_string();
        self.families.insert(font_id.to_owned(), name.clone());
        Ok(name)
    }

    /// Shape a single character at `size_px`.
    pub(crate) fn shape_char(
        &mut self,
        font_id: &str,
        bytes: &[u8],
        ch: char,
        size_px: f32,
    ) -> RevealResult<ShapedChar> {
        let key = (font_id.to_owned(), ch, size_px.to_bits());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let family = self.family_for(font_id, bytes)?;

        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        let shaped = ShapedChar {
            advance: f64::from(layout.width()),
            height: f64::from(layout.height()),
            glyphs,
        };
        self.cache.insert(key, shaped.clone());
        Ok(shaped)
    }
}
