use std::sync::Arc;

use crate::coords::{Point, Rect, Vec2};
use crate::error::Result;

use super::backend::{FontBackend, FontMetrics, GlyphId, GlyphImage};
use super::cache::{CachedGlyph, GlyphCache};
use super::glyph::load_glyph;
use super::style::{TextQuality, TextStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    pub ch: char,
    pub glyph: GlyphId,
    /// Pen position on the baseline, in user space.
    pub origin: Point,
    pub data: Arc<CachedGlyph>,
}

/// Result of laying out one run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub origin: Point,
    pub glyphs: Vec<PositionedGlyph>,
    /// Pen travel from `origin`.
    pub advance: f32,
    /// Ink bounds of every glyph and decoration, in user space.
    pub bounds: Rect,
    pub metrics: FontMetrics,
    /// Underline and strikethrough rectangles, in user space.
    pub decorations: Vec<Rect>,
}

/// Ink extent of a glyph relative to its pen position, including synthetic
/// bold widening.
fn ink_bounds(data: &CachedGlyph, style: &TextStyle) -> Option<Rect> {
    let bold = style.synthetic_bold;
    match &data.image {
        GlyphImage::Outline(p) => p.loose_bounds().map(|b| b.inflate(bold * 0.5)),
        GlyphImage::Coverage(b) if !b.is_empty() => {
            let r = b.bounds();
            Some(Rect::new(r.origin.x, r.origin.y, r.size.x + bold.ceil(), r.size.y))
        }
        GlyphImage::Coverage(_) => None,
    }
}

/// Lays out `text` starting at `origin` on the baseline.
///
/// Drawing and measuring both go through here, so a measurement always
/// matches the subsequent draw.
pub fn layout_text(
    backend: &dyn FontBackend,
    cache: &GlyphCache,
    text: &[char],
    origin: Point,
    style: &TextStyle,
) -> Result<TextLayout> {
    style.validate()?;
    let metrics = backend.font_metrics(style.font, style.size)?;

    let mut glyphs = Vec::with_capacity(text.len());
    let mut ink: Option<Rect> = None;
    let mut pen = origin.x;
    let mut prev: Option<GlyphId> = None;
    for &ch in text {
        let glyph = backend.glyph_index(style.font, ch)?;
        if let (true, Some(left)) = (style.kerning, prev) {
            pen += backend.kerning(style.font, left, glyph, style.size).unwrap_or(0.0);
        }
        let data = load_glyph(backend, cache, style, glyph)?;
        let at = Point::new(pen, origin.y);
        if let Some(b) = ink_bounds(&data, style) {
            let b = b.translate(Vec2::new(at.x, at.y));
            ink = Some(ink.map_or(b, |acc| acc.union(b)));
        }
        pen += data.metrics.advance + style.letter_spacing;
        glyphs.push(PositionedGlyph { ch, glyph, origin: at, data });
        prev = Some(glyph);
    }
    let advance = pen - origin.x;

    let mut decorations = Vec::new();
    if advance > 0.0 {
        let t = style.decoration_thickness();
        if style.underline {
            decorations.push(Rect::new(origin.x, origin.y + metrics.descent * 0.5 - t * 0.5, advance, t));
        }
        if style.strikethrough {
            decorations.push(Rect::new(origin.x, origin.y - metrics.ascent * 0.3 - t * 0.5, advance, t));
        }
    }
    for d in &decorations {
        ink = Some(ink.map_or(*d, |acc| acc.union(*d)));
    }

    log::trace!("laid out {} glyphs, advance {advance}", glyphs.len());
    Ok(TextLayout {
        origin,
        glyphs,
        advance,
        bounds: ink.unwrap_or(Rect::new(origin.x, origin.y, advance.max(0.0), 0.0)),
        metrics,
        decorations,
    })
}

/// Font backend, shared glyph cache and quality settings used by a canvas
/// to render text.
#[derive(Clone)]
pub struct TextContext {
    pub backend: Arc<dyn FontBackend>,
    pub cache: Arc<GlyphCache>,
    pub quality: TextQuality,
}

impl TextContext {
    pub fn new(backend: Arc<dyn FontBackend>, cache: Arc<GlyphCache>) -> Self {
        Self { backend, cache, quality: TextQuality::default() }
    }

    pub fn with_quality(mut self, quality: TextQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn layout(&self, text: &[char], origin: Point, style: &TextStyle) -> Result<TextLayout> {
        layout_text(self.backend.as_ref(), &self.cache, text, origin, style)
    }
}

impl std::fmt::Debug for TextContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextContext")
            .field("cache", &self.cache)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}
