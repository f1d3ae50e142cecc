use std::fmt;
use std::path::Path;

use anyhow::Context;

use crate::coords::{Matrix, Rect};
use crate::error::{Error, Result, invalid};

use super::backend::{
    FontBackend, FontId, FontMetrics, GlyphBitmap, GlyphData, GlyphFormat, GlyphId, GlyphImage,
    GlyphMetrics,
};

/// Error returned by [`FontdueBackend::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// [`FontBackend`] over `fontdue`.
///
/// Fonts are immutable after loading; load everything before sharing the
/// backend behind an `Arc`. Only coverage bitmaps are produced: outline
/// requests and embedded transforms are reported as unsupported so the engine
/// falls back to its own handling.
pub struct FontdueBackend {
    fonts: Vec<fontdue::Font>,
}

impl FontdueBackend {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len() as u32);
        log::debug!("loaded font {:?} ({} glyphs)", id, font.glyph_count());
        self.fonts.push(font);
        Ok(id)
    }

    /// Reads a font file from disk and loads it.
    pub fn load_font_file(&mut self, path: &Path) -> anyhow::Result<FontId> {
        let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        self.load_font(&bytes).with_context(|| format!("parsing font {}", path.display()))
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    fn get(&self, id: FontId) -> Result<&fontdue::Font> {
        self.fonts
            .get(id.0 as usize)
            .ok_or_else(|| invalid(format!("unknown font {id:?}")))
    }
}

impl Default for FontdueBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn glyph_u16(glyph: GlyphId) -> Result<u16> {
    u16::try_from(glyph).map_err(|_| invalid(format!("glyph index {glyph} out of range")))
}

impl FontBackend for FontdueBackend {
    fn font_metrics(&self, font: FontId, size: f32) -> Result<FontMetrics> {
        let lm = self
            .get(font)?
            .horizontal_line_metrics(size)
            .ok_or(Error::Unsupported("font has no horizontal metrics"))?;
        Ok(FontMetrics { ascent: lm.ascent, descent: -lm.descent, line_gap: lm.line_gap })
    }

    fn glyph_index(&self, font: FontId, ch: char) -> Result<GlyphId> {
        Ok(GlyphId::from(self.get(font)?.lookup_glyph_index(ch)))
    }

    fn glyph(
        &self,
        font: FontId,
        glyph: GlyphId,
        size: f32,
        transform: &Matrix,
        format: GlyphFormat,
    ) -> Result<GlyphData> {
        if format == GlyphFormat::Outline {
            return Err(Error::Unsupported("fontdue does not expose glyph outlines"));
        }
        if !transform.linear().is_identity() {
            return Err(Error::Unsupported("fontdue cannot rasterize transformed glyphs"));
        }
        let font = self.get(font)?;
        let (m, data) = font.rasterize_indexed(glyph_u16(glyph)?, size);
        // fontdue reports ymin as the bitmap's bottom edge in y-up space.
        let top = -(m.ymin + m.height as i32);
        let b = m.bounds;
        Ok(GlyphData {
            metrics: GlyphMetrics {
                advance: m.advance_width,
                lsb: b.xmin,
                bounds: Rect::new(b.xmin, -(b.ymin + b.height), b.width, b.height),
            },
            image: GlyphImage::Coverage(GlyphBitmap {
                left: m.xmin,
                top,
                width: m.width as u32,
                height: m.height as u32,
                data,
            }),
        })
    }

    fn kerning(&self, font: FontId, left: GlyphId, right: GlyphId, size: f32) -> Option<f32> {
        let font = self.get(font).ok()?;
        font.horizontal_kern_indexed(glyph_u16(left).ok()?, glyph_u16(right).ok()?, size)
    }
}
