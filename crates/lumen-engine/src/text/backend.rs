use crate::coords::{Matrix, Rect};
use crate::error::Result;
use crate::geometry::Path;

/// Opaque handle to a font known to a [`FontBackend`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

/// Backend-specific glyph index.
pub type GlyphId = u32;

/// Font-wide vertical metrics at a given size. `descent` is positive downwards.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl FontMetrics {
    #[inline]
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

/// Per-glyph metrics. `bounds` is relative to the pen position on the
/// baseline, y pointing down.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GlyphMetrics {
    pub advance: f32,
    /// Left side bearing.
    pub lsb: f32,
    pub bounds: Rect,
}

/// What the caller would prefer to receive from [`FontBackend::glyph`].
/// Backends may answer a `Coverage` request with an outline; the engine
/// rasterizes it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum GlyphFormat {
    Outline,
    #[default]
    Coverage,
}

/// 8-bit coverage bitmap placed relative to the pen position:
/// sample `(x, y)` covers pixel `(left + x, top + y)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBitmap {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Pixel rectangle relative to the pen position.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.left as f32, self.top as f32, self.width as f32, self.height as f32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphImage {
    /// Glyph outline in pixels relative to the pen position, y down.
    Outline(Path),
    Coverage(GlyphBitmap),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphData {
    pub metrics: GlyphMetrics,
    pub image: GlyphImage,
}

/// Supplies outlines, bitmaps and metrics. The engine never parses font
/// files itself.
///
/// `transform` is an embedded per-glyph linear transform (synthetic italic
/// shear). Backends that cannot honor it return [`Error::Unsupported`] and the
/// engine applies it afterwards.
///
/// [`Error::Unsupported`]: crate::error::Error::Unsupported
pub trait FontBackend: Send + Sync {
    fn font_metrics(&self, font: FontId, size: f32) -> Result<FontMetrics>;

    /// Glyph index for `ch`. Missing characters map to the backend's
    /// `.notdef` glyph rather than failing.
    fn glyph_index(&self, font: FontId, ch: char) -> Result<GlyphId>;

    fn glyph(
        &self,
        font: FontId,
        glyph: GlyphId,
        size: f32,
        transform: &Matrix,
        format: GlyphFormat,
    ) -> Result<GlyphData>;

    /// Horizontal kerning adjustment between two glyphs, in pixels.
    fn kerning(&self, _font: FontId, _left: GlyphId, _right: GlyphId, _size: f32) -> Option<f32> {
        None
    }
}
