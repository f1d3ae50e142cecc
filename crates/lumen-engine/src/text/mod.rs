//! Glyph text: decoding, layout, the shared glyph cache and per-glyph
//! processing for every render mode.
//!
//! Fonts come from a [`FontBackend`]; [`FontdueBackend`] is the bundled one.

mod backend;
mod cache;
mod decode;
mod fontdue_backend;
pub mod glyph;
mod layout;
mod style;

pub use backend::{
    FontBackend, FontId, FontMetrics, GlyphBitmap, GlyphData, GlyphFormat, GlyphId, GlyphImage,
    GlyphMetrics,
};
pub use cache::{CacheStats, CachedGlyph, GlyphCache, GlyphKey};
pub use decode::{TextEncoding, decode};
pub use fontdue_backend::{FontLoadError, FontdueBackend};
pub use glyph::{GlyphMask, LcdBitmap};
pub use layout::{PositionedGlyph, TextContext, TextLayout, layout_text};
pub use style::{RenderMode, TextQuality, TextStyle};

#[cfg(test)]
pub(crate) use layout::tests::BoxFont;
