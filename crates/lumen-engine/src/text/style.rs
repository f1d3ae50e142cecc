use crate::error::{Result, invalid};

use super::backend::FontId;

/// How glyphs reach the surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RenderMode {
    /// Outlines through the path rasterizer. Falls back to `Grayscale` when
    /// the backend has no outlines.
    Vector,
    /// Cached 8-bit coverage.
    #[default]
    Grayscale,
    /// Coverage thresholded to fully on or off.
    Mono,
    /// Per-channel coverage from 3× horizontal oversampling.
    Subpixel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontId,
    /// Em size in user units.
    pub size: f32,
    pub mode: RenderMode,
    pub kerning: bool,
    /// Horizontal shear per unit of height for synthetic italic, `0.0` for none.
    pub synthetic_italic: f32,
    /// Extra stroke width in pixels for synthetic bold, `0.0` for none.
    pub synthetic_bold: f32,
    pub underline: bool,
    pub strikethrough: bool,
    /// Added after every glyph advance.
    pub letter_spacing: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontId::default(),
            size: 16.0,
            mode: RenderMode::Grayscale,
            kerning: true,
            synthetic_italic: 0.0,
            synthetic_bold: 0.0,
            underline: false,
            strikethrough: false,
            letter_spacing: 0.0,
        }
    }
}

impl TextStyle {
    pub fn new(font: FontId, size: f32) -> Self {
        Self { font, size, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(invalid(format!("text size must be positive, got {}", self.size)));
        }
        if !self.synthetic_italic.is_finite()
            || !(self.synthetic_bold.is_finite() && self.synthetic_bold >= 0.0)
            || !self.letter_spacing.is_finite()
        {
            return Err(invalid("synthetic style parameters must be finite"));
        }
        Ok(())
    }

    /// Decoration stroke thickness.
    pub fn decoration_thickness(&self) -> f32 {
        (self.size / 14.0).max(1.0)
    }
}

/// Fixed quality knobs for bitmap text.
///
/// Subpixel coverage is filtered with the 5-tap FIR `subpixel_weights`
/// normalized by their sum. Coverage `c` then goes through
/// `255 * (c / 255) ^ (1 / text_gamma)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextQuality {
    pub subpixel_weights: [u8; 5],
    pub text_gamma: f32,
}

impl Default for TextQuality {
    fn default() -> Self {
        Self { subpixel_weights: [1, 2, 3, 2, 1], text_gamma: 1.0 }
    }
}

impl TextQuality {
    /// Lookup table for the text gamma curve.
    pub fn gamma_table(&self) -> [u8; 256] {
        let mut table = [0u8; 256];
        let g = if self.text_gamma.is_finite() && self.text_gamma > 0.0 { self.text_gamma } else { 1.0 };
        for (i, v) in table.iter_mut().enumerate() {
            *v = if g == 1.0 {
                i as u8
            } else {
                (255.0 * (i as f32 / 255.0).powf(1.0 / g)).round() as u8
            };
        }
        table
    }
}
