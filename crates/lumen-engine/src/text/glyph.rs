//! Per-glyph processing between the cache and the compositor: synthetic
//! styles, outline rasterization, mono thresholding and subpixel filtering.

use crate::coords::{IntRect, Matrix, Point};
use crate::error::{Error, Result, try_vec};
use crate::geometry::{LineJoin, Path, StrokeStyle, stroke_to_fill};
use crate::raster::{AlphaMask, FillRule, Rasterizer};

use super::backend::{FontBackend, GlyphBitmap, GlyphData, GlyphFormat, GlyphId, GlyphImage};
use super::cache::{CachedGlyph, GlyphCache, GlyphKey};
use super::style::{RenderMode, TextQuality, TextStyle};

/// Shear applied for synthetic italic. Rows above the baseline (negative y)
/// move right.
pub fn italic_matrix(shear: f32) -> Matrix {
    Matrix::new(1.0, 0.0, -shear, 1.0, 0.0, 0.0)
}

/// Fetches glyph `glyph` through the cache, asking the backend on a miss.
///
/// Vector mode asks for outlines and settles for coverage when the backend
/// has none. An embedded italic shear the backend refuses is applied here.
pub fn load_glyph(
    backend: &dyn FontBackend,
    cache: &GlyphCache,
    style: &TextStyle,
    glyph: GlyphId,
) -> Result<std::sync::Arc<CachedGlyph>> {
    let format = if style.mode == RenderMode::Vector { GlyphFormat::Outline } else { GlyphFormat::Coverage };
    let shear = italic_matrix(style.synthetic_italic);
    let key = GlyphKey::new(style.font, glyph, style.size, &shear, format);
    cache.get_or_insert_with(key, || {
        match fetch(backend, style, glyph, &shear, format) {
            Err(Error::Unsupported(why)) if format == GlyphFormat::Outline => {
                log::debug!("glyph {glyph}: {why}; using coverage instead of outline");
                fetch(backend, style, glyph, &shear, GlyphFormat::Coverage)
            }
            other => other,
        }
    })
}

fn fetch(
    backend: &dyn FontBackend,
    style: &TextStyle,
    glyph: GlyphId,
    shear: &Matrix,
    format: GlyphFormat,
) -> Result<GlyphData> {
    match backend.glyph(style.font, glyph, style.size, shear, format) {
        Err(Error::Unsupported(_)) if !shear.is_identity() => {
            let plain = backend.glyph(style.font, glyph, style.size, &Matrix::identity(), format)?;
            apply_shear(plain, style.synthetic_italic)
        }
        other => other,
    }
}

/// Applies an italic shear to an unsheared glyph.
pub fn apply_shear(mut data: GlyphData, shear: f32) -> Result<GlyphData> {
    let m = italic_matrix(shear);
    data.metrics.bounds = data.metrics.bounds.transform_bounds(&m);
    data.image = match data.image {
        GlyphImage::Outline(path) => GlyphImage::Outline(path.transformed(&m)?),
        GlyphImage::Coverage(bitmap) => GlyphImage::Coverage(shear_bitmap(&bitmap, shear)?),
    };
    Ok(data)
}

/// Shifts each bitmap row by the shear at its center, in whole pixels.
pub fn shear_bitmap(src: &GlyphBitmap, shear: f32) -> Result<GlyphBitmap> {
    if src.is_empty() || shear == 0.0 {
        return Ok(src.clone());
    }
    let shift = |row: u32| (-shear * (src.top as f32 + row as f32 + 0.5)).round() as i32;
    let (lo, hi) = (0..src.height).map(shift).fold((i32::MAX, i32::MIN), |(lo, hi), s| (lo.min(s), hi.max(s)));
    let width = src.width + (hi - lo) as u32;
    let mut data = try_vec((width * src.height) as usize, 0u8)?;
    for y in 0..src.height {
        let dx = (shift(y) - lo) as usize;
        let start = (y * width) as usize + dx;
        data[start..start + src.width as usize].copy_from_slice(src.row(y));
    }
    Ok(GlyphBitmap { left: src.left + lo, top: src.top, width, height: src.height, data })
}

/// Widens an outline by stroking it with width `bold` and unioning the
/// stroke with the original under the non-zero rule.
pub fn embolden_outline(outline: &Path, bold: f32, tolerance: f32) -> Result<Path> {
    if bold <= 0.0 || outline.is_empty() {
        return Ok(outline.clone());
    }
    let stroke = StrokeStyle { join: LineJoin::Round, ..StrokeStyle::new(bold) };
    let widened = stroke_to_fill(outline, &stroke, tolerance)?;

    // Stroke polygons wind positively; match them to the outline's dominant
    // orientation so the union does not cancel.
    let area: f32 = outline
        .to_polylines(tolerance)?
        .iter()
        .map(|l| l.edges().map(|(a, b)| a.cross(b)).sum::<f32>())
        .sum();
    let mut out = outline.clone();
    if area >= 0.0 {
        out.extend_from(&widened)?;
    } else {
        for line in widened.to_polylines(tolerance)? {
            let reversed: Vec<Point> = line.points.iter().rev().copied().collect();
            out.polygon(&reversed, true)?;
        }
    }
    Ok(out)
}

/// Horizontal max filter `n` pixels wide; the bitmap grows by `n` columns.
pub fn dilate(src: &GlyphBitmap, n: u32) -> Result<GlyphBitmap> {
    if n == 0 || src.is_empty() {
        return Ok(src.clone());
    }
    let width = src.width + n;
    let mut data = try_vec((width * src.height) as usize, 0u8)?;
    for y in 0..src.height {
        let row = src.row(y);
        let out = &mut data[(y * width) as usize..((y + 1) * width) as usize];
        for (x, v) in out.iter_mut().enumerate() {
            let x = x as i64;
            let from = (x - n as i64).max(0) as usize;
            let to = (x as usize).min(row.len() - 1);
            if from <= to {
                *v = row[from..=to].iter().copied().max().unwrap_or(0);
            }
        }
    }
    Ok(GlyphBitmap { left: src.left, top: src.top, width, height: src.height, data })
}

/// Rasterizes an outline (pen at the origin) into a coverage bitmap,
/// stretched horizontally by `x_scale`.
pub fn rasterize_outline(
    outline: &Path,
    x_scale: f32,
    raster: &mut Rasterizer,
    tolerance: f32,
) -> Result<GlyphBitmap> {
    let path = outline.transformed(&Matrix::scale(x_scale, 1.0))?;
    let Some(bounds) = path.loose_bounds() else {
        return Ok(GlyphBitmap::default());
    };
    let clip = bounds.round_out();
    if clip.is_empty() {
        return Ok(GlyphBitmap::default());
    }
    let storage = raster.rasterize(&path, FillRule::NonZero, clip, tolerance)?.capture();
    let mask = AlphaMask::from_storage(&storage, clip)?;
    Ok(mask_to_bitmap(&mask))
}

fn mask_to_bitmap(mask: &AlphaMask) -> GlyphBitmap {
    let b: IntRect = mask.bounds();
    GlyphBitmap {
        left: b.x0,
        top: b.y0,
        width: b.width() as u32,
        height: b.height() as u32,
        data: mask.data().to_vec(),
    }
}

/// Three coverage channels per pixel, left to right in the order R, G, B.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LcdBitmap {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<[u8; 3]>,
}

impl LcdBitmap {
    pub fn row(&self, y: u32) -> &[[u8; 3]] {
        let w = self.width as usize;
        &self.data[y as usize * w..(y as usize + 1) * w]
    }
}

/// Triples every column, for bitmaps that were not rendered oversampled.
pub fn oversample_3x(src: &GlyphBitmap) -> Result<GlyphBitmap> {
    let width = src.width * 3;
    let mut data = try_vec((width * src.height) as usize, 0u8)?;
    for y in 0..src.height {
        for (x, &v) in src.row(y).iter().enumerate() {
            let at = (y * width) as usize + x * 3;
            data[at..at + 3].fill(v);
        }
    }
    Ok(GlyphBitmap { left: src.left * 3, top: src.top, width, height: src.height, data })
}

/// Folds 3× oversampled coverage into per-channel coverage with the FIR
/// `weights` centered on each subpixel.
pub fn subpixel_filter(src: &GlyphBitmap, weights: [u8; 5]) -> Result<LcdBitmap> {
    if src.is_empty() {
        return Ok(LcdBitmap::default());
    }
    let sum: u32 = weights.iter().map(|&w| u32::from(w)).sum::<u32>().max(1);
    let first = (src.left - 2).div_euclid(3);
    let last = (src.left + src.width as i32 + 2 + 2).div_euclid(3);
    let width = (last - first) as u32;
    let mut data = try_vec((width * src.height) as usize, [0u8; 3])?;
    for y in 0..src.height {
        let row = src.row(y);
        let sample = |s: i32| {
            let i = s - src.left;
            if i < 0 || i >= row.len() as i32 { 0 } else { u32::from(row[i as usize]) }
        };
        for px in 0..width {
            let base = (first + px as i32) * 3;
            let out = &mut data[(y * width + px) as usize];
            for (c, channel) in out.iter_mut().enumerate() {
                let s = base + c as i32;
                let acc: u32 = (0..5).map(|k| u32::from(weights[k]) * sample(s + k as i32 - 2)).sum();
                *channel = ((acc + sum / 2) / sum).min(255) as u8;
            }
        }
    }
    Ok(LcdBitmap { left: first, top: src.top, width, height: src.height, data })
}

/// A glyph ready for compositing, pen at the origin.
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphMask {
    /// Filled through the path pipeline with the current paint.
    Outline(Path),
    Gray(GlyphBitmap),
    Lcd(LcdBitmap),
}

/// Turns a cached glyph into what the compositor needs for `style.mode`.
pub fn prepare(
    data: &CachedGlyph,
    style: &TextStyle,
    quality: &TextQuality,
    raster: &mut Rasterizer,
    tolerance: f32,
) -> Result<GlyphMask> {
    let bold = style.synthetic_bold;
    let gamma = quality.gamma_table();
    let curve = |mut b: GlyphBitmap| {
        b.data.iter_mut().for_each(|v| *v = gamma[*v as usize]);
        b
    };
    match (&data.image, style.mode) {
        (GlyphImage::Outline(p), RenderMode::Vector) => Ok(GlyphMask::Outline(embolden_outline(p, bold, tolerance)?)),
        (GlyphImage::Outline(p), RenderMode::Subpixel) => {
            let outline = embolden_outline(p, bold, tolerance)?;
            let wide = rasterize_outline(&outline, 3.0, raster, tolerance)?;
            Ok(GlyphMask::Lcd(lcd_with_gamma(subpixel_filter(&wide, quality.subpixel_weights)?, &gamma)))
        }
        (GlyphImage::Outline(p), mode) => {
            let b = rasterize_outline(&embolden_outline(p, bold, tolerance)?, 1.0, raster, tolerance)?;
            Ok(GlyphMask::Gray(if mode == RenderMode::Mono { threshold(b) } else { curve(b) }))
        }
        (GlyphImage::Coverage(b), RenderMode::Subpixel) => {
            let wide = oversample_3x(&dilate(b, bold.ceil() as u32)?)?;
            Ok(GlyphMask::Lcd(lcd_with_gamma(subpixel_filter(&wide, quality.subpixel_weights)?, &gamma)))
        }
        (GlyphImage::Coverage(b), RenderMode::Mono) => Ok(GlyphMask::Gray(threshold(dilate(b, bold.ceil() as u32)?))),
        (GlyphImage::Coverage(b), _) => Ok(GlyphMask::Gray(curve(dilate(b, bold.ceil() as u32)?))),
    }
}

fn threshold(mut b: GlyphBitmap) -> GlyphBitmap {
    b.data.iter_mut().for_each(|v| *v = if *v >= 128 { 255 } else { 0 });
    b
}

fn lcd_with_gamma(mut b: LcdBitmap, gamma: &[u8; 256]) -> LcdBitmap {
    for px in &mut b.data {
        for c in px.iter_mut() {
            *c = gamma[*c as usize];
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;

    fn bitmap(left: i32, top: i32, width: u32, height: u32, data: Vec<u8>) -> GlyphBitmap {
        GlyphBitmap { left, top, width, height, data }
    }

    // ── synthetic styles ──────────────────────────────────────────────────

    #[test]
    fn shear_moves_upper_rows_right() {
        let src = bitmap(0, -4, 1, 4, vec![255; 4]);
        let out = shear_bitmap(&src, 0.5).unwrap();
        // Top row center is y = -3.5, shifted by round(1.75) = 2; bottom row by round(0.25) = 0.
        assert_eq!(out.width, 3);
        assert_eq!(out.left, 0);
        assert_eq!(out.row(0), &[0, 0, 255]);
        assert_eq!(out.row(3), &[255, 0, 0]);
    }

    #[test]
    fn dilate_widens_by_n() {
        let src = bitmap(2, 0, 3, 1, vec![0, 200, 0]);
        let out = dilate(&src, 2).unwrap();
        assert_eq!(out.width, 5);
        assert_eq!(out.left, 2);
        assert_eq!(out.data, vec![0, 200, 200, 200, 0]);
    }

    #[test]
    fn embolden_grows_outline_bounds() {
        let mut p = Path::new();
        p.rect(Rect::new(0.0, -10.0, 6.0, 10.0)).unwrap();
        let bold = embolden_outline(&p, 2.0, 0.1).unwrap();
        let b = bold.loose_bounds().unwrap();
        assert!(b.min().x <= -0.99 && b.max().x >= 6.99);

        let mut raster = Rasterizer::new();
        let bm = rasterize_outline(&bold, 1.0, &mut raster, 0.1).unwrap();
        // Interior stays solid whichever way the outline winds.
        assert_eq!(bm.get((3 - bm.left) as u32, (-5 - bm.top) as u32), 255);
    }

    #[test]
    fn embolden_respects_reversed_outline() {
        let pts = [Point::new(0.0, 0.0), Point::new(0.0, -10.0), Point::new(6.0, -10.0), Point::new(6.0, 0.0)];
        let mut p = Path::new();
        p.polygon(&pts, true).unwrap();
        let bold = embolden_outline(&p, 2.0, 0.1).unwrap();
        let mut raster = Rasterizer::new();
        let bm = rasterize_outline(&bold, 1.0, &mut raster, 0.1).unwrap();
        assert_eq!(bm.get((3 - bm.left) as u32, (-5 - bm.top) as u32), 255);
        assert_eq!(bm.get((0 - bm.left) as u32, (-5 - bm.top) as u32), 255);
    }

    // ── outline rasterization ─────────────────────────────────────────────

    #[test]
    fn outline_rasterizes_relative_to_pen() {
        let mut p = Path::new();
        p.rect(Rect::new(1.0, -3.0, 2.0, 3.0)).unwrap();
        let mut raster = Rasterizer::new();
        let bm = rasterize_outline(&p, 1.0, &mut raster, 0.1).unwrap();
        assert_eq!((bm.left, bm.top, bm.width, bm.height), (1, -3, 2, 3));
        assert!(bm.data.iter().all(|&v| v == 255));
    }

    // ── subpixel ──────────────────────────────────────────────────────────

    #[test]
    fn subpixel_flat_coverage_stays_flat_inside() {
        let src = oversample_3x(&bitmap(0, 0, 3, 1, vec![255; 3])).unwrap();
        let lcd = subpixel_filter(&src, [1, 2, 3, 2, 1]).unwrap();
        assert_eq!(lcd.left, -1);
        assert_eq!(lcd.width, 5);
        let row = lcd.row(0);
        assert_eq!(row[2], [255, 255, 255]);
        // Fringe pixels receive partial coverage only.
        assert!(row[0][2] > 0 && row[0][2] < 255);
        assert_eq!(row[0][0], 0);
    }

    #[test]
    fn subpixel_single_subsample_spreads_symmetrically() {
        let src = bitmap(4, 0, 1, 1, vec![255]);
        let lcd = subpixel_filter(&src, [1, 2, 3, 2, 1]).unwrap();
        // Subsample 4 is the green channel of pixel 1.
        let px1 = lcd.row(0)[(1 - lcd.left) as usize];
        assert_eq!(px1[1], 85);
        assert_eq!(px1[0], px1[2]);
    }

    #[test]
    fn mono_thresholds() {
        let b = threshold(bitmap(0, 0, 3, 1, vec![10, 128, 250]));
        assert_eq!(b.data, vec![0, 255, 255]);
    }
}
