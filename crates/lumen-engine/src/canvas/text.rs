use crate::coords::{IntRect, Matrix, Point, Rect};
use crate::error::{Error, Result, invalid, try_vec};
use crate::geometry::Path;
use crate::paint::PaintSampler;
use crate::raster::{AlphaMask, FillRule, Rasterizer};
use crate::record::DrawOp;
use crate::state::ClipRegion;
use crate::text::glyph::{self, GlyphMask};
use crate::text::{GlyphBitmap, LcdBitmap, RenderMode, TextContext, TextEncoding, TextLayout, TextStyle, decode};

use super::Canvas;
use super::target::{Blend, composite_lcd, composite_mask, destination};

impl<'a> Canvas<'a> {
    /// Draws `text` with its baseline starting at `origin` and returns the
    /// layout that was drawn.
    pub fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<TextLayout> {
        match self.draw_text_inner(text, origin, style) {
            Ok(layout) => {
                self.finish(Ok(()), || DrawOp::DrawText { text: text.into(), origin, style: style.clone() })?;
                Ok(layout)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Decodes `bytes` and draws the result.
    pub fn draw_text_encoded(
        &mut self,
        bytes: &[u8],
        encoding: TextEncoding,
        origin: Point,
        style: &TextStyle,
    ) -> Result<TextLayout> {
        match decode(bytes, encoding) {
            Ok(chars) => self.draw_text(&chars.iter().collect::<String>(), origin, style),
            Err(e) => self.fail(e),
        }
    }

    /// Lays `text` out exactly as [`draw_text`](Self::draw_text) would,
    /// without a target and without touching pixels.
    pub fn measure_text(&self, text: &str, origin: Point, style: &TextStyle) -> Result<TextLayout> {
        let ctx = self.text.as_ref().ok_or(Error::Unsupported("text rendering needs a text context"))?;
        let chars: Vec<char> = text.chars().collect();
        ctx.layout(&chars, origin, style)
    }

    fn draw_text_inner(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<TextLayout> {
        let ctx = self.text.clone().ok_or(Error::Unsupported("text rendering needs a text context"))?;
        if !self.target.is_attached() {
            return Err(Error::NotInitialized);
        }
        let chars: Vec<char> = text.chars().collect();
        let layout = ctx.layout(&chars, origin, style)?;
        self.render_layout(&ctx, &layout, style)?;
        Ok(layout)
    }

    fn render_layout(&mut self, ctx: &TextContext, layout: &TextLayout, style: &TextStyle) -> Result<()> {
        let st = self.state.current();
        let (ctm, clip, paint) = (st.transform, st.clip.clone(), st.paint.clone());
        let (op, opacity, antialias, gamma) = (st.op, st.opacity, st.antialias, st.effective_gamma());
        let (w, h) = self.target.size().ok_or(Error::NotInitialized)?;
        let dst_bounds = IntRect::from_size(w, h);
        let area = clip.bounds().intersect(dst_bounds);

        let mut style = style.clone();
        if style.mode == RenderMode::Subpixel && !ctm.is_translation() {
            log::debug!("subpixel text under a non-translation transform; using grayscale");
            style.mode = RenderMode::Grayscale;
        }
        if !antialias && style.mode != RenderMode::Vector {
            style.mode = RenderMode::Mono;
        }

        // Build every mask first so a failure leaves the target untouched.
        let mut outlines = Path::new();
        let mut gray = Vec::with_capacity(layout.glyphs.len());
        let mut lcd = Vec::new();
        for g in &layout.glyphs {
            match glyph::prepare(&g.data, &style, &ctx.quality, &mut self.raster, self.tolerance)? {
                GlyphMask::Outline(p) => {
                    outlines.extend_from(&p.transformed(&Matrix::translate(g.origin.x, g.origin.y))?)?;
                }
                GlyphMask::Gray(b) if b.is_empty() => {}
                GlyphMask::Gray(b) => {
                    if let Some(mask) = device_mask(&b, g.origin, &ctm, &clip, dst_bounds)? {
                        gray.push(mask);
                    }
                }
                GlyphMask::Lcd(b) => {
                    let d = ctm.apply(g.origin);
                    lcd.push(LcdBitmap { left: d.x.round() as i32 + b.left, top: d.y.round() as i32 + b.top, ..b });
                }
            }
        }
        let mut decorations = Path::new();
        for d in &layout.decorations {
            decorations.rect(*d)?;
        }
        self.raster.set_gamma(gamma);
        if let Some(mask) = path_mask(&mut self.raster, &outlines.transformed(&ctm)?, area, self.tolerance)? {
            gray.extend(clipped(mask, &clip, dst_bounds)?);
        }
        let decorations = path_mask(&mut self.raster, &decorations.transformed(&ctm)?, area, self.tolerance)?;

        // One composite per call; overlapping coverage blends once.
        let lcd = if lcd.is_empty() {
            if let Some(mask) = decorations {
                gray.extend(clipped(mask, &clip, dst_bounds)?);
            }
            None
        } else {
            merge_lcd(&lcd, decorations.as_ref())?
        };
        let gray = AlphaMask::union(&gray)?;

        let Canvas { target, layers, scratch, .. } = self;
        let mut dst = destination(target, layers)?;
        let blend = Blend { sampler: PaintSampler::new(&paint, &ctm)?, op, opacity };
        if let Some(mask) = &gray {
            composite_mask(&mut dst, mask, &blend, scratch);
        }
        if let Some(bitmap) = &lcd {
            composite_lcd(&mut dst, bitmap, (0, 0), &blend, &clip, scratch);
        }
        log::trace!("drew {} glyphs", layout.glyphs.len());
        Ok(())
    }
}

/// Coverage of a device-space path inside `area`, before any mask clip.
fn path_mask(raster: &mut Rasterizer, device: &Path, area: IntRect, tolerance: f32) -> Result<Option<AlphaMask>> {
    if device.is_empty() {
        return Ok(None);
    }
    let coverage = raster.rasterize(device, FillRule::NonZero, area, tolerance)?.capture();
    let bounds = coverage.bounds().intersect(area);
    if bounds.is_empty() {
        return Ok(None);
    }
    AlphaMask::from_storage(&coverage, bounds).map(Some)
}

/// Merges subpixel glyphs placed in device space, plus gray coverage
/// counted on all three channels, into one bitmap at the device origin.
fn merge_lcd(glyphs: &[LcdBitmap], extra: Option<&AlphaMask>) -> Result<Option<LcdBitmap>> {
    let rect = |b: &LcdBitmap| IntRect::new(b.left, b.top, b.left + b.width as i32, b.top + b.height as i32);
    let mut bounds = glyphs.iter().fold(IntRect::empty(), |acc, b| acc.union(rect(b)));
    if let Some(m) = extra {
        bounds = bounds.union(m.bounds());
    }
    if bounds.is_empty() {
        return Ok(None);
    }
    let w = bounds.width() as usize;
    let mut data = try_vec(bounds.area() as usize, [0u8; 3])?;
    let mut merge = |x: i32, y: i32, v: [u8; 3]| {
        let at = (y - bounds.y0) as usize * w + (x - bounds.x0) as usize;
        let px = &mut data[at];
        for c in 0..3 {
            px[c] = px[c].max(v[c]);
        }
    };
    for b in glyphs {
        for y in 0..b.height {
            for (i, &v) in b.row(y).iter().enumerate() {
                merge(b.left + i as i32, b.top + y as i32, v);
            }
        }
    }
    if let Some(m) = extra {
        let mb = m.bounds();
        for y in mb.y0..mb.y1 {
            for (i, &v) in m.row(y).unwrap_or_default().iter().enumerate() {
                merge(mb.x0 + i as i32, y, [v; 3]);
            }
        }
    }
    Ok(Some(LcdBitmap {
        left: bounds.x0,
        top: bounds.y0,
        width: bounds.width() as u32,
        height: bounds.height() as u32,
        data,
    }))
}

/// Places a gray glyph bitmap with its pen at `origin` (user space) into
/// device space and applies the clip. `None` when nothing survives.
fn device_mask(
    bitmap: &GlyphBitmap,
    origin: Point,
    ctm: &Matrix,
    clip: &ClipRegion,
    dst: IntRect,
) -> Result<Option<AlphaMask>> {
    let device = if ctm.is_translation() {
        let d = ctm.apply(origin);
        let (x, y) = (d.x.round() as i32 + bitmap.left, d.y.round() as i32 + bitmap.top);
        let bounds = IntRect::new(x, y, x + bitmap.width as i32, y + bitmap.height as i32);
        AlphaMask::from_vec(bounds, bitmap.data.clone())?
    } else {
        warp_bitmap(bitmap, origin, ctm, clip.bounds().intersect(dst))?
    };
    clipped(device, clip, dst)
}

/// Applies the clip and the destination bounds to device coverage. `None`
/// when nothing survives.
fn clipped(device: AlphaMask, clip: &ClipRegion, dst: IntRect) -> Result<Option<AlphaMask>> {
    let out = match clip {
        ClipRegion::Rect(r) => device.cropped(r.intersect(dst))?,
        ClipRegion::Mask(m) => device.intersect(m)?.cropped(dst)?,
    };
    Ok((!out.bounds().is_empty()).then_some(out))
}

/// Resamples a bitmap through an arbitrary transform by mapping device pixel
/// centers back into glyph space and filtering bilinearly.
fn warp_bitmap(bitmap: &GlyphBitmap, origin: Point, ctm: &Matrix, limit: IntRect) -> Result<AlphaMask> {
    let inv = ctm.invert().ok_or_else(|| invalid("text transform is not invertible"))?;
    let user = Rect::new(
        origin.x + bitmap.left as f32,
        origin.y + bitmap.top as f32,
        bitmap.width as f32,
        bitmap.height as f32,
    );
    let area = user.transform_bounds(ctm).round_out().inflate(1).intersect(limit);
    let mut data = try_vec(area.area() as usize, 0u8)?;
    let w = area.width() as usize;
    for (i, v) in data.iter_mut().enumerate() {
        let x = area.x0 + (i % w) as i32;
        let y = area.y0 + (i / w) as i32;
        let p = inv.apply(Point::new(x as f32 + 0.5, y as f32 + 0.5));
        *v = bilinear(bitmap, p.x - user.origin.x - 0.5, p.y - user.origin.y - 0.5);
    }
    AlphaMask::from_vec(area, data)
}

fn bilinear(b: &GlyphBitmap, u: f32, v: f32) -> u8 {
    let at = |x: i32, y: i32| {
        if x < 0 || y < 0 {
            0.0
        } else {
            f32::from(b.get(x as u32, y as u32))
        }
    };
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let (x0, y0) = (x0 as i32, y0 as i32);
    let top = at(x0, y0) * (1.0 - fx) + at(x0 + 1, y0) * fx;
    let bottom = at(x0, y0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_blends_neighbours() {
        let b = GlyphBitmap { left: 0, top: 0, width: 2, height: 1, data: vec![0, 200] };
        assert_eq!(bilinear(&b, 0.0, 0.0), 0);
        assert_eq!(bilinear(&b, 1.0, 0.0), 200);
        assert_eq!(bilinear(&b, 0.5, 0.0), 100);
        assert_eq!(bilinear(&b, -1.0, 0.0), 0);
    }

    #[test]
    fn translated_gray_glyph_lands_on_the_rounded_pen() {
        let b = GlyphBitmap { left: 1, top: -2, width: 2, height: 2, data: vec![255; 4] };
        let m = device_mask(
            &b,
            Point::new(3.4, 5.6),
            &Matrix::translate(1.0, 0.0),
            &ClipRegion::default(),
            IntRect::from_size(20, 20),
        )
        .unwrap()
        .unwrap();
        assert_eq!(m.bounds(), IntRect::new(5, 4, 7, 6));
    }

    #[test]
    fn scaled_glyph_is_resampled() {
        let b = GlyphBitmap { left: 0, top: -2, width: 2, height: 2, data: vec![255; 4] };
        let m = device_mask(
            &b,
            Point::new(1.0, 4.0),
            &Matrix::scale(2.0, 2.0),
            &ClipRegion::default(),
            IntRect::from_size(20, 20),
        )
        .unwrap()
        .unwrap();
        // User box (1,2)-(3,4) maps to device (2,4)-(6,8).
        assert_eq!(m.get(3, 5), 255);
        assert_eq!(m.get(9, 9), 0);
    }
}
