use std::sync::Arc;

use crate::coords::{CornerRadii, IntRect, Matrix, Point, Rect};
use crate::error::{Error, Result, invalid};
use crate::geometry::{Path, stroke_to_fill};
use crate::paint::{Extend, Filter, Paint, PaintSampler, Pattern, PremulRgba8, SharedPaint};
use crate::raster::{AlphaMask, CompoundShape, FillRule};
use crate::record::DrawOp;
use crate::state::ClipRegion;
use crate::surface::Surface;

use super::Canvas;
use super::target::{Blend, composite_mask, composite_rows, destination};

/// Pixel box a draw may touch: clip ∩ destination ∩ the shape's bounds.
pub(super) fn draw_area(dst: IntRect, clip: &ClipRegion, shape: Option<Rect>) -> Option<IntRect> {
    let shape = shape.filter(|b| b.is_finite())?;
    let area = clip.bounds().intersect(dst).intersect(shape.round_out().inflate(1));
    (!area.is_empty()).then_some(area)
}

#[derive(Copy, Clone)]
enum ShapeMode {
    Fill,
    Stroke,
}

impl<'a> Canvas<'a> {
    /// Remembers a failure that happened before any recordable call.
    pub(super) fn fail<T>(&mut self, e: Error) -> Result<T> {
        log::debug!("canvas call failed: {e}");
        self.last_error = Some(e.clone());
        Err(e)
    }

    /// Fills `path` with the current paint, fill rule and transform.
    pub fn fill_path(&mut self, path: &Path) -> Result<()> {
        let r = self.fill_user_path(path);
        self.finish(r, || DrawOp::FillPath(Arc::new(path.clone())))
    }

    /// Strokes `path` with the current stroke style. The pen is transformed
    /// along with the geometry.
    pub fn stroke_path(&mut self, path: &Path) -> Result<()> {
        let r = self.stroke_user_path(path);
        self.finish(r, || DrawOp::StrokePath(Arc::new(path.clone())))
    }

    fn fill_user_path(&mut self, path: &Path) -> Result<()> {
        let st = self.state.current();
        let device = path.transformed(&st.transform)?;
        let (rule, paint) = (st.fill_rule, st.paint.clone());
        self.paint_device_path(&device, rule, &paint)
    }

    fn stroke_user_path(&mut self, path: &Path) -> Result<()> {
        let st = self.state.current();
        // Flatten finely enough that the tolerance holds after the transform.
        let scale = st.transform.max_scale().max(1e-6);
        let outline = stroke_to_fill(path, &st.stroke, self.tolerance / scale)?;
        let device = outline.transformed(&st.transform)?;
        let paint = st.paint.clone();
        self.paint_device_path(&device, FillRule::NonZero, &paint)
    }

    /// Rasterizes a device-space path and composites `paint` through it.
    ///
    /// Everything fallible happens before the first pixel is written.
    pub(super) fn paint_device_path(&mut self, device: &Path, rule: FillRule, paint: &Paint) -> Result<()> {
        let st = self.state.current();
        let (transform, clip, gamma) = (st.transform, st.clip.clone(), st.effective_gamma());
        let (op, opacity) = (st.op, st.opacity);
        let Canvas { target, layers, raster, scratch, tolerance, .. } = self;
        let mut dst = destination(target, layers)?;
        let blend = Blend { sampler: PaintSampler::new(paint, &transform)?, op, opacity };
        if opacity == 0 {
            return Ok(());
        }
        let Some(area) = draw_area(dst.bounds(), &clip, device.loose_bounds()) else {
            return Ok(());
        };
        raster.set_gamma(gamma);
        let rows = raster.rasterize(device, rule, area, *tolerance)?;
        composite_rows(&mut dst, rows, &blend, &clip, scratch);
        Ok(())
    }

    // ── regions & compound fills ──────────────────────────────────────────

    /// Fills the union of `rects`, whatever the current fill rule.
    pub fn fill_region(&mut self, rects: &[Rect]) -> Result<()> {
        let r = self.fill_region_inner(rects);
        self.finish(r, || DrawOp::FillRegion(rects.into()))
    }

    fn fill_region_inner(&mut self, rects: &[Rect]) -> Result<()> {
        let mut path = Path::new();
        for r in rects {
            if !r.is_finite() {
                return Err(invalid(format!("region rect {r:?} is not finite")));
            }
            if !r.normalized().is_empty() {
                path.rect(*r)?;
            }
        }
        let st = self.state.current();
        let device = path.transformed(&st.transform)?;
        let paint = st.paint.clone();
        self.paint_device_path(&device, FillRule::NonZero, &paint)
    }

    /// Fills every part of `shape` with `paints[style]`. Styles are painted in
    /// ascending order, so higher styles cover lower ones where they overlap.
    pub fn fill_compound(&mut self, shape: &CompoundShape, paints: &[SharedPaint]) -> Result<()> {
        let r = self.fill_compound_inner(shape, paints);
        self.finish(r, || DrawOp::FillCompound { shape: Arc::new(shape.clone()), paints: paints.into() })
    }

    fn fill_compound_inner(&mut self, shape: &CompoundShape, paints: &[SharedPaint]) -> Result<()> {
        if let Some(&style) = shape.styles().iter().find(|&&s| s >= paints.len()) {
            return Err(invalid(format!("style {style} has no paint ({} supplied)", paints.len())));
        }
        let st = self.state.current();
        let (transform, clip, gamma, rule) = (st.transform, st.clip.clone(), st.effective_gamma(), st.fill_rule);
        let (op, opacity) = (st.op, st.opacity);

        let mut device = CompoundShape::new();
        let mut bounds: Option<Rect> = None;
        for (style, part) in shape.parts() {
            let p = part.transformed(&transform)?;
            if let Some(b) = p.loose_bounds() {
                bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
            }
            device.add(style, p);
        }
        let blends = paints
            .iter()
            .map(|p| Ok(Blend { sampler: PaintSampler::new(p, &transform)?, op, opacity }))
            .collect::<Result<Vec<_>>>()?;

        let Canvas { target, layers, compound, scratch, tolerance, .. } = self;
        let mut dst = destination(target, layers)?;
        let Some(area) = draw_area(dst.bounds(), &clip, bounds) else {
            return Ok(());
        };
        compound.set_gamma(gamma);
        let coverage = compound.rasterize(&device, rule, area, *tolerance)?;
        for (style, storage) in &coverage {
            composite_rows(&mut dst, storage.rows().iter().cloned(), &blends[*style], &clip, scratch);
        }
        Ok(())
    }

    /// Paints the current paint through a device-space coverage mask,
    /// ignoring the transform.
    pub fn fill_mask(&mut self, mask: Arc<AlphaMask>) -> Result<()> {
        let r = self.fill_mask_inner(&mask);
        self.finish(r, || DrawOp::FillMask(mask))
    }

    fn fill_mask_inner(&mut self, mask: &AlphaMask) -> Result<()> {
        let st = self.state.current();
        let (transform, clip, paint) = (st.transform, st.clip.clone(), st.paint.clone());
        let (op, opacity) = (st.op, st.opacity);
        let Canvas { target, layers, scratch, .. } = self;
        let mut dst = destination(target, layers)?;
        let blend = Blend { sampler: PaintSampler::new(&paint, &transform)?, op, opacity };
        let clipped = match clip.as_ref() {
            ClipRegion::Rect(r) => mask.cropped(r.intersect(dst.bounds()))?,
            ClipRegion::Mask(m) => mask.intersect(m)?.cropped(dst.bounds())?,
        };
        composite_mask(&mut dst, &clipped, &blend, scratch);
        Ok(())
    }

    // ── bitmaps ───────────────────────────────────────────────────────────

    /// Draws `image` stretched onto `dst` in user space.
    pub fn draw_bitmap(&mut self, image: Arc<Surface>, dst: Rect, filter: Filter) -> Result<()> {
        let r = self.draw_bitmap_inner(&image, dst, filter);
        self.finish(r, || DrawOp::DrawBitmap { image, dst, filter })
    }

    fn draw_bitmap_inner(&mut self, image: &Arc<Surface>, dst: Rect, filter: Filter) -> Result<()> {
        if !dst.is_finite() {
            return Err(invalid(format!("bitmap destination {dst:?} is not finite")));
        }
        if image.is_empty() || dst.width() == 0.0 || dst.height() == 0.0 {
            return Ok(());
        }
        let place = Matrix::translate(dst.origin.x, dst.origin.y)
            * Matrix::scale(dst.width() / image.width() as f32, dst.height() / image.height() as f32);
        let paint = Paint::Pattern(Pattern::new(image.clone(), Extend::Clamp, filter).with_transform(place));
        let mut path = Path::new();
        path.rect(dst)?;
        let device = path.transformed(&self.state.current().transform)?;
        self.paint_device_path(&device, FillRule::NonZero, &paint)
    }

    /// Replaces every pixel inside the clip with `color`, ignoring the
    /// transform, operator and opacity.
    pub fn clear(&mut self, color: PremulRgba8) -> Result<()> {
        let r = self.clear_inner(color);
        self.finish(r, || DrawOp::Clear(color))
    }

    fn clear_inner(&mut self, color: PremulRgba8) -> Result<()> {
        color.debug_assert_premul();
        let clip = self.state.current().clip.clone();
        let Canvas { target, layers, .. } = self;
        let mut dst = destination(target, layers)?;
        let area = clip.bounds().intersect(dst.bounds());
        for y in area.y0..area.y1 {
            let line = &mut dst.row_mut(y as u32)[area.x0 as usize..area.x1 as usize];
            match clip.mask() {
                None => line.fill(color),
                Some(m) => {
                    for (i, px) in line.iter_mut().enumerate() {
                        *px = px.lerp(color, m.get(area.x0 + i as i32, y));
                    }
                }
            }
        }
        Ok(())
    }

    // ── shape helpers ─────────────────────────────────────────────────────

    fn shape(&mut self, mode: ShapeMode, build: impl FnOnce(&mut Path) -> Result<()>) -> Result<()> {
        let mut path = Path::new();
        if let Err(e) = build(&mut path) {
            return self.fail(e);
        }
        match mode {
            ShapeMode::Fill => self.fill_path(&path),
            ShapeMode::Stroke => self.stroke_path(&path),
        }
    }

    pub fn fill_rect(&mut self, rect: Rect) -> Result<()> {
        self.shape(ShapeMode::Fill, |p| p.rect(rect).map(drop))
    }

    pub fn stroke_rect(&mut self, rect: Rect) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.rect(rect).map(drop))
    }

    pub fn fill_round_rect(&mut self, rect: Rect, radii: CornerRadii) -> Result<()> {
        self.shape(ShapeMode::Fill, |p| p.round_rect(rect, radii).map(drop))
    }

    pub fn stroke_round_rect(&mut self, rect: Rect, radii: CornerRadii) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.round_rect(rect, radii).map(drop))
    }

    pub fn fill_ellipse(&mut self, center: Point, rx: f32, ry: f32) -> Result<()> {
        self.shape(ShapeMode::Fill, |p| p.ellipse(center, rx, ry).map(drop))
    }

    pub fn stroke_ellipse(&mut self, center: Point, rx: f32, ry: f32) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.ellipse(center, rx, ry).map(drop))
    }

    pub fn stroke_line(&mut self, from: Point, to: Point) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.polyline(&[from, to]).map(drop))
    }

    pub fn fill_polygon(&mut self, points: &[Point]) -> Result<()> {
        self.shape(ShapeMode::Fill, |p| p.polygon(points, true).map(drop))
    }

    pub fn stroke_polygon(&mut self, points: &[Point]) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.polygon(points, true).map(drop))
    }

    pub fn stroke_polyline(&mut self, points: &[Point]) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.polyline(points).map(drop))
    }

    /// Strokes one cubic bezier segment.
    pub fn stroke_bezier(&mut self, from: Point, c1: Point, c2: Point, to: Point) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| {
            p.move_to(from)?.cubic_to(c1, c2, to)?;
            Ok(())
        })
    }

    /// Fills a pie slice: center, arc, back to center.
    pub fn fill_arc(&mut self, center: Point, radius: f32, start: f32, sweep: f32) -> Result<()> {
        self.shape(ShapeMode::Fill, |p| {
            p.move_to(center)?.arc(center, radius, start, sweep)?.close();
            Ok(())
        })
    }

    /// Strokes an open circular arc.
    pub fn stroke_arc(&mut self, center: Point, radius: f32, start: f32, sweep: f32) -> Result<()> {
        self.shape(ShapeMode::Stroke, |p| p.arc(center, radius, start, sweep).map(drop))
    }
}
