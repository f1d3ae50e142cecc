use std::sync::Arc;

use crate::composite::{CompOp, SpanSource, blend_span, blend_span_lcd};
use crate::coords::IntRect;
use crate::error::{Error, Result};
use crate::paint::{PaintSampler, PremulRgba8};
use crate::raster::{AlphaMask, CoverageRow};
use crate::state::ClipRegion;
use crate::surface::{Surface, SurfaceMut};
use crate::text::LcdBitmap;

/// Pixels a canvas draws into.
#[derive(Debug, Default)]
pub(crate) enum Target<'a> {
    #[default]
    Detached,
    Owned(Surface),
    Borrowed(SurfaceMut<'a>),
}

impl Target<'_> {
    pub(crate) fn view(&mut self) -> Result<SurfaceMut<'_>> {
        match self {
            Target::Detached => Err(Error::NotInitialized),
            Target::Owned(s) => Ok(s.as_mut()),
            Target::Borrowed(s) => Ok(s.reborrow()),
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        !matches!(self, Target::Detached)
    }

    pub(crate) fn size(&self) -> Option<(u32, u32)> {
        match self {
            Target::Detached => None,
            Target::Owned(s) => Some((s.width(), s.height())),
            Target::Borrowed(s) => Some((s.width(), s.height())),
        }
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        match self {
            Target::Detached => None,
            Target::Owned(s) => s.pixel(x, y),
            Target::Borrowed(s) => s.pixel(x, y),
        }
    }
}

/// Offscreen group opened by `push_layer`, composited back on `pop_layer`.
#[derive(Debug)]
pub(crate) struct Layer {
    pub(crate) surface: Surface,
    pub(crate) opacity: u8,
    pub(crate) op: CompOp,
    pub(crate) mask: Option<Arc<AlphaMask>>,
    /// Clip in force when the layer was pushed.
    pub(crate) clip: Arc<ClipRegion>,
}

/// Current draw destination: the innermost layer, else the attached target.
pub(crate) fn destination<'s>(target: &'s mut Target<'_>, layers: &'s mut [Layer]) -> Result<SurfaceMut<'s>> {
    match layers.last_mut() {
        Some(layer) => Ok(layer.surface.as_mut()),
        None => target.view(),
    }
}

/// Per-canvas buffers reused across draws.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    colors: Vec<PremulRgba8>,
    mask: Vec<u8>,
    lcd: Vec<[u8; 3]>,
}

/// Everything a composite pass reads besides coverage.
pub(crate) struct Blend<'p> {
    pub(crate) sampler: PaintSampler<'p>,
    pub(crate) op: CompOp,
    pub(crate) opacity: u8,
}

impl Blend<'_> {
    fn source<'b>(&self, colors: &'b mut Vec<PremulRgba8>, x: i32, y: i32, len: usize) -> SpanSource<'b> {
        match self.sampler.solid() {
            Some(c) => SpanSource::Solid(c),
            None => {
                colors.resize(len, PremulRgba8::TRANSPARENT);
                self.sampler.fill_span(x, y, &mut colors[..len]);
                SpanSource::Pixels(&colors[..len])
            }
        }
    }
}

/// Composites rasterizer rows already limited to the clip bounds and the
/// destination.
pub(crate) fn composite_rows(
    dst: &mut SurfaceMut<'_>,
    rows: impl Iterator<Item = CoverageRow>,
    blend: &Blend<'_>,
    clip: &ClipRegion,
    scratch: &mut Scratch,
) {
    let Scratch { colors, mask, .. } = scratch;
    for row in rows {
        let y = row.y;
        for span in &row.spans {
            let len = span.len as usize;
            let clip_mask = match clip.mask() {
                Some(m) => {
                    mask.resize(len, 0);
                    m.fill_span(span.x, y, &mut mask[..len]);
                    Some(&mask[..len])
                }
                None => None,
            };
            let src = blend.source(colors, span.x, y, len);
            let x0 = span.x as usize;
            let line = &mut dst.row_mut(y as u32)[x0..x0 + len];
            blend_span(blend.op, line, src, span.coverage, blend.opacity, clip_mask);
        }
    }
}

/// Composites through a dense device-space mask, already intersected with
/// the clip and the destination bounds.
pub(crate) fn composite_mask(dst: &mut SurfaceMut<'_>, mask: &AlphaMask, blend: &Blend<'_>, scratch: &mut Scratch) {
    let b = mask.bounds();
    let len = b.width() as usize;
    if len == 0 {
        return;
    }
    for y in b.y0..b.y1 {
        let Some(coverage) = mask.row(y) else { continue };
        if coverage.iter().all(|&c| c == 0) {
            continue;
        }
        let src = blend.source(&mut scratch.colors, b.x0, y, len);
        let x0 = b.x0 as usize;
        let line = &mut dst.row_mut(y as u32)[x0..x0 + len];
        blend_span(blend.op, line, src, 255, blend.opacity, Some(coverage));
    }
}

/// Composites per-channel glyph coverage at its device position, scaled by
/// the clip.
pub(crate) fn composite_lcd(
    dst: &mut SurfaceMut<'_>,
    glyph: &LcdBitmap,
    at: (i32, i32),
    blend: &Blend<'_>,
    clip: &ClipRegion,
    scratch: &mut Scratch,
) {
    let gx = at.0 + glyph.left;
    let gy = at.1 + glyph.top;
    let area = IntRect::new(gx, gy, gx + glyph.width as i32, gy + glyph.height as i32)
        .intersect(clip.bounds())
        .intersect(dst.bounds());
    let len = area.width() as usize;
    if len == 0 {
        return;
    }
    let Scratch { colors, mask, lcd } = scratch;
    for y in area.y0..area.y1 {
        let src_row = glyph.row((y - gy) as u32);
        let from = (area.x0 - gx) as usize;
        lcd.clear();
        lcd.extend_from_slice(&src_row[from..from + len]);
        if let Some(m) = clip.mask() {
            mask.resize(len, 0);
            m.fill_span(area.x0, y, &mut mask[..len]);
            for (px, &c) in lcd.iter_mut().zip(mask.iter()) {
                for ch in px.iter_mut() {
                    *ch = crate::paint::mul_div255(u32::from(*ch), u32::from(c)) as u8;
                }
            }
        }
        let src = blend.source(colors, area.x0, y, len);
        let x0 = area.x0 as usize;
        let line = &mut dst.row_mut(y as u32)[x0..x0 + len];
        blend_span_lcd(blend.op, line, src, &lcd[..len], blend.opacity);
    }
}

/// Composites a finished layer onto `dst` through its push-time clip, its
/// mask and its opacity.
pub(crate) fn composite_layer(dst: &mut SurfaceMut<'_>, layer: &Layer, scratch: &mut Scratch) {
    let mut area = layer.clip.bounds().intersect(dst.bounds()).intersect(layer.surface.bounds());
    if let Some(m) = &layer.mask {
        area = area.intersect(m.bounds());
    }
    let len = area.width() as usize;
    if len == 0 || layer.opacity == 0 {
        return;
    }
    let mask = &mut scratch.mask;
    for y in area.y0..area.y1 {
        let x0 = area.x0 as usize;
        let src = &layer.surface.row(y as u32)[x0..x0 + len];
        let coverage = match (layer.clip.mask(), layer.mask.as_deref()) {
            (None, None) => None,
            (Some(c), Some(g)) => {
                mask.resize(len, 0);
                c.fill_span(area.x0, y, &mut mask[..len]);
                for (i, v) in mask[..len].iter_mut().enumerate() {
                    let gv = g.get(area.x0 + i as i32, y);
                    *v = crate::paint::mul_div255(u32::from(*v), u32::from(gv)) as u8;
                }
                Some(&mask[..len])
            }
            (Some(m), None) | (None, Some(m)) => {
                mask.resize(len, 0);
                m.fill_span(area.x0, y, &mut mask[..len]);
                Some(&mask[..len])
            }
        };
        let line = &mut dst.row_mut(y as u32)[x0..x0 + len];
        blend_span(layer.op, line, SpanSource::Pixels(src), 255, layer.opacity, coverage);
    }
}
