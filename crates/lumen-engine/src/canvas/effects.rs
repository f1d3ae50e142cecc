use std::sync::Arc;

use crate::coords::Rect;
use crate::error::{Error, Result, invalid, try_vec};
use crate::paint::PremulRgba8;
use crate::raster::AlphaMask;
use crate::record::DrawOp;
use crate::surface::Surface;

use super::Canvas;
use super::target::{Layer, composite_layer, destination};

impl<'a> Canvas<'a> {
    // ── layers ────────────────────────────────────────────────────────────

    /// Opens an opacity group. Draws go to an offscreen buffer until the
    /// matching [`pop_layer`](Self::pop_layer).
    pub fn push_layer(&mut self, opacity: u8) -> Result<()> {
        self.push_layer_masked(opacity, None)
    }

    /// Like [`push_layer`](Self::push_layer), with a device-space mask applied
    /// when the group is composited back.
    pub fn push_layer_masked(&mut self, opacity: u8, mask: Option<Arc<AlphaMask>>) -> Result<()> {
        let r = self.open_layer(opacity, mask.clone());
        self.finish(r, || DrawOp::PushLayer { opacity, mask })
    }

    fn open_layer(&mut self, opacity: u8, mask: Option<Arc<AlphaMask>>) -> Result<()> {
        let (w, h) = self.target.size().ok_or(Error::NotInitialized)?;
        let st = self.state.current();
        let layer = Layer { surface: Surface::new(w, h)?, opacity, op: st.op, mask, clip: st.clip.clone() };
        self.layers.push(layer);
        log::trace!("layer pushed, depth {}", self.layers.len());
        Ok(())
    }

    /// Composites the innermost group onto whatever is beneath it.
    pub fn pop_layer(&mut self) -> Result<()> {
        let r = self.close_layer();
        self.finish(r, || DrawOp::PopLayer)
    }

    fn close_layer(&mut self) -> Result<()> {
        let Some(layer) = self.layers.pop() else {
            log::debug!("pop_layer without an open layer");
            return Err(Error::StateUnderflow);
        };
        let Canvas { target, layers, scratch, .. } = self;
        let mut dst = destination(target, layers)?;
        composite_layer(&mut dst, &layer, scratch);
        Ok(())
    }

    /// Number of open layers.
    pub fn layer_depth(&self) -> usize {
        self.layers.len()
    }

    // ── blur ──────────────────────────────────────────────────────────────

    /// Blurs the pixels under `rect` (user space), limited to the clip.
    ///
    /// Three box passes approximate a gaussian; `radius` is scaled by the
    /// current transform. Pixels beyond the blurred box are never read.
    pub fn blur(&mut self, rect: Rect, radius: f32) -> Result<()> {
        let r = self.blur_inner(rect, radius);
        self.finish(r, || DrawOp::Blur { rect, radius })
    }

    fn blur_inner(&mut self, rect: Rect, radius: f32) -> Result<()> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(invalid(format!("blur radius {radius} must be finite and non-negative")));
        }
        if !rect.is_finite() {
            return Err(invalid(format!("blur rect {rect:?} is not finite")));
        }
        let st = self.state.current();
        let device_radius = radius * st.transform.max_scale();
        let box_radius = (device_radius / 3.0).round() as usize;
        let clip = st.clip.clone();
        let bounds = rect.normalized().transform_bounds(&st.transform).round_out();

        let Canvas { target, layers, .. } = self;
        let mut dst = destination(target, layers)?;
        let area = bounds.intersect(clip.bounds()).intersect(dst.bounds());
        if area.is_empty() || box_radius == 0 {
            return Ok(());
        }
        let (w, h) = (area.width() as usize, area.height() as usize);
        // A window wider than the area only repeats clamped edge pixels.
        let box_radius = box_radius.min(w.max(h));
        let mut buf = try_vec(w * h, [0u32; 4])?;
        for y in 0..h {
            let row = &dst.row((area.y0 as usize + y) as u32)[area.x0 as usize..area.x0 as usize + w];
            for (out, px) in buf[y * w..(y + 1) * w].iter_mut().zip(row) {
                *out = px.to_array().map(u32::from);
            }
        }
        let mut line = Vec::with_capacity(w.max(h));
        let mut out = Vec::with_capacity(w.max(h));
        for _ in 0..3 {
            for y in 0..h {
                line.clear();
                line.extend_from_slice(&buf[y * w..(y + 1) * w]);
                box_line(&line, box_radius, &mut out);
                buf[y * w..(y + 1) * w].copy_from_slice(&out);
            }
            for x in 0..w {
                line.clear();
                line.extend((0..h).map(|y| buf[y * w + x]));
                box_line(&line, box_radius, &mut out);
                for (y, v) in out.iter().enumerate() {
                    buf[y * w + x] = *v;
                }
            }
        }
        for y in 0..h {
            let dy = area.y0 + y as i32;
            let row = &mut dst.row_mut(dy as u32)[area.x0 as usize..area.x0 as usize + w];
            for (i, (px, v)) in row.iter_mut().zip(&buf[y * w..(y + 1) * w]).enumerate() {
                let blurred = PremulRgba8::from_premul(v[0] as u8, v[1] as u8, v[2] as u8, v[3] as u8);
                *px = match clip.mask() {
                    None => blurred,
                    Some(m) => px.lerp(blurred, m.get(area.x0 + i as i32, dy)),
                };
            }
        }
        log::trace!("blur {}x{} box radius {box_radius}", w, h);
        Ok(())
    }
}

/// One box pass over `line` with edge clamping. Averages of premultiplied
/// channels stay premultiplied.
fn box_line(line: &[[u32; 4]], radius: usize, out: &mut Vec<[u32; 4]>) {
    out.clear();
    let Some(last) = line.len().checked_sub(1) else { return };
    let at = |i: isize| line[i.clamp(0, last as isize) as usize];
    let div = (2 * radius + 1) as u32;
    let r = radius as isize;
    let mut sum = [0u32; 4];
    for i in -r..=r {
        let px = at(i);
        for c in 0..4 {
            sum[c] += px[c];
        }
    }
    for x in 0..line.len() as isize {
        out.push(sum.map(|s| (s + div / 2) / div));
        let (gone, next) = (at(x - r), at(x + r + 1));
        for c in 0..4 {
            sum[c] = sum[c] + next[c] - gone[c];
        }
    }
}
