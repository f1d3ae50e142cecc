use crate::coords::{IntRect, Point};
use crate::error::Result;
use crate::geometry::{Path, Polyline};

use super::cells::{Cell, CellBuffer, SUBPIXEL_SCALE, SUBPIXEL_SHIFT};
use super::coverage::{CoverageRow, CoverageStorage, Span};
use super::gamma::{Gamma, GammaLut};

/// Interior rule for self-intersecting and nested contours.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// Covered where the winding number is non-zero.
    #[default]
    NonZero,
    /// Covered where an odd number of edges is crossed.
    EvenOdd,
}

/// Largest device coordinate the rasterizer accepts, in pixels.
pub const MAX_COORD: i32 = 1 << 20;

const COVER_FULL: i32 = 1 << 8;

/// Anti-aliased scanline rasterizer.
///
/// Edges are clipped to the clip box while they are added, accumulated as
/// cells, then swept row by row into coverage spans. The rasterizer keeps its
/// buffers between passes, so one instance should be reused for many draws.
#[derive(Debug)]
pub struct Rasterizer {
    cells: CellBuffer,
    clip: IntRect,
    gamma: GammaLut,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cells: CellBuffer::default(),
            clip: IntRect::new(-MAX_COORD, -MAX_COORD, MAX_COORD, MAX_COORD),
            gamma: GammaLut::default(),
        }
    }

    pub fn set_gamma(&mut self, gamma: Gamma) {
        self.gamma = gamma.lut();
    }

    /// Drops accumulated edges and sets the box later edges are clipped to.
    pub fn reset(&mut self, clip: IntRect) {
        self.cells.reset();
        self.clip = clip.intersect(IntRect::new(-MAX_COORD, -MAX_COORD, MAX_COORD, MAX_COORD));
    }

    #[inline]
    pub fn clip_box(&self) -> IntRect {
        self.clip
    }

    /// Adds one edge in device coordinates.
    pub fn add_line(&mut self, a: Point, b: Point) {
        if !a.is_finite() || !b.is_finite() || self.clip.is_empty() || a.y == b.y {
            return;
        }
        let (cx0, cy0) = (self.clip.x0 as f32, self.clip.y0 as f32);
        let (cx1, cy1) = (self.clip.x1 as f32, self.clip.y1 as f32);
        if (a.y <= cy0 && b.y <= cy0) || (a.y >= cy1 && b.y >= cy1) {
            return;
        }

        // Split where the edge crosses a clip boundary. Pieces above or below
        // drop out; pieces left or right collapse onto the boundary, which
        // keeps the winding seen by pixels inside the box.
        let mut ts = [0.0f32; 6];
        ts[1] = 1.0;
        let mut n = 2;
        for (bound, p0, p1) in [(cx0, a.x, b.x), (cx1, a.x, b.x), (cy0, a.y, b.y), (cy1, a.y, b.y)] {
            if (p0 - bound) * (p1 - bound) < 0.0 {
                ts[n] = (bound - p0) / (p1 - p0);
                n += 1;
            }
        }
        let ts = &mut ts[..n];
        ts.sort_unstable_by(f32::total_cmp);

        let at = |t: f32| {
            if t <= 0.0 {
                a
            } else if t >= 1.0 {
                b
            } else {
                a.lerp(b, t)
            }
        };
        for w in ts.windows(2) {
            if w[1] <= w[0] {
                continue;
            }
            let (p0, p1) = (at(w[0]), at(w[1]));
            let mid_y = (p0.y + p1.y) * 0.5;
            if mid_y < cy0 || mid_y > cy1 {
                continue;
            }
            let fix_x = |x: f32| (x.clamp(cx0, cx1) * SUBPIXEL_SCALE as f32).round() as i32;
            let fix_y = |y: f32| (y.clamp(cy0, cy1) * SUBPIXEL_SCALE as f32).round() as i32;
            self.cells.line(fix_x(p0.x), fix_y(p0.y), fix_x(p1.x), fix_y(p1.y));
        }
    }

    /// Adds a contour, closing it implicitly.
    pub fn add_polyline(&mut self, line: &Polyline) {
        if line.points.len() < 2 {
            return;
        }
        for w in line.points.windows(2) {
            self.add_line(w[0], w[1]);
        }
        if let (Some(&first), Some(&last)) = (line.points.first(), line.points.last()) {
            if first != last {
                self.add_line(last, first);
            }
        }
    }

    /// Adds every subpath of a device-space path.
    pub fn add_path(&mut self, path: &Path, tolerance: f32) -> Result<()> {
        for line in path.to_polylines(tolerance)? {
            self.add_polyline(&line);
        }
        Ok(())
    }

    /// Coverage rows of everything added since the last reset, top to bottom.
    pub fn sweep(&mut self, rule: FillRule) -> Sweep<'_> {
        let clip = self.clip;
        let cells = self.cells.sorted_cells();
        let start = cells.partition_point(|c| c.y < clip.y0);
        Sweep { cells, pos: start, rule, gamma: &self.gamma, clip }
    }

    /// Resets to `clip`, adds `path` and sweeps it.
    pub fn rasterize(&mut self, path: &Path, rule: FillRule, clip: IntRect, tolerance: f32) -> Result<Sweep<'_>> {
        self.reset(clip);
        self.add_path(path, tolerance)?;
        Ok(self.sweep(rule))
    }
}

/// Lazy sequence of coverage rows produced by [`Rasterizer::sweep`].
pub struct Sweep<'a> {
    cells: &'a [Cell],
    pos: usize,
    rule: FillRule,
    gamma: &'a GammaLut,
    clip: IntRect,
}

impl Sweep<'_> {
    /// Collects the remaining rows for later reuse.
    pub fn capture(self) -> CoverageStorage {
        self.collect()
    }

    #[inline]
    fn alpha(&self, area: i32) -> u8 {
        let mut cover = (area >> (SUBPIXEL_SHIFT * 2 + 1 - 8)).abs();
        if self.rule == FillRule::EvenOdd {
            cover &= 2 * COVER_FULL - 1;
            if cover > COVER_FULL {
                cover = 2 * COVER_FULL - cover;
            }
        }
        self.gamma.apply(cover.min(255) as u8)
    }

    fn push(&self, spans: &mut Vec<Span>, x: i32, len: i32, coverage: u8) {
        let x0 = x.max(self.clip.x0);
        let x1 = (x + len).min(self.clip.x1);
        if coverage == 0 || x1 <= x0 {
            return;
        }
        if let Some(last) = spans.last_mut() {
            if last.end() == x0 && last.coverage == coverage {
                last.len += (x1 - x0) as u32;
                return;
            }
        }
        spans.push(Span::new(x0, (x1 - x0) as u32, coverage));
    }
}

impl Iterator for Sweep<'_> {
    type Item = CoverageRow;

    fn next(&mut self) -> Option<CoverageRow> {
        while self.pos < self.cells.len() {
            let y = self.cells[self.pos].y;
            if y >= self.clip.y1 {
                self.pos = self.cells.len();
                return None;
            }
            let mut spans = Vec::new();
            let mut cover = 0i32;
            while self.pos < self.cells.len() && self.cells[self.pos].y == y {
                let x = self.cells[self.pos].x;
                let mut area = 0i32;
                while let Some(c) = self.cells.get(self.pos).filter(|c| c.y == y && c.x == x) {
                    area += c.area;
                    cover += c.cover;
                    self.pos += 1;
                }
                let mut next_x = x;
                if area != 0 {
                    let a = self.alpha((cover << (SUBPIXEL_SHIFT + 1)) - area);
                    self.push(&mut spans, x, 1, a);
                    next_x += 1;
                }
                if let Some(c) = self.cells.get(self.pos).filter(|c| c.y == y && c.x > next_x) {
                    let a = self.alpha(cover << (SUBPIXEL_SHIFT + 1));
                    self.push(&mut spans, next_x, c.x - next_x, a);
                }
            }
            if !spans.is_empty() {
                return Some(CoverageRow { y, spans });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};

    fn raster(path: &Path, rule: FillRule, clip: IntRect) -> CoverageStorage {
        let mut r = Rasterizer::new();
        r.rasterize(path, rule, clip, 0.1).unwrap().capture()
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Path {
        let mut p = Path::new();
        p.rect(Rect::new(x, y, w, h)).unwrap();
        p
    }

    // ── basic coverage ───────────────────────────────────────────────────

    #[test]
    fn aligned_rect_is_fully_covered() {
        let s = raster(&rect(2.0, 3.0, 4.0, 2.0), FillRule::NonZero, IntRect::from_size(20, 20));
        assert_eq!(s.rows().len(), 2);
        for row in s.rows() {
            assert_eq!(row.spans, vec![Span::new(2, 4, 255)]);
        }
        assert_eq!(s.bounds(), IntRect::new(2, 3, 6, 5));
    }

    #[test]
    fn half_pixel_edge_gives_half_coverage() {
        let s = raster(&rect(0.5, 0.0, 2.0, 1.0), FillRule::NonZero, IntRect::from_size(8, 8));
        assert_eq!(s.coverage_at(0, 0), 128);
        assert_eq!(s.coverage_at(1, 0), 255);
        assert_eq!(s.coverage_at(2, 0), 128);
        assert_eq!(s.coverage_at(3, 0), 0);
    }

    #[test]
    fn orientation_does_not_matter() {
        let mut ccw = Path::new();
        ccw.polygon(&[Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0), Vec2::new(5.0, 5.0), Vec2::new(5.0, 1.0)], true)
            .unwrap();
        let a = raster(&ccw, FillRule::NonZero, IntRect::from_size(8, 8));
        let b = raster(&rect(1.0, 1.0, 4.0, 4.0), FillRule::NonZero, IntRect::from_size(8, 8));
        assert_eq!(a, b);
    }

    #[test]
    fn open_subpath_is_closed_implicitly() {
        let mut p = Path::new();
        p.polyline(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]).unwrap();
        let s = raster(&p, FillRule::NonZero, IntRect::from_size(20, 20));
        assert_eq!(s.coverage_at(8, 2), 255);
        assert_eq!(s.coverage_at(2, 8), 0);
    }

    // ── fill rules ───────────────────────────────────────────────────────

    #[test]
    fn even_odd_punches_hole_in_nested_rects() {
        let mut p = rect(0.0, 0.0, 10.0, 10.0);
        p.extend_from(&rect(3.0, 3.0, 4.0, 4.0)).unwrap();
        let nz = raster(&p, FillRule::NonZero, IntRect::from_size(16, 16));
        let eo = raster(&p, FillRule::EvenOdd, IntRect::from_size(16, 16));
        assert_eq!(nz.coverage_at(5, 5), 255);
        assert_eq!(eo.coverage_at(5, 5), 0);
        assert_eq!(eo.coverage_at(1, 1), 255);
    }

    // ── clipping ─────────────────────────────────────────────────────────

    #[test]
    fn coverage_stays_inside_clip() {
        let s = raster(&rect(-5.0, -5.0, 30.0, 30.0), FillRule::NonZero, IntRect::new(2, 3, 7, 9));
        assert_eq!(s.bounds(), IntRect::new(2, 3, 7, 9));
        assert!(s.rows().iter().all(|r| r.spans == vec![Span::new(2, 5, 255)]));
    }

    #[test]
    fn shape_left_of_clip_keeps_winding() {
        // Triangle whose left part lies outside: pixels inside still filled.
        let mut p = Path::new();
        p.polygon(&[Vec2::new(-20.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)], true).unwrap();
        let s = raster(&p, FillRule::NonZero, IntRect::new(0, 0, 10, 10));
        assert_eq!(s.coverage_at(9, 1), 255);
        assert_eq!(s.coverage_at(0, 1), 255);
    }

    #[test]
    fn empty_clip_produces_nothing() {
        assert!(raster(&rect(0.0, 0.0, 5.0, 5.0), FillRule::NonZero, IntRect::empty()).is_empty());
    }

    // ── gamma ────────────────────────────────────────────────────────────

    #[test]
    fn threshold_gamma_makes_hard_edges() {
        let mut r = Rasterizer::new();
        r.set_gamma(Gamma::ALIASED);
        let s = r.rasterize(&rect(0.4, 0.0, 2.0, 1.0), FillRule::NonZero, IntRect::from_size(4, 4), 0.1)
            .unwrap()
            .capture();
        assert_eq!(s.coverage_at(0, 0), 255);
        assert_eq!(s.coverage_at(2, 0), 0);
    }

    #[test]
    fn sweep_is_lazy_and_ordered() {
        let mut r = Rasterizer::new();
        let mut p = rect(0.0, 6.0, 2.0, 1.0);
        p.extend_from(&rect(0.0, 1.0, 2.0, 1.0)).unwrap();
        let ys: Vec<i32> = r.rasterize(&p, FillRule::NonZero, IntRect::from_size(8, 8), 0.1).unwrap().map(|row| row.y).collect();
        assert_eq!(ys, vec![1, 6]);
    }
}
