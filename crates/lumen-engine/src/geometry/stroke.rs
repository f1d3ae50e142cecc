use std::f32::consts::PI;

use crate::coords::{Point, Vec2};
use crate::error::{Result, invalid};

use super::flatten::Polyline;
use super::path::Path;

/// Shape at the open ends of a stroked subpath.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Shape where two stroked segments meet.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Dash pattern applied before stroking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dash {
    pub pattern: Vec<f32>,
    pub offset: f32,
}

/// Stroke parameters, carried in the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Ratio of miter length to stroke width above which a miter join
    /// becomes a bevel.
    pub miter_limit: f32,
    pub dash: Option<Dash>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { width: 1.0, cap: LineCap::Butt, join: LineJoin::Miter, miter_limit: 4.0, dash: None }
    }
}

impl StrokeStyle {
    pub fn new(width: f32) -> Self {
        Self { width, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(invalid(format!("stroke width {} must be finite and non-negative", self.width)));
        }
        if !self.miter_limit.is_finite() || self.miter_limit < 1.0 {
            return Err(invalid(format!("miter limit {} must be at least 1", self.miter_limit)));
        }
        Ok(())
    }
}

/// Outline of the stroke of `path` as closed polygons.
///
/// Every polygon winds the same way, so filling the result with the
/// non-zero rule paints exactly the stroked area.
pub fn stroke_to_fill(path: &Path, style: &StrokeStyle, tolerance: f32) -> Result<Path> {
    style.validate()?;
    let mut out = Path::new();
    if style.width == 0.0 || path.is_empty() {
        return Ok(out);
    }
    let source = match &style.dash {
        Some(dash) => path.clone_dashed(dash.offset, &dash.pattern)?,
        None => path.clone(),
    };
    let hw = style.width * 0.5;
    let mut stroker = Stroker { hw, style, tolerance: tolerance.max(1e-3), polys: Vec::new() };
    for line in source.to_polylines(tolerance)? {
        stroker.polyline(&line);
    }
    for poly in stroker.polys {
        out.polygon(&poly, true)?;
    }
    Ok(out)
}

struct Stroker<'a> {
    hw: f32,
    style: &'a StrokeStyle,
    tolerance: f32,
    polys: Vec<Vec<Point>>,
}

impl Stroker<'_> {
    /// Adds a polygon, reversed if needed so every polygon has positive area.
    fn push(&mut self, mut pts: Vec<Point>) {
        if pts.len() < 3 {
            return;
        }
        let area: f32 = pts
            .iter()
            .zip(pts.iter().cycle().skip(1))
            .map(|(a, b)| a.cross(*b))
            .sum();
        if area.abs() <= f32::EPSILON {
            return;
        }
        if area < 0.0 {
            pts.reverse();
        }
        self.polys.push(pts);
    }

    fn circle(&mut self, c: Point) {
        let r = self.hw;
        let n = if r <= self.tolerance {
            8
        } else {
            let step = 2.0 * (1.0 - self.tolerance / r).clamp(-1.0, 1.0).acos();
            ((2.0 * PI / step).ceil() as usize).clamp(8, 256)
        };
        let pts = (0..n)
            .map(|i| {
                let a = i as f32 * 2.0 * PI / n as f32;
                c + Vec2::new(a.cos(), a.sin()) * r
            })
            .collect();
        self.push(pts);
    }

    fn polyline(&mut self, line: &Polyline) {
        let mut pts: Vec<Point> = Vec::with_capacity(line.points.len());
        for &p in &line.points {
            if pts.last().is_none_or(|q: &Point| q.distance(p) > 1e-6) {
                pts.push(p);
            }
        }
        let closed = line.closed && pts.len() > 2;
        if closed && pts.first().zip(pts.last()).is_some_and(|(a, b)| a.distance(*b) <= 1e-6) {
            pts.pop();
        }

        if pts.len() == 1 {
            self.dot(pts[0]);
            return;
        }

        let n = pts.len();
        let edges = if closed { n } else { n - 1 };
        for i in 0..edges {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let nrm = (b - a).normalized().perp() * self.hw;
            self.push(vec![a + nrm, b + nrm, b - nrm, a - nrm]);
        }

        let joints = if closed { 0..n } else { 1..n - 1 };
        for i in joints {
            let prev = pts[(i + n - 1) % n];
            let v = pts[i];
            let next = pts[(i + 1) % n];
            self.join(prev, v, next);
        }

        if !closed {
            self.cap(pts[0], pts[0] - pts[1]);
            self.cap(pts[n - 1], pts[n - 1] - pts[n - 2]);
        }
    }

    /// Zero-length subpath: only round and square caps draw anything.
    fn dot(&mut self, p: Point) {
        match self.style.cap {
            LineCap::Butt => {}
            LineCap::Round => self.circle(p),
            LineCap::Square => {
                let h = self.hw;
                self.push(vec![
                    p + Vec2::new(-h, -h),
                    p + Vec2::new(h, -h),
                    p + Vec2::new(h, h),
                    p + Vec2::new(-h, h),
                ]);
            }
        }
    }

    /// Cap at `end`, where `outward` points away from the stroke.
    fn cap(&mut self, end: Point, outward: Vec2) {
        match self.style.cap {
            LineCap::Butt => {}
            LineCap::Round => self.circle(end),
            LineCap::Square => {
                let d = outward.normalized() * self.hw;
                let nrm = d.perp();
                self.push(vec![end + nrm, end + nrm + d, end - nrm + d, end - nrm]);
            }
        }
    }

    fn join(&mut self, prev: Point, v: Point, next: Point) {
        let d0 = (v - prev).normalized();
        let d1 = (next - v).normalized();
        let cross = d0.cross(d1);
        let dot = d0.dot(d1);
        if cross.abs() <= 1e-6 && dot > 0.0 {
            return;
        }
        if self.style.join == LineJoin::Round {
            self.circle(v);
            return;
        }
        // The outer side of the turn is opposite to the direction it bends.
        let side = if cross > 0.0 { -1.0 } else { 1.0 };
        let o0 = v + d0.perp() * (self.hw * side);
        let o1 = v + d1.perp() * (self.hw * side);
        if self.style.join == LineJoin::Miter {
            let cos_half = ((1.0 + dot) * 0.5).max(0.0).sqrt();
            if cos_half > f32::EPSILON && 1.0 / cos_half <= self.style.miter_limit {
                let bisector = (d0.perp() + d1.perp()).normalized() * side;
                let tip = v + bisector * (self.hw / cos_half);
                self.push(vec![v, o0, tip, o1]);
                return;
            }
        }
        self.push(vec![v, o0, o1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::geometry::PathSegment;

    fn open_line(a: (f32, f32), b: (f32, f32)) -> Path {
        let mut p = Path::new();
        p.move_to(Vec2::new(a.0, a.1)).unwrap().line_to(Vec2::new(b.0, b.1)).unwrap();
        p
    }

    fn bounds(p: &Path) -> Rect {
        p.loose_bounds().unwrap()
    }

    #[test]
    fn butt_line_is_width_by_length() {
        let s = stroke_to_fill(&open_line((0.0, 5.0), (10.0, 5.0)), &StrokeStyle::new(2.0), 0.1).unwrap();
        assert_eq!(bounds(&s), Rect::new(0.0, 4.0, 10.0, 2.0));
    }

    #[test]
    fn square_cap_extends_ends() {
        let style = StrokeStyle { cap: LineCap::Square, ..StrokeStyle::new(2.0) };
        let s = stroke_to_fill(&open_line((0.0, 5.0), (10.0, 5.0)), &style, 0.1).unwrap();
        let b = bounds(&s);
        assert!((b.origin.x + 1.0).abs() < 1e-5);
        assert!((b.max().x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn miter_join_reaches_corner() {
        let mut p = Path::new();
        p.polyline(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]).unwrap();
        let s = stroke_to_fill(&p, &StrokeStyle::new(2.0), 0.1).unwrap();
        let b = bounds(&s);
        assert!((b.max().x - 11.0).abs() < 1e-4);
        assert!((b.origin.y + 1.0).abs() < 1e-4);
    }

    #[test]
    fn all_polygons_wind_positively() {
        let mut p = Path::new();
        p.circle(Vec2::new(20.0, 20.0), 10.0).unwrap();
        let style = StrokeStyle { join: LineJoin::Round, cap: LineCap::Round, ..StrokeStyle::new(3.0) };
        let s = stroke_to_fill(&p, &style, 0.1).unwrap();
        for poly in s.to_polylines(0.1).unwrap() {
            let area: f32 = poly.edges().map(|(a, b)| a.cross(b)).sum();
            assert!(area > 0.0);
        }
    }

    #[test]
    fn zero_width_strokes_nothing() {
        let s = stroke_to_fill(&open_line((0.0, 0.0), (5.0, 0.0)), &StrokeStyle::new(0.0), 0.1).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn negative_width_is_rejected() {
        assert!(stroke_to_fill(&open_line((0.0, 0.0), (5.0, 0.0)), &StrokeStyle::new(-1.0), 0.1).is_err());
    }

    #[test]
    fn dashed_stroke_produces_separate_pieces() {
        let style = StrokeStyle { dash: Some(Dash { pattern: vec![2.0, 2.0], offset: 0.0 }), ..StrokeStyle::new(1.0) };
        let s = stroke_to_fill(&open_line((0.0, 0.0), (10.0, 0.0)), &style, 0.1).unwrap();
        let moves = s.segments().iter().filter(|seg| matches!(seg, PathSegment::MoveTo(_))).count();
        assert_eq!(moves, 3);
    }
}
