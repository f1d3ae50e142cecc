use std::sync::Arc;

use crate::coords::{CornerRadii, Matrix, Point, Rect, Vec2};
use crate::error::{Result, invalid};

use super::arc::{arc_to_cubics, svg_arc_to_cubics};
use super::dash::dash_polylines;
use super::flatten::{Polyline, flatten_into, polylines};

/// Circle approximation constant: control-point offset for a quarter arc,
/// as a fraction of the radius.
pub const KAPPA: f32 = 0.552_284_75;

/// Tolerance used when an operation needs flat geometry but takes none.
pub const DEFAULT_TOLERANCE: f32 = 0.1;

/// One path command. Every subpath starts with `MoveTo`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl PathSegment {
    /// End point of the segment, `None` for `Close`.
    #[inline]
    pub fn end(&self) -> Option<Point> {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(p),
            PathSegment::QuadTo(_, p) | PathSegment::CubicTo(_, _, p) => Some(p),
            PathSegment::Close => None,
        }
    }

    fn map(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(f(p)),
            PathSegment::LineTo(p) => PathSegment::LineTo(f(p)),
            PathSegment::QuadTo(c, p) => PathSegment::QuadTo(f(c), f(p)),
            PathSegment::CubicTo(c1, c2, p) => PathSegment::CubicTo(f(c1), f(c2), f(p)),
            PathSegment::Close => PathSegment::Close,
        }
    }
}

/// Mutable vector path.
///
/// Clones, flattened copies and dashed copies own their storage; nothing
/// derived from a path aliases it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    /// Start of the open subpath, where `close` returns to.
    start: Option<Point>,
    current: Option<Point>,
    /// A `close` happened and no new subpath was started yet.
    closed: bool,
}

/// Reference-counted path handle; the path is freed with its last clone.
pub type SharedPath = Arc<Path>;

fn check(points: &[Point]) -> Result<()> {
    match points.iter().find(|p| !p.is_finite()) {
        Some(p) => Err(invalid(format!("non-finite path coordinate ({}, {})", p.x, p.y))),
        None => Ok(()),
    }
}

impl Path {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a path from raw segments, validating coordinates.
    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Result<Self> {
        let mut path = Path::new();
        for seg in segments {
            match seg {
                PathSegment::MoveTo(p) => path.move_to(p)?,
                PathSegment::LineTo(p) => path.line_to(p)?,
                PathSegment::QuadTo(c, p) => path.quad_to(c, p)?,
                PathSegment::CubicTo(c1, c2, p) => path.cubic_to(c1, c2, p)?,
                PathSegment::Close => path.close(),
            };
        }
        Ok(path)
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    pub fn clear(&mut self) {
        *self = Path::new();
    }

    /// True when the path holds only lines (no curves).
    pub fn is_flat(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, PathSegment::MoveTo(_) | PathSegment::LineTo(_) | PathSegment::Close))
    }

    // ── construction ──────────────────────────────────────────────────────

    pub fn move_to(&mut self, p: Point) -> Result<&mut Self> {
        check(&[p])?;
        // Consecutive moves collapse into the last one.
        if let Some(PathSegment::MoveTo(last)) = self.segments.last_mut() {
            *last = p;
        } else {
            self.segments.push(PathSegment::MoveTo(p));
        }
        self.start = Some(p);
        self.current = Some(p);
        self.closed = false;
        Ok(self)
    }

    /// Starts a subpath at the current point if the previous one was closed,
    /// or at `fallback` when there is no current point at all.
    fn ensure_subpath(&mut self, fallback: Point) {
        match self.current {
            None => {
                self.segments.push(PathSegment::MoveTo(fallback));
                self.start = Some(fallback);
                self.current = Some(fallback);
            }
            Some(p) if self.closed => {
                self.segments.push(PathSegment::MoveTo(p));
                self.start = Some(p);
            }
            Some(_) => {}
        }
        self.closed = false;
    }

    pub fn line_to(&mut self, p: Point) -> Result<&mut Self> {
        check(&[p])?;
        self.ensure_subpath(p);
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
        Ok(self)
    }

    pub fn quad_to(&mut self, c: Point, p: Point) -> Result<&mut Self> {
        check(&[c, p])?;
        self.ensure_subpath(c);
        self.segments.push(PathSegment::QuadTo(c, p));
        self.current = Some(p);
        Ok(self)
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) -> Result<&mut Self> {
        check(&[c1, c2, p])?;
        self.ensure_subpath(c1);
        self.segments.push(PathSegment::CubicTo(c1, c2, p));
        self.current = Some(p);
        Ok(self)
    }

    /// SVG elliptical arc from the current point to `end`.
    ///
    /// Zero radii degrade to a straight line; an arc ending at the current
    /// point adds nothing. Radii too small to span the endpoints are scaled up.
    pub fn arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_rotation_deg: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    ) -> Result<&mut Self> {
        check(&[end, Vec2::new(rx, ry), Vec2::new(x_rotation_deg, 0.0)])?;
        let Some(from) = self.current else {
            return self.move_to(end);
        };
        if from == end {
            return Ok(self);
        }
        if rx == 0.0 || ry == 0.0 {
            return self.line_to(end);
        }
        let cubics = svg_arc_to_cubics(from, rx.abs(), ry.abs(), x_rotation_deg.to_radians(), large_arc, sweep, end);
        self.ensure_subpath(from);
        for [c1, c2, p] in cubics {
            self.segments.push(PathSegment::CubicTo(c1, c2, p));
        }
        self.current = Some(end);
        Ok(self)
    }

    /// Closes the open subpath. Without one this does nothing.
    pub fn close(&mut self) -> &mut Self {
        let open = matches!(
            self.segments.last(),
            Some(PathSegment::LineTo(_) | PathSegment::QuadTo(..) | PathSegment::CubicTo(..))
        );
        if open && !self.closed {
            self.segments.push(PathSegment::Close);
            self.current = self.start;
            self.closed = true;
        }
        self
    }

    /// Appends all segments of `other`.
    pub fn extend_from(&mut self, other: &Path) -> Result<&mut Self> {
        for seg in &other.segments {
            match *seg {
                PathSegment::MoveTo(p) => self.move_to(p)?,
                PathSegment::LineTo(p) => self.line_to(p)?,
                PathSegment::QuadTo(c, p) => self.quad_to(c, p)?,
                PathSegment::CubicTo(c1, c2, p) => self.cubic_to(c1, c2, p)?,
                PathSegment::Close => self.close(),
            };
        }
        Ok(self)
    }

    // ── shape helpers ─────────────────────────────────────────────────────

    /// Closed rectangle, clockwise on a y-down screen.
    pub fn rect(&mut self, r: Rect) -> Result<&mut Self> {
        let r = r.normalized();
        let (min, max) = (r.min(), r.max());
        self.move_to(min)?;
        self.line_to(Vec2::new(max.x, min.y))?;
        self.line_to(max)?;
        self.line_to(Vec2::new(min.x, max.y))?;
        Ok(self.close())
    }

    /// Rectangle with elliptical corners; radii shrink to fit the rectangle.
    pub fn round_rect(&mut self, r: Rect, radii: CornerRadii) -> Result<&mut Self> {
        let r = r.normalized();
        check(&[r.origin, r.size])?;
        let rr = radii.fitted(r.width(), r.height());
        if rr.is_zero() {
            return self.rect(r);
        }
        let (min, max) = (r.min(), r.max());
        let k = 1.0 - KAPPA;
        let (tl, tr, br, bl) = (rr.top_left, rr.top_right, rr.bottom_right, rr.bottom_left);

        self.move_to(Vec2::new(min.x + tl.x, min.y))?;
        self.line_to(Vec2::new(max.x - tr.x, min.y))?;
        if tr != Vec2::zero() {
            self.cubic_to(
                Vec2::new(max.x - tr.x * k, min.y),
                Vec2::new(max.x, min.y + tr.y * k),
                Vec2::new(max.x, min.y + tr.y),
            )?;
        }
        self.line_to(Vec2::new(max.x, max.y - br.y))?;
        if br != Vec2::zero() {
            self.cubic_to(
                Vec2::new(max.x, max.y - br.y * k),
                Vec2::new(max.x - br.x * k, max.y),
                Vec2::new(max.x - br.x, max.y),
            )?;
        }
        self.line_to(Vec2::new(min.x + bl.x, max.y))?;
        if bl != Vec2::zero() {
            self.cubic_to(
                Vec2::new(min.x + bl.x * k, max.y),
                Vec2::new(min.x, max.y - bl.y * k),
                Vec2::new(min.x, max.y - bl.y),
            )?;
        }
        self.line_to(Vec2::new(min.x, min.y + tl.y))?;
        if tl != Vec2::zero() {
            self.cubic_to(
                Vec2::new(min.x, min.y + tl.y * k),
                Vec2::new(min.x + tl.x * k, min.y),
                Vec2::new(min.x + tl.x, min.y),
            )?;
        }
        Ok(self.close())
    }

    /// Axis-aligned ellipse from four cubic quarter arcs.
    pub fn ellipse(&mut self, center: Point, rx: f32, ry: f32) -> Result<&mut Self> {
        check(&[center, Vec2::new(rx, ry)])?;
        let (rx, ry) = (rx.abs(), ry.abs());
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let c = center;
        self.move_to(Vec2::new(c.x + rx, c.y))?;
        self.cubic_to(Vec2::new(c.x + rx, c.y + ky), Vec2::new(c.x + kx, c.y + ry), Vec2::new(c.x, c.y + ry))?;
        self.cubic_to(Vec2::new(c.x - kx, c.y + ry), Vec2::new(c.x - rx, c.y + ky), Vec2::new(c.x - rx, c.y))?;
        self.cubic_to(Vec2::new(c.x - rx, c.y - ky), Vec2::new(c.x - kx, c.y - ry), Vec2::new(c.x, c.y - ry))?;
        self.cubic_to(Vec2::new(c.x + kx, c.y - ry), Vec2::new(c.x + rx, c.y - ky), Vec2::new(c.x + rx, c.y))?;
        Ok(self.close())
    }

    #[inline]
    pub fn circle(&mut self, center: Point, r: f32) -> Result<&mut Self> {
        self.ellipse(center, r, r)
    }

    /// Connects `points` with lines, optionally closing the figure.
    pub fn polygon(&mut self, points: &[Point], close: bool) -> Result<&mut Self> {
        check(points)?;
        let Some((&first, rest)) = points.split_first() else {
            return Ok(self);
        };
        self.move_to(first)?;
        for &p in rest {
            self.line_to(p)?;
        }
        if close {
            self.close();
        }
        Ok(self)
    }

    #[inline]
    pub fn polyline(&mut self, points: &[Point]) -> Result<&mut Self> {
        self.polygon(points, false)
    }

    /// Circular arc around `center`, from `start` radians sweeping `sweep`
    /// radians (positive = clockwise on a y-down screen). Connects to the
    /// current point with a line, or starts a new subpath.
    pub fn arc(&mut self, center: Point, radius: f32, start: f32, sweep: f32) -> Result<&mut Self> {
        check(&[center, Vec2::new(radius, start), Vec2::new(sweep, 0.0)])?;
        let from = center + Vec2::new(start.cos(), start.sin()) * radius;
        if self.current.is_some() && !self.closed {
            self.line_to(from)?;
        } else {
            self.move_to(from)?;
        }
        for [c1, c2, p] in arc_to_cubics(center, radius, radius, 0.0, start, sweep) {
            self.segments.push(PathSegment::CubicTo(c1, c2, p));
            self.current = Some(p);
        }
        Ok(self)
    }

    // ── transforms ────────────────────────────────────────────────────────

    /// Maps every point through `m` in place.
    pub fn transform(&mut self, m: &Matrix) -> Result<()> {
        if !m.is_finite() {
            return Err(invalid("transform has non-finite components"));
        }
        for seg in &mut self.segments {
            *seg = seg.map(|p| m.apply(p));
        }
        self.start = self.start.map(|p| m.apply(p));
        self.current = self.current.map(|p| m.apply(p));
        Ok(())
    }

    /// Transformed copy.
    pub fn transformed(&self, m: &Matrix) -> Result<Path> {
        let mut p = self.clone();
        p.transform(m)?;
        Ok(p)
    }

    // ── derived copies ────────────────────────────────────────────────────

    /// Copy made of lines only; curves are subdivided until their control
    /// points lie within `tolerance` of the chord. Flattening an already
    /// flat path returns an identical path.
    pub fn clone_flattened(&self, tolerance: f32) -> Result<Path> {
        self.flatten_with_scale(tolerance, 1.0)
    }

    /// Flattens for drawing under a transform with effective `scale`, so the
    /// device-space error stays within `tolerance`.
    pub fn flatten_with_scale(&self, tolerance: f32, scale: f32) -> Result<Path> {
        let tol = effective_tolerance(tolerance, scale)?;
        let mut out = Path::new();
        flatten_into(&self.segments, tol, &mut out.segments);
        out.start = self.start;
        out.current = self.current;
        out.closed = self.closed;
        Ok(out)
    }

    /// Flattened contours, one per subpath.
    pub fn to_polylines(&self, tolerance: f32) -> Result<Vec<Polyline>> {
        Ok(polylines(&self.segments, effective_tolerance(tolerance, 1.0)?))
    }

    /// Dashed copy: alternating on/off lengths from `pattern`, starting
    /// `offset` units into the pattern. Each subpath restarts the pattern.
    ///
    /// An odd-length pattern is repeated to make it even. A pattern summing
    /// to zero leaves the path unchanged.
    pub fn clone_dashed(&self, offset: f32, pattern: &[f32]) -> Result<Path> {
        if !offset.is_finite() {
            return Err(invalid("dash offset is not finite"));
        }
        if let Some(v) = pattern.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(invalid(format!("dash length {v} must be finite and non-negative")));
        }
        let sum: f32 = pattern.iter().sum();
        if pattern.is_empty() || sum <= 0.0 {
            return Ok(self.clone());
        }
        let pattern: Vec<f32> = if pattern.len() % 2 == 1 {
            pattern.iter().chain(pattern).copied().collect()
        } else {
            pattern.to_vec()
        };
        let lines = polylines(&self.segments, DEFAULT_TOLERANCE);
        let mut out = Path::new();
        for dash in dash_polylines(&lines, offset, &pattern) {
            out.polygon(&dash.points, dash.closed)?;
        }
        Ok(out)
    }

    // ── bounds ────────────────────────────────────────────────────────────

    /// Bounds of all points including curve control points. Cheap and
    /// conservative.
    pub fn loose_bounds(&self) -> Option<Rect> {
        let mut pts = self.segments.iter().flat_map(|s| {
            let arr: [Option<Point>; 3] = match *s {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => [Some(p), None, None],
                PathSegment::QuadTo(c, p) => [Some(c), Some(p), None],
                PathSegment::CubicTo(c1, c2, p) => [Some(c1), Some(c2), Some(p)],
                PathSegment::Close => [None, None, None],
            };
            arr.into_iter().flatten()
        });
        let first = pts.next()?;
        Some(pts.fold(Rect::from_points(first, first), |acc, p| acc.include(p)))
    }

    /// Bounds of the flattened geometry.
    pub fn tight_bounds(&self, tolerance: f32) -> Result<Option<Rect>> {
        let lines = self.to_polylines(tolerance)?;
        let mut pts = lines.iter().flat_map(|l| l.points.iter().copied());
        let Some(first) = pts.next() else {
            return Ok(None);
        };
        Ok(Some(pts.fold(Rect::from_points(first, first), |acc, p| acc.include(p))))
    }
}

fn effective_tolerance(tolerance: f32, scale: f32) -> Result<f32> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(invalid(format!("flatten tolerance {tolerance} must be positive")));
    }
    let scale = if scale.is_finite() && scale > f32::EPSILON { scale } else { 1.0 };
    Ok(tolerance / scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn p(x: f32, y: f32) -> Point {
        Vec2::new(x, y)
    }

    fn triangle() -> Path {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap().line_to(p(10.0, 0.0)).unwrap().line_to(p(10.0, 10.0)).unwrap();
        path.close();
        path
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn non_finite_point_leaves_path_unchanged() {
        let mut path = triangle();
        let before = path.clone();
        assert!(matches!(path.line_to(p(f32::NAN, 0.0)), Err(Error::InvalidArgument(_))));
        assert_eq!(path, before);
    }

    #[test]
    fn line_after_close_starts_new_subpath() {
        let mut path = triangle();
        path.line_to(p(5.0, 5.0)).unwrap();
        assert_eq!(path.segments()[4], PathSegment::MoveTo(p(0.0, 0.0)));
        assert_eq!(path.segments()[5], PathSegment::LineTo(p(5.0, 5.0)));
    }

    #[test]
    fn close_without_subpath_is_noop() {
        let mut path = Path::new();
        path.close();
        assert!(path.is_empty());
    }

    #[test]
    fn circle_uses_four_cubics() {
        let mut path = Path::new();
        path.circle(p(0.0, 0.0), 10.0).unwrap();
        let cubics = path.segments().iter().filter(|s| matches!(s, PathSegment::CubicTo(..))).count();
        assert_eq!(cubics, 4);
        let b = path.loose_bounds().unwrap();
        assert_eq!(b, Rect::new(-10.0, -10.0, 20.0, 20.0));
    }

    #[test]
    fn round_rect_with_zero_radii_is_rect() {
        let mut a = Path::new();
        a.round_rect(Rect::new(0.0, 0.0, 4.0, 4.0), CornerRadii::zero()).unwrap();
        let mut b = Path::new();
        b.rect(Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        assert_eq!(a, b);
    }

    // ── arcs ──────────────────────────────────────────────────────────────

    #[test]
    fn arc_to_with_zero_radius_is_line() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap();
        path.arc_to(0.0, 5.0, 0.0, false, true, p(10.0, 0.0)).unwrap();
        assert_eq!(path.segments()[1], PathSegment::LineTo(p(10.0, 0.0)));
    }

    #[test]
    fn arc_to_same_point_is_noop() {
        let mut path = Path::new();
        path.move_to(p(3.0, 3.0)).unwrap();
        path.arc_to(5.0, 5.0, 0.0, false, true, p(3.0, 3.0)).unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn arc_to_ends_exactly_at_endpoint() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap();
        path.arc_to(1.0, 1.0, 0.0, false, true, p(10.0, 0.0)).unwrap();
        assert_eq!(path.current_point(), Some(p(10.0, 0.0)));
        let b = path.loose_bounds().unwrap();
        // Radii were too small and got scaled up to a half circle of radius 5.
        assert!(b.height() > 4.0 && b.height() < 7.0);
    }

    // ── transform ─────────────────────────────────────────────────────────

    #[test]
    fn transform_composition_matches_product() {
        let m1 = Matrix::rotate(0.4) * Matrix::scale(2.0, 0.5);
        let m2 = Matrix::translate(3.0, -7.0) * Matrix::skew(0.2, 0.0);
        let mut a = Path::new();
        a.circle(p(4.0, 2.0), 3.0).unwrap();
        let mut b = a.clone();
        a.transform(&m1).unwrap();
        a.transform(&m2).unwrap();
        b.transform(&(m2 * m1)).unwrap();
        for (x, y) in a.segments().iter().zip(b.segments()) {
            if let (Some(px), Some(py)) = (x.end(), y.end()) {
                assert!(px.approx_eq(py, 1e-4));
            }
        }
    }

    // ── flatten ───────────────────────────────────────────────────────────

    #[test]
    fn flatten_is_idempotent() {
        let mut path = Path::new();
        path.ellipse(p(10.0, 10.0), 8.0, 5.0).unwrap();
        path.move_to(p(0.0, 0.0)).unwrap().quad_to(p(5.0, 10.0), p(10.0, 0.0)).unwrap();
        let once = path.clone_flattened(0.25).unwrap();
        assert!(once.is_flat());
        assert_eq!(once.clone_flattened(0.25).unwrap(), once);
    }

    #[test]
    fn flatten_tracks_scale() {
        let mut path = Path::new();
        path.circle(p(0.0, 0.0), 10.0).unwrap();
        let coarse = path.flatten_with_scale(0.5, 1.0).unwrap();
        let fine = path.flatten_with_scale(0.5, 8.0).unwrap();
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn flatten_rejects_bad_tolerance() {
        assert!(triangle().clone_flattened(0.0).is_err());
    }

    #[test]
    fn tight_bounds_are_inside_loose() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap().cubic_to(p(0.0, 20.0), p(10.0, 20.0), p(10.0, 0.0)).unwrap();
        let loose = path.loose_bounds().unwrap();
        let tight = path.tight_bounds(0.05).unwrap().unwrap();
        assert!(tight.height() < loose.height());
        assert!((tight.height() - 15.0).abs() < 0.1);
    }

    // ── dash ──────────────────────────────────────────────────────────────

    #[test]
    fn zero_sum_dash_is_unchanged() {
        let path = triangle();
        assert_eq!(path.clone_dashed(0.0, &[0.0, 0.0]).unwrap(), path);
    }

    #[test]
    fn negative_dash_is_rejected() {
        assert!(matches!(triangle().clone_dashed(0.0, &[2.0, -1.0]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn dash_splits_line() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap().line_to(p(10.0, 0.0)).unwrap();
        let dashed = path.clone_dashed(0.0, &[2.0, 3.0]).unwrap();
        let moves: Vec<Point> = dashed
            .segments()
            .iter()
            .filter_map(|s| if let PathSegment::MoveTo(q) = s { Some(*q) } else { None })
            .collect();
        assert_eq!(moves, vec![p(0.0, 0.0), p(5.0, 0.0)]);
    }

    #[test]
    fn odd_dash_pattern_is_doubled() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0)).unwrap().line_to(p(12.0, 0.0)).unwrap();
        let odd = path.clone_dashed(0.0, &[2.0]).unwrap();
        let even = path.clone_dashed(0.0, &[2.0, 2.0]).unwrap();
        assert_eq!(odd, even);
    }

    #[test]
    fn dashed_copy_does_not_alias_source() {
        let path = triangle();
        let mut dashed = path.clone_dashed(1.0, &[3.0, 1.0]).unwrap();
        dashed.transform(&Matrix::translate(100.0, 0.0)).unwrap();
        assert_eq!(path, triangle());
    }
}
