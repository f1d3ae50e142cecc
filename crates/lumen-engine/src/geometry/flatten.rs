use crate::coords::{Point, Vec2};

use super::path::PathSegment;

/// Subdivision stops at this depth even if the flatness test still fails.
const MAX_DEPTH: u32 = 16;

/// One flattened subpath.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Polyline {
    /// Segments as point pairs, including the closing edge when closed.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = if self.closed && self.points.len() > 1 {
            Some((self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        self.points.windows(2).map(|w| (w[0], w[1])).chain(closing)
    }

    /// Total length including the closing edge.
    pub fn length(&self) -> f32 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }
}

/// Distance of `p` from the infinite line through `a` and `b`, or from `a`
/// when the chord is degenerate.
#[inline]
fn deviation(p: Point, a: Point, b: Point) -> f32 {
    let chord = b - a;
    let len = chord.length();
    if len <= f32::EPSILON { p.distance(a) } else { (p - a).cross(chord).abs() / len }
}

fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, tol: f32, depth: u32, out: &mut impl FnMut(Point)) {
    let flat = deviation(p1, p0, p3).max(deviation(p2, p0, p3)) <= tol;
    if flat || depth >= MAX_DEPTH {
        out(p3);
        return;
    }
    // De Casteljau split at t = 0.5.
    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);
    flatten_cubic(p0, p01, p012, mid, tol, depth + 1, out);
    flatten_cubic(mid, p123, p23, p3, tol, depth + 1, out);
}

/// Degree elevation: the cubic tracing the same curve as a quadratic.
#[inline]
pub(crate) fn quad_to_cubic(p0: Point, c: Point, p: Point) -> (Point, Point) {
    (p0 + (c - p0) * (2.0 / 3.0), p + (c - p) * (2.0 / 3.0))
}

/// Walks segments, emitting only moves, lines and closes.
fn walk(segments: &[PathSegment], tol: f32, mut emit: impl FnMut(PathSegment)) {
    let mut current = Vec2::zero();
    let mut start = Vec2::zero();
    for seg in segments {
        match *seg {
            PathSegment::MoveTo(p) => {
                emit(PathSegment::MoveTo(p));
                current = p;
                start = p;
            }
            PathSegment::LineTo(p) => {
                emit(PathSegment::LineTo(p));
                current = p;
            }
            PathSegment::QuadTo(c, p) => {
                let (c1, c2) = quad_to_cubic(current, c, p);
                flatten_cubic(current, c1, c2, p, tol, 0, &mut |q| emit(PathSegment::LineTo(q)));
                current = p;
            }
            PathSegment::CubicTo(c1, c2, p) => {
                flatten_cubic(current, c1, c2, p, tol, 0, &mut |q| emit(PathSegment::LineTo(q)));
                current = p;
            }
            PathSegment::Close => {
                emit(PathSegment::Close);
                current = start;
            }
        }
    }
}

/// Appends the flattened form of `segments` to `out`. Lines pass through
/// unchanged.
pub(crate) fn flatten_into(segments: &[PathSegment], tol: f32, out: &mut Vec<PathSegment>) {
    walk(segments, tol, |s| out.push(s));
}

/// Flattens `segments` into one polyline per subpath.
pub(crate) fn polylines(segments: &[PathSegment], tol: f32) -> Vec<Polyline> {
    let mut out: Vec<Polyline> = Vec::new();
    let mut cur = Polyline::default();
    walk(segments, tol, |s| match s {
        PathSegment::MoveTo(p) => {
            if cur.points.len() > 1 {
                out.push(std::mem::take(&mut cur));
            } else {
                cur.points.clear();
            }
            cur.points.push(p);
        }
        PathSegment::LineTo(p) => cur.points.push(p),
        PathSegment::Close => {
            cur.closed = true;
            let first = cur.points.first().copied();
            out.push(std::mem::take(&mut cur));
            // A following segment without MoveTo continues from the start point.
            if let Some(p) = first {
                cur.points.push(p);
            }
        }
        PathSegment::QuadTo(..) | PathSegment::CubicTo(..) => {}
    });
    if cur.points.len() > 1 {
        out.push(cur);
    }
    out
}
