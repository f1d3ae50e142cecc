use std::f32::consts::{FRAC_PI_2, TAU};

use crate::coords::{Point, Vec2};

/// Cubic approximation of an elliptical arc, at most a quarter turn per
/// segment. `rotation`, `start` and `sweep` are in radians; the returned
/// items are `[c1, c2, end]`.
pub(crate) fn arc_to_cubics(
    center: Point,
    rx: f32,
    ry: f32,
    rotation: f32,
    start: f32,
    sweep: f32,
) -> Vec<[Point; 3]> {
    let sweep = sweep.clamp(-TAU, TAU);
    if sweep == 0.0 {
        return Vec::new();
    }
    let n = (sweep.abs() / FRAC_PI_2 - 1e-4).ceil().max(1.0) as usize;
    let step = sweep / n as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let (rs, rc) = rotation.sin_cos();

    let point = |angle: f32| {
        let (s, c) = angle.sin_cos();
        let local = Vec2::new(rx * c, ry * s);
        center + Vec2::new(local.x * rc - local.y * rs, local.x * rs + local.y * rc)
    };
    let tangent = |angle: f32| {
        let (s, c) = angle.sin_cos();
        let local = Vec2::new(-rx * s, ry * c);
        Vec2::new(local.x * rc - local.y * rs, local.x * rs + local.y * rc)
    };

    let mut out = Vec::with_capacity(n);
    let mut a0 = start;
    for _ in 0..n {
        let a1 = a0 + step;
        let p0 = point(a0);
        let p1 = point(a1);
        out.push([p0 + tangent(a0) * k, p1 - tangent(a1) * k, p1]);
        a0 = a1;
    }
    out
}

/// SVG endpoint arc (implementation notes F.6.5/F.6.6) converted to cubics.
/// The final point is exactly `to`.
pub(crate) fn svg_arc_to_cubics(
    from: Point,
    mut rx: f32,
    mut ry: f32,
    rotation: f32,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> Vec<[Point; 3]> {
    let (s, c) = rotation.sin_cos();
    let half = (from - to) * 0.5;
    // Midpoint in the ellipse's unrotated frame.
    let x1 = c * half.x + s * half.y;
    let y1 = -s * half.x + c * half.y;

    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
        let f = lambda.sqrt();
        rx *= f;
        ry *= f;
    }

    let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
    let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
    let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
    if large_arc == sweep {
        coef = -coef;
    }
    let cx1 = coef * rx * y1 / ry;
    let cy1 = -coef * ry * x1 / rx;
    let mid = (from + to) * 0.5;
    let center = Vec2::new(c * cx1 - s * cy1 + mid.x, s * cx1 + c * cy1 + mid.y);

    let angle = |ux: f32, uy: f32| uy.atan2(ux);
    let theta1 = angle((x1 - cx1) / rx, (y1 - cy1) / ry);
    let theta2 = angle((-x1 - cx1) / rx, (-y1 - cy1) / ry);
    let mut delta = theta2 - theta1;
    if sweep && delta < 0.0 {
        delta += TAU;
    } else if !sweep && delta > 0.0 {
        delta -= TAU;
    }

    let mut cubics = arc_to_cubics(center, rx, ry, rotation, theta1, delta);
    if let Some(last) = cubics.last_mut() {
        last[2] = to;
    }
    cubics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_circle_matches_kappa() {
        let c = arc_to_cubics(Vec2::zero(), 1.0, 1.0, 0.0, 0.0, FRAC_PI_2);
        assert_eq!(c.len(), 1);
        let [c1, c2, p] = c[0];
        assert!(c1.approx_eq(Vec2::new(1.0, 0.552_284_75), 1e-4));
        assert!(c2.approx_eq(Vec2::new(0.552_284_75, 1.0), 1e-4));
        assert!(p.approx_eq(Vec2::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn full_turn_uses_four_segments() {
        assert_eq!(arc_to_cubics(Vec2::zero(), 2.0, 2.0, 0.0, 0.3, TAU).len(), 4);
    }

    #[test]
    fn svg_half_circle_center() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(10.0, 0.0);
        let cubics = svg_arc_to_cubics(from, 5.0, 5.0, 0.0, false, true, to);
        assert_eq!(cubics.len(), 2);
        // Sweep flag set: positive angle direction, which goes through y < 0 here.
        let mid = cubics[0][2];
        assert!(mid.approx_eq(Vec2::new(5.0, -5.0), 1e-3), "{mid:?}");
        assert_eq!(cubics[1][2], to);
    }

    #[test]
    fn large_arc_flag_picks_long_way() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(10.0, 0.0);
        let short = svg_arc_to_cubics(from, 10.0, 10.0, 0.0, false, true, to);
        let long = svg_arc_to_cubics(from, 10.0, 10.0, 0.0, true, true, to);
        assert!(long.len() > short.len());
    }
}
