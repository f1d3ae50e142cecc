use crate::coords::Point;
use crate::geometry::Polyline;

use super::FillRule;

/// Winding number of `p` with respect to the contours, each closed implicitly.
pub fn winding(lines: &[Polyline], p: Point) -> i32 {
    let mut w = 0;
    for line in lines {
        let n = line.points.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = line.points[i];
            let b = line.points[(i + 1) % n];
            if a.y <= p.y {
                if b.y > p.y && (b - a).cross(p - a) > 0.0 {
                    w += 1;
                }
            } else if b.y <= p.y && (b - a).cross(p - a) < 0.0 {
                w -= 1;
            }
        }
    }
    w
}

/// Point-in-fill test by ray crossing, without rasterizing.
pub fn contains_point(lines: &[Polyline], p: Point, rule: FillRule) -> bool {
    if !p.is_finite() {
        return false;
    }
    let w = winding(lines, p);
    match rule {
        FillRule::NonZero => w != 0,
        FillRule::EvenOdd => w % 2 != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::geometry::Path;

    fn lines(p: &Path) -> Vec<Polyline> {
        p.to_polylines(0.1).unwrap()
    }

    #[test]
    fn rect_contains_interior_only() {
        let mut p = Path::new();
        p.rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let l = lines(&p);
        assert!(contains_point(&l, Vec2::new(5.0, 5.0), FillRule::NonZero));
        assert!(!contains_point(&l, Vec2::new(15.0, 5.0), FillRule::NonZero));
        assert!(!contains_point(&l, Vec2::new(5.0, -1.0), FillRule::NonZero));
    }

    #[test]
    fn fill_rule_decides_nested_hole() {
        let mut p = Path::new();
        p.rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        p.rect(Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        let l = lines(&p);
        let inner = Vec2::new(5.0, 5.0);
        assert_eq!(winding(&l, inner).abs(), 2);
        assert!(contains_point(&l, inner, FillRule::NonZero));
        assert!(!contains_point(&l, inner, FillRule::EvenOdd));
    }

    #[test]
    fn circle_hit() {
        let mut p = Path::new();
        p.circle(Vec2::new(0.0, 0.0), 5.0).unwrap();
        let l = lines(&p);
        assert!(contains_point(&l, Vec2::new(3.0, 3.0), FillRule::NonZero));
        assert!(!contains_point(&l, Vec2::new(4.0, 4.0), FillRule::NonZero));
    }

    #[test]
    fn nan_point_is_outside() {
        let mut p = Path::new();
        p.rect(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(!contains_point(&lines(&p), Vec2::new(f32::NAN, 0.5), FillRule::NonZero));
    }
}
