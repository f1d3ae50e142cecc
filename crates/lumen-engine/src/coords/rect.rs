use super::{IntRect, Matrix, Vec2};

/// Axis-aligned rectangle (top-left origin, +Y down).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Builds a rectangle from two corners in any order.
    #[inline]
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        let x0 = a.x.min(b.x);
        let y0 = a.y.min(b.y);
        Rect::new(x0, y0, a.x.max(b.x) - x0, a.y.max(b.y) - y0)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x < (r.origin.x + r.size.x)
            && p.y < (r.origin.y + r.size.y)
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Smallest rectangle containing both.
    #[inline]
    pub fn union(self, other: Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();
        Rect::from_points(
            Vec2::new(a.origin.x.min(b.origin.x), a.origin.y.min(b.origin.y)),
            Vec2::new(a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
        )
    }

    /// Grows the rectangle to include `p`.
    #[inline]
    pub fn include(self, p: Vec2) -> Rect {
        let r = self.normalized();
        Rect::from_points(
            Vec2::new(r.origin.x.min(p.x), r.origin.y.min(p.y)),
            Vec2::new(r.max().x.max(p.x), r.max().y.max(p.y)),
        )
    }

    #[inline]
    pub fn translate(self, by: Vec2) -> Rect {
        Rect::from_origin_size(self.origin + by, self.size)
    }

    /// Outset on all sides by `amount` (negative insets).
    #[inline]
    pub fn inflate(self, amount: f32) -> Rect {
        Rect::new(
            self.origin.x - amount,
            self.origin.y - amount,
            self.size.x + 2.0 * amount,
            self.size.y + 2.0 * amount,
        )
    }

    /// Bounding box of the four transformed corners.
    pub fn transform_bounds(self, m: &Matrix) -> Rect {
        let r = self.normalized();
        let corners = [
            m.apply(r.min()),
            m.apply(Vec2::new(r.max().x, r.min().y)),
            m.apply(r.max()),
            m.apply(Vec2::new(r.min().x, r.max().y)),
        ];
        corners[1..]
            .iter()
            .fold(Rect::from_points(corners[0], corners[0]), |acc, &p| acc.include(p))
    }

    /// Smallest pixel box fully covering the rectangle.
    #[inline]
    pub fn round_out(self) -> IntRect {
        let r = self.normalized();
        IntRect::new(
            r.origin.x.floor() as i32,
            r.origin.y.floor() as i32,
            r.max().x.ceil() as i32,
            r.max().y.ceil() as i32,
        )
    }

    /// Pixel box with edges snapped to the nearest pixel boundary.
    #[inline]
    pub fn round(self) -> IntRect {
        let r = self.normalized();
        IntRect::new(
            r.origin.x.round() as i32,
            r.origin.y.round() as i32,
            r.max().x.round() as i32,
            r.max().y.round() as i32,
        )
    }
}
