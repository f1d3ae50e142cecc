use super::Vec2;

/// Per-corner elliptical radii for a rounded rectangle.
///
/// Corners follow CSS order: top-left, top-right, bottom-right, bottom-left.
/// Negative components are treated as zero by path construction.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CornerRadii {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub bottom_left: Vec2,
}

impl CornerRadii {
    #[inline]
    pub const fn new(top_left: Vec2, top_right: Vec2, bottom_right: Vec2, bottom_left: Vec2) -> Self {
        Self { top_left, top_right, bottom_right, bottom_left }
    }

    /// Same elliptical radius on all four corners.
    #[inline]
    pub const fn uniform(rx: f32, ry: f32) -> Self {
        let r = Vec2::new(rx, ry);
        Self { top_left: r, top_right: r, bottom_right: r, bottom_left: r }
    }

    /// No rounding.
    #[inline]
    pub const fn zero() -> Self {
        Self::uniform(0.0, 0.0)
    }

    /// Scales all radii down uniformly so adjacent corners never overlap on a
    /// `width` × `height` rectangle (CSS "corner overlap" rule).
    pub fn fitted(self, width: f32, height: f32) -> Self {
        let c = self.clamped_non_negative();
        let mut f = 1.0f32;
        let mut fit = |sum: f32, side: f32| {
            if sum > side && sum > 0.0 {
                f = f.min(side / sum);
            }
        };
        fit(c.top_left.x + c.top_right.x, width);
        fit(c.bottom_left.x + c.bottom_right.x, width);
        fit(c.top_left.y + c.bottom_left.y, height);
        fit(c.top_right.y + c.bottom_right.y, height);
        Self {
            top_left: c.top_left * f,
            top_right: c.top_right * f,
            bottom_right: c.bottom_right * f,
            bottom_left: c.bottom_left * f,
        }
    }

    fn clamped_non_negative(self) -> Self {
        let z = |v: Vec2| Vec2::new(v.x.max(0.0), v.y.max(0.0));
        Self {
            top_left: z(self.top_left),
            top_right: z(self.top_right),
            bottom_right: z(self.bottom_right),
            bottom_left: z(self.bottom_left),
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        let z = |v: Vec2| v.x <= 0.0 || v.y <= 0.0;
        z(self.top_left) && z(self.top_right) && z(self.bottom_right) && z(self.bottom_left)
    }
}
