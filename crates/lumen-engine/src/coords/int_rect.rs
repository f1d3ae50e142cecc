/// Device pixel box with exclusive max edges: columns `x0..x1`, rows `y0..y1`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IntRect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    #[inline]
    pub const fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    #[inline]
    pub fn width(self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    #[inline]
    pub fn height(self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    #[inline]
    pub fn area(self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    #[inline]
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    #[inline]
    pub fn contains_rect(self, other: IntRect) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1)
    }

    /// Intersection; disjoint inputs produce an empty box.
    #[inline]
    pub fn intersect(self, other: IntRect) -> IntRect {
        let r = IntRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if r.is_empty() { IntRect::empty() } else { r }
    }

    #[inline]
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        IntRect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    #[inline]
    pub fn inflate(self, by: i32) -> IntRect {
        IntRect::new(self.x0 - by, self.y0 - by, self.x1 + by, self.y1 + by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_is_commutative() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(4, -2, 20, 6);
        assert_eq!(a.intersect(b), b.intersect(a));
        assert_eq!(a.intersect(b), IntRect::new(4, 0, 10, 6));
    }

    #[test]
    fn disjoint_intersection_is_canonical_empty() {
        let a = IntRect::new(0, 0, 2, 2);
        let b = IntRect::new(5, 5, 8, 8);
        assert_eq!(a.intersect(b), IntRect::empty());
        assert_eq!(a.intersect(b).area(), 0);
    }

    #[test]
    fn union_ignores_empty() {
        let a = IntRect::new(1, 1, 3, 3);
        assert_eq!(a.union(IntRect::empty()), a);
        assert_eq!(IntRect::empty().union(a), a);
    }
}
