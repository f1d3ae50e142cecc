use core::ops::Mul;

use super::Vec2;

/// 2×3 affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
///
/// Composition uses column-vector order: `(m * n).apply(p) == m.apply(n.apply(p))`,
/// i.e. the right-hand operand acts first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `radians`; positive turns +X toward +Y (clockwise on a y-down screen).
    #[inline]
    pub fn rotate(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Shear by the tangents of the given angles.
    #[inline]
    pub fn skew(x_radians: f32, y_radians: f32) -> Self {
        Self::new(1.0, y_radians.tan(), x_radians.tan(), 1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Applies only the linear part (no translation); for direction vectors.
    #[inline]
    pub fn apply_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// True when the inverse exists and is numerically usable.
    #[inline]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > f32::EPSILON * f32::EPSILON && self.is_finite()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.e.is_finite()
            && self.f.is_finite()
    }

    pub fn invert(&self) -> Option<Matrix> {
        if !self.is_invertible() {
            return None;
        }
        let inv = 1.0 / self.determinant();
        Some(Matrix::new(
            self.d * inv,
            -self.b * inv,
            -self.c * inv,
            self.a * inv,
            (self.c * self.f - self.d * self.e) * inv,
            (self.b * self.e - self.a * self.f) * inv,
        ))
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Matrix::identity()
    }

    /// True for pure scale + translate (no rotation or shear).
    #[inline]
    pub fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.c == 0.0
    }

    #[inline]
    pub fn is_translation(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }

    /// Largest singular value of the linear part: the maximum length any unit
    /// vector reaches after transformation.
    pub fn max_scale(&self) -> f32 {
        let s = self.a * self.a + self.b * self.b + self.c * self.c + self.d * self.d;
        let det = self.determinant();
        let disc = (s * s - 4.0 * det * det).max(0.0);
        ((s + disc.sqrt()) * 0.5).sqrt()
    }

    /// Uniform scale when the linear part is a similarity, otherwise `None`.
    pub fn uniform_scale(&self) -> Option<f32> {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        let orthogonal = (self.a * self.c + self.b * self.d).abs() <= 1e-4 * sx.max(sy);
        if orthogonal && (sx - sy).abs() <= 1e-4 * sx.max(sy) { Some(sx) } else { None }
    }

    /// Same linear part, translation dropped.
    #[inline]
    pub fn linear(&self) -> Matrix {
        Matrix::new(self.a, self.b, self.c, self.d, 0.0, 0.0)
    }

    /// `self` applied after `first`.
    #[inline]
    pub fn then(&self, first: &Matrix) -> Matrix {
        *self * *first
    }

    /// Stable hash of the linear part quantized to 1/1024, for cache keys.
    pub fn linear_hash(&self) -> u64 {
        let q = |v: f32| ((v * 1024.0).round() as i64 as u64) & 0xffff;
        q(self.a) | (q(self.b) << 16) | (q(self.c) << 32) | (q(self.d) << 48)
    }

    pub fn approx_eq(&self, other: &Matrix, eps: f32) -> bool {
        (self.a - other.a).abs() <= eps
            && (self.b - other.b).abs() <= eps
            && (self.c - other.c).abs() <= eps
            && (self.d - other.d).abs() <= eps
            && (self.e - other.e).abs() <= eps
            && (self.f - other.f).abs() <= eps
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    #[inline]
    fn mul(self, o: Matrix) -> Matrix {
        Matrix::new(
            self.a * o.a + self.c * o.b,
            self.b * o.a + self.d * o.b,
            self.a * o.c + self.c * o.d,
            self.b * o.c + self.d * o.d,
            self.a * o.e + self.c * o.f + self.e,
            self.b * o.e + self.d * o.f + self.f,
        )
    }
}
