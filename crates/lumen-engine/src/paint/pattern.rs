use std::sync::Arc;

use crate::coords::Matrix;
use crate::surface::Surface;

use super::PremulRgba8;

/// How image coordinates outside the source are resolved.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Extend {
    /// Repeat the edge pixels.
    #[default]
    Clamp,
    Repeat,
    /// Mirror every other tile.
    Reflect,
    /// Mirror with a bit-mask wrap when the image size is a power of two.
    /// Same output as [`Extend::Reflect`].
    ReflectAuto,
}

impl Extend {
    /// Maps an integer texel coordinate into `0..len`.
    #[inline]
    pub fn wrap(self, i: i32, len: u32) -> u32 {
        let n = len as i64;
        let i = i as i64;
        match self {
            Extend::Clamp => i.clamp(0, n - 1) as u32,
            Extend::Repeat => i.rem_euclid(n) as u32,
            Extend::Reflect => reflect(i, n),
            Extend::ReflectAuto => {
                if len.is_power_of_two() {
                    let m = i & (2 * n - 1);
                    (if m >= n { 2 * n - 1 - m } else { m }) as u32
                } else {
                    reflect(i, n)
                }
            }
        }
    }
}

#[inline]
fn reflect(i: i64, n: i64) -> u32 {
    let m = i.rem_euclid(2 * n);
    (if m >= n { 2 * n - 1 - m } else { m }) as u32
}

/// Image sampling filter.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    #[default]
    Bilinear,
}

/// Image paint. The image is shared, never copied per draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub image: Arc<Surface>,
    pub extend: Extend,
    pub filter: Filter,
    /// Image space → user space.
    pub transform: Matrix,
}

impl Pattern {
    pub fn new(image: Arc<Surface>, extend: Extend, filter: Filter) -> Self {
        Self { image, extend, filter, transform: Matrix::identity() }
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.transform = transform;
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.image.is_empty() && self.transform.is_invertible()
    }

    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> PremulRgba8 {
        sample_image(&self.image, u, v, self.extend, self.filter)
    }
}

/// Samples `image` at image-space position `(u, v)`; texel centers sit at
/// half-integer coordinates.
pub fn sample_image(image: &Surface, u: f32, v: f32, extend: Extend, filter: Filter) -> PremulRgba8 {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 || !u.is_finite() || !v.is_finite() {
        return PremulRgba8::TRANSPARENT;
    }
    let texel = |x: i32, y: i32| image.row(extend.wrap(y, h))[extend.wrap(x, w) as usize];
    match filter {
        Filter::Nearest => texel(u.floor() as i32, v.floor() as i32),
        Filter::Bilinear => {
            let fx = u - 0.5;
            let fy = v - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            // 8-bit weights, as in the compositor.
            let wx = ((fx - x0) * 256.0) as u32;
            let wy = ((fy - y0) * 256.0) as u32;
            let (x0, y0) = (x0 as i32, y0 as i32);
            let p00 = texel(x0, y0);
            let p10 = texel(x0 + 1, y0);
            let p01 = texel(x0, y0 + 1);
            let p11 = texel(x0 + 1, y0 + 1);
            let w00 = (256 - wx) * (256 - wy);
            let w10 = wx * (256 - wy);
            let w01 = (256 - wx) * wy;
            let w11 = wx * wy;
            let ch = |a: u8, b: u8, c: u8, d: u8| {
                ((a as u32 * w00 + b as u32 * w10 + c as u32 * w01 + d as u32 * w11 + 32768) >> 16) as u8
            };
            PremulRgba8::from_premul(
                ch(p00.r, p10.r, p01.r, p11.r),
                ch(p00.g, p10.g, p01.g, p11.g),
                ch(p00.b, p10.b, p01.b, p11.b),
                ch(p00.a, p10.a, p01.a, p11.a),
            )
        }
    }
}
