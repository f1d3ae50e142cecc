use bytemuck::{Pod, Zeroable};

/// `a * b / 255` with correct rounding for 8-bit operands.
#[inline]
pub fn mul_div255(a: u32, b: u32) -> u32 {
    let t = a * b + 128;
    (t + (t >> 8)) >> 8
}

/// Straight-alpha sRGB color, 8 bits per channel.
///
/// This is the user-facing color type. Everything past the paint boundary
/// works on [`PremulRgba8`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    pub const GREEN: Rgba8 = Rgba8::new(0, 255, 0, 255);
    pub const BLUE: Rgba8 = Rgba8::new(0, 0, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => Some(Self::opaque(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            6 => Some(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    #[inline]
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Converts to premultiplied form.
    #[inline]
    pub fn premultiply(self) -> PremulRgba8 {
        let a = self.a as u32;
        PremulRgba8 {
            r: mul_div255(self.r as u32, a) as u8,
            g: mul_div255(self.g as u32, a) as u8,
            b: mul_div255(self.b as u32, a) as u8,
            a: self.a,
        }
    }
}

/// Premultiplied RGBA pixel: each color channel is already scaled by `a / 255`.
///
/// Invariant: `r`, `g`, `b` never exceed `a`. The layout matches the RGBA8
/// byte order of surfaces, so pixel rows can be reinterpreted as bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PremulRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PremulRgba8 {
    pub const TRANSPARENT: PremulRgba8 = PremulRgba8 { r: 0, g: 0, b: 0, a: 0 };

    /// Creates a pixel from already-premultiplied components.
    #[inline]
    pub const fn from_premul(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the straight-alpha color.
    ///
    /// For `a == 0` all channels come back as 0: premultiplied transparent
    /// pixels carry no color, which is the only lossy point of the round trip.
    #[inline]
    pub fn unpremultiply(self) -> Rgba8 {
        match self.a {
            0 => Rgba8::TRANSPARENT,
            255 => Rgba8::new(self.r, self.g, self.b, 255),
            a => {
                let a = a as u32;
                let un = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
                Rgba8::new(un(self.r), un(self.g), un(self.b), self.a)
            }
        }
    }

    /// Scales all four channels by `factor / 255`.
    #[inline]
    pub fn scale(self, factor: u8) -> Self {
        match factor {
            255 => self,
            0 => Self::TRANSPARENT,
            f => {
                let f = f as u32;
                Self {
                    r: mul_div255(self.r as u32, f) as u8,
                    g: mul_div255(self.g as u32, f) as u8,
                    b: mul_div255(self.b as u32, f) as u8,
                    a: mul_div255(self.a as u32, f) as u8,
                }
            }
        }
    }

    /// Channel-wise linear interpolation `self * (255 - t) / 255 + other * t / 255`.
    ///
    /// Exact at both ends and preserves the premultiplied invariant.
    #[inline]
    pub fn lerp(self, other: Self, t: u8) -> Self {
        let t = t as u32;
        let mix = |a: u8, b: u8| {
            (mul_div255(a as u32, 255 - t) + mul_div255(b as u32, t)).min(255) as u8
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Debug-only validation of the premultiplied invariant.
    ///
    /// No-op in release builds.
    #[inline]
    pub fn debug_assert_premul(self) {
        debug_assert!(
            self.r <= self.a && self.g <= self.a && self.b <= self.a,
            "PremulRgba8 {self:?} has a channel above alpha, looks like straight alpha was passed as premul"
        );
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Rgba8> for PremulRgba8 {
    #[inline]
    fn from(c: Rgba8) -> Self {
        c.premultiply()
    }
}
