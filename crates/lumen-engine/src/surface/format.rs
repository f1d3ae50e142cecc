use crate::paint::{PremulRgba8, Rgba8};

/// Byte layout of an external pixel buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// Native layout: premultiplied RGBA, one byte per channel.
    #[default]
    Rgba8Premul,
    /// Premultiplied BGRA, as most display back buffers expect.
    Bgra8Premul,
    /// Straight (non-premultiplied) RGBA, as image codecs expect.
    Rgba8Straight,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Encodes one premultiplied pixel into this format.
    #[inline]
    pub fn encode(self, px: PremulRgba8) -> [u8; 4] {
        match self {
            PixelFormat::Rgba8Premul => px.to_array(),
            PixelFormat::Bgra8Premul => [px.b, px.g, px.r, px.a],
            PixelFormat::Rgba8Straight => {
                let c = px.unpremultiply();
                [c.r, c.g, c.b, c.a]
            }
        }
    }

    /// Decodes four bytes of this format into a premultiplied pixel.
    #[inline]
    pub fn decode(self, bytes: [u8; 4]) -> PremulRgba8 {
        let [p, q, r, a] = bytes;
        match self {
            PixelFormat::Rgba8Premul => clamp_premul(p, q, r, a),
            PixelFormat::Bgra8Premul => clamp_premul(r, q, p, a),
            PixelFormat::Rgba8Straight => Rgba8::new(p, q, r, a).premultiply(),
        }
    }
}

/// Imported premultiplied data may violate `c <= a`; clamp rather than trust it.
#[inline]
fn clamp_premul(r: u8, g: u8, b: u8, a: u8) -> PremulRgba8 {
    PremulRgba8::from_premul(r.min(a), g.min(a), b.min(a), a)
}
