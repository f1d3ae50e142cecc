use std::sync::Arc;

use crate::coords::Matrix;
use crate::error::{Result, invalid};

use super::gradient::{ConicGradient, DiamondGradient, LinearGradient, RadialGradient};
use super::pattern::Pattern;
use super::{PremulRgba8, Rgba8};

/// Paint source for filling geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba8),
    Linear(LinearGradient),
    Radial(RadialGradient),
    Diamond(DiamondGradient),
    Conic(ConicGradient),
    Pattern(Pattern),
}

/// Reference-counted paint handle; the paint is freed with its last clone.
pub type SharedPaint = Arc<Paint>;

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Rgba8::BLACK)
    }
}

impl From<Rgba8> for Paint {
    fn from(c: Rgba8) -> Self {
        Paint::Solid(c)
    }
}

impl Paint {
    #[inline]
    pub fn solid(color: Rgba8) -> Self {
        Paint::Solid(color)
    }

    /// Solid color in premultiplied form, if this is a solid paint.
    #[inline]
    pub fn as_solid(&self) -> Option<PremulRgba8> {
        match self {
            Paint::Solid(c) => Some(c.premultiply()),
            _ => None,
        }
    }

    /// Local transform of gradient and pattern paints.
    pub fn transform(&self) -> Matrix {
        match self {
            Paint::Solid(_) => Matrix::identity(),
            Paint::Linear(g) => g.colors.transform,
            Paint::Radial(g) => g.colors.transform,
            Paint::Diamond(g) => g.colors.transform,
            Paint::Conic(g) => g.colors.transform,
            Paint::Pattern(p) => p.transform,
        }
    }

    /// True when every sample has alpha 255.
    pub fn is_opaque(&self) -> bool {
        match self {
            Paint::Solid(c) => c.a == 255,
            Paint::Linear(g) => g.colors.is_opaque(),
            Paint::Radial(g) => g.colors.is_opaque(),
            Paint::Diamond(g) => g.colors.is_opaque(),
            Paint::Conic(g) => g.colors.is_opaque(),
            // Edges of a clamped image can still be transparent; don't scan pixels.
            Paint::Pattern(_) => false,
        }
    }

    /// True when every sample has alpha 0.
    pub fn is_transparent(&self) -> bool {
        match self {
            Paint::Solid(c) => c.a == 0,
            Paint::Linear(g) => g.colors.is_transparent(),
            Paint::Radial(g) => g.colors.is_transparent(),
            Paint::Diamond(g) => g.colors.is_transparent(),
            Paint::Conic(g) => g.colors.is_transparent(),
            Paint::Pattern(p) => p.image.is_empty(),
        }
    }

    /// Rejects paints that cannot be sampled.
    pub fn validate(&self) -> Result<()> {
        let ok = match self {
            Paint::Solid(_) => true,
            Paint::Linear(g) => g.is_valid(),
            Paint::Radial(g) => g.is_valid(),
            Paint::Diamond(g) => g.is_valid(),
            Paint::Conic(g) => g.is_valid(),
            Paint::Pattern(p) => p.is_valid(),
        };
        if ok { Ok(()) } else { Err(invalid(format!("paint cannot be sampled: {self:?}"))) }
    }
}
