use std::sync::{Arc, OnceLock};

use crate::coords::{Matrix, Vec2};
use crate::error::Result;

use super::ramp::ColorRamp;
use super::{PremulRgba8, Rgba8};

/// Gradient spread behavior outside the [0, 1] range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SpreadMode {
    /// Clamp to edge stops.
    #[default]
    Pad,
    /// Repeat the gradient pattern.
    Repeat,
    /// Mirror-repeat the gradient pattern.
    Reflect,
}

impl SpreadMode {
    /// Folds a raw gradient parameter into [0, 1]. NaN maps to 0.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        if t.is_nan() {
            return 0.0;
        }
        match self {
            SpreadMode::Pad => t.clamp(0.0, 1.0),
            SpreadMode::Repeat => {
                let r = t - t.floor();
                if r.is_finite() { r } else { 0.0 }
            }
            SpreadMode::Reflect => {
                let r = t.rem_euclid(2.0);
                if !r.is_finite() {
                    0.0
                } else if r > 1.0 {
                    2.0 - r
                } else {
                    r
                }
            }
        }
    }
}

/// A single gradient stop.
///
/// Offsets outside [0, 1] are clamped when the ramp is built; stops are
/// sorted stably, so two stops at the same offset produce a hard step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: PremulRgba8,
}

impl ColorStop {
    /// Creates a stop from a straight-alpha color.
    #[inline]
    pub fn new(offset: f32, color: Rgba8) -> Self {
        Self { offset, color: color.premultiply() }
    }

    #[inline]
    pub const fn premul(offset: f32, color: PremulRgba8) -> Self {
        Self { offset, color }
    }
}

/// Color description shared by every gradient shape: stops, spread and an
/// optional local transform (gradient space → user space).
///
/// The lookup table is built on first use and reused for the lifetime of the
/// paint.
#[derive(Debug, Clone)]
pub struct GradientColors {
    pub stops: Vec<ColorStop>,
    pub spread: SpreadMode,
    pub transform: Matrix,
    ramp: OnceLock<Arc<ColorRamp>>,
}

impl PartialEq for GradientColors {
    fn eq(&self, other: &Self) -> bool {
        self.stops == other.stops && self.spread == other.spread && self.transform == other.transform
    }
}

impl GradientColors {
    pub fn new(stops: Vec<ColorStop>, spread: SpreadMode) -> Self {
        Self { stops, spread, transform: Matrix::identity(), ramp: OnceLock::new() }
    }

    /// Returns the lookup table, building it on first call.
    pub fn ramp(&self) -> Result<Arc<ColorRamp>> {
        if let Some(ramp) = self.ramp.get() {
            return Ok(Arc::clone(ramp));
        }
        let built = Arc::new(ColorRamp::build(&self.stops)?);
        // A concurrent builder may have won; either table is identical.
        Ok(Arc::clone(self.ramp.get_or_init(|| built)))
    }

    pub fn is_valid(&self) -> bool {
        !self.stops.is_empty()
            && self.stops.iter().all(|s| s.offset.is_finite())
            && self.transform.is_invertible()
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.stops.iter().all(|s| s.color.is_opaque())
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.stops.iter().all(|s| s.color.is_transparent())
    }
}

/// Linear gradient: the parameter is the projection onto the `start → end` axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub colors: GradientColors,
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2, stops: Vec<ColorStop>, spread: SpreadMode) -> Self {
        Self { start, end, colors: GradientColors::new(stops, spread) }
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.colors.transform = transform;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.colors.is_valid()
    }

    /// Gradient parameter for a point in gradient space.
    ///
    /// A zero-length axis yields 1.0 (the last stop everywhere).
    #[inline]
    pub fn parameter(&self, p: Vec2) -> f32 {
        let axis = self.end - self.start;
        let len_sq = axis.dot(axis);
        if len_sq <= f32::EPSILON {
            return 1.0;
        }
        (p - self.start).dot(axis) / len_sq
    }
}

/// Two-point conical gradient: `t = 0` at `focal`, `t = 1` on the circle.
///
/// A focal point outside the circle is pulled just inside it; with
/// `focal == center` this is the plain radial `|p - center| / radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    pub focal: Vec2,
    pub colors: GradientColors,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32, stops: Vec<ColorStop>, spread: SpreadMode) -> Self {
        Self { center, radius, focal: center, colors: GradientColors::new(stops, spread) }
    }

    pub fn with_focal(mut self, focal: Vec2) -> Self {
        self.focal = focal;
        self
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.colors.transform = transform;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite()
            && self.focal.is_finite()
            && self.radius.is_finite()
            && self.radius > 0.0
            && self.colors.is_valid()
    }

    /// Focal point clamped to 99.9% of the radius.
    pub(crate) fn effective_focal(&self) -> Vec2 {
        let d = self.focal - self.center;
        let limit = self.radius * 0.999;
        let len = d.length();
        if len > limit { self.center + d * (limit / len) } else { self.focal }
    }

    /// Gradient parameter for a point in gradient space.
    ///
    /// Solves for the largest `t` with `|p - (f + t(c - f))| = t * r`.
    pub fn parameter(&self, p: Vec2) -> f32 {
        let f = self.effective_focal();
        let pd = p - f;
        let cd = self.center - f;
        let r = self.radius;
        if cd.dot(cd) <= f32::EPSILON {
            return pd.length() / r;
        }
        let a = cd.dot(cd) - r * r;
        let b = pd.dot(cd);
        let c = pd.dot(pd);
        let disc = (b * b - a * c).max(0.0);
        (b - disc.sqrt()) / a
    }
}

/// Diamond gradient: Chebyshev distance from the center over `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiamondGradient {
    pub center: Vec2,
    pub radius: f32,
    pub colors: GradientColors,
}

impl DiamondGradient {
    pub fn new(center: Vec2, radius: f32, stops: Vec<ColorStop>, spread: SpreadMode) -> Self {
        Self { center, radius, colors: GradientColors::new(stops, spread) }
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.colors.transform = transform;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius > 0.0 && self.colors.is_valid()
    }

    #[inline]
    pub fn parameter(&self, p: Vec2) -> f32 {
        let d = p - self.center;
        d.x.abs().max(d.y.abs()) / self.radius
    }
}

/// Conic (sweep) gradient: angle around `center`, starting at `start_angle`
/// radians and growing clockwise on a y-down screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ConicGradient {
    pub center: Vec2,
    pub start_angle: f32,
    pub colors: GradientColors,
}

impl ConicGradient {
    pub fn new(center: Vec2, start_angle: f32, stops: Vec<ColorStop>, spread: SpreadMode) -> Self {
        Self { center, start_angle, colors: GradientColors::new(stops, spread) }
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.colors.transform = transform;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.start_angle.is_finite() && self.colors.is_valid()
    }

    /// Angle fraction in [0, 1).
    #[inline]
    pub fn parameter(&self, p: Vec2) -> f32 {
        let d = p - self.center;
        let angle = d.y.atan2(d.x) - self.start_angle;
        (angle / std::f32::consts::TAU).rem_euclid(1.0)
    }
}
