//! Paint model: colors, gradients, image patterns and per-draw sampling.
//!
//! Scope:
//! - straight and premultiplied 8-bit color
//! - paint sources (solid, four gradient shapes, image pattern)
//! - gradient lookup tables and spread handling
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod gradient;
pub mod pattern;
pub mod ramp;

mod paint;
mod sampler;

pub use color::{PremulRgba8, Rgba8, mul_div255};
pub use gradient::{
    ColorStop, ConicGradient, DiamondGradient, GradientColors, LinearGradient, RadialGradient, SpreadMode,
};
pub use paint::{Paint, SharedPaint};
pub use pattern::{Extend, Filter, Pattern};
pub use ramp::{ColorRamp, RAMP_SIZE};
pub use sampler::PaintSampler;
