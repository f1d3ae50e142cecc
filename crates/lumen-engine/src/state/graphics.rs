use std::sync::Arc;

use crate::composite::CompOp;
use crate::coords::Matrix;
use crate::geometry::StrokeStyle;
use crate::paint::{Paint, SharedPaint};
use crate::raster::{FillRule, Gamma};

use super::clip::ClipRegion;

/// Everything a draw call reads besides its geometry.
///
/// Cloning is cheap: the clip and the paint are shared until replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// User space to device pixels.
    pub transform: Matrix,
    pub clip: Arc<ClipRegion>,
    pub paint: SharedPaint,
    pub stroke: StrokeStyle,
    pub fill_rule: FillRule,
    pub op: CompOp,
    /// Global alpha multiplied into every draw.
    pub opacity: u8,
    pub antialias: bool,
    /// Coverage curve for antialiased drawing.
    pub gamma: Gamma,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Matrix::identity(),
            clip: Arc::new(ClipRegion::default()),
            paint: Arc::new(Paint::default()),
            stroke: StrokeStyle::default(),
            fill_rule: FillRule::NonZero,
            op: CompOp::SrcOver,
            opacity: 255,
            antialias: true,
            gamma: Gamma::None,
        }
    }
}

impl GraphicsState {
    /// Gamma the rasterizer should use for this state.
    pub fn effective_gamma(&self) -> Gamma {
        if self.antialias { self.gamma } else { Gamma::ALIASED }
    }
}
