use std::sync::Arc;

use crate::composite::CompOp;
use crate::coords::{Matrix, Point, Rect};
use crate::geometry::{SharedPath, StrokeStyle};
use crate::paint::{Filter, PremulRgba8, SharedPaint};
use crate::raster::{AlphaMask, CompoundShape, FillRule, Gamma};
use crate::surface::Surface;
use crate::text::TextStyle;

/// One canvas call, captured for replay.
///
/// Extending the recording:
/// - add a variant here
/// - push it from the matching `Canvas` method once the call succeeds
/// - dispatch it in `Canvas::apply`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    /// `m` applied before the current transform.
    Transform(Matrix),
    SetTransform(Matrix),
    ClipRect(Rect),
    ClipPath { path: SharedPath, rule: FillRule },
    SetPaint(SharedPaint),
    SetStroke(StrokeStyle),
    SetFillRule(FillRule),
    SetCompOp(CompOp),
    SetOpacity(u8),
    SetAntialias(bool),
    SetGamma(Gamma),
    FillPath(SharedPath),
    StrokePath(SharedPath),
    FillRegion(Arc<[Rect]>),
    FillCompound { shape: Arc<CompoundShape>, paints: Arc<[SharedPaint]> },
    FillMask(Arc<AlphaMask>),
    DrawText { text: Arc<str>, origin: Point, style: TextStyle },
    DrawBitmap { image: Arc<Surface>, dst: Rect, filter: Filter },
    PushLayer { opacity: u8, mask: Option<Arc<AlphaMask>> },
    PopLayer,
    Blur { rect: Rect, radius: f32 },
    Clear(PremulRgba8),
}

impl DrawOp {
    /// True for calls that only change state.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            DrawOp::Save
                | DrawOp::Restore
                | DrawOp::Transform(_)
                | DrawOp::SetTransform(_)
                | DrawOp::ClipRect(_)
                | DrawOp::ClipPath { .. }
                | DrawOp::SetPaint(_)
                | DrawOp::SetStroke(_)
                | DrawOp::SetFillRule(_)
                | DrawOp::SetCompOp(_)
                | DrawOp::SetOpacity(_)
                | DrawOp::SetAntialias(_)
                | DrawOp::SetGamma(_)
        )
    }
}
