//! The drawing front end.
//!
//! A [`Canvas`] binds one pixel target to one state stack. Every call either
//! succeeds or fails without touching the state stack or the pixels; the
//! failure is also kept for [`Canvas::last_error`].
//!
//! Shape helpers (`fill_rect`, `stroke_line`, ...) build a [`Path`] and go
//! through `fill_path` / `stroke_path`, so the core surface stays small.
//!
//! [`Path`]: crate::geometry::Path

mod draw;
mod effects;
mod target;
mod text;

use std::sync::Arc;

use crate::composite::CompOp;
use crate::config::EngineConfig;
use crate::coords::{IntRect, Matrix, Point, Rect};
use crate::error::{Error, Result};
use crate::geometry::{Path, StrokeStyle};
use crate::paint::{Paint, PremulRgba8, Rgba8, SharedPaint};
use crate::raster::{CompoundRasterizer, FillRule, Gamma, Rasterizer};
use crate::record::{DrawOp, Recording};
use crate::state::{GraphicsState, StateStack};
use crate::surface::{Surface, SurfaceMut};
use crate::text::TextContext;

use target::{Layer, Scratch, Target};

pub struct Canvas<'a> {
    target: Target<'a>,
    layers: Vec<Layer>,
    state: StateStack,
    raster: Rasterizer,
    compound: CompoundRasterizer,
    tolerance: f32,
    text: Option<TextContext>,
    recording: Option<Recording>,
    last_error: Option<Error>,
    scratch: Scratch,
}

impl Default for Canvas<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Canvas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("size", &self.target.size())
            .field("layers", &self.layers.len())
            .field("state_depth", &self.state.depth())
            .field("recording", &self.recording.is_some())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<'a> Canvas<'a> {
    /// Detached canvas with default settings and no text support.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let base = GraphicsState { gamma: config.gamma, ..GraphicsState::default() };
        Self {
            target: Target::Detached,
            layers: Vec::new(),
            state: StateStack::new(base),
            raster: Rasterizer::new(),
            compound: CompoundRasterizer::new(),
            tolerance: config.flatten_tolerance,
            text: None,
            recording: None,
            last_error: None,
            scratch: Scratch::default(),
        }
    }

    /// Enables `draw_text` / `measure_text`.
    pub fn with_text(mut self, text: TextContext) -> Self {
        self.text = Some(text);
        self
    }

    pub fn set_text_context(&mut self, text: Option<TextContext>) {
        self.text = text;
    }

    pub fn text_context(&self) -> Option<&TextContext> {
        self.text.as_ref()
    }

    // ── target ────────────────────────────────────────────────────────────

    /// Draws into an owned surface from now on. Open layers are dropped.
    pub fn attach(&mut self, surface: Surface) {
        self.replace_target(Target::Owned(surface));
    }

    /// Draws into externally owned pixels for the lifetime of the canvas.
    pub fn attach_borrowed(&mut self, surface: SurfaceMut<'a>) {
        self.replace_target(Target::Borrowed(surface));
    }

    /// Releases the target, returning it if the canvas owned it.
    pub fn detach(&mut self) -> Option<Surface> {
        match self.replace_target(Target::Detached) {
            Target::Owned(s) => Some(s),
            _ => None,
        }
    }

    fn replace_target(&mut self, target: Target<'a>) -> Target<'a> {
        if !self.layers.is_empty() {
            log::warn!("discarding {} open layers on target change", self.layers.len());
            self.layers.clear();
        }
        if let Some((w, h)) = target.size() {
            log::debug!("canvas attached to {w}x{h} target");
        }
        std::mem::replace(&mut self.target, target)
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_attached()
    }

    /// The owned target, if any.
    pub fn surface(&self) -> Option<&Surface> {
        match &self.target {
            Target::Owned(s) => Some(s),
            _ => None,
        }
    }

    /// Target size in pixels.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.target.size()
    }

    /// Reads a pixel of the attached target, ignoring open layers.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        self.target.pixel(x, y)
    }

    // ── errors ────────────────────────────────────────────────────────────

    /// The most recent failure, kept until the next failure or
    /// [`clear_error`](Self::clear_error).
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Records `op` on success, remembers the error on failure.
    fn finish(&mut self, result: Result<()>, op: impl FnOnce() -> DrawOp) -> Result<()> {
        match &result {
            Ok(()) => {
                if let Some(recording) = &mut self.recording {
                    recording.push(op());
                }
            }
            Err(e) => {
                log::debug!("canvas call failed: {e}");
                self.last_error = Some(e.clone());
            }
        }
        result
    }

    // ── recording ─────────────────────────────────────────────────────────

    /// Starts capturing successful calls. A recording already in progress is
    /// discarded.
    pub fn begin_recording(&mut self) {
        self.recording = Some(Recording::new());
    }

    /// Stops capturing and returns what was recorded.
    pub fn end_recording(&mut self) -> Recording {
        self.recording.take().unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Executes a recorded call.
    pub fn apply(&mut self, op: &DrawOp) -> Result<()> {
        match op {
            DrawOp::Save => self.save(),
            DrawOp::Restore => self.restore(),
            DrawOp::Transform(m) => self.transform(m),
            DrawOp::SetTransform(m) => self.set_transform(*m),
            DrawOp::ClipRect(r) => self.clip_rect(*r),
            DrawOp::ClipPath { path, rule } => self.clip_path(path, *rule),
            DrawOp::SetPaint(p) => self.set_shared_paint(p.clone()),
            DrawOp::SetStroke(s) => self.set_stroke(s.clone()),
            DrawOp::SetFillRule(r) => self.set_fill_rule(*r),
            DrawOp::SetCompOp(o) => self.set_comp_op(*o),
            DrawOp::SetOpacity(a) => self.set_opacity(*a),
            DrawOp::SetAntialias(on) => self.set_antialias(*on),
            DrawOp::SetGamma(g) => self.set_gamma(*g),
            DrawOp::FillPath(p) => self.fill_path(p),
            DrawOp::StrokePath(p) => self.stroke_path(p),
            DrawOp::FillRegion(rects) => self.fill_region(rects),
            DrawOp::FillCompound { shape, paints } => self.fill_compound(shape, paints),
            DrawOp::FillMask(mask) => self.fill_mask(mask.clone()),
            DrawOp::DrawText { text, origin, style } => self.draw_text(text, *origin, style).map(|_| ()),
            DrawOp::DrawBitmap { image, dst, filter } => self.draw_bitmap(image.clone(), *dst, *filter),
            DrawOp::PushLayer { opacity, mask } => self.push_layer_masked(*opacity, mask.clone()),
            DrawOp::PopLayer => self.pop_layer(),
            DrawOp::Blur { rect, radius } => self.blur(*rect, *radius),
            DrawOp::Clear(c) => self.clear(*c),
        }
    }

    // ── state stack ───────────────────────────────────────────────────────

    pub fn state(&self) -> &GraphicsState {
        self.state.current()
    }

    pub fn state_depth(&self) -> usize {
        self.state.depth()
    }

    pub fn save(&mut self) -> Result<()> {
        self.state.save();
        self.finish(Ok(()), || DrawOp::Save)
    }

    /// Pops the state pushed by the matching [`save`](Self::save).
    pub fn restore(&mut self) -> Result<()> {
        let r = self.state.restore();
        self.finish(r, || DrawOp::Restore)
    }

    // ── transform ─────────────────────────────────────────────────────────

    /// Applies `m` in local coordinates, before the current transform.
    pub fn transform(&mut self, m: &Matrix) -> Result<()> {
        let r = self.state.transform(m);
        self.finish(r, || DrawOp::Transform(*m))
    }

    pub fn translate(&mut self, tx: f32, ty: f32) -> Result<()> {
        self.transform(&Matrix::translate(tx, ty))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> Result<()> {
        self.transform(&Matrix::scale(sx, sy))
    }

    pub fn rotate(&mut self, radians: f32) -> Result<()> {
        self.transform(&Matrix::rotate(radians))
    }

    pub fn skew(&mut self, x_radians: f32, y_radians: f32) -> Result<()> {
        self.transform(&Matrix::skew(x_radians, y_radians))
    }

    pub fn set_transform(&mut self, m: Matrix) -> Result<()> {
        let r = self.state.set_transform(m);
        self.finish(r, || DrawOp::SetTransform(m))
    }

    pub fn reset_transform(&mut self) -> Result<()> {
        self.set_transform(Matrix::identity())
    }

    pub fn transform_matrix(&self) -> Matrix {
        self.state.transform_matrix()
    }

    pub fn user_to_device(&self, p: Point) -> Point {
        self.state.user_to_device(p)
    }

    pub fn device_to_user(&self, p: Point) -> Result<Point> {
        self.state.device_to_user(p)
    }

    // ── clip ──────────────────────────────────────────────────────────────

    /// Intersects the clip with `rect` in user space.
    pub fn clip_rect(&mut self, rect: Rect) -> Result<()> {
        let target = self.clip_target();
        let r = self.state.clip_rect(rect, target, &mut self.raster, self.tolerance);
        self.finish(r, || DrawOp::ClipRect(rect))
    }

    pub fn clip_path(&mut self, path: &Path, rule: FillRule) -> Result<()> {
        let target = self.clip_target();
        let r = self.state.clip_path(path, rule, target, &mut self.raster, self.tolerance);
        self.finish(r, || DrawOp::ClipPath { path: Arc::new(path.clone()), rule })
    }

    /// Pixels a mask clip may cover: the attached target, or the current
    /// clip while detached.
    fn clip_target(&self) -> IntRect {
        match self.target.size() {
            Some((w, h)) => IntRect::from_size(w, h),
            None => self.state.current().clip.bounds(),
        }
    }

    /// Whether the user-space point falls on a pixel the clip keeps.
    pub fn clip_contains(&self, p: Point) -> bool {
        self.state.clip_contains(p)
    }

    pub fn fill_contains(&self, path: &Path, p: Point) -> Result<bool> {
        self.state.fill_contains(path, p, self.tolerance)
    }

    pub fn stroke_contains(&self, path: &Path, p: Point) -> Result<bool> {
        self.state.stroke_contains(path, p, self.tolerance)
    }

    // ── paint & parameters ────────────────────────────────────────────────

    pub fn set_paint(&mut self, paint: Paint) -> Result<()> {
        self.set_shared_paint(Arc::new(paint))
    }

    pub fn set_shared_paint(&mut self, paint: SharedPaint) -> Result<()> {
        let r = paint.validate();
        if r.is_ok() {
            self.state.current_mut().paint = paint.clone();
        }
        self.finish(r, || DrawOp::SetPaint(paint))
    }

    pub fn set_color(&mut self, color: Rgba8) -> Result<()> {
        self.set_paint(Paint::Solid(color))
    }

    pub fn set_stroke(&mut self, stroke: StrokeStyle) -> Result<()> {
        let r = stroke.validate();
        if r.is_ok() {
            self.state.current_mut().stroke = stroke.clone();
        }
        self.finish(r, || DrawOp::SetStroke(stroke))
    }

    pub fn set_line_width(&mut self, width: f32) -> Result<()> {
        let stroke = StrokeStyle { width, ..self.state().stroke.clone() };
        self.set_stroke(stroke)
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) -> Result<()> {
        self.state.current_mut().fill_rule = rule;
        self.finish(Ok(()), || DrawOp::SetFillRule(rule))
    }

    pub fn set_comp_op(&mut self, op: CompOp) -> Result<()> {
        self.state.current_mut().op = op;
        self.finish(Ok(()), || DrawOp::SetCompOp(op))
    }

    /// Global alpha multiplied into every draw.
    pub fn set_opacity(&mut self, opacity: u8) -> Result<()> {
        self.state.current_mut().opacity = opacity;
        self.finish(Ok(()), || DrawOp::SetOpacity(opacity))
    }

    pub fn set_antialias(&mut self, on: bool) -> Result<()> {
        self.state.current_mut().antialias = on;
        self.finish(Ok(()), || DrawOp::SetAntialias(on))
    }

    pub fn set_gamma(&mut self, gamma: Gamma) -> Result<()> {
        self.state.current_mut().gamma = gamma;
        self.finish(Ok(()), || DrawOp::SetGamma(gamma))
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests;
