use std::sync::Arc;

use crate::coords::{IntRect, Matrix, Point, Rect};
use crate::error::{Error, Result, invalid};
use crate::geometry::{Path, stroke_to_fill};
use crate::raster::{AlphaMask, FillRule, Rasterizer, hit};

use super::clip::ClipRegion;
use super::graphics::GraphicsState;

/// Save/restore stack of [`GraphicsState`]s. Never empty: the bottom entry
/// is the base state and cannot be popped.
#[derive(Debug, Clone)]
pub struct StateStack {
    states: Vec<GraphicsState>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new(GraphicsState::default())
    }
}

fn check_matrix(m: &Matrix) -> Result<()> {
    if m.is_finite() { Ok(()) } else { Err(invalid(format!("transform {m:?} is not finite"))) }
}

impl StateStack {
    pub fn new(base: GraphicsState) -> Self {
        Self { states: vec![base] }
    }

    #[inline]
    pub fn current(&self) -> &GraphicsState {
        // The stack always holds the base state.
        &self.states[self.states.len() - 1]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        let top = self.states.len() - 1;
        &mut self.states[top]
    }

    /// Number of saved states above the base.
    #[inline]
    pub fn depth(&self) -> usize {
        self.states.len() - 1
    }

    pub fn save(&mut self) {
        let top = self.current().clone();
        self.states.push(top);
    }

    pub fn restore(&mut self) -> Result<()> {
        if self.states.len() == 1 {
            log::debug!("restore without matching save");
            return Err(Error::StateUnderflow);
        }
        self.states.pop();
        Ok(())
    }

    // ── transforms ───────────────────────────────────────────────────────

    #[inline]
    pub fn transform_matrix(&self) -> Matrix {
        self.current().transform
    }

    /// Applies `m` in the current user space: `m` acts before the existing
    /// transform.
    pub fn transform(&mut self, m: &Matrix) -> Result<()> {
        check_matrix(m)?;
        let next = self.current().transform * *m;
        check_matrix(&next)?;
        self.current_mut().transform = next;
        Ok(())
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
        check_matrix(&m)?;
        self.current_mut().transform = m;
        Ok(())
    }

    pub fn reset_transform(&mut self) {
        self.current_mut().transform = Matrix::identity();
    }

    #[inline]
    pub fn user_to_device(&self, p: Point) -> Point {
        self.current().transform.apply(p)
    }

    pub fn device_to_user(&self, p: Point) -> Result<Point> {
        let m = self.current().transform;
        m.invert()
            .map(|inv| inv.apply(p))
            .ok_or_else(|| invalid(format!("transform {m:?} is not invertible")))
    }

    // ── clipping ─────────────────────────────────────────────────────────

    /// Intersects the clip with `rect` in user space.
    ///
    /// Under a scale-and-translate transform the device rect is snapped to
    /// pixel edges and intersected directly; otherwise the rect is rasterized
    /// like any clip path. `target` bounds the pixels a mask clip can cover.
    pub fn clip_rect(&mut self, rect: Rect, target: IntRect, raster: &mut Rasterizer, tolerance: f32) -> Result<()> {
        if !rect.is_finite() {
            return Err(invalid(format!("clip rect {rect:?} is not finite")));
        }
        let state = self.current();
        if state.transform.is_axis_aligned() {
            let device = rect.transform_bounds(&state.transform).round();
            let clip = state.clip.intersect_rect(device)?;
            self.current_mut().clip = Arc::new(clip);
            return Ok(());
        }
        let mut path = Path::new();
        path.rect(rect)?;
        self.clip_path(&path, FillRule::NonZero, target, raster, tolerance)
    }

    /// Intersects the clip with the interior of `path` (user space). The
    /// resulting mask never extends past `target`.
    pub fn clip_path(
        &mut self,
        path: &Path,
        rule: FillRule,
        target: IntRect,
        raster: &mut Rasterizer,
        tolerance: f32,
    ) -> Result<()> {
        let state = self.current();
        let device = path.transformed(&state.transform)?;
        let area = state.clip.bounds().intersect(target);
        raster.set_gamma(state.effective_gamma());
        let coverage = raster.rasterize(&device, rule, area, tolerance)?.capture();
        let bounds = coverage.bounds().intersect(area);
        let clip = if bounds.is_empty() {
            ClipRegion::Rect(bounds)
        } else {
            state.clip.intersect_mask(AlphaMask::from_storage(&coverage, bounds)?)?
        };
        log::trace!("clip path -> {:?}", clip.bounds());
        self.current_mut().clip = Arc::new(clip);
        Ok(())
    }

    // ── hit testing ──────────────────────────────────────────────────────

    /// True when user-space point `p` lies inside `path` under the current
    /// fill rule.
    pub fn fill_contains(&self, path: &Path, p: Point, tolerance: f32) -> Result<bool> {
        let state = self.current();
        let lines = path.transformed(&state.transform)?.to_polylines(tolerance)?;
        Ok(hit::contains_point(&lines, state.transform.apply(p), state.fill_rule))
    }

    /// True when `p` lies inside the stroke of `path` with the current
    /// stroke style.
    pub fn stroke_contains(&self, path: &Path, p: Point, tolerance: f32) -> Result<bool> {
        let state = self.current();
        let outline = stroke_to_fill(path, &state.stroke, tolerance)?;
        let lines = outline.transformed(&state.transform)?.to_polylines(tolerance)?;
        Ok(hit::contains_point(&lines, state.transform.apply(p), FillRule::NonZero))
    }

    /// True when user-space point `p` maps to a device pixel with non-zero
    /// clip coverage.
    pub fn clip_contains(&self, p: Point) -> bool {
        let d = self.user_to_device(p);
        if !d.is_finite() {
            return false;
        }
        self.current().clip.coverage_at(d.x.floor() as i32, d.y.floor() as i32) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    const SCREEN: IntRect = IntRect::from_size(100, 100);

    fn stack_with_clip(r: IntRect) -> StateStack {
        let mut s = StateStack::default();
        s.current_mut().clip = Arc::new(ClipRegion::Rect(r));
        s
    }

    // ── save / restore ───────────────────────────────────────────────────

    #[test]
    fn restore_returns_previous_state_exactly() {
        let mut s = StateStack::default();
        s.translate(3.0, 4.0).unwrap();
        let before = s.current().clone();
        s.save();
        s.scale(2.0, 2.0).unwrap();
        s.current_mut().opacity = 10;
        s.restore().unwrap();
        assert_eq!(*s.current(), before);
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn restoring_base_underflows_and_keeps_state() {
        let mut s = StateStack::default();
        s.translate(1.0, 0.0).unwrap();
        assert_eq!(s.restore(), Err(Error::StateUnderflow));
        assert_eq!(s.transform_matrix(), Matrix::translate(1.0, 0.0));
    }

    #[test]
    fn save_shares_clip_until_changed() {
        let mut s = stack_with_clip(IntRect::new(0, 0, 10, 10));
        s.save();
        let below = Arc::clone(&s.states[0].clip);
        assert!(Arc::ptr_eq(&below, &s.current().clip));
        let mut r = Rasterizer::new();
        s.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), SCREEN, &mut r, 0.1).unwrap();
        assert!(!Arc::ptr_eq(&below, &s.current().clip));
        assert_eq!(s.states[0].clip.bounds(), IntRect::new(0, 0, 10, 10));
    }

    // ── transforms ───────────────────────────────────────────────────────

    #[test]
    fn later_transforms_act_in_local_space() {
        let mut s = StateStack::default();
        s.translate(10.0, 0.0).unwrap();
        s.scale(2.0, 2.0).unwrap();
        assert_eq!(s.user_to_device(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn non_finite_transform_is_rejected() {
        let mut s = StateStack::default();
        assert!(s.translate(f32::NAN, 0.0).is_err());
        assert!(s.transform_matrix().is_identity());
    }

    #[test]
    fn device_to_user_needs_invertible_transform() {
        let mut s = StateStack::default();
        s.translate(5.0, 5.0).unwrap();
        assert_eq!(s.device_to_user(Vec2::new(6.0, 7.0)).unwrap(), Vec2::new(1.0, 2.0));
        s.scale(0.0, 1.0).unwrap();
        assert!(matches!(s.device_to_user(Vec2::zero()), Err(Error::InvalidArgument(_))));
    }

    // ── clipping ─────────────────────────────────────────────────────────

    #[test]
    fn axis_aligned_clip_stays_a_rect() {
        let mut s = stack_with_clip(IntRect::new(0, 0, 100, 100));
        let mut r = Rasterizer::new();
        s.translate(10.0, 10.0).unwrap();
        s.clip_rect(Rect::new(0.0, 0.0, 20.4, 20.6), SCREEN, &mut r, 0.1).unwrap();
        assert_eq!(*s.current().clip, ClipRegion::Rect(IntRect::new(10, 10, 30, 31)));
    }

    #[test]
    fn clip_never_grows() {
        let mut s = stack_with_clip(IntRect::new(0, 0, 10, 10));
        let mut r = Rasterizer::new();
        s.clip_rect(Rect::new(-50.0, -50.0, 500.0, 500.0), SCREEN, &mut r, 0.1).unwrap();
        assert_eq!(s.current().clip.bounds(), IntRect::new(0, 0, 10, 10));
    }

    #[test]
    fn rotated_clip_becomes_mask() {
        let mut s = stack_with_clip(IntRect::new(0, 0, 40, 40));
        let mut r = Rasterizer::new();
        s.translate(20.0, 20.0).unwrap();
        s.rotate(std::f32::consts::FRAC_PI_4).unwrap();
        s.clip_rect(Rect::new(-5.0, -5.0, 10.0, 10.0), SCREEN, &mut r, 0.1).unwrap();
        let clip = &s.current().clip;
        assert!(clip.mask().is_some());
        assert_eq!(clip.coverage_at(20, 20), 255);
        assert_eq!(clip.coverage_at(14, 14), 0);
        assert!(clip.bounds().width() <= 16);
    }

    #[test]
    fn rotated_clip_mask_is_bounded_by_target() {
        let mut s = StateStack::default();
        let mut r = Rasterizer::new();
        s.rotate(0.1).unwrap();
        let target = IntRect::from_size(20, 20);
        s.clip_rect(Rect::new(-1.0e5, -1.0e5, 2.0e5, 2.0e5), target, &mut r, 0.1).unwrap();
        let clip = &s.current().clip;
        assert_eq!(clip.bounds(), target);
        assert_eq!(clip.coverage_at(0, 0), 255);
        assert_eq!(clip.coverage_at(19, 19), 255);
    }

    #[test]
    fn clip_path_outside_everything_empties_clip() {
        let mut s = stack_with_clip(IntRect::new(0, 0, 10, 10));
        let mut p = Path::new();
        p.circle(Vec2::new(100.0, 100.0), 5.0).unwrap();
        s.clip_path(&p, FillRule::NonZero, SCREEN, &mut Rasterizer::new(), 0.1).unwrap();
        assert!(s.current().clip.is_empty());
    }

    // ── hit testing ──────────────────────────────────────────────────────

    #[test]
    fn hit_tests_use_current_transform() {
        let mut s = StateStack::default();
        s.scale(2.0, 2.0).unwrap();
        let mut p = Path::new();
        p.rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(s.fill_contains(&p, Vec2::new(9.0, 9.0), 0.1).unwrap());
        assert!(!s.fill_contains(&p, Vec2::new(11.0, 9.0), 0.1).unwrap());

        s.current_mut().stroke.width = 2.0;
        assert!(s.stroke_contains(&p, Vec2::new(10.5, 5.0), 0.1).unwrap());
        assert!(!s.stroke_contains(&p, Vec2::new(5.0, 5.0), 0.1).unwrap());
    }

    #[test]
    fn clip_contains_checks_device_pixel() {
        let s = stack_with_clip(IntRect::new(0, 0, 4, 4));
        assert!(s.clip_contains(Vec2::new(3.5, 0.0)));
        assert!(!s.clip_contains(Vec2::new(4.0, 0.0)));
    }
}
