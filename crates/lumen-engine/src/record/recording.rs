use crate::canvas::Canvas;
use crate::error::{Error, Result};

use super::DrawOp;

/// Canvas call sequence captured between `Canvas::begin_recording` and
/// `Canvas::end_recording`.
///
/// Replay re-issues every call in order against any canvas; the target may
/// differ in size or pixel content from the one recorded on. Only calls that
/// succeeded are recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    ops: Vec<DrawOp>,
}

impl Recording {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Ops in recording order.
    #[inline]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of ops that touch pixels.
    pub fn draw_count(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_state_change()).count()
    }

    /// Clears recorded ops. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Re-issues every op against `canvas`, bracketed by a save/restore so the
    /// canvas state is unchanged afterwards. Stops at the first failure.
    ///
    /// A `Restore` with no matching `Save` inside the recording fails with
    /// [`Error::StateUnderflow`]. Layers left open are composited.
    pub fn replay(&self, canvas: &mut Canvas<'_>) -> Result<()> {
        log::debug!("replaying {} ops ({} draws)", self.len(), self.draw_count());
        canvas.save()?;
        let depth = canvas.state_depth();
        let layers = canvas.layer_depth();
        let result = self.ops.iter().try_for_each(|op| {
            if matches!(op, DrawOp::Restore) && canvas.state_depth() <= depth {
                return Err(Error::StateUnderflow);
            }
            canvas.apply(op)
        });
        while canvas.layer_depth() > layers {
            canvas.pop_layer()?;
        }
        while canvas.state_depth() >= depth {
            canvas.restore()?;
        }
        result
    }
}

impl FromIterator<DrawOp> for Recording {
    fn from_iter<I: IntoIterator<Item = DrawOp>>(iter: I) -> Self {
        Self { ops: iter.into_iter().collect() }
    }
}

impl Extend<DrawOp> for Recording {
    fn extend<I: IntoIterator<Item = DrawOp>>(&mut self, iter: I) {
        self.ops.extend(iter);
    }
}
