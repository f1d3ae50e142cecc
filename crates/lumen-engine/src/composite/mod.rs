//! Pixel compositing on premultiplied RGBA8.
//!
//! [`blend_pixel`] is the per-pixel operator algebra; [`blend_span`] applies
//! it to a row with coverage, opacity and an optional mask.

mod op;
mod span;

pub use op::{CompOp, blend_pixel};
pub use span::{SpanSource, blend_span, blend_span_lcd};
