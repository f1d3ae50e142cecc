//! Deferred rendering: canvas calls captured as [`DrawOp`]s and replayed
//! later, possibly against a different target.

mod op;
mod recording;

pub use op::DrawOp;
pub use recording::Recording;
