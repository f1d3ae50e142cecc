//! Path geometry: construction, curve flattening, dashing, stroking and bounds.
//!
//! All coordinates here are in user space; the canvas applies the current
//! transform before rasterization.

mod arc;
mod dash;
mod flatten;
mod path;
mod stroke;

pub use flatten::Polyline;
pub use path::{DEFAULT_TOLERANCE, KAPPA, Path, PathSegment, SharedPath};
pub use stroke::{Dash, LineCap, LineJoin, StrokeStyle, stroke_to_fill};
