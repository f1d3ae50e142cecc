//! Coordinate and geometry primitives shared by every engine module.
//!
//! Canonical space:
//! - origin top-left
//! - +X right, +Y down
//! - user space is mapped to device pixels by the current [`Matrix`]

mod corner_radii;
mod int_rect;
mod matrix;
mod rect;
mod vec2;

pub use corner_radii::CornerRadii;
pub use int_rect::IntRect;
pub use matrix::Matrix;
pub use rect::Rect;
pub use vec2::{Point, Vec2};
