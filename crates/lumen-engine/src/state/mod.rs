//! Per-canvas drawing state: transform, clip, paint and stroke parameters,
//! kept on a save/restore stack.

mod clip;
mod graphics;
mod stack;

pub use clip::ClipRegion;
pub use graphics::GraphicsState;
pub use stack::StateStack;
