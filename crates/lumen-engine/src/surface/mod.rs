//! Pixel targets.
//!
//! - [`Surface`]: owned premultiplied RGBA8 buffer
//! - [`SurfaceMut`]: borrowed view over external memory, the type every draw writes through
//! - [`DisplayDevice`]: display collaborator (swap, retrace, overlay) gated by [`DisplayCaps`]

mod display;
mod format;
mod surface;

pub use display::{DisplayCaps, DisplayDevice, DisplayInit, MemoryDisplay, OverlayConfig, choose_format};
pub use format::PixelFormat;
pub use surface::{Surface, SurfaceMut};
