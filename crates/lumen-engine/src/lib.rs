//! Lumen engine crate.
//!
//! A software 2D vector renderer: paths are transformed to device space,
//! scan-converted into anti-aliased coverage and composited onto
//! premultiplied RGBA8 surfaces with solid, gradient or image paint.
//! [`Canvas`] is the entry point.

pub mod canvas;
pub mod composite;
pub mod config;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod raster;
pub mod record;
pub mod state;
pub mod surface;
pub mod sync;
pub mod text;

pub use canvas::Canvas;
pub use composite::CompOp;
pub use config::EngineConfig;
pub use coords::{CornerRadii, IntRect, Matrix, Point, Rect, Vec2};
pub use error::{Error, Result};
pub use geometry::{Path, StrokeStyle};
pub use paint::{Paint, PremulRgba8, Rgba8};
pub use raster::{FillRule, Gamma};
pub use surface::{Surface, SurfaceMut};
