//! Scanline rasterization: device-space paths to anti-aliased coverage.
//!
//! [`Rasterizer`] turns paths into rows of [`Span`]s. Rows are produced
//! lazily and are usually consumed by the compositor right away; keep them
//! with [`Sweep::capture`] or bake them into an [`AlphaMask`] to reuse them.

mod cells;
pub mod compound;
mod coverage;
mod gamma;
pub mod hit;
mod rasterizer;

pub use compound::{CompoundRasterizer, CompoundShape};
pub use coverage::{AlphaMask, CoverageRow, CoverageStorage, Span};
pub use gamma::{Gamma, GammaLut};
pub use rasterizer::{FillRule, MAX_COORD, Rasterizer, Sweep};
