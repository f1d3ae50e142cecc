//! Multi-style fills.
//!
//! A compound shape is a set of sub-paths each tagged with a style index.
//! Styles are resolved by rasterizing once per style, lowest index first, so
//! a later style paints over an earlier one where they overlap.

use crate::coords::IntRect;
use crate::error::Result;
use crate::geometry::Path;

use super::coverage::CoverageStorage;
use super::gamma::Gamma;
use super::rasterizer::{FillRule, Rasterizer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundShape {
    parts: Vec<(usize, Path)>,
}

impl CompoundShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, style: usize, path: Path) -> &mut Self {
        self.parts.push((style, path));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Distinct style indices in ascending order.
    pub fn styles(&self) -> Vec<usize> {
        let mut styles: Vec<usize> = self.parts.iter().map(|(s, _)| *s).collect();
        styles.sort_unstable();
        styles.dedup();
        styles
    }

    pub fn parts(&self) -> impl Iterator<Item = (usize, &Path)> {
        self.parts.iter().map(|(s, p)| (*s, p))
    }
}

/// Rasterizes compound shapes one style at a time.
#[derive(Debug, Default)]
pub struct CompoundRasterizer {
    raster: Rasterizer,
}

impl CompoundRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gamma(&mut self, gamma: Gamma) {
        self.raster.set_gamma(gamma);
    }

    /// Coverage of each style, in style order. Styles whose parts fall
    /// entirely outside `clip` are omitted.
    pub fn rasterize(
        &mut self,
        shape: &CompoundShape,
        rule: FillRule,
        clip: IntRect,
        tolerance: f32,
    ) -> Result<Vec<(usize, CoverageStorage)>> {
        let mut out = Vec::new();
        for style in shape.styles() {
            self.raster.reset(clip);
            for (_, path) in shape.parts().filter(|(s, _)| *s == style) {
                self.raster.add_path(path, tolerance)?;
            }
            let coverage = self.raster.sweep(rule).capture();
            if !coverage.is_empty() {
                out.push((style, coverage));
            }
        }
        log::trace!("compound fill: {} parts, {} styles drawn", shape.parts.len(), out.len());
        Ok(out)
    }
}
