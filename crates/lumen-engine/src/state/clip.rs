use crate::coords::IntRect;
use crate::error::Result;
use crate::raster::{AlphaMask, MAX_COORD};

/// Device-space clip. Only ever shrinks: every operation intersects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipRegion {
    /// Pixel-aligned box, produced by axis-aligned rect clips.
    Rect(IntRect),
    /// Anti-aliased coverage, produced by any other clip shape.
    Mask(AlphaMask),
}

impl Default for ClipRegion {
    fn default() -> Self {
        ClipRegion::Rect(IntRect::new(-MAX_COORD, -MAX_COORD, MAX_COORD, MAX_COORD))
    }
}

impl ClipRegion {
    pub fn bounds(&self) -> IntRect {
        match self {
            ClipRegion::Rect(r) => *r,
            ClipRegion::Mask(m) => m.bounds(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds().is_empty()
    }

    pub fn mask(&self) -> Option<&AlphaMask> {
        match self {
            ClipRegion::Rect(_) => None,
            ClipRegion::Mask(m) => Some(m),
        }
    }

    /// Clip coverage of device pixel `(x, y)`.
    pub fn coverage_at(&self, x: i32, y: i32) -> u8 {
        match self {
            ClipRegion::Rect(r) => {
                if r.contains(x, y) {
                    255
                } else {
                    0
                }
            }
            ClipRegion::Mask(m) => m.get(x, y),
        }
    }

    pub fn intersect_rect(&self, rect: IntRect) -> Result<ClipRegion> {
        Ok(match self {
            ClipRegion::Rect(r) => ClipRegion::Rect(r.intersect(rect)),
            ClipRegion::Mask(m) => ClipRegion::Mask(m.cropped(rect)?),
        })
    }

    /// Intersects with a coverage mask. A mask built inside a rect clip's
    /// bounds needs no multiplication.
    pub fn intersect_mask(&self, mask: AlphaMask) -> Result<ClipRegion> {
        Ok(match self {
            ClipRegion::Rect(r) => ClipRegion::Mask(mask.cropped(*r)?),
            ClipRegion::Mask(m) => ClipRegion::Mask(m.intersect(&mask)?),
        })
    }
}
