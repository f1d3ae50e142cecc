use crate::coords::IntRect;
use crate::error::{Result, try_vec};

/// Run of pixels sharing one coverage value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub x: i32,
    pub len: u32,
    pub coverage: u8,
}

impl Span {
    #[inline]
    pub const fn new(x: i32, len: u32, coverage: u8) -> Self {
        Self { x, len, coverage }
    }

    #[inline]
    pub fn end(&self) -> i32 {
        self.x + self.len as i32
    }
}

/// Spans of one device row, sorted by `x` and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageRow {
    pub y: i32,
    pub spans: Vec<Span>,
}

impl CoverageRow {
    /// Coverage at column `x`, 0 outside every span.
    pub fn coverage_at(&self, x: i32) -> u8 {
        self.spans
            .iter()
            .find(|s| x >= s.x && x < s.end())
            .map_or(0, |s| s.coverage)
    }
}

/// Coverage rows captured from a rasterizer pass.
///
/// Rows appear in increasing `y`; rows with no coverage are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageStorage {
    rows: Vec<CoverageRow>,
}

impl CoverageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: CoverageRow) {
        if !row.spans.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn rows(&self) -> &[CoverageRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Smallest box containing every covered pixel.
    pub fn bounds(&self) -> IntRect {
        self.rows.iter().fold(IntRect::empty(), |acc, row| {
            match (row.spans.first(), row.spans.last()) {
                (Some(first), Some(last)) => acc.union(IntRect::new(first.x, row.y, last.end(), row.y + 1)),
                _ => acc,
            }
        })
    }

    pub fn coverage_at(&self, x: i32, y: i32) -> u8 {
        self.rows
            .binary_search_by_key(&y, |r| r.y)
            .map_or(0, |i| self.rows[i].coverage_at(x))
    }
}

impl FromIterator<CoverageRow> for CoverageStorage {
    fn from_iter<I: IntoIterator<Item = CoverageRow>>(iter: I) -> Self {
        let mut storage = CoverageStorage::new();
        for row in iter {
            storage.push(row);
        }
        storage
    }
}

/// Dense 8-bit coverage over a device box. Pixels outside `bounds` read as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    bounds: IntRect,
    data: Vec<u8>,
}

impl AlphaMask {
    /// Mask of `bounds` filled with `value`.
    pub fn filled(bounds: IntRect, value: u8) -> Result<Self> {
        let len = bounds.area() as usize;
        Ok(Self { bounds, data: try_vec(len, value)? })
    }

    /// Wraps row-major coverage covering `bounds`.
    pub fn from_vec(bounds: IntRect, data: Vec<u8>) -> Result<Self> {
        if data.len() != bounds.area() as usize {
            return Err(crate::error::invalid(format!(
                "{} mask values supplied for a {}x{} box",
                data.len(),
                bounds.width(),
                bounds.height()
            )));
        }
        Ok(Self { bounds, data })
    }

    /// Rasterizes captured coverage into a dense mask limited to `bounds`.
    pub fn from_storage(storage: &CoverageStorage, bounds: IntRect) -> Result<Self> {
        let mut mask = Self::filled(bounds, 0)?;
        for row in storage.rows() {
            if let Some(line) = mask.row_mut(row.y) {
                for span in &row.spans {
                    let x0 = span.x.max(bounds.x0);
                    let x1 = span.end().min(bounds.x1);
                    if x1 > x0 {
                        let a = (x0 - bounds.x0) as usize;
                        let b = (x1 - bounds.x0) as usize;
                        line[a..b].fill(span.coverage);
                    }
                }
            }
        }
        Ok(mask)
    }

    #[inline]
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if !self.bounds.contains(x, y) {
            return 0;
        }
        let w = self.bounds.width() as usize;
        self.data[(y - self.bounds.y0) as usize * w + (x - self.bounds.x0) as usize]
    }

    /// Row `y` over the mask's columns.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < self.bounds.y0 || y >= self.bounds.y1 {
            return None;
        }
        let w = self.bounds.width() as usize;
        let start = (y - self.bounds.y0) as usize * w;
        Some(&self.data[start..start + w])
    }

    fn row_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        if y < self.bounds.y0 || y >= self.bounds.y1 {
            return None;
        }
        let w = self.bounds.width() as usize;
        let start = (y - self.bounds.y0) as usize * w;
        Some(&mut self.data[start..start + w])
    }

    /// Copies `len` mask values starting at `(x, y)` into `out`, zero where
    /// the row leaves the mask.
    pub fn fill_span(&self, x: i32, y: i32, out: &mut [u8]) {
        out.fill(0);
        let Some(row) = self.row(y) else { return };
        let x0 = x.max(self.bounds.x0);
        let x1 = (x + out.len() as i32).min(self.bounds.x1);
        if x1 <= x0 {
            return;
        }
        let src = &row[(x0 - self.bounds.x0) as usize..(x1 - self.bounds.x0) as usize];
        out[(x0 - x) as usize..(x1 - x) as usize].copy_from_slice(src);
    }

    /// Copy limited to `bounds`; pixels outside the original read as 0.
    pub fn cropped(&self, bounds: IntRect) -> Result<AlphaMask> {
        let bounds = self.bounds.intersect(bounds);
        let mut out = Self::filled(bounds, 0)?;
        for y in bounds.y0..bounds.y1 {
            if let Some(line) = out.row_mut(y) {
                self.fill_span(bounds.x0, y, line);
            }
        }
        Ok(out)
    }

    /// Product of two masks, restricted to the overlap of their bounds.
    pub fn intersect(&self, other: &AlphaMask) -> Result<AlphaMask> {
        let bounds = self.bounds.intersect(other.bounds);
        let mut out = Self::filled(bounds, 0)?;
        for y in bounds.y0..bounds.y1 {
            if let Some(line) = out.row_mut(y) {
                for (i, v) in line.iter_mut().enumerate() {
                    let x = bounds.x0 + i as i32;
                    *v = crate::paint::mul_div255(self.get(x, y) as u32, other.get(x, y) as u32) as u8;
                }
            }
        }
        Ok(out)
    }

    /// Per-pixel maximum of `masks` over the union of their bounds, so
    /// overlapping coverage is counted once. `None` for no non-empty mask.
    pub fn union(masks: &[AlphaMask]) -> Result<Option<AlphaMask>> {
        let bounds = masks.iter().fold(IntRect::empty(), |acc, m| acc.union(m.bounds));
        if bounds.is_empty() {
            return Ok(None);
        }
        let mut out = Self::filled(bounds, 0)?;
        for m in masks {
            let b = m.bounds;
            for y in b.y0..b.y1 {
                let (Some(src), Some(line)) = (m.row(y), out.row_mut(y)) else { continue };
                let from = (b.x0 - bounds.x0) as usize;
                for (d, &s) in line[from..from + src.len()].iter_mut().zip(src) {
                    *d = (*d).max(s);
                }
            }
        }
        Ok(Some(out))
    }

    /// True when every pixel of `bounds` is fully covered.
    pub fn is_opaque(&self) -> bool {
        self.data.iter().all(|&v| v == 255)
    }
}
