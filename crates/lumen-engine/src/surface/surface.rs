use crate::coords::IntRect;
use crate::error::{Error, Result, invalid, try_vec};
use crate::paint::pattern::{Extend, Filter, sample_image};
use crate::paint::PremulRgba8;

use super::PixelFormat;

/// Owned premultiplied RGBA8 pixel buffer, rows packed without padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<PremulRgba8>,
}

impl Surface {
    /// Allocates a transparent surface. Zero-sized surfaces are valid.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = pixel_count(width, height)?;
        Ok(Self { width, height, pixels: try_vec(len, PremulRgba8::TRANSPARENT)? })
    }

    /// Wraps existing premultiplied pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<PremulRgba8>) -> Result<Self> {
        let len = pixel_count(width, height)?;
        if pixels.len() != len {
            return Err(invalid(format!(
                "{} pixels supplied for a {width}x{height} surface",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Copies external bytes in any supported format.
    pub fn from_bytes(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        bytes: &[u8],
    ) -> Result<Self> {
        check_layout(width, height, stride, bytes.len())?;
        let mut out = Self::new(width, height)?;
        let row_bytes = width as usize * format.bytes_per_pixel();
        for y in 0..height as usize {
            let src = &bytes[y * stride..y * stride + row_bytes];
            let dst = out.row_mut(y as u32);
            for (px, chunk) in dst.iter_mut().zip(src.chunks_exact(4)) {
                *px = format.decode([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
        }
        Ok(out)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    #[inline]
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn pixels(&self) -> &[PremulRgba8] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [PremulRgba8] {
        &mut self.pixels
    }

    /// Raw premultiplied RGBA bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[PremulRgba8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [PremulRgba8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.pixels[start..start + w]
    }

    pub fn fill(&mut self, color: PremulRgba8) {
        self.pixels.fill(color);
    }

    /// Mutable view used by the canvas and compositor.
    #[inline]
    pub fn as_mut(&mut self) -> SurfaceMut<'_> {
        SurfaceMut { width: self.width, height: self.height, stride: self.width as usize, pixels: &mut self.pixels }
    }

    /// Resamples into a new surface of the given size.
    pub fn scaled(&self, width: u32, height: u32, filter: Filter) -> Result<Surface> {
        let mut out = Surface::new(width, height)?;
        if self.is_empty() || out.is_empty() {
            return Ok(out);
        }
        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;
        for y in 0..height {
            let v = (y as f32 + 0.5) * sy;
            for (x, px) in out.row_mut(y).iter_mut().enumerate() {
                let u = (x as f32 + 0.5) * sx;
                *px = sample_image(self, u, v, Extend::Clamp, filter);
            }
        }
        log::debug!("scaled {}x{} surface to {width}x{height} ({filter:?})", self.width, self.height);
        Ok(out)
    }

    /// Encodes the pixels into a tightly packed buffer of `format`.
    pub fn convert_to(&self, format: PixelFormat) -> Result<Vec<u8>> {
        let mut out = try_vec(self.pixels.len() * format.bytes_per_pixel(), 0u8)?;
        for (chunk, px) in out.chunks_exact_mut(4).zip(&self.pixels) {
            chunk.copy_from_slice(&format.encode(*px));
        }
        Ok(out)
    }
}

/// Borrowed pixel target: rows of `width` pixels spaced `stride` pixels apart.
#[derive(Debug)]
pub struct SurfaceMut<'a> {
    width: u32,
    height: u32,
    stride: usize,
    pixels: &'a mut [PremulRgba8],
}

impl<'a> SurfaceMut<'a> {
    /// Attaches to an externally owned byte buffer.
    ///
    /// Only [`PixelFormat::Rgba8Premul`] can be drawn into in place; other
    /// formats must go through [`Surface::from_bytes`]. `stride` is in bytes
    /// and must be a multiple of four.
    pub fn from_bytes(
        bytes: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if format != PixelFormat::Rgba8Premul {
            return Err(Error::Unsupported("in-place drawing requires premultiplied RGBA8"));
        }
        if stride % 4 != 0 {
            return Err(invalid(format!("stride {stride} is not a multiple of 4")));
        }
        let needed = check_layout(width, height, stride, bytes.len())?;
        let pixels: &mut [PremulRgba8] = bytemuck::try_cast_slice_mut(&mut bytes[..needed])
            .map_err(|e| invalid(format!("buffer cannot hold RGBA8 pixels: {e}")))?;
        Ok(Self { width, height, stride: stride / 4, pixels })
    }

    /// Attaches to already-typed pixels with a pixel stride.
    pub fn from_pixels(pixels: &'a mut [PremulRgba8], width: u32, height: u32, stride: usize) -> Result<Self> {
        check_layout(width, height, stride * 4, pixels.len() * 4)?;
        Ok(Self { width, height, stride, pixels })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shorter-lived view of the same pixels.
    #[inline]
    pub fn reborrow(&mut self) -> SurfaceMut<'_> {
        SurfaceMut { width: self.width, height: self.height, stride: self.stride, pixels: &mut *self.pixels }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.stride + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[PremulRgba8] {
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.width as usize]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [PremulRgba8] {
        let start = y as usize * self.stride;
        &mut self.pixels[start..start + self.width as usize]
    }

    pub fn fill(&mut self, color: PremulRgba8) {
        for y in 0..self.height {
            self.row_mut(y).fill(color);
        }
    }

    /// Copies the visible pixels into an owned surface.
    pub fn to_surface(&self) -> Result<Surface> {
        let mut out = Surface::new(self.width, self.height)?;
        for y in 0..self.height {
            out.row_mut(y).copy_from_slice(self.row(y));
        }
        Ok(out)
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|n| n.checked_mul(4).is_some())
        .ok_or(Error::OutOfMemory)
}

/// Validates a strided layout and returns the number of bytes it spans.
fn check_layout(width: u32, height: u32, stride: usize, len: usize) -> Result<usize> {
    let row = width as usize * 4;
    if stride < row {
        return Err(invalid(format!("stride {stride} is shorter than a {width}-pixel row")));
    }
    if height == 0 {
        return Ok(0);
    }
    let needed = stride
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(row))
        .ok_or(Error::OutOfMemory)?;
    if len < needed {
        return Err(invalid(format!("buffer of {len} bytes is too small, need {needed}")));
    }
    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Rgba8;

    // ── owned ─────────────────────────────────────────────────────────────

    #[test]
    fn new_surface_is_transparent() {
        let s = Surface::new(3, 2).unwrap();
        assert_eq!(s.pixels().len(), 6);
        assert!(s.pixels().iter().all(|p| p.is_transparent()));
        assert_eq!(s.stride(), 12);
    }

    #[test]
    fn from_pixels_checks_length() {
        let r = Surface::from_pixels(2, 2, vec![PremulRgba8::TRANSPARENT; 3]);
        assert!(matches!(r, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn convert_round_trips_through_bgra() {
        let mut s = Surface::new(2, 1).unwrap();
        s.row_mut(0)[0] = Rgba8::RED.premultiply();
        s.row_mut(0)[1] = Rgba8::new(0, 0, 255, 128).premultiply();
        let bytes = s.convert_to(PixelFormat::Bgra8Premul).unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 255, 255]);
        let back = Surface::from_bytes(2, 1, 8, PixelFormat::Bgra8Premul, &bytes).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn nearest_upscale_replicates_pixels() {
        let mut s = Surface::new(2, 1).unwrap();
        s.row_mut(0)[0] = Rgba8::RED.premultiply();
        s.row_mut(0)[1] = Rgba8::BLUE.premultiply();
        let big = s.scaled(4, 2, Filter::Nearest).unwrap();
        assert_eq!(big.row(1), &[
            Rgba8::RED.premultiply(),
            Rgba8::RED.premultiply(),
            Rgba8::BLUE.premultiply(),
            Rgba8::BLUE.premultiply(),
        ]);
    }

    // ── borrowed ──────────────────────────────────────────────────────────

    #[test]
    fn borrowed_view_respects_stride() {
        let mut bytes = vec![0u8; 2 * 16];
        {
            let mut view = SurfaceMut::from_bytes(&mut bytes, 2, 2, 16, PixelFormat::Rgba8Premul).unwrap();
            view.fill(PremulRgba8::from_premul(1, 2, 3, 4));
        }
        assert_eq!(&bytes[0..8], &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(&bytes[8..16], &[0; 8]);
        assert_eq!(&bytes[16..24], &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn borrowed_rejects_other_formats() {
        let mut bytes = vec![0u8; 16];
        let r = SurfaceMut::from_bytes(&mut bytes, 2, 2, 8, PixelFormat::Bgra8Premul);
        assert!(matches!(r, Err(Error::Unsupported(_))));
    }

    #[test]
    fn borrowed_rejects_short_buffer() {
        let mut bytes = vec![0u8; 15];
        let r = SurfaceMut::from_bytes(&mut bytes, 2, 2, 8, PixelFormat::Rgba8Premul);
        assert!(matches!(r, Err(Error::InvalidArgument(_))));
    }
}
