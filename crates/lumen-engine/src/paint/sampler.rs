use std::sync::Arc;

use crate::coords::{Matrix, Vec2};
use crate::error::{Result, invalid};

use super::gradient::{ConicGradient, DiamondGradient, LinearGradient, RadialGradient, SpreadMode};
use super::pattern::Pattern;
use super::ramp::ColorRamp;
use super::{Paint, PremulRgba8};

#[derive(Debug)]
enum Shape<'a> {
    Linear(&'a LinearGradient),
    Radial(&'a RadialGradient),
    Diamond(&'a DiamondGradient),
    Conic(&'a ConicGradient),
}

impl Shape<'_> {
    #[inline]
    fn parameter(&self, p: Vec2) -> f32 {
        match self {
            Shape::Linear(g) => g.parameter(p),
            Shape::Radial(g) => g.parameter(p),
            Shape::Diamond(g) => g.parameter(p),
            Shape::Conic(g) => g.parameter(p),
        }
    }
}

#[derive(Debug)]
enum Source<'a> {
    Solid(PremulRgba8),
    Gradient { shape: Shape<'a>, ramp: Arc<ColorRamp>, spread: SpreadMode },
    Pattern(&'a Pattern),
}

/// Per-draw paint evaluator.
///
/// Maps device pixel centers back into paint space through the inverse of
/// `ctm × paint.transform` and produces premultiplied colors.
#[derive(Debug)]
pub struct PaintSampler<'a> {
    source: Source<'a>,
    inverse: Matrix,
}

impl<'a> PaintSampler<'a> {
    pub fn new(paint: &'a Paint, ctm: &Matrix) -> Result<Self> {
        paint.validate()?;
        let source = match paint {
            Paint::Solid(c) => {
                return Ok(Self { source: Source::Solid(c.premultiply()), inverse: Matrix::identity() });
            }
            Paint::Linear(g) => gradient(Shape::Linear(g), &g.colors)?,
            Paint::Radial(g) => gradient(Shape::Radial(g), &g.colors)?,
            Paint::Diamond(g) => gradient(Shape::Diamond(g), &g.colors)?,
            Paint::Conic(g) => gradient(Shape::Conic(g), &g.colors)?,
            Paint::Pattern(p) => Source::Pattern(p),
        };
        let inverse = (*ctm * paint.transform())
            .invert()
            .ok_or_else(|| invalid("paint transform is not invertible"))?;
        Ok(Self { source, inverse })
    }

    /// The constant color when the paint does not vary per pixel.
    #[inline]
    pub fn solid(&self) -> Option<PremulRgba8> {
        match self.source {
            Source::Solid(c) => Some(c),
            _ => None,
        }
    }

    /// Color at the center of device pixel `(x, y)`.
    pub fn sample(&self, x: i32, y: i32) -> PremulRgba8 {
        let mut out = [PremulRgba8::TRANSPARENT];
        self.fill_span(x, y, &mut out);
        out[0]
    }

    /// Writes colors for `out.len()` pixels starting at device `(x, y)`.
    pub fn fill_span(&self, x: i32, y: i32, out: &mut [PremulRgba8]) {
        let start = self.inverse.apply(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
        let step = self.inverse.apply_vector(Vec2::new(1.0, 0.0));
        match &self.source {
            Source::Solid(c) => out.fill(*c),
            Source::Gradient { shape, ramp, spread } => {
                for (i, px) in out.iter_mut().enumerate() {
                    let p = start + step * i as f32;
                    *px = ramp.sample(shape.parameter(p), *spread);
                }
            }
            Source::Pattern(pattern) => {
                for (i, px) in out.iter_mut().enumerate() {
                    let p = start + step * i as f32;
                    *px = pattern.sample(p.x, p.y);
                }
            }
        }
    }
}

fn gradient<'a>(shape: Shape<'a>, colors: &'a super::GradientColors) -> Result<Source<'a>> {
    Ok(Source::Gradient { shape, ramp: colors.ramp()?, spread: colors.spread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{ColorStop, Extend, Filter, Rgba8};
    use crate::surface::Surface;

    fn black_to_white() -> Paint {
        Paint::Linear(LinearGradient::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            vec![ColorStop::new(0.0, Rgba8::BLACK), ColorStop::new(1.0, Rgba8::WHITE)],
            SpreadMode::Pad,
        ))
    }

    #[test]
    fn solid_fills_constant() {
        let paint = Paint::solid(Rgba8::RED);
        let s = PaintSampler::new(&paint, &Matrix::identity()).unwrap();
        let mut row = [PremulRgba8::TRANSPARENT; 4];
        s.fill_span(0, 0, &mut row);
        assert!(row.iter().all(|p| *p == Rgba8::RED.premultiply()));
        assert_eq!(s.solid(), Some(Rgba8::RED.premultiply()));
    }

    #[test]
    fn linear_gradient_is_monotonic_and_bounded() {
        let paint = black_to_white();
        let s = PaintSampler::new(&paint, &Matrix::identity()).unwrap();
        let mut row = vec![PremulRgba8::TRANSPARENT; 120];
        s.fill_span(-10, 0, &mut row);
        for w in row.windows(2) {
            assert!(w[1].r >= w[0].r);
            assert_eq!(w[1].a, 255);
        }
        assert_eq!(row[0], Rgba8::BLACK.premultiply());
        assert_eq!(row[119], Rgba8::WHITE.premultiply());
    }

    #[test]
    fn ctm_moves_gradient_with_geometry() {
        let paint = black_to_white();
        let plain = PaintSampler::new(&paint, &Matrix::identity()).unwrap();
        let shifted = PaintSampler::new(&paint, &Matrix::translate(50.0, 0.0)).unwrap();
        assert_eq!(plain.sample(20, 0), shifted.sample(70, 0));
    }

    #[test]
    fn singular_ctm_is_rejected() {
        let paint = black_to_white();
        assert!(PaintSampler::new(&paint, &Matrix::scale(0.0, 0.0)).is_err());
    }

    #[test]
    fn pattern_repeats_in_device_space() {
        let mut img = Surface::new(2, 1).unwrap();
        img.row_mut(0).copy_from_slice(&[Rgba8::RED.premultiply(), Rgba8::BLUE.premultiply()]);
        let paint = Paint::Pattern(Pattern::new(Arc::new(img), Extend::Repeat, Filter::Nearest));
        let s = PaintSampler::new(&paint, &Matrix::identity()).unwrap();
        let mut row = [PremulRgba8::TRANSPARENT; 4];
        s.fill_span(0, 0, &mut row);
        assert_eq!(row[2], Rgba8::RED.premultiply());
        assert_eq!(row[3], Rgba8::BLUE.premultiply());
    }
}
