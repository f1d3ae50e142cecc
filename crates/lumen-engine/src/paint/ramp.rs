use crate::error::{Result, invalid};

use super::PremulRgba8;
use super::gradient::{ColorStop, SpreadMode};

/// Number of entries in a gradient lookup table.
pub const RAMP_SIZE: usize = 1024;

/// Precomputed premultiplied colors for `t` in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    lut: Vec<PremulRgba8>,
    opaque: bool,
}

impl ColorRamp {
    /// Builds the table from a stop list.
    ///
    /// Offsets are clamped to [0, 1] and sorted stably. Colors are
    /// interpolated in premultiplied space; two stops sharing an offset
    /// produce a hard step.
    pub fn build(stops: &[ColorStop]) -> Result<Self> {
        if stops.is_empty() {
            return Err(invalid("gradient needs at least one color stop"));
        }
        if let Some(s) = stops.iter().find(|s| !s.offset.is_finite()) {
            return Err(invalid(format!("gradient stop offset {} is not finite", s.offset)));
        }

        let mut sorted: Vec<ColorStop> = stops
            .iter()
            .map(|s| ColorStop::premul(s.offset.clamp(0.0, 1.0), s.color))
            .collect();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        let mut lut = Vec::with_capacity(RAMP_SIZE);
        let mut j = 0usize;
        for i in 0..RAMP_SIZE {
            let t = i as f32 / (RAMP_SIZE - 1) as f32;
            while j + 1 < sorted.len() && sorted[j + 1].offset <= t {
                j += 1;
            }
            let color = if t < sorted[0].offset || j + 1 == sorted.len() {
                if t < sorted[0].offset { sorted[0].color } else { sorted[j].color }
            } else {
                let a = sorted[j];
                let b = sorted[j + 1];
                let span = b.offset - a.offset;
                let f = if span > 0.0 { (t - a.offset) / span } else { 0.0 };
                mix(a.color, b.color, f)
            };
            lut.push(color);
        }

        let opaque = lut.iter().all(|c| c.is_opaque());
        Ok(Self { lut, opaque })
    }

    /// Color at a normalized parameter in [0, 1].
    #[inline]
    pub fn lookup(&self, t: f32) -> PremulRgba8 {
        let idx = (t * (RAMP_SIZE - 1) as f32 + 0.5) as usize;
        self.lut[idx.min(RAMP_SIZE - 1)]
    }

    /// Applies `spread` to a raw parameter, then looks it up.
    #[inline]
    pub fn sample(&self, t: f32, spread: SpreadMode) -> PremulRgba8 {
        self.lookup(spread.apply(t))
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn entries(&self) -> &[PremulRgba8] {
        &self.lut
    }
}

#[inline]
fn mix(a: PremulRgba8, b: PremulRgba8, f: f32) -> PremulRgba8 {
    let ch = |x: u8, y: u8| {
        let v = x as f32 + (y as f32 - x as f32) * f;
        v.round().clamp(0.0, 255.0) as u8
    };
    PremulRgba8::from_premul(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), ch(a.a, b.a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::paint::Rgba8;

    fn two_stop(a: Rgba8, b: Rgba8) -> ColorRamp {
        ColorRamp::build(&[ColorStop::new(0.0, a), ColorStop::new(1.0, b)]).unwrap()
    }

    #[test]
    fn empty_stops_are_rejected() {
        assert!(matches!(ColorRamp::build(&[]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn endpoints_match_stops() {
        let ramp = two_stop(Rgba8::RED, Rgba8::BLUE);
        assert_eq!(ramp.lookup(0.0), Rgba8::RED.premultiply());
        assert_eq!(ramp.lookup(1.0), Rgba8::BLUE.premultiply());
        assert!(ramp.is_opaque());
    }

    #[test]
    fn two_stop_ramp_is_monotonic() {
        let ramp = two_stop(Rgba8::new(10, 200, 30, 255), Rgba8::new(250, 20, 90, 255));
        let e = ramp.entries();
        for w in e.windows(2) {
            assert!(w[1].r >= w[0].r);
            assert!(w[1].g <= w[0].g);
            assert!(w[1].b >= w[0].b);
        }
    }

    #[test]
    fn duplicate_offsets_make_hard_step() {
        let ramp = ColorRamp::build(&[
            ColorStop::new(0.0, Rgba8::RED),
            ColorStop::new(0.5, Rgba8::RED),
            ColorStop::new(0.5, Rgba8::BLUE),
            ColorStop::new(1.0, Rgba8::BLUE),
        ])
        .unwrap();
        assert_eq!(ramp.lookup(0.49), Rgba8::RED.premultiply());
        assert_eq!(ramp.lookup(0.51), Rgba8::BLUE.premultiply());
    }

    #[test]
    fn single_stop_is_solid() {
        let ramp = ColorRamp::build(&[ColorStop::new(0.3, Rgba8::GREEN)]).unwrap();
        assert_eq!(ramp.lookup(0.0), Rgba8::GREEN.premultiply());
        assert_eq!(ramp.lookup(1.0), Rgba8::GREEN.premultiply());
    }

    #[test]
    fn unsorted_and_out_of_range_stops_are_normalized() {
        let ramp = ColorRamp::build(&[
            ColorStop::new(2.0, Rgba8::WHITE),
            ColorStop::new(-1.0, Rgba8::BLACK),
        ])
        .unwrap();
        assert_eq!(ramp.lookup(0.0), Rgba8::BLACK.premultiply());
        assert_eq!(ramp.lookup(1.0), Rgba8::WHITE.premultiply());
    }

    #[test]
    fn translucent_stop_clears_opaque_flag() {
        let ramp = two_stop(Rgba8::RED, Rgba8::RED.with_alpha(0));
        assert!(!ramp.is_opaque());
        for c in ramp.entries() {
            c.debug_assert_premul();
        }
    }
}
