use crate::paint::{PremulRgba8, mul_div255};

use super::op::{CompOp, blend_pixel};

/// Source colors for one span.
#[derive(Debug, Copy, Clone)]
pub enum SpanSource<'a> {
    Solid(PremulRgba8),
    /// One color per destination pixel.
    Pixels(&'a [PremulRgba8]),
}

impl SpanSource<'_> {
    #[inline]
    fn at(&self, i: usize) -> PremulRgba8 {
        match self {
            SpanSource::Solid(c) => *c,
            SpanSource::Pixels(p) => p[i],
        }
    }
}

#[inline]
fn blend_covered(op: CompOp, src: PremulRgba8, dst: PremulRgba8, cov: u8) -> PremulRgba8 {
    if cov == 0 {
        return dst;
    }
    if op.is_bounded() {
        blend_pixel(op, src.scale(cov), dst)
    } else {
        let out = blend_pixel(op, src, dst);
        if cov == 255 { out } else { dst.lerp(out, cov) }
    }
}

/// Composites `src` onto `dst` with a uniform span coverage, global opacity
/// and an optional per-pixel mask (clip mask, layer mask or glyph coverage).
///
/// The mask multiplies into coverage and is never renormalized.
pub fn blend_span(
    op: CompOp,
    dst: &mut [PremulRgba8],
    src: SpanSource<'_>,
    coverage: u8,
    opacity: u8,
    mask: Option<&[u8]>,
) {
    let base = mul_div255(coverage as u32, opacity as u32);
    if base == 0 || op == CompOp::Dst || dst.is_empty() {
        return;
    }
    if let SpanSource::Solid(c) = src {
        if c.a == 0 && op.transparent_source_is_noop() {
            return;
        }
        // Opaque solid src-over with full coverage is a plain fill.
        if mask.is_none() && base == 255 && (op == CompOp::Src || (op == CompOp::SrcOver && c.a == 255)) {
            dst.fill(c);
            return;
        }
    }
    for (i, d) in dst.iter_mut().enumerate() {
        let cov = match mask {
            Some(m) => mul_div255(base, m.get(i).copied().unwrap_or(0) as u32) as u8,
            None => base as u8,
        };
        *d = blend_covered(op, src.at(i), *d, cov);
    }
}

/// Subpixel variant: `coverage` holds red, green and blue coverage for each
/// pixel. Alpha follows the strongest of the three.
pub fn blend_span_lcd(op: CompOp, dst: &mut [PremulRgba8], src: SpanSource<'_>, coverage: &[[u8; 3]], opacity: u8) {
    if opacity == 0 || op == CompOp::Dst {
        return;
    }
    for (i, (d, cov)) in dst.iter_mut().zip(coverage).enumerate() {
        let [cr, cg, cb] = cov.map(|c| mul_div255(c as u32, opacity as u32) as u8);
        let ca = cr.max(cg).max(cb);
        if ca == 0 {
            continue;
        }
        let full = blend_pixel(op, src.at(i), *d);
        let mix = |dc: u8, rc: u8, t: u8| {
            (mul_div255(dc as u32, 255 - t as u32) + mul_div255(rc as u32, t as u32)).min(255) as u8
        };
        let a = mix(d.a, full.a, ca);
        *d = PremulRgba8::from_premul(
            mix(d.r, full.r, cr).min(a),
            mix(d.g, full.g, cg).min(a),
            mix(d.b, full.b, cb).min(a),
            a,
        );
    }
}
