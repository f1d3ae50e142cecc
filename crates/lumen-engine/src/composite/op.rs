use crate::paint::{PremulRgba8, mul_div255};

/// Compositing operator: how a source pixel combines with the destination.
///
/// The first twelve are the Porter-Duff operators; the rest are separable
/// blend modes whose coverage composites like `SrcOver`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CompOp {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Darken,
    Lighten,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Exclusion,
}

impl CompOp {
    pub const ALL: [CompOp; 19] = [
        CompOp::Clear,
        CompOp::Src,
        CompOp::Dst,
        CompOp::SrcOver,
        CompOp::DstOver,
        CompOp::SrcIn,
        CompOp::DstIn,
        CompOp::SrcOut,
        CompOp::DstOut,
        CompOp::SrcAtop,
        CompOp::DstAtop,
        CompOp::Xor,
        CompOp::Darken,
        CompOp::Lighten,
        CompOp::Multiply,
        CompOp::Screen,
        CompOp::Overlay,
        CompOp::Difference,
        CompOp::Exclusion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CompOp::Clear => "clear",
            CompOp::Src => "src",
            CompOp::Dst => "dst",
            CompOp::SrcOver => "src-over",
            CompOp::DstOver => "dst-over",
            CompOp::SrcIn => "src-in",
            CompOp::DstIn => "dst-in",
            CompOp::SrcOut => "src-out",
            CompOp::DstOut => "dst-out",
            CompOp::SrcAtop => "src-atop",
            CompOp::DstAtop => "dst-atop",
            CompOp::Xor => "xor",
            CompOp::Darken => "darken",
            CompOp::Lighten => "lighten",
            CompOp::Multiply => "multiply",
            CompOp::Screen => "screen",
            CompOp::Overlay => "overlay",
            CompOp::Difference => "difference",
            CompOp::Exclusion => "exclusion",
        }
    }

    /// Looks an operator up by name (`"src-over"`, `"SrcOver"`, `"src_over"`).
    ///
    /// Unknown names fall back to [`CompOp::SrcOver`].
    pub fn from_name(name: &str) -> CompOp {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match CompOp::ALL.iter().find(|op| op.name().replace('-', "") == key) {
            Some(op) => *op,
            None => {
                log::warn!("unknown compositing operator {name:?}, using src-over");
                CompOp::SrcOver
            }
        }
    }

    /// True when a fully transparent source leaves every destination pixel
    /// as it was. Unbounded operators (`Clear`, `Src`, `SrcIn`, `SrcOut`)
    /// still write where the source is transparent.
    ///
    /// `DstIn` and `DstAtop` would clear the destination under a transparent
    /// source; the engine treats that case as a no-op instead.
    pub fn transparent_source_is_noop(self) -> bool {
        !matches!(self, CompOp::Clear | CompOp::Src | CompOp::SrcIn | CompOp::SrcOut)
    }

    /// Bounded operators only affect pixels under the source, so partial
    /// coverage can scale the source. Unbounded ones interpolate between the
    /// destination and the blended result instead.
    pub fn is_bounded(self) -> bool {
        !matches!(
            self,
            CompOp::Clear | CompOp::Src | CompOp::SrcIn | CompOp::DstIn | CompOp::SrcOut | CompOp::DstAtop
        )
    }
}

#[inline]
fn md(a: u32, b: u32) -> u32 {
    mul_div255(a, b)
}

/// Composites one premultiplied source pixel onto a destination pixel.
pub fn blend_pixel(op: CompOp, src: PremulRgba8, dst: PremulRgba8) -> PremulRgba8 {
    if src.a == 0 && op.transparent_source_is_noop() {
        return dst;
    }
    let (sa, da) = (src.a as u32, dst.a as u32);
    let isa = 255 - sa;
    let ida = 255 - da;

    // Porter-Duff: result = src * fa + dst * fb, applied to all four channels.
    let porter_duff = |fa: u32, fb: u32| {
        let ch = |s: u8, d: u8| (md(s as u32, fa) + md(d as u32, fb)).min(255) as u8;
        PremulRgba8::from_premul(ch(src.r, dst.r), ch(src.g, dst.g), ch(src.b, dst.b), ch(src.a, dst.a))
    };

    // Separable modes: alpha is src-over, color is f(s, d) plus the
    // uncovered parts of each side.
    let separable = |f: &dyn Fn(u32, u32) -> i32| {
        let a = sa + da - md(sa, da);
        let ch = |s: u8, d: u8| {
            let (s, d) = (s as u32, d as u32);
            let v = f(s, d) + md(s, ida) as i32 + md(d, isa) as i32;
            v.clamp(0, a as i32) as u8
        };
        PremulRgba8::from_premul(ch(src.r, dst.r), ch(src.g, dst.g), ch(src.b, dst.b), a as u8)
    };

    match op {
        CompOp::Clear => PremulRgba8::TRANSPARENT,
        CompOp::Src => src,
        CompOp::Dst => dst,
        CompOp::SrcOver => {
            if sa == 255 {
                src
            } else {
                porter_duff(255, isa)
            }
        }
        CompOp::DstOver => porter_duff(ida, 255),
        CompOp::SrcIn => porter_duff(da, 0),
        CompOp::DstIn => porter_duff(0, sa),
        CompOp::SrcOut => porter_duff(ida, 0),
        CompOp::DstOut => porter_duff(0, isa),
        CompOp::SrcAtop => porter_duff(da, isa),
        CompOp::DstAtop => porter_duff(ida, sa),
        CompOp::Xor => porter_duff(ida, isa),
        CompOp::Darken => separable(&|s, d| md(s, da).min(md(d, sa)) as i32),
        CompOp::Lighten => separable(&|s, d| md(s, da).max(md(d, sa)) as i32),
        CompOp::Multiply => separable(&|s, d| md(s, d) as i32),
        CompOp::Screen => {
            separable(&|s, d| (s + d) as i32 - md(s, d) as i32 - md(s, ida) as i32 - md(d, isa) as i32)
        }
        CompOp::Overlay => separable(&|s, d| {
            if 2 * d <= da {
                2 * md(s, d) as i32
            } else {
                md(sa, da) as i32 - 2 * md(da.saturating_sub(d), sa.saturating_sub(s)) as i32
            }
        }),
        CompOp::Difference => separable(&|s, d| {
            let overlap = md(s, da).min(md(d, sa)) as i32;
            (s + d) as i32 - 2 * overlap - md(s, ida) as i32 - md(d, isa) as i32
        }),
        CompOp::Exclusion => {
            separable(&|s, d| (s + d) as i32 - 2 * md(s, d) as i32 - md(s, ida) as i32 - md(d, isa) as i32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> PremulRgba8 {
        PremulRgba8::from_premul(r, g, b, a)
    }

    fn samples() -> Vec<PremulRgba8> {
        let mut v = Vec::new();
        for a in [0u8, 1, 64, 128, 200, 254, 255] {
            for f in [0u32, 37, 128, 255] {
                let c = mul_div255(f, a as u32) as u8;
                v.push(px(c, a / 2, a, a));
                v.push(px(a, c, 0, a));
            }
        }
        v
    }

    // ── porter-duff ──────────────────────────────────────────────────────

    #[test]
    fn src_over_opaque_source_replaces_destination() {
        for dst in samples() {
            for src in samples().into_iter().filter(|s| s.a == 255) {
                assert_eq!(blend_pixel(CompOp::SrcOver, src, dst), src);
            }
        }
    }

    #[test]
    fn src_over_half_on_opaque() {
        let out = blend_pixel(CompOp::SrcOver, px(128, 0, 0, 128), px(0, 0, 255, 255));
        assert_eq!(out, px(128, 0, 127, 255));
    }

    #[test]
    fn in_and_out_partition_the_source() {
        let src = px(200, 100, 50, 200);
        let dst = px(0, 0, 90, 90);
        let i = blend_pixel(CompOp::SrcIn, src, dst);
        let o = blend_pixel(CompOp::SrcOut, src, dst);
        assert!((i.a as i32 + o.a as i32 - src.a as i32).abs() <= 1);
    }

    #[test]
    fn clear_and_dst() {
        let (s, d) = (px(10, 20, 30, 40), px(1, 2, 3, 4));
        assert_eq!(blend_pixel(CompOp::Clear, s, d), PremulRgba8::TRANSPARENT);
        assert_eq!(blend_pixel(CompOp::Dst, s, d), d);
        assert_eq!(blend_pixel(CompOp::Src, s, d), s);
    }

    #[test]
    fn xor_of_opaque_pixels_is_transparent() {
        let out = blend_pixel(CompOp::Xor, px(255, 0, 0, 255), px(0, 255, 0, 255));
        assert_eq!(out, PremulRgba8::TRANSPARENT);
    }

    // ── transparent source ───────────────────────────────────────────────

    #[test]
    fn transparent_source_leaves_destination_for_dst_ops() {
        for op in [CompOp::Dst, CompOp::DstOver, CompOp::DstIn, CompOp::DstAtop] {
            for dst in samples() {
                assert_eq!(blend_pixel(op, PremulRgba8::TRANSPARENT, dst), dst, "{op:?}");
            }
        }
    }

    #[test]
    fn bounded_ops_ignore_transparent_source() {
        for op in CompOp::ALL.into_iter().filter(|op| op.is_bounded()) {
            for dst in samples() {
                assert_eq!(blend_pixel(op, PremulRgba8::TRANSPARENT, dst), dst, "{op:?}");
            }
        }
    }

    // ── blend modes ──────────────────────────────────────────────────────

    #[test]
    fn results_stay_premultiplied() {
        for op in CompOp::ALL {
            for s in samples() {
                for d in samples() {
                    let o = blend_pixel(op, s, d);
                    assert!(o.r <= o.a && o.g <= o.a && o.b <= o.a, "{op:?} {s:?} {d:?} -> {o:?}");
                }
            }
        }
    }

    #[test]
    fn multiply_and_screen_on_opaque() {
        let s = px(255, 128, 0, 255);
        let d = px(128, 128, 128, 255);
        assert_eq!(blend_pixel(CompOp::Multiply, s, d), px(128, 64, 0, 255));
        assert_eq!(blend_pixel(CompOp::Screen, s, d), px(255, 192, 128, 255));
    }

    #[test]
    fn darken_lighten_difference() {
        let s = px(200, 50, 100, 255);
        let d = px(100, 150, 100, 255);
        assert_eq!(blend_pixel(CompOp::Darken, s, d), px(100, 50, 100, 255));
        assert_eq!(blend_pixel(CompOp::Lighten, s, d), px(200, 150, 100, 255));
        assert_eq!(blend_pixel(CompOp::Difference, s, d), px(100, 100, 0, 255));
    }

    #[test]
    fn blend_mode_over_transparent_is_source() {
        let s = px(120, 60, 30, 200);
        for op in [CompOp::Multiply, CompOp::Screen, CompOp::Overlay, CompOp::Darken, CompOp::Exclusion] {
            assert_eq!(blend_pixel(op, s, PremulRgba8::TRANSPARENT), s, "{op:?}");
        }
    }

    // ── names ────────────────────────────────────────────────────────────

    #[test]
    fn names_round_trip() {
        for op in CompOp::ALL {
            assert_eq!(CompOp::from_name(op.name()), op);
        }
        assert_eq!(CompOp::from_name("DstAtop"), CompOp::DstAtop);
        assert_eq!(CompOp::from_name("src_in"), CompOp::SrcIn);
    }

    #[test]
    fn unknown_name_falls_back_to_src_over() {
        assert_eq!(CompOp::from_name("hard-light"), CompOp::SrcOver);
    }
}
