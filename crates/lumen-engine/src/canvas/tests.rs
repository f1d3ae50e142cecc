use std::sync::Arc;

use super::Canvas;
use crate::composite::CompOp;
use crate::coords::{IntRect, Matrix, Point, Rect};
use crate::error::Error;
use crate::geometry::Path;
use crate::paint::{Filter, Paint, PremulRgba8, Rgba8};
use crate::raster::{AlphaMask, CompoundShape, FillRule};
use crate::surface::Surface;
use crate::text::{BoxFont, FontId, GlyphCache, RenderMode, TextContext, TextEncoding, TextStyle};

const RED: PremulRgba8 = PremulRgba8::from_premul(255, 0, 0, 255);
const BLUE: PremulRgba8 = PremulRgba8::from_premul(0, 0, 255, 255);
const CLEAR: PremulRgba8 = PremulRgba8::TRANSPARENT;

fn canvas(w: u32, h: u32) -> Canvas<'static> {
    let mut c = Canvas::new();
    c.attach(Surface::new(w, h).unwrap());
    c
}

fn px(c: &Canvas<'_>, x: u32, y: u32) -> PremulRgba8 {
    c.pixel(x, y).unwrap()
}

fn snapshot(c: &Canvas<'_>) -> Vec<PremulRgba8> {
    c.surface().unwrap().pixels().to_vec()
}

fn text_canvas(w: u32, h: u32, outlines: bool) -> Canvas<'static> {
    let ctx = TextContext::new(Arc::new(BoxFont { outlines }), Arc::new(GlyphCache::new(64)));
    let mut c = canvas(w, h).with_text(ctx);
    c.set_color(Rgba8::BLACK).unwrap();
    c
}

// ── basic fills ───────────────────────────────────────────────────────────

#[test]
fn triangle_fill_covers_only_its_interior() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    let mut p = Path::new();
    p.move_to(Point::new(0.0, 0.0)).unwrap();
    p.line_to(Point::new(10.0, 0.0)).unwrap();
    p.line_to(Point::new(10.0, 10.0)).unwrap();
    p.close();
    c.fill_path(&p).unwrap();

    assert_eq!(px(&c, 8, 2), RED);
    assert_eq!(px(&c, 9, 0), RED);
    assert_eq!(px(&c, 2, 8), CLEAR);
    assert_eq!(px(&c, 15, 15), CLEAR);
    assert_eq!(px(&c, 12, 5), CLEAR);
}

#[test]
fn later_rect_wins_where_rects_overlap() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    c.fill_rect(Rect::new(2.0, 2.0, 10.0, 10.0)).unwrap();
    c.set_color(Rgba8::BLUE).unwrap();
    c.fill_rect(Rect::new(6.0, 6.0, 10.0, 10.0)).unwrap();

    assert_eq!(px(&c, 3, 3), RED);
    assert_eq!(px(&c, 8, 8), BLUE);
    assert_eq!(px(&c, 14, 14), BLUE);
    assert_eq!(px(&c, 1, 1), CLEAR);
}

#[test]
fn save_restore_scopes_the_transform() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    c.save().unwrap();
    c.translate(10.0, 10.0).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
    c.restore().unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();

    for (x, y) in [(10, 10), (14, 14), (0, 0), (4, 4)] {
        assert_eq!(px(&c, x, y), RED, "({x}, {y})");
    }
    for (x, y) in [(5, 5), (9, 9), (15, 15), (12, 2)] {
        assert_eq!(px(&c, x, y), CLEAR, "({x}, {y})");
    }
}

#[test]
fn stroke_line_covers_its_width() {
    let mut c = canvas(20, 10);
    c.set_color(Rgba8::RED).unwrap();
    c.set_line_width(2.0).unwrap();
    c.stroke_line(Point::new(2.0, 5.0), Point::new(18.0, 5.0)).unwrap();
    assert_eq!(px(&c, 10, 4), RED);
    assert_eq!(px(&c, 10, 5), RED);
    assert_eq!(px(&c, 10, 7), CLEAR);
    assert_eq!(px(&c, 0, 5), CLEAR);
}

#[test]
fn scaled_stroke_grows_with_the_transform() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    c.scale(4.0, 4.0).unwrap();
    c.set_line_width(1.0).unwrap();
    c.stroke_line(Point::new(0.0, 2.0), Point::new(5.0, 2.0)).unwrap();
    // Device band y in [6, 10).
    assert_eq!(px(&c, 10, 6), RED);
    assert_eq!(px(&c, 10, 9), RED);
    assert_eq!(px(&c, 10, 11), CLEAR);
}

#[test]
fn opacity_scales_the_source() {
    let mut c = canvas(4, 4);
    c.set_color(Rgba8::WHITE).unwrap();
    c.set_opacity(128).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
    let p = px(&c, 1, 1);
    assert_eq!(p.a, 128);
    assert_eq!(p.r, 128);
}

#[test]
fn dst_operator_leaves_pixels_alone() {
    let mut c = canvas(8, 8);
    c.set_color(Rgba8::RED).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    let before = snapshot(&c);
    c.set_comp_op(CompOp::Dst).unwrap();
    c.set_color(Rgba8::BLUE).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    assert_eq!(snapshot(&c), before);
}

#[test]
fn even_odd_leaves_a_hole() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    c.set_fill_rule(FillRule::EvenOdd).unwrap();
    let mut p = Path::new();
    p.rect(Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
    p.rect(Rect::new(5.0, 5.0, 10.0, 10.0)).unwrap();
    c.fill_path(&p).unwrap();
    assert_eq!(px(&c, 2, 2), RED);
    assert_eq!(px(&c, 10, 10), CLEAR);
}

// ── clips ─────────────────────────────────────────────────────────────────

#[test]
fn clip_rect_limits_fills_until_restore() {
    let mut c = canvas(10, 10);
    c.set_color(Rgba8::RED).unwrap();
    c.save().unwrap();
    c.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    assert_eq!(px(&c, 2, 2), RED);
    assert_eq!(px(&c, 7, 7), CLEAR);
    c.restore().unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    assert_eq!(px(&c, 7, 7), RED);
}

#[test]
fn path_clip_masks_coverage() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    let mut circle = Path::new();
    circle.circle(Point::new(10.0, 10.0), 5.0).unwrap();
    c.clip_path(&circle, FillRule::NonZero).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
    assert_eq!(px(&c, 10, 10), RED);
    assert_eq!(px(&c, 1, 1), CLEAR);
    assert!(c.clip_contains(Point::new(10.5, 10.5)));
    assert!(!c.clip_contains(Point::new(1.5, 1.5)));
}

#[test]
fn rotated_clip_larger_than_the_target_keeps_everything() {
    let mut c = canvas(20, 20);
    c.set_color(Rgba8::RED).unwrap();
    c.rotate(0.1).unwrap();
    c.clip_rect(Rect::new(-1.0e5, -1.0e5, 2.0e5, 2.0e5)).unwrap();
    c.set_transform(Matrix::identity()).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
    assert!(snapshot(&c).iter().all(|&p| p == RED));
}

// ── errors ────────────────────────────────────────────────────────────────

#[test]
fn drawing_without_a_target_is_rejected() {
    let mut c = Canvas::new();
    let err = c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap_err();
    assert_eq!(err, Error::NotInitialized);
    assert_eq!(c.last_error(), Some(&Error::NotInitialized));
    c.clear_error();
    assert!(c.last_error().is_none());
}

#[test]
fn restore_without_save_underflows() {
    let mut c = canvas(2, 2);
    c.translate(3.0, 4.0).unwrap();
    assert_eq!(c.restore().unwrap_err(), Error::StateUnderflow);
    assert_eq!(c.transform_matrix(), Matrix::translate(3.0, 4.0));
    assert_eq!(c.state_depth(), 0);
}

#[test]
fn rejected_stroke_width_keeps_the_old_one() {
    let mut c = canvas(2, 2);
    c.set_line_width(3.0).unwrap();
    assert!(matches!(c.set_line_width(-1.0), Err(Error::InvalidArgument(_))));
    assert_eq!(c.state().stroke.width, 3.0);
}

#[test]
fn compound_fill_without_enough_paints_touches_nothing() {
    let mut c = canvas(8, 8);
    let mut shape = CompoundShape::new();
    let mut p = Path::new();
    p.rect(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    shape.add(0, p.clone()).add(3, p);
    let paints = [Arc::new(Paint::Solid(Rgba8::RED))];
    assert!(matches!(c.fill_compound(&shape, &paints), Err(Error::InvalidArgument(_))));
    assert!(snapshot(&c).iter().all(|p| *p == CLEAR));
}

// ── regions, compound, masks, bitmaps ─────────────────────────────────────

#[test]
fn region_union_is_painted_once() {
    let mut c = canvas(20, 10);
    c.set_color(Rgba8::new(255, 0, 0, 128)).unwrap();
    c.fill_region(&[Rect::new(0.0, 0.0, 12.0, 10.0), Rect::new(8.0, 0.0, 12.0, 10.0)]).unwrap();
    assert_eq!(px(&c, 10, 5), px(&c, 2, 5));
    assert_eq!(px(&c, 10, 5), px(&c, 18, 5));
}

#[test]
fn compound_styles_paint_in_order() {
    let mut c = canvas(20, 20);
    let mut shape = CompoundShape::new();
    let mut big = Path::new();
    big.rect(Rect::new(0.0, 0.0, 12.0, 12.0)).unwrap();
    let mut small = Path::new();
    small.rect(Rect::new(6.0, 6.0, 10.0, 10.0)).unwrap();
    shape.add(1, small).add(0, big);
    let paints = [Arc::new(Paint::Solid(Rgba8::RED)), Arc::new(Paint::Solid(Rgba8::BLUE))];
    c.fill_compound(&shape, &paints).unwrap();
    assert_eq!(px(&c, 2, 2), RED);
    assert_eq!(px(&c, 8, 8), BLUE);
    assert_eq!(px(&c, 14, 14), BLUE);
}

#[test]
fn mask_fill_ignores_the_transform() {
    let mut c = canvas(10, 10);
    c.set_color(Rgba8::RED).unwrap();
    c.translate(5.0, 5.0).unwrap();
    let mask = AlphaMask::filled(IntRect::new(2, 2, 4, 4), 255).unwrap();
    c.fill_mask(Arc::new(mask)).unwrap();
    assert_eq!(px(&c, 3, 3), RED);
    assert_eq!(px(&c, 7, 7), CLEAR);
}

#[test]
fn bitmap_is_stretched_onto_its_rect() {
    let mut c = canvas(12, 12);
    let green = Rgba8::GREEN.premultiply();
    let image = Surface::from_pixels(2, 2, vec![green; 4]).unwrap();
    c.draw_bitmap(Arc::new(image), Rect::new(4.0, 4.0, 4.0, 4.0), Filter::Nearest).unwrap();
    assert_eq!(px(&c, 5, 5), green);
    assert_eq!(px(&c, 7, 7), green);
    assert_eq!(px(&c, 9, 9), CLEAR);
    assert_eq!(px(&c, 3, 3), CLEAR);
}

#[test]
fn clear_respects_the_clip() {
    let mut c = canvas(20, 4);
    c.set_color(Rgba8::RED).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 20.0, 4.0)).unwrap();
    c.clip_rect(Rect::new(0.0, 0.0, 10.0, 4.0)).unwrap();
    c.clear(CLEAR).unwrap();
    assert_eq!(px(&c, 5, 1), CLEAR);
    assert_eq!(px(&c, 15, 1), RED);
}

// ── layers & effects ──────────────────────────────────────────────────────

#[test]
fn layer_applies_group_opacity_once() {
    let mut c = canvas(20, 10);
    c.set_color(Rgba8::RED).unwrap();
    c.push_layer(128).unwrap();
    assert_eq!(c.layer_depth(), 1);
    c.fill_rect(Rect::new(0.0, 0.0, 12.0, 10.0)).unwrap();
    c.fill_rect(Rect::new(8.0, 0.0, 12.0, 10.0)).unwrap();
    // Nothing reaches the target until the group closes.
    assert_eq!(px(&c, 2, 2), CLEAR);
    c.pop_layer().unwrap();
    assert_eq!(c.layer_depth(), 0);
    let single = px(&c, 2, 2);
    assert_eq!(single.a, 128);
    assert_eq!(px(&c, 10, 2), single);
}

#[test]
fn masked_layer_only_shows_through_the_mask() {
    let mut c = canvas(10, 10);
    c.set_color(Rgba8::RED).unwrap();
    let mask = AlphaMask::filled(IntRect::new(0, 0, 5, 10), 255).unwrap();
    c.push_layer_masked(255, Some(Arc::new(mask))).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    c.pop_layer().unwrap();
    assert_eq!(px(&c, 2, 2), RED);
    assert_eq!(px(&c, 7, 2), CLEAR);
}

#[test]
fn pop_without_layer_underflows() {
    let mut c = canvas(2, 2);
    assert_eq!(c.pop_layer().unwrap_err(), Error::StateUnderflow);
}

#[test]
fn blur_softens_an_edge() {
    let mut c = canvas(20, 4);
    c.set_color(Rgba8::RED).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 10.0, 4.0)).unwrap();
    c.blur(Rect::new(0.0, 0.0, 20.0, 4.0), 6.0).unwrap();
    let edge = px(&c, 10, 2);
    assert!(edge.a > 0 && edge.a < 255, "edge alpha {}", edge.a);
    assert!(px(&c, 9, 2).a > edge.a);
    assert_eq!(px(&c, 0, 2), RED);
}

#[test]
fn huge_blur_radius_on_a_flat_area_changes_nothing() {
    let mut c = canvas(8, 8);
    c.set_color(Rgba8::RED).unwrap();
    c.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    c.blur(Rect::new(0.0, 0.0, 2.0, 2.0), 3.0e7).unwrap();
    assert!(snapshot(&c).iter().all(|&p| p == RED));
}

#[test]
fn blur_rejects_a_negative_radius() {
    let mut c = canvas(2, 2);
    assert!(matches!(c.blur(Rect::new(0.0, 0.0, 2.0, 2.0), -1.0), Err(Error::InvalidArgument(_))));
}

// ── recording ─────────────────────────────────────────────────────────────

#[test]
fn replay_reproduces_the_recorded_pixels() {
    let mut c = canvas(20, 20);
    c.begin_recording();
    c.set_color(Rgba8::RED).unwrap();
    c.save().unwrap();
    c.translate(4.0, 4.0).unwrap();
    c.fill_ellipse(Point::new(5.0, 5.0), 4.0, 3.0).unwrap();
    c.restore().unwrap();
    c.set_line_width(2.0).unwrap();
    c.stroke_polyline(&[Point::new(1.0, 18.0), Point::new(18.0, 12.0)]).unwrap();
    // Failed calls are not recorded.
    let _ = c.restore();
    let rec = c.end_recording();
    assert!(!c.is_recording());
    assert_eq!(rec.draw_count(), 2);

    let mut other = canvas(20, 20);
    other.set_color(Rgba8::BLUE).unwrap();
    rec.replay(&mut other).unwrap();
    assert_eq!(snapshot(&other), snapshot(&c));
    assert_eq!(other.state_depth(), 0);
    assert_eq!(*other.state().paint, Paint::Solid(Rgba8::BLUE));
}

// ── text ──────────────────────────────────────────────────────────────────

#[test]
fn measure_matches_draw() {
    let mut c = text_canvas(60, 30, false);
    let style = TextStyle::new(FontId(0), 20.0);
    let origin = Point::new(2.0, 20.0);
    let measured = c.measure_text("AB", origin, &style).unwrap();
    let drawn = c.draw_text("AB", origin, &style).unwrap();
    assert_eq!(measured.bounds, drawn.bounds);
    assert_eq!(measured.advance, drawn.advance);
}

#[test]
fn gray_glyph_boxes_are_painted() {
    let mut c = text_canvas(40, 30, false);
    c.draw_text("A", Point::new(2.0, 20.0), &TextStyle::new(FontId(0), 20.0)).unwrap();
    // Box is 10x14 above the baseline.
    assert_eq!(px(&c, 5, 10).a, 255);
    assert_eq!(px(&c, 15, 10).a, 0);
    assert_eq!(px(&c, 5, 22).a, 0);
}

#[test]
fn vector_glyphs_fill_the_same_box() {
    let mut c = text_canvas(40, 30, true);
    let style = TextStyle { mode: RenderMode::Vector, ..TextStyle::new(FontId(0), 20.0) };
    c.draw_text("A", Point::new(2.0, 20.0), &style).unwrap();
    assert_eq!(px(&c, 5, 10).a, 255);
    assert_eq!(px(&c, 15, 10).a, 0);
}

#[test]
fn underline_sits_below_the_baseline() {
    let mut c = text_canvas(40, 30, false);
    let style = TextStyle { underline: true, ..TextStyle::new(FontId(0), 20.0) };
    let layout = c.draw_text(" ", Point::new(2.0, 20.0), &style).unwrap();
    assert_eq!(layout.decorations.len(), 1);
    // descent 4 -> centered at y = 22.
    assert!(px(&c, 5, 22).a > 0);
    assert_eq!(px(&c, 5, 10).a, 0);
}

#[test]
fn translucent_strikethrough_does_not_darken_the_glyph() {
    for mode in [RenderMode::Grayscale, RenderMode::Vector, RenderMode::Subpixel] {
        let mut c = text_canvas(40, 30, mode == RenderMode::Vector);
        c.set_color(Rgba8::new(0, 0, 0, 128)).unwrap();
        let style = TextStyle { strikethrough: true, mode, ..TextStyle::new(FontId(0), 20.0) };
        c.draw_text("A", Point::new(2.0, 20.0), &style).unwrap();
        // The line crosses the glyph box around y = 15 and runs past it to x = 14.
        assert_eq!(px(&c, 6, 15), px(&c, 6, 10), "{mode:?}");
        assert!(px(&c, 13, 15).a > 0, "{mode:?}");
    }
}

#[test]
fn subpixel_text_under_rotation_still_draws() {
    let mut c = text_canvas(40, 40, false);
    c.translate(20.0, 20.0).unwrap();
    c.rotate(0.3).unwrap();
    let style = TextStyle { mode: RenderMode::Subpixel, ..TextStyle::new(FontId(0), 12.0) };
    c.draw_text("A", Point::new(0.0, 0.0), &style).unwrap();
    assert!(snapshot(&c).iter().any(|p| p.a > 0));
}

#[test]
fn text_needs_a_context_and_a_target() {
    let mut c = canvas(4, 4);
    let style = TextStyle::new(FontId(0), 10.0);
    assert!(matches!(c.draw_text("A", Point::new(0.0, 0.0), &style), Err(Error::Unsupported(_))));

    let ctx = TextContext::new(Arc::new(BoxFont { outlines: false }), Arc::new(GlyphCache::new(4)));
    let mut detached = Canvas::new().with_text(ctx);
    assert_eq!(detached.draw_text("A", Point::new(0.0, 0.0), &style).unwrap_err(), Error::NotInitialized);
    assert!(detached.measure_text("A", Point::new(0.0, 0.0), &style).is_ok());
}

#[test]
fn encoded_text_is_decoded_before_drawing() {
    let mut c = text_canvas(40, 30, false);
    let style = TextStyle::new(FontId(0), 10.0);
    let layout = c.draw_text_encoded(&[0x41, 0xE9], TextEncoding::Latin1, Point::new(1.0, 20.0), &style).unwrap();
    assert_eq!(layout.glyphs.iter().map(|g| g.ch).collect::<String>(), "Aé");
    assert!(matches!(
        c.draw_text_encoded(&[0xFF, 0xFE], TextEncoding::Utf8, Point::new(1.0, 20.0), &style),
        Err(Error::InvalidArgument(_))
    ));
}
