//! Renders a demo scene with the software engine and writes it out as PNG.
//!
//! Usage: `lumen-studio [OUTPUT.png] [--font PATH]`

use std::f32::consts::PI;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_engine::geometry::{LineCap, LineJoin};
use lumen_engine::logging::{LoggingConfig, init_logging};
use lumen_engine::paint::{ColorStop, LinearGradient, RadialGradient, SpreadMode};
use lumen_engine::surface::{DisplayDevice, DisplayInit, MemoryDisplay, PixelFormat};
use lumen_engine::text::{FontBackend, FontId, FontdueBackend, RenderMode, TextStyle};
use lumen_engine::{Canvas, CornerRadii, EngineConfig, Paint, Point, Rect, Rgba8, StrokeStyle, Surface, Vec2};

const WIDTH: u32 = 480;
const HEIGHT: u32 = 320;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

struct Args {
    output: PathBuf,
    font: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut output = PathBuf::from("lumen-studio.png");
    let mut font = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--font" => font = Some(PathBuf::from(args.next().context("--font needs a path")?)),
            _ => output = PathBuf::from(arg),
        }
    }
    Ok(Args { output, font })
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let args = parse_args()?;
    let config = EngineConfig::from_env();
    log::info!("tolerance {} gamma {:?}", config.flatten_tolerance, config.gamma);

    let fonts = load_fonts(args.font.as_deref())?;
    let text = fonts.map(|(backend, id)| (config.text_context(backend), id));

    let mut display = MemoryDisplay::new(DisplayInit { width: WIDTH, height: HEIGHT, ..Default::default() })
        .context("creating memory display")?;

    let recording = {
        let mut canvas = Canvas::with_config(&config);
        if let Some((ctx, _)) = &text {
            canvas.set_text_context(Some(ctx.clone()));
        }
        canvas.attach_borrowed(display.back_buffer()?);
        canvas.begin_recording();
        draw_scene(&mut canvas, text.as_ref().map(|(_, id)| *id)).context("drawing scene")?;
        canvas.end_recording()
    };
    log::info!("scene recorded: {} ops, {} draws", recording.len(), recording.draw_count());
    display.swap_buffers()?;

    write_png(display.front_buffer(), &args.output)?;

    // The same recording, replayed at half size.
    let mut thumb = Canvas::with_config(&config);
    if let Some((ctx, _)) = &text {
        thumb.set_text_context(Some(ctx.clone()));
    }
    thumb.attach(Surface::new(WIDTH / 2, HEIGHT / 2)?);
    thumb.scale(0.5, 0.5)?;
    recording.replay(&mut thumb).context("replaying scene")?;
    let thumb = thumb.detach().context("thumbnail canvas lost its surface")?;
    write_png(&thumb, &args.output.with_extension("thumb.png"))?;

    if let Some((ctx, _)) = &text {
        let stats = ctx.cache.stats();
        log::info!("glyph cache: {} hits, {} misses, {} entries", stats.hits, stats.misses, stats.entries);
    }
    Ok(())
}

fn load_fonts(explicit: Option<&FsPath>) -> Result<Option<(Arc<dyn FontBackend>, FontId)>> {
    let mut backend = FontdueBackend::new();
    let id = match explicit {
        Some(path) => backend.load_font_file(path)?,
        None => {
            let Some(path) = FONT_CANDIDATES.iter().map(FsPath::new).find(|p| p.exists()) else {
                log::warn!("no system font found; rendering without text");
                return Ok(None);
            };
            backend.load_font_file(path)?
        }
    };
    let backend: Arc<dyn FontBackend> = Arc::new(backend);
    Ok(Some((backend, id)))
}

fn draw_scene(canvas: &mut Canvas<'_>, font: Option<FontId>) -> lumen_engine::Result<()> {
    let (w, h) = (WIDTH as f32, HEIGHT as f32);

    // ── background ────────────────────────────────────────────────────────
    canvas.set_paint(Paint::Linear(LinearGradient::new(
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, h),
        vec![ColorStop::new(0.0, Rgba8::opaque(24, 28, 40)), ColorStop::new(1.0, Rgba8::opaque(52, 60, 84))],
        SpreadMode::Pad,
    )))?;
    canvas.fill_rect(Rect::new(0.0, 0.0, w, h))?;

    // ── card with a soft shadow ───────────────────────────────────────────
    let card = Rect::new(32.0, 32.0, 200.0, 128.0);
    canvas.set_color(Rgba8::new(0, 0, 0, 160))?;
    canvas.fill_round_rect(card.translate(Vec2::new(6.0, 8.0)), CornerRadii::uniform(14.0, 14.0))?;
    canvas.blur(card.translate(Vec2::new(6.0, 8.0)).inflate(12.0), 6.0)?;
    canvas.set_color(Rgba8::opaque(236, 238, 244))?;
    canvas.fill_round_rect(card, CornerRadii::uniform(14.0, 14.0))?;
    canvas.set_stroke(StrokeStyle { cap: LineCap::Round, join: LineJoin::Round, ..StrokeStyle::new(3.0) })?;
    canvas.set_color(Rgba8::opaque(90, 110, 200))?;
    canvas.stroke_bezier(Point::new(48.0, 140.0), Point::new(96.0, 40.0), Point::new(160.0, 180.0), Point::new(216.0, 60.0))?;

    // ── orb ───────────────────────────────────────────────────────────────
    let center = Point::new(340.0, 100.0);
    canvas.set_paint(Paint::Radial(
        RadialGradient::new(
            center,
            64.0,
            vec![ColorStop::new(0.0, Rgba8::opaque(255, 214, 120)), ColorStop::new(1.0, Rgba8::opaque(200, 60, 40))],
            SpreadMode::Pad,
        )
        .with_focal(Point::new(320.0, 80.0)),
    ))?;
    canvas.fill_ellipse(center, 64.0, 64.0)?;
    canvas.set_color(Rgba8::WHITE)?;
    canvas.set_line_width(2.0)?;
    canvas.stroke_arc(center, 76.0, -PI * 0.75, PI * 0.5)?;

    // ── star inside a translucent group ───────────────────────────────────
    canvas.save()?;
    canvas.translate(120.0, 240.0)?;
    canvas.rotate(0.2)?;
    let star: Vec<Point> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { 56.0 } else { 24.0 };
            let a = i as f32 * PI / 5.0 - PI / 2.0;
            Point::new(a.cos() * r, a.sin() * r)
        })
        .collect();
    canvas.push_layer(180)?;
    canvas.set_color(Rgba8::opaque(110, 200, 140))?;
    canvas.fill_polygon(&star)?;
    canvas.set_color(Rgba8::opaque(30, 90, 60))?;
    canvas.stroke_polygon(&star)?;
    canvas.pop_layer()?;
    canvas.restore()?;

    // ── pie chart ─────────────────────────────────────────────────────────
    let pie = Point::new(340.0, 240.0);
    let slices = [(0.35, Rgba8::opaque(240, 120, 80)), (0.4, Rgba8::opaque(90, 160, 230)), (0.25, Rgba8::opaque(250, 210, 90))];
    let mut start = -PI / 2.0;
    for (share, color) in slices {
        let sweep = share * 2.0 * PI;
        canvas.set_color(color)?;
        canvas.fill_arc(pie, 56.0, start, sweep)?;
        start += sweep;
    }

    // ── text ──────────────────────────────────────────────────────────────
    if let Some(font) = font {
        canvas.set_color(Rgba8::opaque(30, 34, 48))?;
        let title = TextStyle { mode: RenderMode::Subpixel, ..TextStyle::new(font, 20.0) };
        let layout = canvas.draw_text("Lumen", Point::new(48.0, 72.0), &title)?;
        let caption = TextStyle { underline: true, ..TextStyle::new(font, 13.0) };
        canvas.draw_text("software vector graphics", Point::new(48.0, layout.bounds.max().y + 20.0), &caption)?;
    }
    Ok(())
}

fn write_png(surface: &Surface, path: &FsPath) -> Result<()> {
    let bytes = surface.convert_to(PixelFormat::Rgba8Straight)?;
    let image = image::RgbaImage::from_raw(surface.width(), surface.height(), bytes)
        .context("pixel buffer does not match the surface size")?;
    image.save(path).with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}x{} image to {}", surface.width(), surface.height(), path.display());
    Ok(())
}
