//! Engine-wide defaults.

use std::str::FromStr;
use std::sync::Arc;

use crate::geometry::DEFAULT_TOLERANCE;
use crate::raster::Gamma;
use crate::text::{FontBackend, GlyphCache, TextContext, TextQuality};

/// Defaults applied to new canvases and glyph caches.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum distance in device pixels between a curve and its flattened
    /// polyline.
    pub flatten_tolerance: f32,

    /// Coverage curve for antialiased fills.
    pub gamma: Gamma,

    /// Number of glyphs the shared cache keeps before evicting.
    pub glyph_cache_capacity: usize,

    /// Subpixel filter and text gamma.
    pub text: TextQuality,

    /// Debug-assert on lock misuse instead of only returning an error.
    pub strict_locks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flatten_tolerance: DEFAULT_TOLERANCE,
            gamma: Gamma::None,
            glyph_cache_capacity: 1024,
            text: TextQuality::default(),
            strict_locks: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `LUMEN_TOLERANCE`, `LUMEN_GAMMA` and
    /// `LUMEN_GLYPH_CACHE`. Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_vars(|name| std::env::var(name).ok());
        config
    }

    /// Glyph cache sized and locked as configured.
    pub fn glyph_cache(&self) -> GlyphCache {
        GlyphCache::with_strict_locks(self.glyph_cache_capacity, self.strict_locks)
    }

    /// Text context over `backend` with a fresh cache from this config.
    pub fn text_context(&self, backend: Arc<dyn FontBackend>) -> TextContext {
        TextContext::new(backend, Arc::new(self.glyph_cache())).with_quality(self.text)
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(t) = parse_var::<f32>(&var, "LUMEN_TOLERANCE") {
            if t.is_finite() && t > 0.0 {
                self.flatten_tolerance = t;
            } else {
                log::warn!("ignoring LUMEN_TOLERANCE={t}: must be positive");
            }
        }
        if let Some(raw) = var("LUMEN_GAMMA") {
            match parse_gamma(&raw) {
                Some(g) => self.gamma = g,
                None => log::warn!("ignoring LUMEN_GAMMA={raw:?}: expected none, threshold:<0-255> or a number"),
            }
        }
        if let Some(n) = parse_var::<usize>(&var, "LUMEN_GLYPH_CACHE") {
            self.glyph_cache_capacity = n;
        }
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = var(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

/// `none`, `threshold:<n>` or a power exponent.
fn parse_gamma(raw: &str) -> Option<Gamma> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Some(Gamma::None);
    }
    if let Some(t) = raw.strip_prefix("threshold:") {
        return t.trim().parse().ok().map(Gamma::Threshold);
    }
    raw.parse::<f32>().ok().filter(|g| g.is_finite() && *g > 0.0).map(Gamma::Power)
}
