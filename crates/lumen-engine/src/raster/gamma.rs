/// Coverage response curve applied after accumulation.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum Gamma {
    /// Coverage passes through unchanged.
    #[default]
    None,
    /// `255 * (c / 255) ^ g`.
    Power(f32),
    /// Hard edge: coverage at or above the threshold becomes full, the rest
    /// becomes zero. `Threshold(128)` is the non-antialiased rasterizer.
    Threshold(u8),
}

impl Gamma {
    /// Aliased rendering.
    pub const ALIASED: Gamma = Gamma::Threshold(128);

    pub fn lut(self) -> GammaLut {
        let mut table = [0u8; 256];
        for (i, out) in table.iter_mut().enumerate() {
            *out = match self {
                Gamma::None => i as u8,
                Gamma::Power(g) => {
                    let g = if g.is_finite() && g > 0.0 { g } else { 1.0 };
                    ((i as f32 / 255.0).powf(g) * 255.0 + 0.5) as u8
                }
                Gamma::Threshold(t) => {
                    if i as u8 >= t.max(1) { 255 } else { 0 }
                }
            };
        }
        GammaLut { table }
    }
}

/// Precomputed [`Gamma`] curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaLut {
    table: [u8; 256],
}

impl Default for GammaLut {
    fn default() -> Self {
        Gamma::None.lut()
    }
}

impl GammaLut {
    #[inline]
    pub fn apply(&self, coverage: u8) -> u8 {
        self.table[coverage as usize]
    }

    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| v as usize == i)
    }
}
