use std::time::{Duration, Instant};

use crate::coords::IntRect;
use crate::error::{Error, Result, invalid};
use crate::paint::Rgba8;

use super::{PixelFormat, Surface, SurfaceMut};

/// Optional features of a display device. Query before calling the gated methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCaps {
    pub double_buffer: bool,
    pub retrace_wait: bool,
    pub overlay: bool,
    /// Scan-out formats, preferred first.
    pub formats: Vec<PixelFormat>,
}

/// Hardware overlay placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    pub rect: IntRect,
    /// Pixels of this color in the primary plane show the overlay through.
    pub color_key: Option<Rgba8>,
    pub alpha: u8,
}

/// Surface/display collaborator.
///
/// Drawing always goes through [`DisplayDevice::back_buffer`]; the other
/// calls return [`Error::Unsupported`] when the matching capability is absent.
pub trait DisplayDevice {
    fn capabilities(&self) -> DisplayCaps;

    fn size(&self) -> (u32, u32);

    /// Buffer the next frame is drawn into.
    fn back_buffer(&mut self) -> Result<SurfaceMut<'_>>;

    /// Presents the back buffer.
    fn swap_buffers(&mut self) -> Result<()>;

    /// Blocks until the next vertical retrace.
    ///
    /// Returns [`Error::Timeout`] instead of blocking past `timeout`.
    fn wait_for_retrace(&mut self, timeout: Duration) -> Result<()>;

    fn configure_overlay(&mut self, config: OverlayConfig) -> Result<()>;
}

/// Picks the first supported format, honoring a preference when available.
pub fn choose_format(caps: &DisplayCaps, preferred: Option<PixelFormat>) -> Option<PixelFormat> {
    if let Some(p) = preferred.filter(|p| caps.formats.contains(p)) {
        return Some(p);
    }
    caps.formats.first().copied()
}

/// Initialization parameters for [`MemoryDisplay`].
#[derive(Debug, Clone)]
pub struct DisplayInit {
    pub width: u32,
    pub height: u32,

    /// Keep separate front and back buffers.
    pub double_buffer: bool,

    /// Simulated refresh period. `None` disables retrace waiting.
    pub refresh_interval: Option<Duration>,

    /// Expose a single overlay plane.
    pub overlay: bool,
}

impl Default for DisplayInit {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            double_buffer: true,
            refresh_interval: Some(Duration::from_micros(16_667)),
            overlay: false,
        }
    }
}

/// Software display: buffers live in memory, retraces are simulated from a
/// fixed refresh period.
#[derive(Debug)]
pub struct MemoryDisplay {
    init: DisplayInit,
    buffers: Vec<Surface>,
    front: usize,
    epoch: Instant,
    overlay: Option<OverlayConfig>,
    presented: u64,
}

impl MemoryDisplay {
    pub fn new(init: DisplayInit) -> Result<Self> {
        let count = if init.double_buffer { 2 } else { 1 };
        let buffers = (0..count)
            .map(|_| Surface::new(init.width, init.height))
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "memory display {}x{} ({} buffer(s), refresh {:?})",
            init.width,
            init.height,
            count,
            init.refresh_interval
        );
        Ok(Self { init, buffers, front: 0, epoch: Instant::now(), overlay: None, presented: 0 })
    }

    /// Last presented frame (the only buffer when single-buffered).
    pub fn front_buffer(&self) -> &Surface {
        &self.buffers[self.front]
    }

    pub fn overlay(&self) -> Option<&OverlayConfig> {
        self.overlay.as_ref()
    }

    /// Number of completed swaps.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    fn back_index(&self) -> usize {
        (self.front + 1) % self.buffers.len()
    }

    /// Time from `now` until the next simulated retrace.
    fn until_next_retrace(&self, interval: Duration, now: Instant) -> Duration {
        let period = interval.as_nanos().max(1);
        let elapsed = now.duration_since(self.epoch).as_nanos();
        let remaining = period - elapsed % period;
        Duration::from_nanos(remaining.min(u64::MAX as u128) as u64)
    }
}

impl DisplayDevice for MemoryDisplay {
    fn capabilities(&self) -> DisplayCaps {
        DisplayCaps {
            double_buffer: self.init.double_buffer,
            retrace_wait: self.init.refresh_interval.is_some(),
            overlay: self.init.overlay,
            formats: vec![PixelFormat::Rgba8Premul, PixelFormat::Bgra8Premul],
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.init.width, self.init.height)
    }

    fn back_buffer(&mut self) -> Result<SurfaceMut<'_>> {
        let idx = self.back_index();
        Ok(self.buffers[idx].as_mut())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        if !self.init.double_buffer {
            return Err(Error::Unsupported("display is single-buffered"));
        }
        self.front = self.back_index();
        self.presented += 1;
        log::trace!("presented frame {}", self.presented);
        Ok(())
    }

    fn wait_for_retrace(&mut self, timeout: Duration) -> Result<()> {
        let Some(interval) = self.init.refresh_interval else {
            return Err(Error::Unsupported("display has no retrace signal"));
        };
        let wait = self.until_next_retrace(interval, Instant::now());
        if wait > timeout {
            return Err(Error::Timeout);
        }
        std::thread::sleep(wait);
        Ok(())
    }

    fn configure_overlay(&mut self, config: OverlayConfig) -> Result<()> {
        if !self.init.overlay {
            return Err(Error::Unsupported("display has no overlay plane"));
        }
        let screen = IntRect::from_size(self.init.width, self.init.height);
        if config.rect.is_empty() || !screen.contains_rect(config.rect) {
            return Err(invalid(format!("overlay rect {:?} is outside the screen", config.rect)));
        }
        self.overlay = Some(config);
        Ok(())
    }
}
