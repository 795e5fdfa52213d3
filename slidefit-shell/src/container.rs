//! Container width sources.

use tokio::sync::watch;

/// Synchronous read of the box width text wraps at. `None` means the
/// container has not been measured yet; the shell then falls back to
/// `FitConfig::default_container_width`.
pub trait ContainerSource: Send {
    fn width(&self) -> Option<f32>;
}

/// A container that never reports a width.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unmeasured;

impl ContainerSource for Unmeasured {
    fn width(&self) -> Option<f32> {
        None
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedWidth(pub f32);

impl ContainerSource for FixedWidth {
    fn width(&self) -> Option<f32> {
        Some(self.0)
    }
}

/// Width published by the host's layout (e.g. on resize).
impl ContainerSource for watch::Receiver<Option<f32>> {
    fn width(&self) -> Option<f32> {
        *self.borrow()
    }
}

/// Non-finite and non-positive widths count as unmeasured.
pub(crate) fn usable_width(source: &dyn ContainerSource) -> Option<f32> {
    source.width().filter(|w| w.is_finite() && *w > 0.0)
}
