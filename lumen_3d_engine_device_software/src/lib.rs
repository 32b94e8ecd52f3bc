/*!
# Lumen 3D Engine - Software Device Backend

CPU implementation of the lumen_3d_engine graphics device and render
context traits.

The software device tracks the whole fixed-function state and performs
clip-space hit testing, which makes selection mode (and therefore picking)
fully functional without a GPU. Rendering counts visible triangles instead
of producing pixels, so the backend suits headless displays and tests.

Enable the `trace-calls` feature to echo device calls through the engine
logger at trace severity.
*/

mod clip;
mod selection;
mod stats;
mod software_context;
mod software_device;

pub use software_context::{SoftwareContext, ContextProbe};
pub use software_device::{SoftwareGraphicsDevice, Overlay};
pub use stats::{DeviceStats, StatsSnapshot};

/// Build a software backend for a display thread
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use lumen_3d_engine::lumen3d::{DisplayKernel, DisplayConfig};
/// use lumen_3d_engine::lumen3d::display::DisplayThread;
///
/// let kernel = Arc::new(DisplayKernel::new());
/// let handle = DisplayThread::start(kernel, &DisplayConfig::default(), || {
///     Ok(lumen_3d_engine_device_software::backend())
/// })?;
/// # Ok::<(), lumen_3d_engine::lumen3d::Error>(())
/// ```
pub fn backend() -> lumen_3d_engine::lumen3d::display::Backend {
    (Box::new(SoftwareContext::new()), Box::new(SoftwareGraphicsDevice::new()))
}

pub mod lumen3d {
    pub use crate::software_context::{SoftwareContext, ContextProbe};
    pub use crate::software_device::{SoftwareGraphicsDevice, Overlay};
    pub use crate::stats::{DeviceStats, StatsSnapshot};
}
