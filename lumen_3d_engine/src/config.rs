/// Display configuration
///
/// Everything needed to open a display window and initialize its kernel.
/// Fields are public; `DisplayKernel::with_config` validates them.

use crate::error::Result;
use crate::kernel::{MouseMode, StereoMode};
use crate::math::Rgba;

/// Display configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Window title, also used as the display's registry name
    pub title: String,
    /// Window position in screen pixels
    pub x: i32,
    pub y: i32,
    /// Window size in pixels
    pub width: u32,
    pub height: u32,
    /// Field of view in radians, in `(0, pi)`
    pub fov: f64,
    pub stereo: StereoMode,
    pub autoscale: bool,
    pub autocenter: bool,
    /// Autoscale to a cube instead of a per-axis box
    pub uniform: bool,
    pub background: Rgba,
    pub foreground: Rgba,
    pub mouse_mode: MouseMode,
    /// Level-of-detail bias handed to every shape
    pub lod_adjust: i32,
    /// Draw the smoothed cycle time in the lower left corner
    pub show_render_speed: bool,
    /// Terminate the process on a fatal graphics error instead of only
    /// stopping the display thread
    pub abort_on_fatal: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Lumen3D".to_string(),
            x: 0,
            y: 0,
            width: 384,
            height: 256,
            fov: 60f64.to_radians(),
            stereo: StereoMode::NoStereo,
            autoscale: true,
            autocenter: false,
            uniform: true,
            background: Rgba::BLACK,
            foreground: Rgba::WHITE,
            mouse_mode: MouseMode::ZoomRotate,
            lod_adjust: 0,
            show_render_speed: false,
            abort_on_fatal: true,
        }
    }
}

impl DisplayConfig {
    /// Check the values a kernel cannot start with
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for an empty window or a field of view
    /// outside `(0, pi)`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(crate::engine_config_err!(
                "lumen3d::DisplayConfig",
                "Window size must be non-zero, got {}x{}.",
                self.width, self.height
            ));
        }
        if !(self.fov > 0.0 && self.fov < std::f64::consts::PI) {
            return Err(crate::engine_config_err!(
                "lumen3d::DisplayConfig",
                "Field of view must lie in (0, pi), got {}.",
                self.fov
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = DisplayConfig::default();
        assert_eq!((config.width, config.height), (384, 256));
        assert!((config.fov - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
        assert!(config.autoscale && config.uniform && !config.autocenter);
        assert_eq!(config.foreground, Rgba::WHITE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let zero_fov = DisplayConfig { fov: 0.0, ..DisplayConfig::default() };
        assert!(matches!(zero_fov.validate(), Err(Error::InvalidConfiguration(_))));
        let straight = DisplayConfig { fov: std::f64::consts::PI, ..DisplayConfig::default() };
        assert!(straight.validate().is_err());
        let empty = DisplayConfig { height: 0, ..DisplayConfig::default() };
        assert!(empty.validate().is_err());
    }
}
