/// GraphicsDevice trait - the immediate-mode drawing surface the engine renders through.
///
/// The display kernel drives one device per window. Calls are issued in
/// order from the render thread; errors raised by the driver are collected
/// and reported by [`GraphicsDevice::check_error`], which the kernel calls
/// after each frame and each pick.

use bitflags::bitflags;
use glam::Vec3;
use crate::error::Result;
use crate::math::{GpuMatrix, Rgba};
use crate::resource::Material;
use crate::scene::LightParams;

/// Number of fixed light units a device exposes
pub const MAX_LIGHTS: usize = 8;

bitflags! {
    /// Buffers reset by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

bitflags! {
    /// Color channels that accept writes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorMask: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Target buffer for subsequent draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawBuffer {
    Back,
    BackLeft,
    BackRight,
}

/// Pixel rectangle, origin at the lower left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// `[x, y, width, height]` as floats
    pub fn to_array(&self) -> [f64; 4] {
        [self.x as f64, self.y as f64, self.width as f64, self.height as f64]
    }
}

/// One selection-mode hit: the name stack at the time of the hit and the
/// depth range it covered, scaled from `[0, 1]` to the full `u32` range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRecord {
    pub names: Vec<u32>,
    pub min_depth: u32,
    pub max_depth: u32,
}

impl HitRecord {
    /// Words the record occupies in a selection buffer
    pub fn word_count(&self) -> usize {
        3 + self.names.len()
    }

    /// Scale a `[0, 1]` depth to the stored integer form
    pub fn encode_depth(depth: f64) -> u32 {
        (depth.clamp(0.0, 1.0) * u32::MAX as f64).round() as u32
    }

    /// Nearest depth as a `[0, 1]` value
    pub fn min_depth_unit(&self) -> f64 {
        self.min_depth as f64 / u32::MAX as f64
    }
}

/// Immediate-mode rendering device
///
/// Matrices are column-major single precision. `push_transform` multiplies
/// onto the current modelview and `pop_transform` restores the previous one.
pub trait GraphicsDevice: Send {
    /// Report and clear the first error raised since the previous check
    fn check_error(&mut self) -> Result<()>;

    fn clear(&mut self, flags: ClearFlags);

    fn set_clear_color(&mut self, color: Rgba);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_color_mask(&mut self, mask: ColorMask);

    fn set_draw_buffer(&mut self, buffer: DrawBuffer);

    fn set_depth_test(&mut self, enabled: bool);

    fn set_projection(&mut self, projection: &GpuMatrix);

    /// Replace the modelview and empty the transform stack
    fn set_modelview(&mut self, modelview: &GpuMatrix);

    fn push_transform(&mut self, transform: &GpuMatrix);

    fn pop_transform(&mut self) -> Result<()>;

    fn enable_lighting(&mut self, ambient: Rgba);

    /// Configure and switch on fixed light `unit` (below [`MAX_LIGHTS`])
    fn enable_light(&mut self, unit: usize, params: &LightParams);

    /// Switch lighting and every light unit off
    fn disable_lighting(&mut self);

    fn set_color(&mut self, color: Rgba);

    fn bind_material(&mut self, material: Option<&Material>);

    /// Draw a triangle list, three vertices per triangle
    fn draw_triangles(&mut self, vertices: &[Vec3]);

    /// Draw text anchored at a window position in pixels
    fn draw_overlay(&mut self, x: f32, y: f32, text: &str, color: Rgba);

    /// Enter selection mode with room for `capacity` words of hit records
    fn begin_selection(&mut self, capacity: usize);

    fn push_name(&mut self, name: u32);

    fn load_name(&mut self, name: u32);

    fn pop_name(&mut self);

    /// Leave selection mode and return the hits.
    ///
    /// # Errors
    ///
    /// [`Error::PickBufferOverflow`](crate::error::Error::PickBufferOverflow)
    /// when the records did not fit in the capacity given to `begin_selection`.
    fn end_selection(&mut self) -> Result<Vec<HitRecord>>;
}
