/// Graphics device module - the drawing surface and window hooks

pub mod graphics_device;
pub mod render_context;

pub use graphics_device::*;
pub use render_context::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
