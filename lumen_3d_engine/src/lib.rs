/*!
# Lumen 3D Engine

Display kernel for interactive 3D scenes: a scene graph of renderable
objects, an auto-scaling camera, stereo rendering and mouse picking, drawn
through a pluggable immediate-mode graphics device.

## Architecture

- **DisplayKernel**: per-window camera, extent, lights and the render loop
- **Renderable**: capability trait every drawable object implements
- **Frame**: renderable owning children in a nested coordinate system
- **GraphicsDevice**: drawing surface trait, implemented by backend crates
- **RenderContext**: the activate / deactivate / swap hooks of a window
- **DisplayThread**: runs one kernel's render loop on a dedicated thread

Backends such as `lumen_3d_engine_device_software` provide concrete devices.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod math;
pub mod config;
pub mod graphics_device;
pub mod resource;
pub mod scene;
pub mod kernel;
pub mod events;
pub mod display;

// Main lumen3d namespace module
pub mod lumen3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Display kernel and its window-facing types
    pub use crate::kernel::{
        DisplayKernel, CameraSetup, PickResult, StereoMode, Eye,
        MouseMode, MouseButton, MouseManager, MouseEvent, MouseEventKind, MouseEventQueue, Modifiers,
    };

    pub use crate::config::DisplayConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics device sub-module
    pub mod render {
        pub use crate::graphics_device::{
            GraphicsDevice, RenderContext, CallbackContext,
            ClearFlags, ColorMask, DrawBuffer, Viewport, HitRecord, MAX_LIGHTS,
        };
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Input events and the display thread
    pub mod events {
        pub use crate::events::*;
    }

    pub mod display {
        pub use crate::display::*;
    }
}

// Re-export math library at crate root
pub use glam;
