//! Display kernel module
//!
//! Per-window camera, render loop and picking, plus the mouse handling that
//! drives them.

mod display_kernel;
mod mouse;
mod mouse_manager;
mod stereo;
mod timer;

pub use display_kernel::{
    DisplayKernel, CameraSetup, PickResult, fov_tangents,
    EXTENT_INTERVAL, MAX_SCENE_SCALE, GCF_DRIFT_LIMIT,
};
pub use mouse::{MouseMode, MouseButton};
pub use mouse_manager::{MouseManager, MouseEvent, MouseEventKind, MouseEventQueue, Modifiers};
pub use stereo::{StereoMode, Eye};
pub use timer::{FrameTimer, INITIAL_CYCLE_TIME};
