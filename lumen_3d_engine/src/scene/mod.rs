//! Scene module
//!
//! Everything the display kernel draws: the renderable contract, nested
//! frames, lights, the per-pass view and the world extent.

mod extent;
mod renderable;
mod frame;
mod light;
mod view;

#[cfg(test)]
pub(crate) mod test_body;

pub use extent::{Extent, HIT_RECORD_OVERHEAD, NEAR_FAR_RATIO};
pub use renderable::{
    Renderable, RenderableState, SharedRenderable, CacheRefresh,
    share, lock_renderable, same_object, draw_object, accumulate_extent,
    sort_back_to_front, sort_triangles_back_to_front, migrate_by_alpha,
};
pub use frame::Frame;
pub use light::{Light, LightKey, LightParams, NO_SPOT_CUTOFF};
pub use view::{View, ScreenOverlay, ScreenObjects};
