/// View - per-pass rendering context handed down the scene graph.
///
/// A view is rebuilt for every render pass and never outlives it. Frames
/// derive a local copy whose camera, center and forward are expressed in the
/// frame's own coordinates.

use std::cell::RefCell;
use glam::DVec3;
use crate::math::{Rgba, Transform};
use crate::resource::ModelCache;

/// Window-space item drawn after the 3D scene with depth testing disabled
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenOverlay {
    /// Anchor in world coordinates (unscaled)
    pub position: DVec3,
    pub color: Rgba,
    pub text: String,
}

/// Overlays queued during one render pass
#[derive(Debug, Default)]
pub struct ScreenObjects {
    items: RefCell<Vec<ScreenOverlay>>,
}

impl ScreenObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, overlay: ScreenOverlay) {
        self.items.borrow_mut().push(overlay);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Remove and return everything queued so far
    pub fn take(&self) -> Vec<ScreenOverlay> {
        std::mem::take(&mut *self.items.borrow_mut())
    }
}

#[derive(Clone)]
pub struct View<'a> {
    /// Camera position, unscaled, in the coordinates of the current frame
    pub camera: DVec3,
    /// Unit viewing direction
    pub forward: DVec3,
    /// Point the camera looks at
    pub center: DVec3,
    /// True vertical direction of the image
    pub up: DVec3,
    pub window_width: f64,
    pub window_height: f64,
    /// Forward moved since the previous frame
    pub forward_changed: bool,
    /// Global correction factor
    pub gcf: f64,
    /// The correction factor changed since the previous frame
    pub gcf_changed: bool,
    /// Level-of-detail bias added by shapes to their own choice
    pub lod_adjust: i32,
    pub anaglyph: bool,
    pub color_anaglyph: bool,
    pub tan_hfov_x: f64,
    pub tan_hfov_y: f64,
    /// Maps the current frame's coordinates to world coordinates
    pub frame_to_world: Transform,
    models: &'a ModelCache,
    screen_objects: &'a ScreenObjects,
}

impl<'a> View<'a> {
    /// Top-level view with identity frame transform and no stereo
    pub fn new(
        forward: DVec3,
        center: DVec3,
        window_width: f64,
        window_height: f64,
        models: &'a ModelCache,
        screen_objects: &'a ScreenObjects,
    ) -> Self {
        Self {
            camera: DVec3::ZERO,
            forward: forward.normalize_or_zero(),
            center,
            up: DVec3::Y,
            window_width,
            window_height,
            forward_changed: false,
            gcf: 1.0,
            gcf_changed: false,
            lod_adjust: 0,
            anaglyph: false,
            color_anaglyph: false,
            tan_hfov_x: 0.0,
            tan_hfov_y: 0.0,
            frame_to_world: Transform::identity(),
            models,
            screen_objects,
        }
    }

    /// Shared level-of-detail model tables
    pub fn models(&self) -> &'a ModelCache {
        self.models
    }

    /// Queue a label anchored at `position` in the current frame's coordinates
    pub fn push_overlay(&self, position: DVec3, color: Rgba, text: impl Into<String>) {
        self.screen_objects.push(ScreenOverlay {
            position: self.frame_to_world.transform_point(position),
            color,
            text: text.into(),
        });
    }

    pub fn screen_objects(&self) -> &'a ScreenObjects {
        self.screen_objects
    }

    /// Approximate on-screen size in pixels of a sphere of `radius` at `position`.
    ///
    /// Shapes use it to pick a level of detail. Returns 0 for anything behind
    /// the camera.
    pub fn pixel_coverage(&self, position: DVec3, radius: f64) -> f64 {
        let distance = (position - self.camera).dot(self.forward);
        if distance <= 0.0 || self.tan_hfov_x <= 0.0 {
            return 0.0;
        }
        let visible_width = 2.0 * distance * self.tan_hfov_x;
        2.0 * radius.abs() / visible_width * self.window_width
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
