/// Renderable - the capability every drawable object implements.
///
/// Concrete shapes keep their cached geometry behind this trait and let the
/// provided [`Renderable::refresh_cache`] decide, once per render, whether the
/// cache needs nothing, a depth re-sort, or a full rebuild.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::DVec3;
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::math::Rgba;
use crate::resource::{Material, Texture};
use super::extent::Extent;
use super::frame::Frame;
use super::view::View;

/// Scene graph handle: owned by a layer or a frame, locked per object
pub type SharedRenderable = Arc<Mutex<dyn Renderable>>;

/// Wrap a renderable into a shareable scene graph handle
pub fn share<R: Renderable + 'static>(renderable: R) -> SharedRenderable {
    Arc::new(Mutex::new(renderable))
}

/// Lock one scene object, reporting a poisoned lock as a backend error
pub fn lock_renderable(object: &SharedRenderable) -> Result<MutexGuard<'_, dyn Renderable + 'static>> {
    object
        .lock()
        .map_err(|_| Error::BackendError("Renderable lock poisoned".to_string()))
}

/// Which cost tier a cache refresh ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRefresh {
    Unchanged,
    Resorted,
    Rebuilt,
}

/// Properties shared by every renderable
#[derive(Clone)]
pub struct RenderableState {
    /// Color; `alpha < 1` places the object in a transparent layer
    pub color: Rgba,
    /// Cached geometry must be rebuilt
    pub model_damaged: bool,
    /// Cached faces must be depth-sorted again
    pub z_damaged: bool,
    /// Hidden objects are skipped by render, pick and extent passes
    pub visible: bool,
    pub texture: Option<Arc<dyn Texture>>,
    pub material: Option<Arc<Material>>,
}

impl RenderableState {
    /// Fresh state: visible, everything damaged so the first render builds the cache
    pub fn new(color: Rgba) -> Self {
        Self {
            color,
            model_damaged: true,
            z_damaged: true,
            visible: true,
            texture: None,
            material: None,
        }
    }

    /// Geometry changed; the next refresh rebuilds
    pub fn damage_model(&mut self) {
        self.model_damaged = true;
        self.z_damaged = true;
    }

    /// Face order changed; the next refresh of a transparent object re-sorts
    pub fn damage_z(&mut self) {
        self.z_damaged = true;
    }
}

impl Default for RenderableState {
    fn default() -> Self {
        Self::new(Rgba::WHITE)
    }
}

impl std::fmt::Debug for RenderableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderableState")
            .field("color", &self.color)
            .field("model_damaged", &self.model_damaged)
            .field("z_damaged", &self.z_damaged)
            .field("visible", &self.visible)
            .field("texture", &self.texture.is_some())
            .field("material", &self.material.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

/// Drawable scene object
///
/// Coordinates handed to the device are the object's own coordinates
/// multiplied by `view.gcf`; positions reported through [`Renderable::center`]
/// and [`Renderable::grow_extent`] are unscaled.
pub trait Renderable: Send {
    fn state(&self) -> &RenderableState;

    fn state_mut(&mut self) -> &mut RenderableState;

    /// Short name used in log messages
    fn type_name(&self) -> &'static str {
        "renderable"
    }

    /// Draw with full shading
    fn render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()>;

    /// Draw position-only geometry in selection mode
    fn pick_render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.render(view, device)
    }

    /// Widen `extent` to hold this object.
    ///
    /// Selection-buffer words are counted by [`accumulate_extent`], not here.
    fn grow_extent(&self, extent: &mut Extent);

    /// Point used to order transparent objects
    fn center(&self) -> DVec3;

    /// Rebuild cached geometry from scratch
    fn update_cache(&mut self, _view: &View<'_>) {}

    /// Re-sort cached faces along `view.forward`
    fn update_z_sort(&mut self, _view: &View<'_>) {}

    /// Bring the cache up to date, choosing the cheapest sufficient tier
    fn refresh_cache(&mut self, view: &View<'_>) -> CacheRefresh {
        let state = self.state();
        let transparent = state.color.alpha != 1.0;
        let model_stale = state.model_damaged || view.gcf_changed;

        if transparent && (state.z_damaged || view.forward_changed) {
            let tier = if model_stale {
                self.update_cache(view);
                CacheRefresh::Rebuilt
            } else {
                self.update_z_sort(view);
                CacheRefresh::Resorted
            };
            let state = self.state_mut();
            state.model_damaged = false;
            state.z_damaged = false;
            tier
        } else if model_stale {
            self.update_cache(view);
            self.state_mut().model_damaged = false;
            CacheRefresh::Rebuilt
        } else {
            CacheRefresh::Unchanged
        }
    }

    /// Downcast used by pick resolution
    fn as_frame(&self) -> Option<&Frame> {
        None
    }

    fn color(&self) -> Rgba {
        self.state().color
    }

    fn set_color(&mut self, color: Rgba) {
        self.state_mut().color = color;
    }

    fn is_visible(&self) -> bool {
        self.state().visible
    }
}

/// Whether two handles point at the same scene object
pub fn same_object(a: &SharedRenderable, b: &SharedRenderable) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Refresh the cache of one object and draw it.
///
/// During anaglyph passes the color is swapped for its desaturated or
/// grayscale version for the duration of the draw and restored afterwards.
/// Hidden objects are skipped.
pub fn draw_object(
    object: &mut dyn Renderable,
    view: &View<'_>,
    device: &mut dyn GraphicsDevice,
) -> Result<CacheRefresh> {
    if !object.is_visible() {
        return Ok(CacheRefresh::Unchanged);
    }
    let tier = object.refresh_cache(view);
    if view.anaglyph {
        let actual = object.color();
        let filtered = if view.color_anaglyph { actual.desaturate() } else { actual.grayscale() };
        object.set_color(filtered);
        let drawn = object.render(view, device);
        object.set_color(actual);
        drawn?;
    } else {
        object.render(view, device)?;
    }
    Ok(tier)
}

/// Add a visible object to an extent pass.
///
/// Widens `extent` and reserves the selection words of the hit record the
/// object produces when picked. A frame produces no record of its own; its
/// children are counted when it grows its extent.
pub fn accumulate_extent(object: &dyn Renderable, extent: &mut Extent) {
    object.grow_extent(extent);
    if object.as_frame().is_none() {
        extent.add_body();
    }
}

/// Stable back-to-front sort of a transparent layer.
///
/// Keys are `forward . (center - origin)`, largest first; objects with equal
/// keys keep their relative order. Each object is locked once to read its
/// center. On a lock error the layer is left untouched.
pub fn sort_back_to_front(objects: &mut Vec<SharedRenderable>, forward: DVec3, origin: DVec3) -> Result<()> {
    if objects.len() < 2 {
        return Ok(());
    }
    let mut keyed = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        let key = forward.dot(lock_renderable(object)?.center() - origin);
        keyed.push((key, index));
    }
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    let sorted: Vec<SharedRenderable> = keyed.iter().map(|&(_, index)| objects[index].clone()).collect();
    *objects = sorted;
    Ok(())
}

/// Stable back-to-front sort of cached triangles along `forward`
pub fn sort_triangles_back_to_front(triangles: &mut [[DVec3; 3]], forward: DVec3) {
    triangles.sort_by(|a, b| {
        let ka = forward.dot(a[0] + a[1] + a[2]);
        let kb = forward.dot(b[0] + b[1] + b[2]);
        kb.total_cmp(&ka)
    });
}

/// Move objects between an opaque and a transparent list when their alpha has
/// crossed 1.0, keeping the relative order of the rest.
///
/// Every alpha is read before either list changes, so a lock error leaves
/// both lists as they were.
pub fn migrate_by_alpha(
    opaque: &mut Vec<SharedRenderable>,
    transparent: &mut Vec<SharedRenderable>,
) -> Result<usize> {
    let to_transparent = alpha_flags(opaque, |alpha| alpha != 1.0)?;
    let to_opaque = alpha_flags(transparent, |alpha| alpha == 1.0)?;
    let moved = to_transparent.iter().chain(to_opaque.iter()).filter(|&&flag| flag).count();
    if moved == 0 {
        return Ok(0);
    }

    let (leaving_opaque, staying_opaque) = partition(opaque, &to_transparent);
    let (leaving_transparent, staying_transparent) = partition(transparent, &to_opaque);
    *opaque = staying_opaque;
    opaque.extend(leaving_transparent);
    *transparent = staying_transparent;
    transparent.extend(leaving_opaque);
    Ok(moved)
}

fn alpha_flags(objects: &[SharedRenderable], test: impl Fn(f32) -> bool) -> Result<Vec<bool>> {
    objects
        .iter()
        .map(|object| Ok(test(lock_renderable(object)?.color().alpha)))
        .collect()
}

/// Split `objects` into (flagged, unflagged), both in their original order
fn partition(objects: &[SharedRenderable], flags: &[bool]) -> (Vec<SharedRenderable>, Vec<SharedRenderable>) {
    let mut flagged = Vec::new();
    let mut rest = Vec::with_capacity(objects.len());
    for (object, &flag) in objects.iter().zip(flags) {
        if flag {
            flagged.push(object.clone());
        } else {
            rest.push(object.clone());
        }
    }
    (flagged, rest)
}

#[cfg(test)]
#[path = "renderable_tests.rs"]
mod tests;
