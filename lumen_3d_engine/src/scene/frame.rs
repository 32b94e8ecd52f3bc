/// Frame - a renderable that owns children in a nested coordinate system.
///
/// Children are positioned in the frame's local space, defined by `pos`,
/// an orthonormal basis built from `axis` and `up`, and a per-axis `scale`.
/// Like the display kernel, a frame keeps opaque and transparent children in
/// separate lists and moves them between the lists at render time.

use glam::{DMat4, DVec3, DVec4};
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::math::{Basis, Rgba, Transform, orthonormal_basis};
use super::extent::Extent;
use super::renderable::{
    accumulate_extent, draw_object, lock_renderable, migrate_by_alpha, same_object, sort_back_to_front,
    Renderable, RenderableState, SharedRenderable,
};
use super::view::View;

const SOURCE: &str = "lumen3d::Frame";

pub struct Frame {
    state: RenderableState,
    pos: DVec3,
    axis: DVec3,
    up: DVec3,
    scale: DVec3,
    basis: Basis,
    children: Vec<SharedRenderable>,
    trans_children: Vec<SharedRenderable>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Frame at the origin aligned with the world axes
    pub fn new() -> Self {
        Self {
            state: RenderableState::new(Rgba::WHITE),
            pos: DVec3::ZERO,
            axis: DVec3::X,
            up: DVec3::Y,
            scale: DVec3::ONE,
            basis: Basis { x: DVec3::X, y: DVec3::Y, z: DVec3::Z, degenerate: false },
            children: Vec::new(),
            trans_children: Vec::new(),
        }
    }

    pub fn pos(&self) -> DVec3 {
        self.pos
    }

    pub fn axis(&self) -> DVec3 {
        self.axis
    }

    pub fn up(&self) -> DVec3 {
        self.up
    }

    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Current local basis
    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn set_pos(&mut self, pos: DVec3) {
        self.pos = pos;
    }

    /// # Errors
    ///
    /// `InvalidConfiguration` when `axis` has zero length; the frame is unchanged.
    pub fn set_axis(&mut self, axis: DVec3) -> Result<()> {
        let basis = self.checked_basis(axis, self.up)?;
        self.axis = axis;
        self.basis = basis;
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidConfiguration` when `up` has zero length; the frame is unchanged.
    pub fn set_up(&mut self, up: DVec3) -> Result<()> {
        let basis = self.checked_basis(self.axis, up)?;
        self.up = up;
        self.basis = basis;
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidConfiguration` when a component is zero or not finite.
    pub fn set_scale(&mut self, scale: DVec3) -> Result<()> {
        if !scale.is_finite() || scale.x == 0.0 || scale.y == 0.0 || scale.z == 0.0 {
            return Err(crate::engine_config_err!(
                SOURCE,
                "Frame scale components must be finite and non-zero, got {:?}.",
                scale
            ));
        }
        self.scale = scale;
        Ok(())
    }

    fn checked_basis(&self, axis: DVec3, up: DVec3) -> Result<Basis> {
        let basis = orthonormal_basis(axis, up).ok_or_else(|| {
            crate::engine_config_err!(SOURCE, "Frame axis and up cannot be zero (axis {:?}, up {:?}).", axis, up)
        })?;
        if basis.degenerate {
            crate::engine_warn!(
                SOURCE,
                "Frame at {:?}: axis {:?} is nearly parallel to up {:?}, using a synthetic up",
                self.pos, axis, up
            );
        }
        Ok(basis)
    }

    /// Add a child, filed by its current alpha
    pub fn add_child(&mut self, child: SharedRenderable) -> Result<()> {
        let opaque = lock_renderable(&child)?.color().alpha == 1.0;
        if opaque {
            self.children.push(child);
        } else {
            self.trans_children.push(child);
        }
        Ok(())
    }

    /// Remove a child; returns whether it was found
    pub fn remove_child(&mut self, child: &SharedRenderable) -> bool {
        let before = self.child_count();
        self.children.retain(|c| !same_object(c, child));
        self.trans_children.retain(|c| !same_object(c, child));
        self.child_count() != before
    }

    pub fn child_count(&self) -> usize {
        self.children.len() + self.trans_children.len()
    }

    /// Opaque children followed by transparent children, in selection-name order
    pub fn children(&self) -> Vec<SharedRenderable> {
        self.children.iter().chain(self.trans_children.iter()).cloned().collect()
    }

    pub fn opaque_children(&self) -> &[SharedRenderable] {
        &self.children
    }

    pub fn transparent_children(&self) -> &[SharedRenderable] {
        &self.trans_children
    }

    /// Local-to-world transform: basis columns scaled by `scale * gcf`,
    /// translated by `pos * gcf`
    pub fn frame_world_transform(&self, gcf: f64) -> Transform {
        let b = &self.basis;
        Transform::from_columns(
            (b.x * self.scale.x * gcf).extend(0.0),
            (b.y * self.scale.y * gcf).extend(0.0),
            (b.z * self.scale.z * gcf).extend(0.0),
            (self.pos * gcf).extend(1.0),
        )
    }

    /// Exact inverse of [`Frame::frame_world_transform`], built from the
    /// transposed basis
    pub fn world_frame_transform(&self, gcf: f64) -> Transform {
        let b = &self.basis;
        let row = |axis: DVec3, s: f64| {
            let r = axis / (s * gcf);
            DVec4::new(r.x, r.y, r.z, -axis.dot(self.pos) / s)
        };
        let rows = DMat4::from_cols(
            row(b.x, self.scale.x),
            row(b.y, self.scale.y),
            row(b.z, self.scale.z),
            DVec4::W,
        );
        Transform::from_matrix(rows.transpose())
    }

    /// View expressed in this frame's coordinates
    fn local_view<'a>(&self, view: &View<'a>) -> View<'a> {
        let to_local = self.world_frame_transform(1.0);
        let mut local = view.clone();
        local.camera = to_local.transform_point(view.camera);
        local.center = to_local.transform_point(view.center);
        local.forward = to_local.transform_vector(view.forward).normalize_or(view.forward);
        local.up = to_local.transform_vector(view.up).normalize_or(view.up);
        local.gcf = 1.0;
        local.frame_to_world = view.frame_to_world.compose(&self.frame_world_transform(1.0));
        local
    }

    fn render_children(&mut self, local: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        for child in &self.children {
            draw_object(&mut *lock_renderable(child)?, local, device)?;
        }
        sort_back_to_front(&mut self.trans_children, local.forward, local.camera)?;
        for child in &self.trans_children {
            draw_object(&mut *lock_renderable(child)?, local, device)?;
        }
        Ok(())
    }

    fn pick_children(&self, local: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        for (name, child) in self.children.iter().chain(self.trans_children.iter()).enumerate() {
            device.load_name(name as u32);
            let mut child = lock_renderable(child)?;
            if child.is_visible() {
                child.pick_render(local, device)?;
            }
        }
        Ok(())
    }

    /// Resolve a selection name path relative to this frame.
    ///
    /// The first name indexes opaque children, then transparent ones. Further
    /// names descend into nested frames.
    ///
    /// # Errors
    ///
    /// `InvalidPick` for an empty path, an index past the last child, or a
    /// path that continues through a child which is not a frame.
    pub fn lookup_name(&self, names: &[u32]) -> Result<SharedRenderable> {
        let (&first, rest) = names
            .split_first()
            .ok_or_else(|| Error::InvalidPick("empty name path".to_string()))?;
        let index = first as usize;
        let child = if index < self.children.len() {
            self.children[index].clone()
        } else {
            self.trans_children
                .get(index - self.children.len())
                .cloned()
                .ok_or_else(|| {
                    Error::InvalidPick(format!(
                        "name {} exceeds the {} children of the frame at {:?}",
                        first,
                        self.child_count(),
                        self.pos
                    ))
                })?
        };
        if rest.is_empty() {
            return Ok(child);
        }
        let guard = lock_renderable(&child)?;
        match guard.as_frame() {
            Some(frame) => frame.lookup_name(rest),
            None => Err(Error::InvalidPick(format!(
                "name path continues through a {}",
                guard.type_name()
            ))),
        }
    }
}

impl Renderable for Frame {
    fn state(&self) -> &RenderableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderableState {
        &mut self.state
    }

    fn type_name(&self) -> &'static str {
        "frame"
    }

    fn render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        let local = self.local_view(view);
        migrate_by_alpha(&mut self.children, &mut self.trans_children)?;
        device.push_transform(&self.frame_world_transform(view.gcf).to_gpu());
        let drawn = self.render_children(&local, device);
        device.pop_transform()?;
        drawn
    }

    fn pick_render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        let local = self.local_view(view);
        device.push_name(0);
        device.push_transform(&self.frame_world_transform(view.gcf).to_gpu());
        let picked = self.pick_children(&local, device);
        device.pop_transform()?;
        device.pop_name();
        picked
    }

    fn grow_extent(&self, world: &mut Extent) {
        world.push_frame();
        let mut local = Extent::nested(world);
        for child in self.children.iter().chain(self.trans_children.iter()) {
            match lock_renderable(child) {
                Ok(child) if child.is_visible() => accumulate_extent(&*child, &mut local),
                Ok(_) => {}
                Err(err) => crate::engine_warn!(SOURCE, "Skipping child in extent pass: {}", err),
            }
        }
        world.merge_local(&self.frame_world_transform(1.0), &local);
        world.pop_frame();
    }

    /// Mean of the children's centers, in the parent's coordinates
    fn center(&self) -> DVec3 {
        let to_parent = self.frame_world_transform(1.0);
        let mut sum = DVec3::ZERO;
        let mut count = 0usize;
        for child in self.children.iter().chain(self.trans_children.iter()) {
            match lock_renderable(child) {
                Ok(child) => {
                    sum += to_parent.transform_point(child.center());
                    count += 1;
                }
                Err(err) => crate::engine_warn!(SOURCE, "Skipping child in frame center: {}", err),
            }
        }
        if count == 0 {
            self.pos
        } else {
            sum / count as f64
        }
    }

    fn as_frame(&self) -> Option<&Frame> {
        Some(self)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
