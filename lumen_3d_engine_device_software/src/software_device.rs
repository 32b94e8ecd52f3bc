/// SoftwareGraphicsDevice - CPU implementation of the GraphicsDevice trait.
///
/// The device keeps the full fixed-function state (matrices, lights, masks)
/// and transforms every submitted triangle to clip space. It does not
/// rasterize: in render mode it counts the triangles that reach the view
/// volume, in selection mode those triangles produce hit records tagged with
/// the current name stack.
///
/// Driver-style errors (bad light unit, name stack misuse) are latched and
/// reported by the next `check_error`, like a real immediate-mode driver.

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::lumen3d::math::{GpuMatrix, Rgba};
use lumen_3d_engine::lumen3d::resource::Material;
use lumen_3d_engine::lumen3d::scene::LightParams;
use lumen_3d_engine::lumen3d::render::{
    GraphicsDevice, ClearFlags, ColorMask, DrawBuffer, Viewport, HitRecord, MAX_LIGHTS,
};
use crate::clip::clip_triangle;
use crate::selection::Selection;
use crate::stats::DeviceStats;

const SOURCE: &str = "lumen3d::software::Device";

/// Text drawn through `draw_overlay`
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub position: Vec2,
    pub text: String,
    pub color: Rgba,
}

pub struct SoftwareGraphicsDevice {
    viewport: Viewport,
    clear_color: Rgba,
    color_mask: ColorMask,
    draw_buffer: DrawBuffer,
    depth_test: bool,
    projection: Mat4,
    /// Never empty; the first entry is the matrix given to `set_modelview`
    modelview: Vec<Mat4>,
    /// Ambient color while lighting is on
    lighting: Option<Rgba>,
    lights: FxHashMap<usize, LightParams>,
    color: Rgba,
    material: Option<String>,
    overlays: Vec<Overlay>,
    selection: Option<Selection>,
    pending_error: Option<Error>,
    stats: Arc<DeviceStats>,
}

impl Default for SoftwareGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareGraphicsDevice {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0, 0, 0, 0),
            clear_color: Rgba::BLACK,
            color_mask: ColorMask::ALL,
            draw_buffer: DrawBuffer::Back,
            depth_test: false,
            projection: Mat4::IDENTITY,
            modelview: vec![Mat4::IDENTITY],
            lighting: None,
            lights: FxHashMap::default(),
            color: Rgba::WHITE,
            material: None,
            overlays: Vec::new(),
            selection: None,
            pending_error: None,
            stats: Arc::new(DeviceStats::new()),
        }
    }

    /// Counters shared with this device
    pub fn stats(&self) -> Arc<DeviceStats> {
        Arc::clone(&self.stats)
    }

    /// Latch `err` for the next `check_error`; the first error wins
    pub fn inject_error(&mut self, err: Error) {
        self.stats.count_error();
        if self.pending_error.is_none() {
            self.pending_error = Some(err);
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn clear_color(&self) -> Rgba {
        self.clear_color
    }

    pub fn color_mask(&self) -> ColorMask {
        self.color_mask
    }

    pub fn draw_buffer(&self) -> DrawBuffer {
        self.draw_buffer
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Current modelview (top of the transform stack)
    pub fn modelview(&self) -> Mat4 {
        self.top()
    }

    /// Number of pushed transforms not yet popped
    pub fn transform_depth(&self) -> usize {
        self.modelview.len() - 1
    }

    pub fn lighting_enabled(&self) -> bool {
        self.lighting.is_some()
    }

    pub fn ambient(&self) -> Option<Rgba> {
        self.lighting
    }

    pub fn light(&self, unit: usize) -> Option<&LightParams> {
        self.lights.get(&unit)
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Name of the bound material
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_some()
    }

    fn top(&self) -> Mat4 {
        self.modelview.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    fn trace(&self, call: std::fmt::Arguments) {
        if cfg!(feature = "trace-calls") {
            lumen_3d_engine::engine_trace!(SOURCE, "{}", call);
        }
    }
}

impl GraphicsDevice for SoftwareGraphicsDevice {
    fn check_error(&mut self) -> Result<()> {
        match self.pending_error.take() {
            Some(err) => {
                lumen_3d_engine::engine_debug!(SOURCE, "Reporting latched error: {}", err);
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.trace(format_args!("clear({:?})", flags));
        if flags.contains(ClearFlags::COLOR) {
            // Overlays live in the color buffer
            self.overlays.clear();
        }
        self.stats.count_clear();
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.clear_color = color;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.trace(format_args!("set_viewport({:?})", viewport));
        if viewport.width < 0 || viewport.height < 0 {
            self.inject_error(Error::BackendError(format!(
                "negative viewport size {}x{}",
                viewport.width, viewport.height
            )));
            return;
        }
        self.viewport = viewport;
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.color_mask = mask;
    }

    fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.draw_buffer = buffer;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_projection(&mut self, projection: &GpuMatrix) {
        self.projection = projection.to_mat4();
    }

    fn set_modelview(&mut self, modelview: &GpuMatrix) {
        self.modelview.clear();
        self.modelview.push(modelview.to_mat4());
    }

    fn push_transform(&mut self, transform: &GpuMatrix) {
        let combined = self.top() * transform.to_mat4();
        self.modelview.push(combined);
    }

    fn pop_transform(&mut self) -> Result<()> {
        if self.modelview.len() <= 1 {
            self.stats.count_error();
            lumen_3d_engine::engine_bail!(SOURCE, "Transform stack underflow");
        }
        self.modelview.pop();
        Ok(())
    }

    fn enable_lighting(&mut self, ambient: Rgba) {
        self.lighting = Some(ambient);
    }

    fn enable_light(&mut self, unit: usize, params: &LightParams) {
        self.trace(format_args!("enable_light({})", unit));
        if unit >= MAX_LIGHTS {
            self.inject_error(Error::BackendError(format!(
                "light unit {} out of range (max {})",
                unit, MAX_LIGHTS
            )));
            return;
        }
        self.lights.insert(unit, *params);
    }

    fn disable_lighting(&mut self) {
        self.lighting = None;
        self.lights.clear();
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn bind_material(&mut self, material: Option<&Material>) {
        self.material = material.map(|m| m.name().to_string());
    }

    fn draw_triangles(&mut self, vertices: &[Vec3]) {
        let mvp = self.projection * self.top();
        let mut submitted = 0u64;
        let mut visible = 0u64;

        for triangle in vertices.chunks_exact(3) {
            submitted += 1;
            let clip = [
                mvp * Vec4::from((triangle[0], 1.0)),
                mvp * Vec4::from((triangle[1], 1.0)),
                mvp * Vec4::from((triangle[2], 1.0)),
            ];
            if let Some((lo, hi)) = clip_triangle(clip) {
                visible += 1;
                if let Some(selection) = self.selection.as_mut() {
                    selection.hit(lo, hi);
                }
            }
        }
        self.trace(format_args!("draw_triangles({} submitted, {} visible)", submitted, visible));
        self.stats.count_triangles(submitted, visible);
    }

    fn draw_overlay(&mut self, x: f32, y: f32, text: &str, color: Rgba) {
        if self.selection.is_some() {
            return;
        }
        self.overlays.push(Overlay {
            position: Vec2::new(x, y),
            text: text.to_string(),
            color,
        });
    }

    fn begin_selection(&mut self, capacity: usize) {
        self.trace(format_args!("begin_selection({})", capacity));
        if self.selection.is_some() {
            self.inject_error(Error::BackendError("selection mode is already active".to_string()));
            return;
        }
        self.selection = Some(Selection::new(capacity));
    }

    fn push_name(&mut self, name: u32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.push_name(name);
        }
    }

    fn load_name(&mut self, name: u32) {
        let loaded = match self.selection.as_mut() {
            Some(selection) => selection.load_name(name),
            None => Ok(()),
        };
        if let Err(err) = loaded {
            self.inject_error(err);
        }
    }

    fn pop_name(&mut self) {
        let popped = match self.selection.as_mut() {
            Some(selection) => selection.pop_name(),
            None => Ok(()),
        };
        if let Err(err) = popped {
            self.inject_error(err);
        }
    }

    fn end_selection(&mut self) -> Result<Vec<HitRecord>> {
        let selection = match self.selection.take() {
            Some(selection) => selection,
            None => lumen_3d_engine::engine_bail!(SOURCE, "end_selection without begin_selection"),
        };
        if !selection.names().is_empty() {
            lumen_3d_engine::engine_debug!(
                SOURCE,
                "Selection ended with {} name(s) still pushed",
                selection.names().len()
            );
        }
        match selection.finish() {
            Ok(hits) => {
                self.stats.count_selection(hits.len() as u64);
                Ok(hits)
            }
            Err(err) => {
                self.stats.count_error();
                lumen_3d_engine::engine_warn!(SOURCE, "Selection failed: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "software_device_tests.rs"]
mod tests;
