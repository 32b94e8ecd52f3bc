/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every call is recorded as a short command string so tests can assert on
/// the exact sequence the kernel issued. Selection mode replays scripted
/// hit records, and an error can be injected for the next `check_error`.

use glam::Vec3;
use crate::error::{Error, Result};
use crate::math::{GpuMatrix, Rgba};
use crate::resource::Material;
use crate::scene::LightParams;
use super::{ClearFlags, ColorMask, DrawBuffer, GraphicsDevice, HitRecord, Viewport};

#[derive(Default)]
pub struct MockGraphicsDevice {
    /// Recorded calls, oldest first
    pub commands: Vec<String>,
    /// Hits returned by the next `end_selection`
    pub scripted_hits: Vec<HitRecord>,
    /// Error returned by the next `check_error`
    pub pending_error: Option<Error>,
    /// Name stack as seen by the device
    pub name_stack: Vec<u32>,
    pub selection_capacity: Option<usize>,
    pub projection: Option<GpuMatrix>,
    pub modelview: Option<GpuMatrix>,
    /// Colors set through `set_color`, in order
    pub colors: Vec<Rgba>,
    pub triangles_drawn: usize,
    transform_depth: usize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(hits: Vec<HitRecord>) -> Self {
        Self { scripted_hits: hits, ..Self::default() }
    }

    /// Recorded commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Position of the first command equal to `command`
    pub fn position(&self, command: &str) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.colors.clear();
    }

    fn record(&mut self, command: String) {
        self.commands.push(command);
    }
}

fn clear_label(flags: ClearFlags) -> String {
    let mut parts = Vec::new();
    if flags.contains(ClearFlags::COLOR) {
        parts.push("color");
    }
    if flags.contains(ClearFlags::DEPTH) {
        parts.push("depth");
    }
    parts.join("+")
}

fn mask_label(mask: ColorMask) -> String {
    [
        (ColorMask::RED, 'R'),
        (ColorMask::GREEN, 'G'),
        (ColorMask::BLUE, 'B'),
        (ColorMask::ALPHA, 'A'),
    ]
    .iter()
    .map(|(bit, c)| if mask.contains(*bit) { *c } else { '-' })
    .collect()
}

impl GraphicsDevice for MockGraphicsDevice {
    fn check_error(&mut self) -> Result<()> {
        match self.pending_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(format!("clear:{}", clear_label(flags)));
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.record(format!("clear_color:{},{},{}", color.red, color.green, color.blue));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(format!(
            "viewport:{},{},{},{}",
            viewport.x, viewport.y, viewport.width, viewport.height
        ));
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.record(format!("color_mask:{}", mask_label(mask)));
    }

    fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.record(format!("draw_buffer:{:?}", buffer));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(format!("depth_test:{}", if enabled { "on" } else { "off" }));
    }

    fn set_projection(&mut self, projection: &GpuMatrix) {
        self.projection = Some(*projection);
        self.record("projection".to_string());
    }

    fn set_modelview(&mut self, modelview: &GpuMatrix) {
        self.modelview = Some(*modelview);
        self.transform_depth = 0;
        self.record("modelview".to_string());
    }

    fn push_transform(&mut self, _transform: &GpuMatrix) {
        self.transform_depth += 1;
        self.record("push_transform".to_string());
    }

    fn pop_transform(&mut self) -> Result<()> {
        self.record("pop_transform".to_string());
        if self.transform_depth == 0 {
            return Err(Error::BackendError("transform stack underflow".to_string()));
        }
        self.transform_depth -= 1;
        Ok(())
    }

    fn enable_lighting(&mut self, _ambient: Rgba) {
        self.record("lighting:on".to_string());
    }

    fn enable_light(&mut self, unit: usize, _params: &LightParams) {
        self.record(format!("light:{}", unit));
    }

    fn disable_lighting(&mut self) {
        self.record("lighting:off".to_string());
    }

    fn set_color(&mut self, color: Rgba) {
        self.colors.push(color);
        self.record(format!("color:{},{},{},{}", color.red, color.green, color.blue, color.alpha));
    }

    fn bind_material(&mut self, material: Option<&Material>) {
        self.record(format!("material:{}", material.map(|m| m.name()).unwrap_or("none")));
    }

    fn draw_triangles(&mut self, vertices: &[Vec3]) {
        self.triangles_drawn += vertices.len() / 3;
        self.record(format!("triangles:{}", vertices.len() / 3));
    }

    fn draw_overlay(&mut self, _x: f32, _y: f32, text: &str, _color: Rgba) {
        self.record(format!("overlay:{}", text));
    }

    fn begin_selection(&mut self, capacity: usize) {
        self.selection_capacity = Some(capacity);
        self.name_stack.clear();
        self.record(format!("begin_selection:{}", capacity));
    }

    fn push_name(&mut self, name: u32) {
        self.name_stack.push(name);
        self.record(format!("push_name:{}", name));
    }

    fn load_name(&mut self, name: u32) {
        if let Some(top) = self.name_stack.last_mut() {
            *top = name;
        }
        self.record(format!("load_name:{}", name));
    }

    fn pop_name(&mut self) {
        self.name_stack.pop();
        self.record("pop_name".to_string());
    }

    fn end_selection(&mut self) -> Result<Vec<HitRecord>> {
        self.record("end_selection".to_string());
        let capacity = self.selection_capacity.take().unwrap_or(0);
        let required: usize = self.scripted_hits.iter().map(|h| h.word_count()).sum();
        if required > capacity {
            return Err(Error::PickBufferOverflow { required, capacity });
        }
        Ok(std::mem::take(&mut self.scripted_hits))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
