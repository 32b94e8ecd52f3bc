//! Minimal renderable used by the unit tests of the scene graph and the kernel

use glam::{DVec3, Vec3};
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::math::Rgba;
use super::{Extent, Renderable, RenderableState, SharedRenderable, View};

/// Leave the object's mutex poisoned by panicking while it is held
pub fn poison(object: &SharedRenderable) {
    let object = object.clone();
    let _ = std::thread::spawn(move || {
        let _guard = object.lock();
        panic!("poisoned on purpose");
    })
    .join();
}

/// A sphere-bounded body drawn as a single triangle
pub struct TestBody {
    state: RenderableState,
    pub pos: DVec3,
    pub radius: f64,
    pub rebuilds: usize,
    pub resorts: usize,
    pub renders: usize,
    pub picks: usize,
    /// Color seen by the last render call
    pub last_color: Option<Rgba>,
    /// Correction factor seen by the last render call
    pub last_gcf: Option<f64>,
}

impl TestBody {
    pub fn new(pos: DVec3, radius: f64) -> Self {
        Self {
            state: RenderableState::new(Rgba::WHITE),
            pos,
            radius,
            rebuilds: 0,
            resorts: 0,
            renders: 0,
            picks: 0,
            last_color: None,
            last_gcf: None,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.state.color = color;
        self
    }
}

impl Renderable for TestBody {
    fn state(&self) -> &RenderableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderableState {
        &mut self.state
    }

    fn type_name(&self) -> &'static str {
        "test body"
    }

    fn render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.renders += 1;
        self.last_color = Some(self.state.color);
        self.last_gcf = Some(view.gcf);
        device.set_color(self.state.color);
        let p = (self.pos * view.gcf).as_vec3();
        let r = (self.radius * view.gcf) as f32;
        device.draw_triangles(&[p + Vec3::new(-r, -r, 0.0), p + Vec3::new(r, -r, 0.0), p + Vec3::new(0.0, r, 0.0)]);
        Ok(())
    }

    fn pick_render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.picks += 1;
        self.render(view, device)
    }

    fn grow_extent(&self, extent: &mut Extent) {
        extent.add_sphere(self.pos, self.radius);
    }

    fn center(&self) -> DVec3 {
        self.pos
    }

    fn update_cache(&mut self, _view: &View<'_>) {
        self.rebuilds += 1;
    }

    fn update_z_sort(&mut self, _view: &View<'_>) {
        self.resorts += 1;
    }
}
