//! Shapes shared by the integration tests

use glam::{DVec3, Vec3};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::lumen3d::math::Rgba;
use lumen_3d_engine::lumen3d::render::GraphicsDevice;
use lumen_3d_engine::lumen3d::resource::{Model, ModelKey};
use lumen_3d_engine::lumen3d::scene::{Extent, Renderable, RenderableState, View};

/// Latitude-longitude sphere tessellated into a cached unit model
pub struct Sphere {
    state: RenderableState,
    pub pos: DVec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(pos: DVec3, radius: f64) -> Self {
        Self {
            state: RenderableState::new(Rgba::WHITE),
            pos,
            radius,
        }
    }
}

fn unit_sphere(slices: usize, stacks: usize) -> Model {
    let point = |slice: usize, stack: usize| {
        let theta = std::f64::consts::TAU * slice as f64 / slices as f64;
        let phi = std::f64::consts::PI * stack as f64 / stacks as f64;
        DVec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin())
    };
    let mut triangles = Vec::with_capacity(slices * stacks * 2);
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = point(slice, stack);
            let b = point(slice + 1, stack);
            let c = point(slice + 1, stack + 1);
            let d = point(slice, stack + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }
    Model::from_triangles(triangles)
}

impl Renderable for Sphere {
    fn state(&self) -> &RenderableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderableState {
        &mut self.state
    }

    fn type_name(&self) -> &'static str {
        "sphere"
    }

    fn render(&mut self, view: &View<'_>, device: &mut dyn GraphicsDevice) -> Result<()> {
        let lod = if view.pixel_coverage(self.pos, self.radius) > 50.0 { 1 } else { 0 };
        let model = view
            .models()
            .get_or_build(ModelKey::new("sphere", lod), || unit_sphere(16 * (lod as usize + 1), 8 * (lod as usize + 1)));

        let vertices: Vec<Vec3> = model
            .triangles
            .iter()
            .flatten()
            .map(|v| ((self.pos + *v * self.radius) * view.gcf).as_vec3())
            .collect();
        device.set_color(self.state.color);
        device.draw_triangles(&vertices);
        Ok(())
    }

    fn grow_extent(&self, extent: &mut Extent) {
        extent.add_sphere(self.pos, self.radius);
    }

    fn center(&self) -> DVec3 {
        self.pos
    }
}
