/// DisplayKernel - per-window scene state, camera and render loop.
///
/// A kernel owns the top-level layers of a window (opaque objects in
/// insertion order, transparent objects sorted back to front), the light
/// list and the camera. One mutex guards all of it; the application thread
/// mutates the scene through the same handle the render thread draws from.
///
/// Coordinates handed to the graphics device are multiplied by the global
/// correction factor (`gcf`), which the kernel adjusts whenever the scene
/// size drifts too far from unity for single-precision rendering.

use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard};
use glam::DVec3;
use slotmap::SlotMap;
use winit::dpi::PhysicalSize;
use crate::config::DisplayConfig;
use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearFlags, ColorMask, DrawBuffer, GraphicsDevice, HitRecord, RenderContext, Viewport, MAX_LIGHTS,
};
use crate::math::{orthonormal_basis, stable_length, Rgba, Transform};
use crate::resource::ModelCache;
use crate::scene::{
    accumulate_extent, draw_object, lock_renderable, migrate_by_alpha, sort_back_to_front, Extent, Light, LightKey,
    ScreenObjects, SharedRenderable, View, same_object,
};
use super::mouse::{MouseButton, MouseMode};
use super::stereo::{Eye, StereoMode};
use super::timer::FrameTimer;

const SOURCE: &str = "lumen3d::DisplayKernel";

/// Render cycles between two extent passes
pub const EXTENT_INTERVAL: u32 = 4;

/// Largest scene diagonal the kernel will try to display
pub const MAX_SCENE_SCALE: f64 = 1e300;

/// `|range| * gcf` is kept within `[1 / GCF_DRIFT_LIMIT, GCF_DRIFT_LIMIT]`
pub const GCF_DRIFT_LIMIT: f64 = 1e10;

/// Stereo camera separation as a fraction of the visible half width
const STEREO_SEPARATION: f64 = 0.02;

/// Closest approach (radians) of the rotating camera to either pole of `up`
const POLE_MARGIN: f64 = 0.02;

/// Words every top-level object may need in the selection buffer
const TOP_LEVEL_HIT_WORDS: usize = 4;

/// Camera geometry for one pass, in gcf-scaled coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSetup {
    pub modelview: Transform,
    pub projection: Transform,
    /// Inverse of `projection`
    pub projection_inverse: Transform,
    /// Eye position
    pub camera: DVec3,
    /// Point looked at, shifted with the eye in stereo passes
    pub target: DVec3,
    /// True vertical direction of the image
    pub up: DVec3,
    pub near: f64,
    pub far: f64,
    /// Distance from the eye to the scene center
    pub eye_length: f64,
    pub tan_hfov_x: f64,
    pub tan_hfov_y: f64,
}

impl CameraSetup {
    /// Map a window position and a `[0, 1]` depth back to scaled world coordinates
    pub fn unproject(&self, x: f64, y: f64, depth: f64, viewport: Viewport) -> DVec3 {
        let ndc = DVec3::new(
            2.0 * (x - viewport.x as f64) / viewport.width as f64 - 1.0,
            2.0 * (y - viewport.y as f64) / viewport.height as f64 - 1.0,
            2.0 * depth - 1.0,
        );
        let eye = self.projection_inverse.project_point(ndc);
        self.modelview.invert_ortho().transform_point(eye)
    }

    /// Window position and `[0, 1]` depth of a scaled world point.
    ///
    /// `None` for points at or behind the eye.
    pub fn project(&self, point: DVec3, viewport: Viewport) -> Option<(f64, f64, f64)> {
        let eye = self.modelview.transform_point(point);
        if eye.z >= 0.0 {
            return None;
        }
        let ndc = self.projection.project_point(eye);
        Some((
            viewport.x as f64 + (ndc.x + 1.0) * 0.5 * viewport.width as f64,
            viewport.y as f64 + (ndc.y + 1.0) * 0.5 * viewport.height as f64,
            (ndc.z + 1.0) * 0.5,
        ))
    }
}

/// Outcome of [`DisplayKernel::pick`]
#[derive(Clone)]
pub struct PickResult {
    /// Nearest object under the cursor
    pub object: Option<SharedRenderable>,
    /// World point of the nearest hit; `mouse_position` when nothing was hit
    pub pick_position: DVec3,
    /// Cursor unprojected onto the plane through the scene center facing the camera
    pub mouse_position: DVec3,
    /// Camera position in world coordinates
    pub camera: DVec3,
}

impl std::fmt::Debug for PickResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickResult")
            .field("object", &self.object.is_some())
            .field("pick_position", &self.pick_position)
            .field("mouse_position", &self.mouse_position)
            .field("camera", &self.camera)
            .finish()
    }
}

/// Horizontal and vertical tangents of half the field of view
pub fn fov_tangents(fov: f64, width: f64, height: f64) -> (f64, f64) {
    let tan_hfov = (fov * 0.5).tan();
    let aspect = height / width;
    if aspect > 1.0 {
        (tan_hfov / aspect, tan_hfov)
    } else {
        (tan_hfov, tan_hfov * aspect)
    }
}

struct KernelState {
    window_width: f64,
    window_height: f64,
    center: DVec3,
    forward: DVec3,
    up: DVec3,
    range: DVec3,
    fov: f64,
    autoscale: bool,
    autocenter: bool,
    uniform: bool,
    user_scale: f64,
    gcf: f64,
    gcf_changed: bool,
    forward_changed: bool,
    cycles_since_extent: u32,
    cycles: u64,
    world_extent: Extent,
    background: Rgba,
    foreground: Rgba,
    ambient: Rgba,
    lights: SlotMap<LightKey, Light>,
    layer_world: Vec<SharedRenderable>,
    layer_world_transparent: Vec<SharedRenderable>,
    mouse_mode: MouseMode,
    stereo_mode: StereoMode,
    lod_adjust: i32,
    show_render_speed: bool,
    realized: bool,
    timer: FrameTimer,
}

impl KernelState {
    fn new() -> Self {
        Self {
            window_width: 384.0,
            window_height: 256.0,
            center: DVec3::ZERO,
            forward: DVec3::NEG_Z,
            up: DVec3::Y,
            range: DVec3::splat(10.0),
            fov: 60f64.to_radians(),
            autoscale: true,
            autocenter: false,
            uniform: true,
            user_scale: 1.0,
            gcf: 1.0,
            gcf_changed: false,
            forward_changed: true,
            cycles_since_extent: EXTENT_INTERVAL,
            cycles: 0,
            world_extent: Extent::new(),
            background: Rgba::BLACK,
            foreground: Rgba::WHITE,
            ambient: Rgba::gray(0.2),
            lights: SlotMap::with_key(),
            layer_world: Vec::new(),
            layer_world_transparent: Vec::new(),
            mouse_mode: MouseMode::ZoomRotate,
            stereo_mode: StereoMode::NoStereo,
            lod_adjust: 0,
            show_render_speed: false,
            realized: false,
            timer: FrameTimer::default(),
        }
    }

    fn object_count(&self) -> usize {
        self.layer_world.len() + self.layer_world_transparent.len()
    }

    /// Bounds and selection words of every visible top-level object
    fn scene_extent(&self) -> Result<Extent> {
        let mut extent = Extent::new();
        for object in self.layer_world.iter().chain(self.layer_world_transparent.iter()) {
            let object = lock_renderable(object)?;
            if object.is_visible() {
                accumulate_extent(&*object, &mut extent);
            }
        }
        Ok(extent)
    }

    fn recalc_extent(&mut self) -> Result<()> {
        let extent = self.scene_extent()?;
        if !extent.is_empty() {
            let scale = extent.scale();
            if self.autoscale && (!scale.is_finite() || scale > MAX_SCENE_SCALE) {
                crate::engine_error!(SOURCE, "Scene extent of {:e} units cannot be displayed", scale);
                return Err(Error::SceneTooLarge(scale));
            }
            if self.autocenter {
                self.center = extent.center();
            }
            if self.autoscale {
                let range = if self.uniform {
                    extent.uniform_range(self.center)
                } else {
                    extent.range(self.center)
                };
                self.range = DVec3::select(range.cmpeq(DVec3::ZERO), DVec3::ONE, range);
            }
        }

        let magnitude = stable_length(self.range) * self.gcf;
        if magnitude.ln().abs() >= GCF_DRIFT_LIMIT.ln() {
            self.gcf = 1.0 / stable_length(self.range);
            self.gcf_changed = true;
            crate::engine_debug!(SOURCE, "Global correction factor reset to {:e}", self.gcf);
        }
        self.world_extent = extent;
        self.cycles_since_extent = 0;
        Ok(())
    }

    /// Camera and projection for one eye.
    ///
    /// `viewport_width` is the width of the area drawn into, half the window
    /// in passive stereo.
    fn camera_setup(&self, eye: Eye, viewport_width: f64) -> CameraSetup {
        let forward = self.forward.normalize_or(DVec3::NEG_Z);
        let up = orthonormal_basis(forward, self.up).map_or(DVec3::Y, |basis| basis.y);
        let tan_hfov = (self.fov * 0.5).tan();
        let (tan_hfov_x, tan_hfov_y) = fov_tangents(self.fov, viewport_width, self.window_height);
        let range_length = stable_length(self.range);

        let eye_length = self.user_scale * range_length * self.gcf / tan_hfov;
        let mut target = self.center * self.gcf;
        let mut camera = target - forward * eye_length;

        let (near, far) = self
            .world_extent
            .clip_planes(camera / self.gcf, forward)
            .map(|(near, far)| (near * self.gcf, far * self.gcf))
            .unwrap_or((0.01 * eye_length, 2.0 * eye_length + range_length * self.gcf));

        let camera_offset = tan_hfov * eye_length * STEREO_SEPARATION;
        let delta = forward.cross(up).normalize_or_zero() * camera_offset * eye.sign();
        camera += delta;
        target += delta;
        let frustum_offset = match eye {
            Eye::Left => camera_offset * near / eye_length,
            Eye::Center => 0.0,
            Eye::Right => -camera_offset * near / eye_length,
        };

        let (projection, projection_inverse) = Transform::frustum(
            -near * tan_hfov_x + frustum_offset,
            near * tan_hfov_x + frustum_offset,
            -near * tan_hfov_y,
            near * tan_hfov_y,
            near,
            far,
        );
        CameraSetup {
            modelview: Transform::look_at(camera, target, up),
            projection,
            projection_inverse,
            camera,
            target,
            up,
            near,
            far,
            eye_length,
            tan_hfov_x,
            tan_hfov_y,
        }
    }

    fn build_view<'a>(
        &self,
        models: &'a ModelCache,
        screens: &'a ScreenObjects,
        setup: &CameraSetup,
        viewport_width: f64,
    ) -> View<'a> {
        let mut view = View::new(
            self.forward,
            self.center,
            viewport_width,
            self.window_height,
            models,
            screens,
        );
        view.camera = setup.camera / self.gcf;
        view.up = setup.up;
        view.tan_hfov_x = setup.tan_hfov_x;
        view.tan_hfov_y = setup.tan_hfov_y;
        view.gcf = self.gcf;
        view.gcf_changed = self.gcf_changed;
        view.forward_changed = self.forward_changed;
        view.lod_adjust = self.lod_adjust;
        view
    }

    fn enable_lights(&self, device: &mut dyn GraphicsDevice) {
        device.enable_lighting(self.ambient);
        for (unit, light) in self.lights.values().take(MAX_LIGHTS).enumerate() {
            device.enable_light(unit, &light.params(self.gcf));
        }
    }

    /// One complete pass: 3D layers, then overlays with depth testing off
    fn draw(
        &mut self,
        models: &ModelCache,
        device: &mut dyn GraphicsDevice,
        eye: Eye,
        viewport: Viewport,
        anaglyph: bool,
    ) -> Result<()> {
        let setup = self.camera_setup(eye, viewport.width as f64);
        device.set_projection(&setup.projection.to_gpu());
        device.set_modelview(&setup.modelview.to_gpu());

        let screens = ScreenObjects::new();
        let mut view = self.build_view(models, &screens, &setup, viewport.width as f64);
        view.anaglyph = anaglyph;
        view.color_anaglyph = anaglyph && self.stereo_mode.is_color_anaglyph();

        self.enable_lights(device);
        migrate_by_alpha(&mut self.layer_world, &mut self.layer_world_transparent)?;
        for object in &self.layer_world {
            draw_object(&mut *lock_renderable(object)?, &view, device)?;
        }
        sort_back_to_front(&mut self.layer_world_transparent, view.forward, view.camera)?;
        for object in &self.layer_world_transparent {
            draw_object(&mut *lock_renderable(object)?, &view, device)?;
        }
        device.disable_lighting();

        device.set_depth_test(false);
        let mut overlays = screens.take();
        let forward = view.forward;
        overlays.sort_by(|a, b| forward.dot(b.position).total_cmp(&forward.dot(a.position)));
        for overlay in &overlays {
            if let Some((x, y, _)) = setup.project(overlay.position * self.gcf, viewport) {
                device.draw_overlay(x as f32, y as f32, &overlay.text, overlay.color);
            }
        }
        device.set_depth_test(true);
        Ok(())
    }

    fn render_passes(&mut self, models: &ModelCache, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.cycles_since_extent >= EXTENT_INTERVAL {
            self.recalc_extent()?;
        }
        device.set_clear_color(self.background);
        let width = self.window_width as i32;
        let height = self.window_height as i32;
        let full = Viewport::new(0, 0, width, height);
        let everything = ClearFlags::COLOR | ClearFlags::DEPTH;

        match self.stereo_mode {
            StereoMode::NoStereo => {
                device.set_viewport(full);
                device.clear(everything);
                self.draw(models, device, Eye::Center, full, false)?;
            }
            StereoMode::Active => {
                device.set_viewport(full);
                device.set_draw_buffer(DrawBuffer::BackLeft);
                device.clear(everything);
                self.draw(models, device, Eye::Left, full, false)?;
                device.set_draw_buffer(DrawBuffer::BackRight);
                device.clear(everything);
                self.draw(models, device, Eye::Right, full, false)?;
                device.set_draw_buffer(DrawBuffer::Back);
            }
            StereoMode::Passive => {
                let half = (self.window_width * 0.5) as i32;
                device.clear(everything);
                device.set_viewport(Viewport::new(0, 0, half, height));
                self.draw(models, device, Eye::Left, Viewport::new(0, 0, half, height), false)?;
                let right = Viewport::new(half + 1, 0, half, height);
                device.set_viewport(right);
                self.draw(models, device, Eye::Right, right, false)?;
            }
            mode => {
                let (left_mask, right_mask) = mode.anaglyph_masks().unwrap_or((ColorMask::ALL, ColorMask::ALL));
                device.clear(everything);
                device.set_viewport(full);
                device.set_color_mask(left_mask);
                self.draw(models, device, Eye::Left, full, true)?;
                device.set_color_mask(right_mask);
                device.clear(ClearFlags::DEPTH);
                self.draw(models, device, Eye::Right, full, true)?;
                device.set_color_mask(ColorMask::ALL);
            }
        }

        if self.show_render_speed {
            device.set_viewport(full);
            device.set_depth_test(false);
            let message = format!("Cycle time: {:.6}", self.timer.read());
            device.draw_overlay(0.0, 0.0, &message, self.background.inverse());
            device.set_depth_test(true);
        }
        Ok(())
    }

    fn pick_pass(
        &mut self,
        models: &ModelCache,
        device: &mut dyn GraphicsDevice,
        x: f64,
        y: f64,
        radius: f64,
    ) -> Result<PickResult> {
        let viewport = Viewport::new(0, 0, self.window_width as i32, self.window_height as i32);
        let window_y = self.window_height - y;
        // Objects may have changed since the last extent pass
        let select_words = self.scene_extent()?.select_buffer_depth();
        let capacity = (TOP_LEVEL_HIT_WORDS * self.object_count()).max(select_words);

        let setup = self.camera_setup(Eye::Center, self.window_width);
        let pick_projection = Transform::pick_matrix(x, window_y, radius, radius, viewport.to_array())
            .compose(&setup.projection);

        device.check_error()?;
        device.begin_selection(capacity);
        device.clear(ClearFlags::DEPTH);
        device.set_viewport(viewport);
        device.set_projection(&pick_projection.to_gpu());
        device.set_modelview(&setup.modelview.to_gpu());

        let screens = ScreenObjects::new();
        let view = self.build_view(models, &screens, &setup, self.window_width);
        let mut name_table: Vec<SharedRenderable> = Vec::with_capacity(self.object_count());
        device.push_name(0);
        for object in self.layer_world.iter().chain(self.layer_world_transparent.iter()) {
            device.load_name(name_table.len() as u32);
            name_table.push(object.clone());
            let mut object = lock_renderable(object)?;
            if object.is_visible() {
                object.pick_render(&view, device)?;
            }
        }
        device.pop_name();
        let hits = device.end_selection()?;
        device.check_error()?;

        let nearest = hits
            .iter()
            .filter(|hit| !hit.names.is_empty())
            .min_by_key(|hit| hit.min_depth);
        let object = match nearest {
            Some(hit) => Some(resolve_hit(&name_table, hit)?),
            None => None,
        };

        let center_depth = setup
            .project(self.center * self.gcf, viewport)
            .map_or(0.5, |(_, _, depth)| depth);
        let mouse_position = setup.unproject(x, window_y, center_depth, viewport) / self.gcf;
        let pick_position = match nearest {
            Some(hit) => setup.unproject(x, window_y, hit.min_depth_unit(), viewport) / self.gcf,
            None => mouse_position,
        };

        Ok(PickResult {
            object,
            pick_position,
            mouse_position,
            camera: setup.camera / self.gcf,
        })
    }
}

/// Resolve the name path of a hit against the top-level name table
fn resolve_hit(name_table: &[SharedRenderable], hit: &HitRecord) -> Result<SharedRenderable> {
    let (&first, rest) = hit
        .names
        .split_first()
        .ok_or_else(|| Error::InvalidPick("hit without names".to_string()))?;
    let top = name_table
        .get(first as usize)
        .ok_or_else(|| Error::InvalidPick(format!("name {} is not a top-level object", first)))?;
    if rest.is_empty() {
        return Ok(top.clone());
    }
    let guard = lock_renderable(top)?;
    match guard.as_frame() {
        Some(frame) => frame.lookup_name(rest),
        None => Err(Error::InvalidPick(format!(
            "nested name path below a {}",
            guard.type_name()
        ))),
    }
}

pub struct DisplayKernel {
    state: Mutex<KernelState>,
    models: ModelCache,
}

impl Default for DisplayKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayKernel {
    /// Kernel with default camera, no objects and no lights
    pub fn new() -> Self {
        Self {
            state: Mutex::new(KernelState::new()),
            models: ModelCache::new(),
        }
    }

    /// Kernel initialized from a display configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the configuration does not validate.
    pub fn with_config(config: &DisplayConfig) -> Result<Self> {
        config.validate()?;
        let kernel = Self::new();
        {
            let mut state = kernel.lock_state()?;
            state.window_width = config.width as f64;
            state.window_height = config.height as f64;
            state.fov = config.fov;
            state.stereo_mode = config.stereo;
            state.autoscale = config.autoscale;
            state.autocenter = config.autocenter;
            state.uniform = config.uniform;
            state.background = config.background;
            state.foreground = config.foreground;
            state.mouse_mode = config.mouse_mode;
            state.lod_adjust = config.lod_adjust;
            state.show_render_speed = config.show_render_speed;
        }
        Ok(kernel)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, KernelState>> {
        self.state
            .lock()
            .map_err(|_| Error::BackendError("DisplayKernel lock poisoned".to_string()))
    }

    /// Level-of-detail model tables shared by every shape of this window
    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    // ===== SCENE =====

    /// Add a top-level object, filed by its current alpha
    pub fn add_renderable(&self, object: SharedRenderable) -> Result<()> {
        let opaque = lock_renderable(&object)?.color().alpha == 1.0;
        let mut state = self.lock_state()?;
        if opaque {
            state.layer_world.push(object);
        } else {
            state.layer_world_transparent.push(object);
        }
        Ok(())
    }

    /// Remove a top-level object; returns whether it was present
    pub fn remove_renderable(&self, object: &SharedRenderable) -> Result<bool> {
        let mut state = self.lock_state()?;
        let before = state.object_count();
        state.layer_world.retain(|o| !same_object(o, object));
        state.layer_world_transparent.retain(|o| !same_object(o, object));
        Ok(state.object_count() != before)
    }

    /// Top-level objects, opaque layer first
    pub fn objects(&self) -> Result<Vec<SharedRenderable>> {
        let state = self.lock_state()?;
        Ok(state.layer_world.iter().chain(state.layer_world_transparent.iter()).cloned().collect())
    }

    pub fn object_count(&self) -> Result<usize> {
        Ok(self.lock_state()?.object_count())
    }

    // ===== LIGHTS =====

    /// # Errors
    ///
    /// `InvalidConfiguration` when the kernel already holds [`MAX_LIGHTS`] lights.
    pub fn add_light(&self, light: Light) -> Result<LightKey> {
        let mut state = self.lock_state()?;
        if state.lights.len() >= MAX_LIGHTS {
            return Err(crate::engine_config_err!(SOURCE, "There may be no more than {} lights.", MAX_LIGHTS));
        }
        Ok(state.lights.insert(light))
    }

    pub fn remove_light(&self, key: LightKey) -> Result<Option<Light>> {
        Ok(self.lock_state()?.lights.remove(key))
    }

    pub fn light(&self, key: LightKey) -> Result<Option<Light>> {
        Ok(self.lock_state()?.lights.get(key).cloned())
    }

    /// Replace a light in place; returns whether the key was present
    pub fn update_light(&self, key: LightKey, light: Light) -> Result<bool> {
        let mut state = self.lock_state()?;
        match state.lights.get_mut(key) {
            Some(slot) => {
                *slot = light;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn light_count(&self) -> Result<usize> {
        Ok(self.lock_state()?.lights.len())
    }

    pub fn clear_lights(&self) -> Result<()> {
        self.lock_state()?.lights.clear();
        Ok(())
    }

    pub fn ambient(&self) -> Result<Rgba> {
        Ok(self.lock_state()?.ambient)
    }

    pub fn set_ambient(&self, ambient: Rgba) -> Result<()> {
        self.lock_state()?.ambient = ambient;
        Ok(())
    }

    /// Replace all lights by the default pair of directional lights
    pub fn illuminate_default(&self) -> Result<()> {
        let key_light = Light::directional(DVec3::new(0.25, 0.5, 1.0), Rgba::gray(0.8))?;
        let fill_light = Light::directional(DVec3::new(-1.0, -0.25, 0.0), Rgba::gray(0.3))?;
        let mut state = self.lock_state()?;
        state.lights.clear();
        state.ambient = Rgba::gray(0.2);
        state.lights.insert(key_light);
        state.lights.insert(fill_light);
        Ok(())
    }

    // ===== CAMERA =====

    pub fn center(&self) -> Result<DVec3> {
        Ok(self.lock_state()?.center)
    }

    pub fn set_center(&self, center: DVec3) -> Result<()> {
        if !center.is_finite() {
            return Err(crate::engine_config_err!(SOURCE, "Center must be finite, got {:?}.", center));
        }
        self.lock_state()?.center = center;
        Ok(())
    }

    pub fn forward(&self) -> Result<DVec3> {
        Ok(self.lock_state()?.forward)
    }

    pub fn set_forward(&self, forward: DVec3) -> Result<()> {
        if forward == DVec3::ZERO || !forward.is_finite() {
            return Err(crate::engine_config_err!(SOURCE, "Forward cannot be zero."));
        }
        let mut state = self.lock_state()?;
        state.forward = forward;
        state.forward_changed = true;
        Ok(())
    }

    pub fn up(&self) -> Result<DVec3> {
        Ok(self.lock_state()?.up)
    }

    pub fn set_up(&self, up: DVec3) -> Result<()> {
        if up == DVec3::ZERO || !up.is_finite() {
            return Err(crate::engine_config_err!(SOURCE, "Up cannot be zero."));
        }
        self.lock_state()?.up = up;
        Ok(())
    }

    pub fn fov(&self) -> Result<f64> {
        Ok(self.lock_state()?.fov)
    }

    pub fn set_fov(&self, fov: f64) -> Result<()> {
        if !(fov > 0.0 && fov < PI) {
            return Err(crate::engine_config_err!(SOURCE, "Field of view must lie in (0, pi), got {}.", fov));
        }
        self.lock_state()?.fov = fov;
        Ok(())
    }

    pub fn range(&self) -> Result<DVec3> {
        Ok(self.lock_state()?.range)
    }

    /// Fix the half extents of the visible region; turns autoscale off
    pub fn set_range(&self, range: DVec3) -> Result<()> {
        if !(range.cmpgt(DVec3::ZERO).all() && range.is_finite()) {
            return Err(crate::engine_config_err!(SOURCE, "Range components must be positive, got {:?}.", range));
        }
        let mut state = self.lock_state()?;
        state.range = range;
        state.autoscale = false;
        Ok(())
    }

    /// Reciprocal of `range`
    pub fn scale(&self) -> Result<DVec3> {
        Ok(DVec3::ONE / self.lock_state()?.range)
    }

    pub fn set_scale(&self, scale: DVec3) -> Result<()> {
        if !(scale.cmpgt(DVec3::ZERO).all() && scale.is_finite()) {
            return Err(crate::engine_config_err!(SOURCE, "Scale components must be positive, got {:?}.", scale));
        }
        self.set_range(DVec3::ONE / scale)
    }

    pub fn autoscale(&self) -> Result<bool> {
        Ok(self.lock_state()?.autoscale)
    }

    pub fn set_autoscale(&self, autoscale: bool) -> Result<()> {
        self.lock_state()?.autoscale = autoscale;
        Ok(())
    }

    pub fn autocenter(&self) -> Result<bool> {
        Ok(self.lock_state()?.autocenter)
    }

    pub fn set_autocenter(&self, autocenter: bool) -> Result<()> {
        self.lock_state()?.autocenter = autocenter;
        Ok(())
    }

    pub fn uniform(&self) -> Result<bool> {
        Ok(self.lock_state()?.uniform)
    }

    pub fn set_uniform(&self, uniform: bool) -> Result<()> {
        self.lock_state()?.uniform = uniform;
        Ok(())
    }

    pub fn user_scale(&self) -> Result<f64> {
        Ok(self.lock_state()?.user_scale)
    }

    pub fn set_user_scale(&self, user_scale: f64) -> Result<()> {
        if !(user_scale > 0.0 && user_scale.is_finite()) {
            return Err(crate::engine_config_err!(SOURCE, "User scale must be positive, got {}.", user_scale));
        }
        self.lock_state()?.user_scale = user_scale;
        Ok(())
    }

    pub fn gcf(&self) -> Result<f64> {
        Ok(self.lock_state()?.gcf)
    }

    /// Whether the correction factor changed since the last completed render
    pub fn gcf_changed(&self) -> Result<bool> {
        Ok(self.lock_state()?.gcf_changed)
    }

    pub fn forward_changed(&self) -> Result<bool> {
        Ok(self.lock_state()?.forward_changed)
    }

    pub fn background(&self) -> Result<Rgba> {
        Ok(self.lock_state()?.background)
    }

    pub fn set_background(&self, color: Rgba) -> Result<()> {
        self.lock_state()?.background = color;
        Ok(())
    }

    pub fn foreground(&self) -> Result<Rgba> {
        Ok(self.lock_state()?.foreground)
    }

    pub fn set_foreground(&self, color: Rgba) -> Result<()> {
        self.lock_state()?.foreground = color;
        Ok(())
    }

    pub fn lod_adjust(&self) -> Result<i32> {
        Ok(self.lock_state()?.lod_adjust)
    }

    pub fn set_lod_adjust(&self, lod_adjust: i32) -> Result<()> {
        self.lock_state()?.lod_adjust = lod_adjust;
        Ok(())
    }

    pub fn mouse_mode(&self) -> Result<MouseMode> {
        Ok(self.lock_state()?.mouse_mode)
    }

    pub fn set_mouse_mode(&self, mode: MouseMode) -> Result<()> {
        self.lock_state()?.mouse_mode = mode;
        Ok(())
    }

    pub fn stereo_mode(&self) -> Result<StereoMode> {
        Ok(self.lock_state()?.stereo_mode)
    }

    pub fn set_stereo_mode(&self, mode: StereoMode) -> Result<()> {
        self.lock_state()?.stereo_mode = mode;
        Ok(())
    }

    /// Set the stereo mode from its configuration string (`"redcyan"`, ...)
    pub fn set_stereo_mode_name(&self, name: &str) -> Result<()> {
        let mode = name.parse::<StereoMode>().inspect_err(|err| {
            crate::engine_warn!(SOURCE, "{}", err);
        })?;
        self.set_stereo_mode(mode)
    }

    pub fn set_show_render_speed(&self, show: bool) -> Result<()> {
        self.lock_state()?.show_render_speed = show;
        Ok(())
    }

    /// Window size in pixels
    pub fn window_size(&self) -> Result<(f64, f64)> {
        let state = self.lock_state()?;
        Ok((state.window_width, state.window_height))
    }

    /// Completed render cycles
    pub fn cycles(&self) -> Result<u64> {
        Ok(self.lock_state()?.cycles)
    }

    /// Smoothed render cycle time in seconds
    pub fn cycle_time(&self) -> Result<f64> {
        Ok(self.lock_state()?.timer.read())
    }

    /// World extent from the last extent pass
    pub fn extent(&self) -> Result<Extent> {
        Ok(self.lock_state()?.world_extent.clone())
    }

    /// Recompute the world extent now, adjusting center, range and gcf
    ///
    /// # Errors
    ///
    /// `SceneTooLarge` when autoscaling meets a scene beyond [`MAX_SCENE_SCALE`].
    pub fn recalc_extent(&self) -> Result<()> {
        self.lock_state()?.recalc_extent()
    }

    /// Camera geometry the next render pass would use for `eye`
    pub fn world_to_view_transform(&self, eye: Eye) -> Result<CameraSetup> {
        let state = self.lock_state()?;
        let width = if state.stereo_mode == StereoMode::Passive {
            state.window_width * 0.5
        } else {
            state.window_width
        };
        Ok(state.camera_setup(eye, width))
    }

    // ===== WINDOW REPORTS =====

    pub fn report_resize(&self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            // Minimized windows keep their last usable size
            return Ok(());
        }
        let mut state = self.lock_state()?;
        state.window_width = size.width as f64;
        state.window_height = size.height as f64;
        Ok(())
    }

    /// The rendering context exists; the next render is the first one
    pub fn report_realize(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        state.realized = true;
        state.cycles_since_extent = EXTENT_INTERVAL;
        crate::engine_info!(SOURCE, "Display realized at {}x{}", state.window_width, state.window_height);
        Ok(())
    }

    pub fn is_realized(&self) -> Result<bool> {
        Ok(self.lock_state()?.realized)
    }

    /// The rendering context was destroyed; device-side models must be rebuilt
    pub fn report_context_lost(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        state.realized = false;
        self.models.clear();
        for object in state.layer_world.iter().chain(state.layer_world_transparent.iter()) {
            lock_renderable(object)?.state_mut().damage_model();
        }
        crate::engine_warn!(SOURCE, "Rendering context lost, cached models cleared");
        Ok(())
    }

    /// Move the camera in response to a drag of `(dx, dy)` pixels
    pub fn report_mouse_motion(&self, dx: f64, dy: f64, button: MouseButton) -> Result<()> {
        let mut state = self.lock_state()?;
        let vfrac = dy / state.window_height;
        let hfrac = dx / state.window_width;
        let pan_rate = stable_length(state.range) * state.user_scale / (state.fov * 0.5).tan();

        match (button, state.mouse_mode) {
            (MouseButton::Middle, MouseMode::Pan) => {
                let forward = state.forward.normalize_or_zero();
                state.center += forward * pan_rate * vfrac;
            }
            (MouseButton::Middle, MouseMode::ZoomRotate | MouseMode::ZoomRoll) => {
                state.user_scale *= 10f64.powf(vfrac);
            }
            (MouseButton::Right, MouseMode::Pan) => {
                let horizontal = state.forward.cross(state.up).normalize_or_zero();
                let vertical = horizontal.cross(state.forward).normalize_or_zero();
                state.center += -horizontal * pan_rate * hfrac + vertical * pan_rate * vfrac;
            }
            (MouseButton::Right, MouseMode::ZoomRotate) => {
                let up = state.up.normalize_or(DVec3::Y);
                let mut forward = Transform::rotation(-hfrac * 2.0, up).transform_vector(state.forward);

                let max_vertical = up.angle_between(-forward.normalize_or_zero());
                let vertical = (vfrac * 2.0)
                    .min(max_vertical - POLE_MARGIN)
                    .max(-PI + max_vertical + POLE_MARGIN);
                let axis = forward.cross(up).normalize_or_zero();
                forward = Transform::rotation(-vertical, axis).transform_vector(forward);
                state.forward = forward;
                state.forward_changed = true;
            }
            _ => {}
        }
        Ok(())
    }

    // ===== RENDERING =====

    /// Render one complete frame and present it.
    ///
    /// # Errors
    ///
    /// Device errors, a pick buffer overflow or an unrepresentable scene.
    /// These are fatal for the display; the error is logged before returning.
    pub fn render_scene(&self, context: &mut dyn RenderContext, device: &mut dyn GraphicsDevice) -> Result<()> {
        let mut state = self.lock_state()?;
        state.timer.start();
        context.activate()?;
        let rendered = state
            .render_passes(&self.models, device)
            .and_then(|()| context.swap_buffers())
            .and_then(|()| device.check_error());
        context.deactivate();
        if let Err(err) = rendered {
            crate::engine_error!(SOURCE, "Render failed: {}", err);
            return Err(err);
        }
        state.timer.stop();
        state.cycles_since_extent += 1;
        state.cycles += 1;
        state.gcf_changed = false;
        state.forward_changed = false;
        Ok(())
    }

    /// Find the object under window position `(x, y)` (origin at the top left).
    ///
    /// Hits are searched within a square of `radius` pixels.
    pub fn pick(
        &self,
        context: &mut dyn RenderContext,
        device: &mut dyn GraphicsDevice,
        x: f64,
        y: f64,
        radius: f64,
    ) -> Result<PickResult> {
        let mut state = self.lock_state()?;
        context.activate()?;
        let picked = state.pick_pass(&self.models, device, x, y, radius);
        context.deactivate();
        if let Err(err) = &picked {
            crate::engine_error!(SOURCE, "Pick failed: {}", err);
        }
        picked
    }
}

#[cfg(test)]
#[path = "display_kernel_tests.rs"]
mod tests;
