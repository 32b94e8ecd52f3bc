//! Picking through the software device
//!
//! These tests run the complete selection path: kernel pick pass, clip-space
//! hit testing in the software device, and name resolution back to objects.

mod common;

use common::Sphere;
use glam::DVec3;
use lumen_3d_engine::lumen3d::{DisplayKernel, Eye};
use lumen_3d_engine::lumen3d::render::Viewport;
use lumen_3d_engine::lumen3d::scene::{share, same_object, Frame, Renderable, SharedRenderable};
use lumen_3d_engine_device_software::{SoftwareContext, SoftwareGraphicsDevice};

const PICK_RADIUS: f64 = 2.0;

/// Kernel holding `objects`, after one frame so the camera has autoscaled
fn rendered_kernel(objects: &[SharedRenderable]) -> (DisplayKernel, SoftwareContext, SoftwareGraphicsDevice) {
    let kernel = DisplayKernel::new();
    for object in objects {
        kernel.add_renderable(object.clone()).unwrap();
    }
    let mut context = SoftwareContext::new();
    let mut device = SoftwareGraphicsDevice::new();
    kernel.render_scene(&mut context, &mut device).unwrap();
    (kernel, context, device)
}

/// Mouse position (origin top left) of a world point
fn mouse_position_of(kernel: &DisplayKernel, point: DVec3) -> (f64, f64) {
    let (width, height) = kernel.window_size().unwrap();
    let viewport = Viewport::new(0, 0, width as i32, height as i32);
    let setup = kernel.world_to_view_transform(Eye::Center).unwrap();
    let (x, y, _) = setup.project(point * kernel.gcf().unwrap(), viewport).unwrap();
    (x, height - y)
}

// ============================================================================
// HITS
// ============================================================================

#[test]
fn test_pick_sphere_at_window_center() {
    let sphere = share(Sphere::new(DVec3::ZERO, 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[sphere.clone()]);
    let (width, height) = kernel.window_size().unwrap();

    let pick = kernel
        .pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS)
        .unwrap();

    let object = pick.object.expect("sphere should be hit");
    assert!(same_object(&object, &sphere));
    let distance = pick.pick_position.length();
    assert!(distance <= 1.0 + 1e-3, "pick position {:?} outside the sphere", pick.pick_position);
    assert!(distance > 0.95, "pick position {:?} too deep inside the sphere", pick.pick_position);
    // The hit lies on the side facing the camera
    assert!(pick.pick_position.z > 0.9);
    assert!(pick.camera.z > 1.0);
}

#[test]
fn test_pick_prefers_nearest_object() {
    let back = share(Sphere::new(DVec3::new(0.0, 0.0, -2.0), 1.0));
    let front = share(Sphere::new(DVec3::new(0.0, 0.0, 2.0), 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[back.clone(), front.clone()]);
    let (width, height) = kernel.window_size().unwrap();

    let pick = kernel
        .pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS)
        .unwrap();

    let object = pick.object.expect("front sphere should be hit");
    assert!(same_object(&object, &front));
    assert!((pick.pick_position.z - 3.0).abs() < 1e-2);
}

#[test]
fn test_pick_off_center_sphere() {
    let left = share(Sphere::new(DVec3::new(-2.0, 0.0, 0.0), 0.5));
    let right = share(Sphere::new(DVec3::new(2.0, 0.0, 0.0), 0.5));
    let (kernel, mut context, mut device) = rendered_kernel(&[left.clone(), right.clone()]);

    let (x, y) = mouse_position_of(&kernel, DVec3::new(2.0, 0.0, 0.0));
    let pick = kernel.pick(&mut context, &mut device, x, y, PICK_RADIUS).unwrap();

    let object = pick.object.expect("right sphere should be hit");
    assert!(same_object(&object, &right));
    assert!((pick.pick_position - DVec3::new(2.0, 0.0, 0.0)).length() <= 0.5 + 1e-3);
}

#[test]
fn test_pick_resolves_frame_child() {
    let anchor = share(Sphere::new(DVec3::ZERO, 0.5));
    let child = share(Sphere::new(DVec3::ZERO, 0.5));
    let mut frame = Frame::new();
    frame.set_pos(DVec3::new(2.0, 0.0, 0.0));
    frame.add_child(child.clone()).unwrap();
    let frame = share(frame);
    let (kernel, mut context, mut device) = rendered_kernel(&[anchor, frame]);

    let (x, y) = mouse_position_of(&kernel, DVec3::new(2.0, 0.0, 0.0));
    let pick = kernel.pick(&mut context, &mut device, x, y, PICK_RADIUS).unwrap();

    let object = pick.object.expect("frame child should be hit");
    assert!(same_object(&object, &child));
    assert!((pick.pick_position - DVec3::new(2.0, 0.0, 0.0)).length() <= 0.5 + 1e-3);
}

// ============================================================================
// CROWDED SCENES
// ============================================================================

fn frame_of(children: impl IntoIterator<Item = SharedRenderable>) -> Frame {
    let mut frame = Frame::new();
    for child in children {
        frame.add_child(child).unwrap();
    }
    frame
}

fn spheres_at_origin(count: usize) -> Vec<SharedRenderable> {
    (0..count).map(|_| share(Sphere::new(DVec3::ZERO, 1.0))).collect()
}

/// Pick at the window center, where every object of the scene overlaps
fn pick_center(objects: &[SharedRenderable]) -> (Option<SharedRenderable>, u64) {
    let (kernel, mut context, mut device) = rendered_kernel(objects);
    let (width, height) = kernel.window_size().unwrap();
    let pick = kernel
        .pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS)
        .unwrap();
    (pick.object, device.stats().snapshot().hits)
}

#[test]
fn test_pick_frame_among_top_level_bodies() {
    let mut objects = vec![share(frame_of(spheres_at_origin(5)))];
    objects.extend(spheres_at_origin(3));

    let (object, hits) = pick_center(&objects);
    assert!(object.is_some());
    assert_eq!(hits, 8);
}

#[test]
fn test_pick_through_nested_frames() {
    let inner = share(frame_of(spheres_at_origin(10)));
    let outer = share(frame_of([inner]));

    let (object, hits) = pick_center(&[outer]);
    assert!(object.is_some());
    assert_eq!(hits, 10);
}

#[test]
fn test_pick_sees_objects_added_after_render() {
    let first = share(Sphere::new(DVec3::ZERO, 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[first]);
    kernel.add_renderable(share(frame_of(spheres_at_origin(6)))).unwrap();
    let (width, height) = kernel.window_size().unwrap();

    let pick = kernel
        .pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS)
        .unwrap();
    assert!(pick.object.is_some());
    assert_eq!(device.stats().snapshot().hits, 7);
}

// ============================================================================
// MISSES
// ============================================================================

#[test]
fn test_pick_miss_lands_on_mouse_plane() {
    let sphere = share(Sphere::new(DVec3::ZERO, 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[sphere]);

    let pick = kernel.pick(&mut context, &mut device, 2.0, 2.0, PICK_RADIUS).unwrap();

    assert!(pick.object.is_none());
    assert_eq!(pick.pick_position, pick.mouse_position);
    // The mouse plane passes through the scene center, facing the camera
    assert!(pick.mouse_position.z.abs() < 1e-6);
}

#[test]
fn test_hidden_object_is_not_picked() {
    let sphere = share(Sphere::new(DVec3::ZERO, 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[sphere.clone()]);
    sphere.lock().unwrap().state_mut().visible = false;
    let (width, height) = kernel.window_size().unwrap();

    let pick = kernel
        .pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS)
        .unwrap();

    assert!(pick.object.is_none());
}

#[test]
fn test_pick_reports_selection_stats() {
    let sphere = share(Sphere::new(DVec3::ZERO, 1.0));
    let (kernel, mut context, mut device) = rendered_kernel(&[sphere]);
    let stats = device.stats();
    let (width, height) = kernel.window_size().unwrap();

    kernel.pick(&mut context, &mut device, width / 2.0, height / 2.0, PICK_RADIUS).unwrap();
    kernel.pick(&mut context, &mut device, 1.0, 1.0, PICK_RADIUS).unwrap();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.selections, 2);
    assert_eq!(snapshot.hits, 1);
    assert!(!device.is_selecting());
}
