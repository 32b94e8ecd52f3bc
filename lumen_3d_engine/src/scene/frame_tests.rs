//! Unit tests for frame.rs

use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::resource::ModelCache;
use crate::scene::test_body::{poison, TestBody};
use crate::scene::{share, ScreenObjects, HIT_RECORD_OVERHEAD};
use glam::DVec3;

fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-9
}

fn tilted_frame() -> Frame {
    let mut frame = Frame::new();
    frame.set_pos(DVec3::new(3.0, -2.0, 7.0));
    frame.set_axis(DVec3::new(1.0, 1.0, 0.0)).unwrap();
    frame.set_up(DVec3::new(0.0, 0.2, 1.0)).unwrap();
    frame.set_scale(DVec3::new(2.0, 0.5, 4.0)).unwrap();
    frame
}

// ============================================================================
// TRANSFORMS
// ============================================================================

#[test]
fn test_world_frame_is_inverse_of_frame_world() {
    let frame = tilted_frame();
    for gcf in [1.0, 0.25, 1e-6] {
        let there = frame.frame_world_transform(gcf);
        let back = frame.world_frame_transform(gcf);
        for p in [DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0), DVec3::new(-40.0, 0.5, 9.0)] {
            let round = back.transform_point(there.transform_point(p));
            assert!(close(round, p), "gcf {} point {:?} came back as {:?}", gcf, p, round);
        }
    }
}

#[test]
fn test_frame_world_places_origin_at_pos() {
    let frame = tilted_frame();
    assert!(close(frame.frame_world_transform(1.0).transform_point(DVec3::ZERO), frame.pos()));
    assert!(close(frame.frame_world_transform(0.5).transform_point(DVec3::ZERO), frame.pos() * 0.5));
}

#[test]
fn test_invalid_settings_leave_frame_unchanged() {
    let mut frame = tilted_frame();
    let basis = frame.basis();
    assert!(frame.set_axis(DVec3::ZERO).is_err());
    assert!(frame.set_up(DVec3::ZERO).is_err());
    assert!(frame.set_scale(DVec3::new(1.0, 0.0, 1.0)).is_err());
    assert!(frame.set_scale(DVec3::new(1.0, f64::NAN, 1.0)).is_err());
    assert_eq!(frame.basis(), basis);
    assert_eq!(frame.scale(), DVec3::new(2.0, 0.5, 4.0));
}

#[test]
fn test_parallel_axis_and_up_still_gives_basis() {
    let mut frame = Frame::new();
    frame.set_axis(DVec3::Y).unwrap();
    let basis = frame.basis();
    assert!(basis.degenerate);
    assert!(basis.x.dot(basis.y).abs() < 1e-12);
    assert!(basis.y.dot(basis.z).abs() < 1e-12);
}

// ============================================================================
// CHILDREN
// ============================================================================

#[test]
fn test_children_filed_by_alpha() {
    let mut frame = Frame::new();
    let solid = share(TestBody::new(DVec3::ZERO, 1.0));
    let glass = share(TestBody::new(DVec3::X, 1.0).with_color(Rgba::WHITE.with_alpha(0.5)));
    frame.add_child(glass.clone()).unwrap();
    frame.add_child(solid.clone()).unwrap();
    assert_eq!(frame.opaque_children().len(), 1);
    assert_eq!(frame.transparent_children().len(), 1);
    // Opaque first in selection-name order
    assert!(same_object(&frame.children()[0], &solid));

    assert!(frame.remove_child(&glass));
    assert!(!frame.remove_child(&glass));
    assert_eq!(frame.child_count(), 1);
}

#[test]
fn test_center_is_mean_of_children() {
    let mut frame = Frame::new();
    assert_eq!(frame.center(), DVec3::ZERO);
    frame.set_pos(DVec3::new(10.0, 0.0, 0.0));
    frame.add_child(share(TestBody::new(DVec3::new(1.0, 0.0, 0.0), 1.0))).unwrap();
    frame.add_child(share(TestBody::new(DVec3::new(3.0, 0.0, 0.0), 1.0))).unwrap();
    assert!(close(frame.center(), DVec3::new(12.0, 0.0, 0.0)));
}

#[test]
fn test_center_skips_poisoned_child() {
    let mut frame = Frame::new();
    let broken = share(TestBody::new(DVec3::new(100.0, 0.0, 0.0), 1.0));
    frame.add_child(share(TestBody::new(DVec3::new(2.0, 0.0, 0.0), 1.0))).unwrap();
    frame.add_child(broken.clone()).unwrap();
    frame.add_child(share(TestBody::new(DVec3::new(4.0, 0.0, 0.0), 1.0))).unwrap();
    poison(&broken);

    assert!(close(frame.center(), DVec3::new(3.0, 0.0, 0.0)));
}

// ============================================================================
// EXTENT
// ============================================================================

#[test]
fn test_extent_of_translated_frame() {
    let mut frame = Frame::new();
    frame.set_pos(DVec3::new(100.0, 0.0, 0.0));
    frame.add_child(share(TestBody::new(DVec3::ZERO, 1.0))).unwrap();
    let mut world = Extent::new();
    frame.grow_extent(&mut world);
    assert!(close(world.center(), DVec3::new(100.0, 0.0, 0.0)));
    assert_eq!(world.frame_depth(), 0);
    assert_eq!(world.select_buffer_depth(), HIT_RECORD_OVERHEAD + 1);
}

#[test]
fn test_nested_frame_selection_words() {
    let mut inner = Frame::new();
    for i in 0..3 {
        inner.add_child(share(TestBody::new(DVec3::new(i as f64, 0.0, 0.0), 0.5))).unwrap();
    }
    let mut outer = Frame::new();
    outer.add_child(share(TestBody::new(DVec3::ZERO, 1.0))).unwrap();
    outer.add_child(share(inner)).unwrap();

    let mut world = Extent::new();
    outer.grow_extent(&mut world);
    // The inner frame has no record of its own; its bodies carry three names
    let outer_body = HIT_RECORD_OVERHEAD + 1;
    let inner_body = HIT_RECORD_OVERHEAD + 2;
    assert_eq!(world.select_buffer_depth(), outer_body + 3 * inner_body);
}

#[test]
fn test_hidden_children_do_not_count() {
    let mut frame = Frame::new();
    let mut hidden = TestBody::new(DVec3::new(50.0, 0.0, 0.0), 1.0);
    hidden.state_mut().visible = false;
    frame.add_child(share(hidden)).unwrap();
    frame.add_child(share(TestBody::new(DVec3::ZERO, 1.0))).unwrap();
    let mut world = Extent::new();
    frame.grow_extent(&mut world);
    assert!(world.maxs().x < 2.0);
    assert_eq!(world.select_buffer_depth(), HIT_RECORD_OVERHEAD + 1);
}

// ============================================================================
// RENDER AND PICK
// ============================================================================

#[test]
fn test_render_pushes_and_pops_transform() {
    let models = ModelCache::new();
    let overlays = ScreenObjects::new();
    let mut view = View::new(DVec3::NEG_Z, DVec3::ZERO, 384.0, 256.0, &models, &overlays);
    view.gcf = 0.5;
    let body = share(TestBody::new(DVec3::ZERO, 1.0));
    let mut frame = Frame::new();
    frame.add_child(body.clone()).unwrap();

    let mut device = MockGraphicsDevice::new();
    frame.render(&view, &mut device).unwrap();
    assert_eq!(device.commands.first().map(String::as_str), Some("push_transform"));
    assert_eq!(device.commands.last().map(String::as_str), Some("pop_transform"));
    assert_eq!(device.triangles_drawn, 1);
}

#[test]
fn test_children_see_local_view() {
    let models = ModelCache::new();
    let overlays = ScreenObjects::new();
    let mut view = View::new(DVec3::NEG_Z, DVec3::ZERO, 384.0, 256.0, &models, &overlays);
    view.camera = DVec3::new(5.0, 0.0, 10.0);
    view.gcf = 0.1;

    let mut frame = Frame::new();
    frame.set_pos(DVec3::new(5.0, 0.0, 0.0));
    let local = frame.local_view(&view);
    assert!(close(local.camera, DVec3::new(0.0, 0.0, 10.0)));
    assert!(close(local.forward, DVec3::NEG_Z));
    assert_eq!(local.gcf, 1.0);

    local.push_overlay(DVec3::ZERO, Rgba::WHITE, "origin");
    assert!(close(overlays.take()[0].position, DVec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_render_migrates_children() {
    let models = ModelCache::new();
    let overlays = ScreenObjects::new();
    let view = View::new(DVec3::NEG_Z, DVec3::ZERO, 384.0, 256.0, &models, &overlays);
    let body = share(TestBody::new(DVec3::ZERO, 1.0));
    let mut frame = Frame::new();
    frame.add_child(body.clone()).unwrap();
    lock_renderable(&body).unwrap().set_color(Rgba::WHITE.with_alpha(0.2));

    frame.render(&view, &mut MockGraphicsDevice::new()).unwrap();
    assert!(frame.opaque_children().is_empty());
    assert_eq!(frame.transparent_children().len(), 1);
}

#[test]
fn test_pick_render_names_children() {
    let models = ModelCache::new();
    let overlays = ScreenObjects::new();
    let view = View::new(DVec3::NEG_Z, DVec3::ZERO, 384.0, 256.0, &models, &overlays);
    let mut frame = Frame::new();
    frame.add_child(share(TestBody::new(DVec3::ZERO, 1.0))).unwrap();
    frame.add_child(share(TestBody::new(DVec3::X, 1.0))).unwrap();

    let mut device = MockGraphicsDevice::new();
    frame.pick_render(&view, &mut device).unwrap();
    let names: Vec<&str> = device
        .commands
        .iter()
        .map(String::as_str)
        .filter(|c| c.contains("name") || c.contains("transform"))
        .collect();
    assert_eq!(
        names,
        vec!["push_name:0", "push_transform", "load_name:0", "load_name:1", "pop_transform", "pop_name"]
    );
}

// ============================================================================
// NAME LOOKUP
// ============================================================================

#[test]
fn test_lookup_name_descends_into_frames() {
    let leaf = share(TestBody::new(DVec3::ZERO, 1.0));
    let glass = share(TestBody::new(DVec3::ZERO, 1.0).with_color(Rgba::WHITE.with_alpha(0.5)));
    let mut inner = Frame::new();
    inner.add_child(share(TestBody::new(DVec3::X, 1.0))).unwrap();
    inner.add_child(leaf.clone()).unwrap();
    let mut outer = Frame::new();
    outer.add_child(share(inner)).unwrap();
    outer.add_child(glass.clone()).unwrap();

    assert!(same_object(&outer.lookup_name(&[0, 1]).unwrap(), &leaf));
    assert!(same_object(&outer.lookup_name(&[1]).unwrap(), &glass));
}

#[test]
fn test_lookup_name_rejects_bad_paths() {
    let mut frame = Frame::new();
    frame.add_child(share(TestBody::new(DVec3::ZERO, 1.0))).unwrap();
    assert!(matches!(frame.lookup_name(&[]), Err(Error::InvalidPick(_))));
    assert!(matches!(frame.lookup_name(&[4]), Err(Error::InvalidPick(_))));
    assert!(matches!(frame.lookup_name(&[0, 0]), Err(Error::InvalidPick(_))));
}
