//! Unit tests for model_cache.rs

use super::*;
use glam::DVec3;
use std::sync::Arc;

fn triangle() -> Model {
    Model::from_triangles(vec![[DVec3::X, DVec3::Y, DVec3::Z]])
}

#[test]
fn test_build_once_per_key() {
    let cache = ModelCache::new();
    let key = ModelKey::new("sphere", 2);
    let a = cache.get_or_build(key, triangle);
    let b = cache.get_or_build(key, || panic!("builder must not run twice"));
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.build_count(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_levels_are_distinct() {
    let cache = ModelCache::new();
    cache.get_or_build(ModelKey::new("sphere", 0), triangle);
    cache.get_or_build(ModelKey::new("sphere", 1), Model::default);
    cache.get_or_build(ModelKey::new("cone", 0), Model::default);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(ModelKey::new("sphere", 0)).unwrap().triangle_count(), 1);
    assert!(cache.get(ModelKey::new("box", 0)).is_none());
}

#[test]
fn test_clear_forces_rebuild() {
    let cache = ModelCache::new();
    let key = ModelKey::new("ring", 3);
    cache.get_or_build(key, triangle);
    cache.clear();
    assert!(cache.is_empty());
    cache.get_or_build(key, triangle);
    assert_eq!(cache.build_count(), 2);
}
