/// Level-of-detail model tables shared by every instance of a shape.
///
/// Shapes tessellate a unit model once per level of detail and reuse it for
/// every instance. The cache is filled on first use and cleared when the
/// rendering context is lost, because any device-side copies die with it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use glam::DVec3;
use rustc_hash::FxHashMap;

/// Identifies one tessellation: shape family plus level of detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub shape: &'static str,
    pub lod: u32,
}

impl ModelKey {
    pub fn new(shape: &'static str, lod: u32) -> Self {
        Self { shape, lod }
    }
}

/// Unit-sized triangle soup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub triangles: Vec<[DVec3; 3]>,
}

impl Model {
    pub fn from_triangles(triangles: Vec<[DVec3; 3]>) -> Self {
        Self { triangles }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

#[derive(Default)]
pub struct ModelCache {
    models: Mutex<FxHashMap<ModelKey, Arc<Model>>>,
    builds: AtomicUsize,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, FxHashMap<ModelKey, Arc<Model>>> {
        // The table holds finished models only, so a poisoned lock is still consistent
        self.models.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the model for `key`, running `build` the first time it is asked for
    pub fn get_or_build<F>(&self, key: ModelKey, build: F) -> Arc<Model>
    where
        F: FnOnce() -> Model,
    {
        let mut table = self.table();
        if let Some(model) = table.get(&key) {
            return Arc::clone(model);
        }
        let model = Arc::new(build());
        self.builds.fetch_add(1, Ordering::Relaxed);
        table.insert(key, Arc::clone(&model));
        crate::engine_trace!(
            "lumen3d::ModelCache",
            "Built {} lod {} ({} triangles)",
            key.shape,
            key.lod,
            model.triangle_count()
        );
        model
    }

    pub fn get(&self, key: ModelKey) -> Option<Arc<Model>> {
        self.table().get(&key).cloned()
    }

    /// Drop every model; shapes rebuild on their next render
    pub fn clear(&self) {
        let mut table = self.table();
        if !table.is_empty() {
            crate::engine_debug!("lumen3d::ModelCache", "Dropping {} cached models", table.len());
        }
        table.clear();
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Number of times a builder has run since creation
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "model_cache_tests.rs"]
mod tests;
