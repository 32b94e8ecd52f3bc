/// Device statistics - atomic counters shared between a device and observers.
///
/// The device usually lives on a display thread, so callers keep an
/// `Arc<DeviceStats>` to read the counters from elsewhere.

use std::sync::atomic::{AtomicU64, Ordering};

const SOURCE: &str = "lumen3d::software::Stats";

/// Thread-safe counters updated by [`SoftwareGraphicsDevice`](crate::SoftwareGraphicsDevice)
#[derive(Debug, Default)]
pub struct DeviceStats {
    clears: AtomicU64,
    triangles_submitted: AtomicU64,
    triangles_visible: AtomicU64,
    selections: AtomicU64,
    hits: AtomicU64,
    errors: AtomicU64,
}

/// Plain copy of the counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub clears: u64,
    pub triangles_submitted: u64,
    /// Submitted triangles with some part inside the view volume
    pub triangles_visible: u64,
    pub selections: u64,
    pub hits: u64,
    pub errors: u64,
}

impl DeviceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_triangles(&self, submitted: u64, visible: u64) {
        self.triangles_submitted.fetch_add(submitted, Ordering::Relaxed);
        self.triangles_visible.fetch_add(visible, Ordering::Relaxed);
    }

    pub(crate) fn count_selection(&self, hits: u64) {
        self.selections.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(hits, Ordering::Relaxed);
    }

    pub(crate) fn count_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            clears: self.clears.load(Ordering::Relaxed),
            triangles_submitted: self.triangles_submitted.load(Ordering::Relaxed),
            triangles_visible: self.triangles_visible.load(Ordering::Relaxed),
            selections: self.selections.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.clears.store(0, Ordering::Relaxed);
        self.triangles_submitted.store(0, Ordering::Relaxed);
        self.triangles_visible.store(0, Ordering::Relaxed);
        self.selections.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    /// Write the counters through the engine logger
    pub fn log_report(&self) {
        let stats = self.snapshot();
        if stats.errors > 0 {
            lumen_3d_engine::engine_warn!(SOURCE, "{} device error(s) reported", stats.errors);
        }
        lumen_3d_engine::engine_info!(
            SOURCE,
            "clears: {}, triangles: {} ({} visible), selections: {} ({} hits)",
            stats.clears,
            stats.triangles_submitted,
            stats.triangles_visible,
            stats.selections,
            stats.hits
        );
    }
}
