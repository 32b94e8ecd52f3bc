/// SoftwareContext - RenderContext for windowless rendering.
///
/// There is no real surface behind it: activation and swaps only update
/// shared flags and counters. A [`ContextProbe`] obtained before the context
/// moves to its display thread observes it and can simulate a lost context.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::lumen3d::render::RenderContext;

const SOURCE: &str = "lumen3d::software::Context";

#[derive(Debug, Default)]
struct ContextShared {
    active: AtomicBool,
    lost: AtomicBool,
    activations: AtomicU64,
    swaps: AtomicU64,
}

#[derive(Debug, Default)]
pub struct SoftwareContext {
    shared: Arc<ContextShared>,
}

/// Observer handle of a [`SoftwareContext`]
#[derive(Debug, Clone)]
pub struct ContextProbe {
    shared: Arc<ContextShared>,
}

impl SoftwareContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> ContextProbe {
        ContextProbe { shared: Arc::clone(&self.shared) }
    }
}

impl ContextProbe {
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn activations(&self) -> u64 {
        self.shared.activations.load(Ordering::SeqCst)
    }

    pub fn swaps(&self) -> u64 {
        self.shared.swaps.load(Ordering::SeqCst)
    }

    /// Make every following activation and swap fail
    pub fn lose(&self) {
        self.shared.lost.store(true, Ordering::SeqCst);
    }

    pub fn restore(&self) {
        self.shared.lost.store(false, Ordering::SeqCst);
    }
}

impl RenderContext for SoftwareContext {
    fn activate(&mut self) -> Result<()> {
        if self.shared.lost.load(Ordering::SeqCst) {
            lumen_3d_engine::engine_bail!(SOURCE, "Cannot activate a lost context");
        }
        self.shared.active.store(true, Ordering::SeqCst);
        self.shared.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.shared.active.store(false, Ordering::SeqCst);
    }

    fn swap_buffers(&mut self) -> Result<()> {
        if self.shared.lost.load(Ordering::SeqCst) {
            return Err(Error::BackendError("swap on a lost context".to_string()));
        }
        if !self.shared.active.load(Ordering::SeqCst) {
            lumen_3d_engine::engine_bail!(SOURCE, "swap_buffers called on an inactive context");
        }
        self.shared.swaps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
