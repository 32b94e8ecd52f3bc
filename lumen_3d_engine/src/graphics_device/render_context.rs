/// RenderContext - the three hooks a platform window supplies to a display.
///
/// The kernel activates the context before touching the device, swaps
/// buffers after the last draw call of a frame and deactivates it last.

use crate::error::Result;

pub trait RenderContext: Send {
    /// Make this window's rendering context current on the calling thread
    fn activate(&mut self) -> Result<()>;

    /// Release the context
    fn deactivate(&mut self);

    /// Present the back buffer
    fn swap_buffers(&mut self) -> Result<()>;
}

type Hook = Box<dyn FnMut() -> Result<()> + Send>;

/// RenderContext assembled from closures
///
/// # Example
///
/// ```no_run
/// use lumen_3d_engine::lumen3d::render::CallbackContext;
///
/// let context = CallbackContext::new(
///     || Ok(()),
///     || {},
///     || Ok(()),
/// );
/// ```
pub struct CallbackContext {
    activate: Hook,
    deactivate: Box<dyn FnMut() + Send>,
    swap: Hook,
}

impl CallbackContext {
    pub fn new<A, D, S>(activate: A, deactivate: D, swap: S) -> Self
    where
        A: FnMut() -> Result<()> + Send + 'static,
        D: FnMut() + Send + 'static,
        S: FnMut() -> Result<()> + Send + 'static,
    {
        Self {
            activate: Box::new(activate),
            deactivate: Box::new(deactivate),
            swap: Box::new(swap),
        }
    }
}

impl RenderContext for CallbackContext {
    fn activate(&mut self) -> Result<()> {
        (self.activate)()
    }

    fn deactivate(&mut self) {
        (self.deactivate)()
    }

    fn swap_buffers(&mut self) -> Result<()> {
        (self.swap)()
    }
}
