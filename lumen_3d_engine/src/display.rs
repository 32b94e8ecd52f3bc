/// Display thread - runs the render loop of one window.
///
/// The rendering context and graphics device are created on the display
/// thread itself, since most platforms tie a context to the thread that made
/// it current. `DisplayThread::start` blocks until that has happened and then
/// returns a handle for feeding input events and stopping the thread.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::config::DisplayConfig;
use crate::error::{Error, Result};
use crate::events::{EventQueue, EventSender, InputEvent};
use crate::graphics_device::{GraphicsDevice, RenderContext};
use crate::kernel::{DisplayKernel, MouseEventQueue, MouseManager};

const SOURCE: &str = "lumen3d::DisplayThread";

/// Time between two frames when no event arrives
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Half size in pixels of the square searched under the cursor
pub const PICK_RADIUS: f64 = 2.0;

/// Context and device of one window, built on the display thread
pub type Backend = (Box<dyn RenderContext>, Box<dyn GraphicsDevice>);

pub struct DisplayThread;

/// Control handle of a running display thread
pub struct DisplayHandle {
    kernel: Arc<DisplayKernel>,
    events: EventSender,
    mouse_events: Arc<MouseEventQueue>,
    closed: Receiver<Result<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DisplayThread {
    /// Spawn the display thread of `kernel` and wait until it is ready.
    ///
    /// `backend` runs on the new thread and builds its context and device.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` when the thread cannot be spawned, the backend
    /// cannot be built, or the thread dies before reporting.
    pub fn start<F>(kernel: Arc<DisplayKernel>, config: &DisplayConfig, backend: F) -> Result<DisplayHandle>
    where
        F: FnOnce() -> Result<Backend> + Send + 'static,
    {
        let (events, queue) = EventQueue::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let (closed_tx, closed_rx) = mpsc::channel::<Result<()>>();
        let manager = MouseManager::new();
        let mouse_events = manager.events();
        let abort_on_fatal = config.abort_on_fatal;
        let thread_kernel = Arc::clone(&kernel);

        let thread = thread::Builder::new()
            .name(format!("lumen3d-display-{}", config.title))
            .spawn(move || {
                let (mut context, mut device) = match backend() {
                    Ok(backend) => backend,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if let Err(err) = thread_kernel.report_realize() {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                let mut worker = DisplayWorker {
                    kernel: thread_kernel,
                    queue,
                    manager,
                    abort_on_fatal,
                    last_pick: None,
                };
                let outcome = worker.run(context.as_mut(), device.as_mut());
                let _ = closed_tx.send(outcome);
            })
            .map_err(|e| {
                crate::engine_error!(SOURCE, "Failed to spawn display thread: {}", e);
                Error::InitializationFailed(format!("Failed to spawn display thread: {}", e))
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                crate::engine_info!(SOURCE, "Display '{}' started", config.title);
                Ok(DisplayHandle {
                    kernel,
                    events,
                    mouse_events,
                    closed: closed_rx,
                    thread: Some(thread),
                })
            }
            Ok(Err(err)) => {
                let _ = thread.join();
                crate::engine_error!(SOURCE, "Display '{}' failed to start: {}", config.title, err);
                Err(Error::InitializationFailed(format!("Display '{}' failed to start: {}", config.title, err)))
            }
            Err(_) => {
                let _ = thread.join();
                crate::engine_error!(SOURCE, "Display '{}' exited before reporting", config.title);
                Err(Error::InitializationFailed(format!("Display '{}' exited before reporting", config.title)))
            }
        }
    }
}

impl DisplayHandle {
    pub fn kernel(&self) -> &Arc<DisplayKernel> {
        &self.kernel
    }

    /// Queue an input event for the display thread
    pub fn send(&self, event: InputEvent) -> Result<()> {
        self.events.send(event)
    }

    /// Sender that can be moved to the windowing thread
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Left-button events produced by the display's mouse manager
    pub fn mouse_events(&self) -> Arc<MouseEventQueue> {
        Arc::clone(&self.mouse_events)
    }

    /// Receives one message when the thread stops: `Ok` after a requested
    /// close, the error after a fatal failure
    pub fn closed(&self) -> &Receiver<Result<()>> {
        &self.closed
    }

    /// Ask the thread to stop and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        // The thread may already be gone after a fatal error
        let _ = self.events.send(InputEvent::Close);
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| Error::BackendError("display thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.events.send(InputEvent::Close);
            let _ = self.join();
        }
    }
}

struct DisplayWorker {
    kernel: Arc<DisplayKernel>,
    queue: EventQueue,
    manager: MouseManager,
    abort_on_fatal: bool,
    /// Cursor position of the last pick
    last_pick: Option<(i32, i32)>,
}

impl DisplayWorker {
    fn run(&mut self, context: &mut dyn RenderContext, device: &mut dyn GraphicsDevice) -> Result<()> {
        loop {
            let mut events: Vec<InputEvent> = self.queue.wait(FRAME_INTERVAL).into_iter().collect();
            events.extend(self.queue.drain());

            for event in events {
                let handled = match event {
                    InputEvent::Close => {
                        crate::engine_info!(SOURCE, "Display closed");
                        return Ok(());
                    }
                    event => self.handle(event, context, device),
                };
                if let Err(err) = handled {
                    self.fail(err)?;
                }
            }
            if self.queue.is_disconnected() {
                crate::engine_info!(SOURCE, "Event channel closed, stopping display");
                return Ok(());
            }

            if let Err(err) = self.kernel.render_scene(context, device) {
                self.fail(err)?;
            }
        }
    }

    fn handle(
        &mut self,
        event: InputEvent,
        context: &mut dyn RenderContext,
        device: &mut dyn GraphicsDevice,
    ) -> Result<()> {
        match event {
            InputEvent::Resized(size) => self.kernel.report_resize(size),
            InputEvent::Mouse { buttons, x, y, modifiers, can_lock } => {
                if self.last_pick != Some((x, y)) {
                    let pick = self.kernel.pick(context, device, x as f64, y as f64, PICK_RADIUS)?;
                    self.manager.set_pick(&pick);
                    self.last_pick = Some((x, y));
                }
                self.manager.report_mouse_state(&self.kernel, buttons, x, y, modifiers, can_lock)
            }
            InputEvent::Redraw => self.kernel.render_scene(context, device),
            InputEvent::ContextLost => self.kernel.report_context_lost(),
            InputEvent::Close => Ok(()),
        }
    }

    /// Fatal errors end the display (and the process when configured to);
    /// everything else is logged and the loop goes on
    fn fail(&self, err: Error) -> Result<()> {
        if !err.is_fatal() {
            crate::engine_warn!(SOURCE, "Recovered from: {}", err);
            return Ok(());
        }
        crate::engine_error!(SOURCE, "Fatal display error: {}", err);
        if self.abort_on_fatal {
            std::process::exit(1);
        }
        Err(err)
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
