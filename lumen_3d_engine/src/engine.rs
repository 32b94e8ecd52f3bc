/// Lumen3D Engine - process-wide registry of displays and the logger
///
/// Displays are registered by name so that any thread of the application can
/// reach the kernel of a window. State lives in thread-safe statics guarded by
/// RwLock. Logging works whether or not the engine has been initialized.

use std::sync::{OnceLock, RwLock, Arc};
use std::time::SystemTime;
use rustc_hash::FxHashMap;
use crate::error::{Result, Error};
use crate::kernel::DisplayKernel;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

struct EngineState {
    /// Display kernels by window name
    displays: RwLock<FxHashMap<String, Arc<DisplayKernel>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            displays: RwLock::new(FxHashMap::default()),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// # Example
///
/// ```no_run
/// use lumen_3d_engine::lumen3d::{Engine, DisplayKernel};
///
/// Engine::initialize()?;
/// let kernel = Engine::create_display("main", DisplayKernel::new())?;
/// kernel.illuminate_default()?;
///
/// // Elsewhere in the application
/// let same = Engine::display("main")?;
///
/// Engine::shutdown();
/// # Ok::<(), lumen_3d_engine::lumen3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an error before handing it back
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("lumen3d::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("lumen3d::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("lumen3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })
    }

    /// Initialize the engine; calling it again is harmless
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop every registered display.
    ///
    /// Kernels still referenced elsewhere stay alive until their last handle
    /// is dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut displays) = state.displays.write() {
                displays.clear();
            }
        }
    }

    // ===== DISPLAY API =====

    /// Register a kernel under `name` and return the shared handle
    ///
    /// # Errors
    ///
    /// - the engine is not initialized
    /// - a display with this name already exists
    /// - the registry lock is poisoned
    pub fn create_display(name: &str, kernel: DisplayKernel) -> Result<Arc<DisplayKernel>> {
        let state = Self::state()?;
        let mut displays = state.displays.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Display registry lock poisoned".to_string()))
        })?;

        if displays.contains_key(name) {
            return Err(Self::log_and_return_error(Error::InitializationFailed(format!(
                "Display '{}' already exists. Call Engine::destroy_display() first.",
                name
            ))));
        }

        let kernel = Arc::new(kernel);
        displays.insert(name.to_string(), Arc::clone(&kernel));
        crate::engine_info!("lumen3d::Engine", "Display '{}' created", name);
        Ok(kernel)
    }

    /// Kernel registered under `name`
    pub fn display(name: &str) -> Result<Arc<DisplayKernel>> {
        let state = Self::state()?;
        let displays = state.displays.read().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Display registry lock poisoned".to_string()))
        })?;

        displays.get(name).cloned().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(format!(
                "Display '{}' not found. Call Engine::create_display() first.",
                name
            )))
        })
    }

    /// Unregister a display; unknown names are ignored
    pub fn destroy_display(name: &str) -> Result<()> {
        let state = Self::state()?;
        let mut displays = state.displays.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Display registry lock poisoned".to_string()))
        })?;

        if displays.remove(name).is_some() {
            crate::engine_info!("lumen3d::Engine", "Display '{}' destroyed", name);
        }
        Ok(())
    }

    /// Number of registered displays (0 before initialization)
    pub fn display_count() -> usize {
        ENGINE_STATE
            .get()
            .and_then(|state| state.displays.read().ok().map(|displays| displays.len()))
            .unwrap_or(0)
    }

    /// Names of the registered displays, sorted
    pub fn display_names() -> Vec<String> {
        let mut names: Vec<String> = ENGINE_STATE
            .get()
            .and_then(|state| state.displays.read().ok().map(|displays| displays.keys().cloned().collect()))
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Clear the registry between tests
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
    }

    // ===== LOGGING API =====

    /// Replace the logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lumen_3d_engine::lumen3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Go back to the default console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Logging entry point of the `engine_*!` macros
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Logging entry point of `engine_error!`, with source location
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
