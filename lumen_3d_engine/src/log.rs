//! Internal logging system for the Lumen3D engine
//!
//! - Pluggable output via the [`Logger`] trait
//! - Severity levels from Trace to Error
//! - Colored console output by default, filtered by a minimum severity
//! - Source file and line attached to ERROR entries
//!
//! Every subsystem logs under a source name such as `"lumen3d::DisplayKernel"`
//! or `"lumen3d::Frame"`, so output from several displays can be told apart.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use lumen_3d_engine::lumen3d::log::{Logger, LogEntry};
///
/// struct CaptureLogger;
///
/// impl Logger for CaptureLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Handle one log entry
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Time the entry was created
    pub timestamp: SystemTime,

    /// Emitting subsystem (e.g., "lumen3d::DisplayKernel")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (ERROR entries only)
    pub file: Option<&'static str>,

    /// Source line (ERROR entries only)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-object render chatter
    Trace,

    /// Per-frame diagnostics (gcf changes, extent passes)
    Debug,

    /// Lifecycle events (display created, context realized)
    Info,

    /// Recovered problems such as a degenerate frame basis
    Warn,

    /// Configuration or graphics failures
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Console logger with colored output
///
/// Warnings and errors go to stderr, everything else to stdout.
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Logger that drops entries below `min_severity`
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Lowest severity that is printed
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Render an entry to a single line, without color codes when `plain` is set
    pub fn format_entry(entry: &LogEntry, plain: bool) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let (severity, source) = if plain {
            (label.to_string(), entry.source.clone())
        } else {
            let severity = match entry.severity {
                LogSeverity::Trace => label.bright_black(),
                LogSeverity::Debug => label.cyan(),
                LogSeverity::Info => label.green(),
                LogSeverity::Warn => label.yellow(),
                LogSeverity::Error => label.red().bold(),
            };
            (severity.to_string(), entry.source.bright_blue().to_string())
        };

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, source, entry.message, file, line
            ),
            _ => format!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::with_min_severity(LogSeverity::Debug)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.severity < self.min_severity {
            return;
        }
        let line = Self::format_entry(entry, false);
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!("lumen3d::Frame", "rendering {} children", count);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// ```ignore
/// engine_error!("lumen3d::DisplayKernel", "render failed: {}", err);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log_detailed(
            $crate::lumen3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an error and build the matching [`Error::BackendError`](crate::lumen3d::Error)
///
/// ```ignore
/// let err = engine_err!("lumen3d::software", "stack underflow in {}", "pop_transform");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen3d::Error::BackendError(message)
    }};
}

/// Log an error and return it from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a warning and build an [`Error::InvalidConfiguration`](crate::lumen3d::Error)
///
/// Configuration errors are recoverable, so they are logged at WARN severity.
#[macro_export]
macro_rules! engine_config_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::lumen3d::Error::InvalidConfiguration(message)
    }};
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
