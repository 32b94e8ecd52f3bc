//! Unit tests for the Engine singleton
//!
//! ENGINE_STATE and LOGGER are process-wide, so every test here is #[serial].
//! Other unit tests may log concurrently; log assertions therefore look for
//! specific entries instead of counting them.

use crate::lumen3d::{Engine, Error, DisplayKernel};
use crate::lumen3d::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Logger that keeps every entry it receives
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

fn setup() {
    Engine::reset_for_testing();
    let _ = Engine::initialize();
}

// ============================================================================
// INITIALIZATION AND SHUTDOWN
// ============================================================================

#[test]
#[serial]
fn test_initialize_is_idempotent() {
    setup();
    Engine::initialize().unwrap();
    Engine::initialize().unwrap();
    assert!(Engine::create_display("test_idempotent", DisplayKernel::new()).is_ok());
}

#[test]
#[serial]
fn test_shutdown_clears_displays() {
    setup();
    let _a = Engine::create_display("test_shutdown_a", DisplayKernel::new()).unwrap();
    let _b = Engine::create_display("test_shutdown_b", DisplayKernel::new()).unwrap();
    assert_eq!(Engine::display_count(), 2);

    Engine::shutdown();
    assert_eq!(Engine::display_count(), 0);
    assert!(Engine::display_names().is_empty());

    // A second shutdown is harmless
    Engine::shutdown();
}

#[test]
#[serial]
fn test_handles_survive_shutdown() {
    setup();
    let kernel = Engine::create_display("test_survivor", DisplayKernel::new()).unwrap();
    Engine::shutdown();
    kernel.set_autocenter(true).unwrap();
    assert!(kernel.autocenter().unwrap());
}

// ============================================================================
// DISPLAY REGISTRY
// ============================================================================

#[test]
#[serial]
fn test_create_and_lookup_display() {
    setup();
    let created = Engine::create_display("test_lookup", DisplayKernel::new()).unwrap();
    let found = Engine::display("test_lookup").unwrap();
    assert!(Arc::ptr_eq(&created, &found));

    // Changes through one handle are seen through the other
    created.set_user_scale(2.0).unwrap();
    assert_eq!(found.user_scale().unwrap(), 2.0);
}

#[test]
#[serial]
fn test_duplicate_display_name_fails() {
    setup();
    Engine::create_display("test_duplicate", DisplayKernel::new()).unwrap();
    let result = Engine::create_display("test_duplicate", DisplayKernel::new());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert_eq!(Engine::display_count(), 1);
}

#[test]
#[serial]
fn test_unknown_display_fails() {
    setup();
    match Engine::display("test_missing") {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("test_missing")),
        other => panic!("expected InitializationFailed, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[serial]
fn test_destroy_display() {
    setup();
    Engine::create_display("test_destroy", DisplayKernel::new()).unwrap();
    Engine::destroy_display("test_destroy").unwrap();
    assert!(Engine::display("test_destroy").is_err());

    // Unknown names are ignored
    Engine::destroy_display("test_destroy").unwrap();
}

#[test]
#[serial]
fn test_display_names_sorted() {
    setup();
    for name in ["test_c", "test_a", "test_b"] {
        Engine::create_display(name, DisplayKernel::new()).unwrap();
    }
    assert_eq!(Engine::display_names(), vec!["test_a", "test_b", "test_c"]);
}

// ============================================================================
// LOGGING
// ============================================================================

#[test]
#[serial]
fn test_registry_errors_are_logged() {
    setup();
    let entries = capture();

    let _ = Engine::display("test_logged_missing");

    let found = entries.lock().unwrap().iter().any(|entry| {
        entry.severity == LogSeverity::Error
            && entry.source == "lumen3d::Engine"
            && entry.message.contains("test_logged_missing")
            && entry.file.is_some()
            && entry.line.is_some()
    });
    Engine::reset_logger();
    assert!(found);
}

#[test]
#[serial]
fn test_log_macros_route_through_engine() {
    let entries = capture();

    crate::engine_info!("lumen3d::EngineTest", "display {} ready", 7);
    let err = crate::engine_config_err!("lumen3d::EngineTest", "bad value {}", 3);

    let captured: Vec<LogEntry> = entries
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.source == "lumen3d::EngineTest")
        .cloned()
        .collect();
    Engine::reset_logger();

    assert_eq!(err, Error::InvalidConfiguration("bad value 3".to_string()));
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "display 7 ready");
    assert!(captured[0].file.is_none());
    assert_eq!(captured[1].severity, LogSeverity::Warn);
}

#[test]
#[serial]
fn test_engine_err_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("lumen3d::EngineTest", "device lost after {} frames", 12);

    let logged = entries
        .lock()
        .unwrap()
        .iter()
        .any(|entry| entry.source == "lumen3d::EngineTest" && entry.severity == LogSeverity::Error);
    Engine::reset_logger();

    assert_eq!(err, Error::BackendError("device lost after 12 frames".to_string()));
    assert!(err.is_fatal());
    assert!(logged);
}
