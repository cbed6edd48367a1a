//! Structured logging for copyscope
//!
//! Console logging with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Colored, tag-prefixed output
//!
//! ## Usage
//!
//! ```rust
//! use copyscope::logger::{self, LogTag};
//!
//! logger::info(LogTag::Sync, "Sync started");
//! logger::warning(LogTag::Provider, "Rate limit approaching");
//! logger::debug(LogTag::Parser, "Strategy A produced 0 trades"); // Only with --debug-parser
//! ```
//!
//! Call `logger::init()` once at startup to pick up debug flags from the
//! command line before any logging occurs.

mod config;
mod core;
mod levels;
mod tags;

pub use config::{ get_logger_config, init_from_args, LoggerConfig };
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system from command-line arguments
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (gated by --debug-<module>)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Event-style logging: a short uppercase event key plus a message.
/// Kept for call sites that tag a lifecycle step, e.g. `log(LogTag::Sync, "COMMIT", ...)`.
pub fn log(tag: LogTag, event: &str, message: &str) {
    core::log_internal(tag, LogLevel::Info, &format!("{}: {}", event, message));
}
