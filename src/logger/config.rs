/// Logger configuration derived from command-line arguments
///
/// Scans the process arguments once for --debug-<module>, --verbose and
/// --quiet flags and keeps the result behind a global RwLock.

use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level threshold (Info by default)
    pub min_level: LogLevel,
    /// Modules with --debug-<module> enabled
    pub debug_modules: HashSet<String>,
    /// Global --verbose flag
    pub verbose: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_modules: HashSet::new(),
            verbose: false,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Parse the process arguments into the global logger config
pub fn init_from_args() {
    let args = crate::arguments::get_cmd_args();
    let mut config = LoggerConfig::default();

    for arg in &args {
        if let Some(module) = arg.strip_prefix("--debug-") {
            config.debug_modules.insert(module.to_string());
        }
    }

    if args.iter().any(|a| a == "--verbose") {
        config.verbose = true;
        config.min_level = LogLevel::Verbose;
    } else if args.iter().any(|a| a == "--quiet") {
        config.min_level = LogLevel::Error;
    } else if !config.debug_modules.is_empty() {
        config.min_level = LogLevel::Debug;
    }

    if let Ok(mut global) = LOGGER_CONFIG.write() {
        *global = config;
    }
}

/// Get a snapshot of the current logger config
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

/// True when --debug-<module> was passed for this tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    get_logger_config().debug_modules.contains(tag.to_debug_key())
}
