/// Core logging implementation with filtering and console formatting

use super::config::{ get_logger_config, is_debug_enabled_for_tag };
use super::levels::LogLevel;
use super::tags::LogTag;
use colored::Colorize;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Check against minimum log level threshold
/// 3. Debug level requires --debug-<module> for that tag (or --verbose)
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();

    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug && !config.verbose {
        return is_debug_enabled_for_tag(tag);
    }

    true
}

/// Internal logging function: filter, format, write to stderr
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
    let level_str = match level {
        LogLevel::Error => level.as_str().red().bold(),
        LogLevel::Warning => level.as_str().yellow(),
        LogLevel::Info => level.as_str().green(),
        LogLevel::Debug => level.as_str().cyan(),
        LogLevel::Verbose => level.as_str().dimmed(),
    };

    eprintln!(
        "{} {} [{}] {}",
        timestamp.to_string().dimmed(),
        level_str,
        tag.as_str().blue(),
        message
    );
}
