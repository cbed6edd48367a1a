/// Centralized argument handling
///
/// Consolidates command-line argument parsing and debug flag checking.
/// Binaries and tests can override the default env::args() collection
/// through set_cmd_args.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// First positional argument after the binary name that is not a flag or
/// a flag value. Used as the subcommand.
pub fn get_subcommand() -> Option<String> {
    let args = get_cmd_args();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            // Flags with values consume the next argument
            if matches!(
                arg.as_str(),
                "--wallet" | "--owner" | "--name" | "--emoji" | "--timeframe" | "--delay" |
                    "--slippage" | "--config"
            ) {
                iter.next();
            }
            continue;
        }
        return Some(arg.clone());
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Sync coordinator debug mode
pub fn is_debug_sync_enabled() -> bool {
    has_arg("--debug-sync")
}

/// Swap parser debug mode
pub fn is_debug_parser_enabled() -> bool {
    has_arg("--debug-parser")
}

/// Database layer debug mode
pub fn is_debug_database_enabled() -> bool {
    has_arg("--debug-database")
}

/// Provider client debug mode
pub fn is_debug_provider_enabled() -> bool {
    has_arg("--debug-provider")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because CMD_ARGS is process-global state
    #[test]
    fn test_argument_parsing() {
        set_cmd_args(vec![
            "copyscope".to_string(),
            "sync".to_string(),
            "--wallet".to_string(),
            "abc".to_string(),
            "--debug-sync".to_string()
        ]);

        assert!(has_arg("--debug-sync"));
        assert!(!has_arg("--debug-parser"));
        assert_eq!(get_arg_value("--wallet"), Some("abc".to_string()));
        assert_eq!(get_arg_value("--missing"), None);
        assert_eq!(get_subcommand(), Some("sync".to_string()));
        assert!(is_debug_sync_enabled());

        set_cmd_args(vec![
            "copyscope".to_string(),
            "--wallet".to_string(),
            "abc".to_string(),
            "summary".to_string()
        ]);
        assert_eq!(get_subcommand(), Some("summary".to_string()));
    }
}
