/// Centralized argument handling system for SwarmBot
///
/// This module consolidates all command-line argument parsing and debug flag
/// checking so binaries and tests share one source of truth.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Debug flag checking functions for all modules
/// - Unified argument parsing utilities
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by binaries and tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
/// Returns a vector clone to avoid holding the mutex lock
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// Checks if help output was requested
pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Reset mode: wipe stored wallets and logs before starting
pub fn is_reset_enabled() -> bool {
    has_arg("--reset")
}

/// Dry-run mode: plan funding without submitting any transfers
pub fn is_dry_run_enabled() -> bool {
    has_arg("--dry-run")
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// These functions check for specific debug flags in the command-line arguments
// =============================================================================

/// Fleet scheduler debug mode
pub fn is_debug_fleet_enabled() -> bool {
    has_arg("--debug-fleet")
}

/// Funding planner/worker debug mode
pub fn is_debug_funding_enabled() -> bool {
    has_arg("--debug-funding")
}

/// Pool simulator debug mode
pub fn is_debug_pool_enabled() -> bool {
    has_arg("--debug-pool")
}

/// Quote engine debug mode
pub fn is_debug_quote_enabled() -> bool {
    has_arg("--debug-quote")
}

/// Wallet store debug mode
pub fn is_debug_wallet_enabled() -> bool {
    has_arg("--debug-wallet")
}

/// Ledger client debug mode
pub fn is_debug_ledger_enabled() -> bool {
    has_arg("--debug-ledger")
}

/// Print the help text for the swarmbot binary
pub fn print_help() {
    println!("swarmbot - automated trading wallet fleet");
    println!();
    println!("USAGE:");
    println!("  swarmbot [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --config <path>       Config file path (default: config.json)");
    println!("  --reset               Delete stored wallets and logs, then exit");
    println!("  --dry-run             Plan funding without submitting transfers");
    println!("  --quiet               Only warnings and errors");
    println!("  --verbose             Very detailed trace output");
    println!("  --debug-<module>      Per-module diagnostics (fleet, funding,");
    println!("                        worker, pool, quote, wallet, ledger, system)");
    println!("  --help, -h            Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_value_follows_flag() {
        set_cmd_args(vec![
            "swarmbot".to_string(),
            "--config".to_string(),
            "custom.json".to_string(),
        ]);
        assert_eq!(get_arg_value("--config"), Some("custom.json".to_string()));
        assert_eq!(get_arg_value("--missing"), None);
        set_cmd_args(vec!["swarmbot".to_string()]);
    }
}
