use swarmbot::arguments;
use swarmbot::config::Config;
use swarmbot::logger::{self, LogTag};
use swarmbot::paths;

/// Main entry point for SwarmBot
///
/// Handles the special modes (--help, --reset, --dry-run) and otherwise
/// starts a fleet session against the configured network.
#[tokio::main]
async fn main() {
    // Ensure all directories exist BEFORE logger initialization
    // (Logger needs the logs directory to create log files)
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init();

    if arguments::is_help_requested() {
        arguments::print_help();
        return;
    }

    logger::info(LogTag::System, "swarmbot starting up");

    // =========================================================================
    // SPECIAL MODES (execute and exit)
    // =========================================================================

    if arguments::is_reset_enabled() {
        let db_path = paths::get_wallets_db_path();
        match std::fs::remove_file(&db_path) {
            Ok(()) => logger::info(
                LogTag::System,
                &format!("removed wallet store {}", db_path.display()),
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::info(LogTag::System, "wallet store already absent")
            }
            Err(e) => {
                logger::error(
                    LogTag::System,
                    &format!("failed to remove {}: {}", db_path.display(), e),
                );
                std::process::exit(1);
            }
        }
        logger::flush();
        return;
    }

    // =========================================================================
    // NORMAL STARTUP
    // =========================================================================

    let config_path =
        arguments::get_arg_value("--config").unwrap_or_else(|| "config.json".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            logger::error(LogTag::System, &format!("config error: {:#}", e));
            logger::flush();
            std::process::exit(1);
        }
    };

    // Command-line verbosity flags win over the configured level
    if let Some(level) = logger::LogLevel::from_str(&config.general.log_level) {
        logger::update_logger_config(|c| {
            if c.min_level == logger::LogLevel::Info {
                c.min_level = level;
            }
        });
    }

    if let Err(e) = swarmbot::run::run(config).await {
        logger::error(LogTag::System, &format!("fatal: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }
}
