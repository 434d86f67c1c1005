//! Filesystem layout for SwarmBot data
//!
//! All runtime data lives under the working directory:
//! - `logs/` log files
//! - `data/` wallet store database
//!
//! Directories must exist before the logger initializes, so main calls
//! `ensure_all_directories` first.

use std::fs;
use std::path::PathBuf;

/// Directory holding log files
pub fn get_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Directory holding databases and other runtime data
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Path of the main log file
pub fn get_log_file_path() -> PathBuf {
    get_logs_dir().join("swarmbot.log")
}

/// Path of the encrypted wallet store database
pub fn get_wallets_db_path() -> PathBuf {
    get_data_dir().join("wallets.db")
}

/// Create every directory the application writes into
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_logs_dir(), get_data_dir()] {
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}
