mod config;
pub mod database;
mod tasks;

pub use config::{Config, NotificationsConfig, PomodoroSettings, SessionConfig, TimerConfig};
pub use database::{Database, SessionRecord, Statistics, WordStatistics};
pub use tasks::{Task, MAX_TASK_LEN};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/writing-timer[-dev]/`.
///
/// Set WRITING_TIMER_ENV=dev to use the development data directory, or
/// WRITING_TIMER_HOME to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WRITING_TIMER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WRITING_TIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("writing-timer-dev")
            } else {
                base_dir.join("writing-timer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
