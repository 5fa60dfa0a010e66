mod config;
mod database;
mod settings;
mod store;

pub use config::{Config, NotificationsConfig, StatsConfig};
pub use database::SqliteStore;
pub use settings::Settings;
pub use store::{MemoryStore, SettingsStore};

use std::path::PathBuf;

use crate::error::{CoreError, StoreError};

/// Settings store keys.
pub mod keys {
    pub const SOUND_ENABLED: &str = "soundEnabled";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const AUTO_START_BREAKS: &str = "autoStartBreaks";
    pub const AUTO_START_FOCUS: &str = "autoStartFocus";
    pub const CURRENT_PRESET: &str = "currentPreset";

    pub const COMPLETED_CYCLES: &str = "completedCycles";
    pub const TODAY_FOCUS_MINUTES: &str = "todayFocusMinutes";
    pub const WEEK_FOCUS_MINUTES: &str = "weekFocusMinutes";
    pub const CURRENT_STREAK: &str = "currentStreak";

    pub const TODAY_CYCLES: &str = "todayCycles";
    pub const TODAY_SESSIONS: &str = "todaySessions";
    pub const STATS_DATE: &str = "statsDate";
    pub const WEEK_START: &str = "weekStart";
    pub const LAST_ACTIVE_DATE: &str = "lastActiveDate";
    /// JSON-encoded `NotificationStatus` of the last delivery attempt.
    pub const LAST_NOTIFICATION: &str = "lastNotification";
}

/// Returns the data directory, creating it if needed.
///
/// `POMOBAR_DATA_DIR` wins outright. Otherwise `~/.config/pomobar`, or
/// `~/.config/pomobar-dev` when `POMOBAR_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("POMOBAR_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOBAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomobar-dev")
            } else {
                base_dir.join("pomobar")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Unwrap a store read, logging and substituting `default` on a missing
/// value or a failure. Persistence problems never stop the timer.
pub fn or_default_logged<T>(
    result: Result<Option<T>, StoreError>,
    key: &str,
    default: T,
) -> T {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!(key, error = %e, "falling back to default");
            default
        }
    }
}
