use pomobar_core::storage::{keys, or_default_logged, Config, Settings, SettingsStore, SqliteStore};
use pomobar_core::{NotificationStatus, Statistics};
use serde_json::json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open_default()?;
    let settings = Settings::load(&store);
    let preset = config.current_preset(settings.current_preset.as_deref());
    let completed_cycles = or_default_logged(
        store.load_counter(keys::COMPLETED_CYCLES),
        keys::COMPLETED_CYCLES,
        0,
    );
    let stats = Statistics::load(&store, chrono::Local::now().date_naive());
    let notification_status = if settings.notifications_enabled {
        NotificationStatus::load(&store)
    } else {
        NotificationStatus::Disabled
    };

    let status = json!({
        "preset": preset,
        "completed_cycles": completed_cycles,
        "settings": settings,
        "skip_credit": config.stats.skip_credit,
        "notification_status": notification_status,
        "stats": stats,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
