use clap::Subcommand;
use pomobar_core::storage::{Settings, SqliteStore};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one flag
    Get {
        /// One of soundEnabled, notificationsEnabled, autoStartBreaks, autoStartFocus
        key: String,
    },
    /// Change one flag
    Set {
        key: String,
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Print all settings as JSON
    List,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open_default()?;
    let mut settings = Settings::load(&store);

    match action {
        SettingsAction::Get { key } => {
            let value = settings.flag(&key).ok_or_else(|| {
                format!(
                    "unknown setting: {key} (expected one of {})",
                    Settings::FLAG_KEYS.join(", ")
                )
            })?;
            println!("{value}");
        }
        SettingsAction::Set { key, value } => {
            settings.set_flag(&key, value)?;
            settings.save(&store)?;
            println!("ok");
        }
        SettingsAction::List => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
