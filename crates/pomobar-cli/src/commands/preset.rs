use clap::Subcommand;
use pomobar_core::storage::{Config, Settings, SettingsStore, SqliteStore};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and configured presets
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select the preset the timer starts with
    Use {
        /// Preset name (case-insensitive)
        name: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open_default()?;

    match action {
        PresetAction::List { json } => {
            let presets = config.all_presets();
            if json {
                println!("{}", serde_json::to_string_pretty(&presets)?);
                return Ok(());
            }
            let current = Settings::load(&store).current_preset;
            let selected = config.current_preset(current.as_deref());
            for preset in &presets {
                let marker = if preset.name == selected.name { "*" } else { " " };
                println!(
                    "{marker} {:<12} focus {:>3}m  short {:>3}m  long {:>3}m",
                    preset.name,
                    preset.focus_minutes,
                    preset.short_break_minutes,
                    preset.long_break_minutes
                );
            }
        }
        PresetAction::Use { name } => {
            let preset = config
                .preset(&name)
                .ok_or(pomobar_core::CoreError::UnknownPreset(name))?;
            store.save_preset_name(&preset.name)?;
            println!("{}", preset.name);
        }
    }
    Ok(())
}
