//! User-facing boolean settings and the selected preset.

use serde::{Deserialize, Serialize};

use super::{keys, or_default_logged, SettingsStore};
use crate::error::{ConfigError, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
    pub auto_start_breaks: bool,
    pub auto_start_focus: bool,
    pub current_preset: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: true,
            auto_start_breaks: false,
            auto_start_focus: false,
            current_preset: None,
        }
    }
}

impl Settings {
    /// Keys accepted by [`Settings::flag`] and [`Settings::set_flag`].
    pub const FLAG_KEYS: [&'static str; 4] = [
        keys::SOUND_ENABLED,
        keys::NOTIFICATIONS_ENABLED,
        keys::AUTO_START_BREAKS,
        keys::AUTO_START_FOCUS,
    ];

    /// Load every setting, substituting the default for anything missing or
    /// unreadable. Never fails.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| or_default_logged(store.load_bool(key), key, default);
        Self {
            sound_enabled: flag(keys::SOUND_ENABLED, defaults.sound_enabled),
            notifications_enabled: flag(keys::NOTIFICATIONS_ENABLED, defaults.notifications_enabled),
            auto_start_breaks: flag(keys::AUTO_START_BREAKS, defaults.auto_start_breaks),
            auto_start_focus: flag(keys::AUTO_START_FOCUS, defaults.auto_start_focus),
            current_preset: or_default_logged(
                store.load_preset_name().map(|name| name.map(Some)),
                keys::CURRENT_PRESET,
                None,
            ),
        }
    }

    pub fn save(&self, store: &dyn SettingsStore) -> Result<(), StoreError> {
        for key in Self::FLAG_KEYS {
            if let Some(value) = self.flag(key) {
                store.save_bool(key, value)?;
            }
        }
        if let Some(name) = &self.current_preset {
            store.save_preset_name(name)?;
        }
        Ok(())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match key {
            keys::SOUND_ENABLED => Some(self.sound_enabled),
            keys::NOTIFICATIONS_ENABLED => Some(self.notifications_enabled),
            keys::AUTO_START_BREAKS => Some(self.auto_start_breaks),
            keys::AUTO_START_FOCUS => Some(self.auto_start_focus),
            _ => None,
        }
    }

    pub fn set_flag(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        let slot = match key {
            keys::SOUND_ENABLED => &mut self.sound_enabled,
            keys::NOTIFICATIONS_ENABLED => &mut self.notifications_enabled,
            keys::AUTO_START_BREAKS => &mut self.auto_start_breaks,
            keys::AUTO_START_FOCUS => &mut self.auto_start_focus,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        *slot = value;
        Ok(())
    }
}
