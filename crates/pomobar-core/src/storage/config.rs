//! TOML-based application configuration.
//!
//! Holds what the key-value settings store does not:
//! - Extra presets beyond the built-ins
//! - Notification appearance (application name, sound)
//! - How a skipped focus phase is credited in statistics
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::phase::{find_preset, resolve_preset, Preset};
use crate::timer::SkipCredit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Sound to request when `soundEnabled` is on. Only honoured by
    /// notification servers that support sound hints.
    #[serde(default = "default_sound_name")]
    pub sound_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub skip_credit: SkipCredit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Presets in addition to the built-ins. A preset named like a built-in
    /// replaces it.
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

fn default_app_name() -> String {
    "pomobar".into()
}
fn default_sound_name() -> String {
    "message-new-instant".into()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            sound_name: default_sound_name(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Ok(Self::load_from(&path)?)
    }

    /// Load and validate the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.presets.iter().try_for_each(Preset::validate)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, keeping the existing value's type.
    /// The result must still deserialize and validate; nothing is written
    /// to disk.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Built-in presets merged with configured ones, built-ins first.
    pub fn all_presets(&self) -> Vec<Preset> {
        let mut presets = Preset::builtin();
        for custom in &self.presets {
            match presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&custom.name))
            {
                Some(existing) => *existing = custom.clone(),
                None => presets.push(custom.clone()),
            }
        }
        presets
    }

    pub fn preset(&self, name: &str) -> Option<Preset> {
        find_preset(&self.all_presets(), name).cloned()
    }

    /// The preset the timer starts with for a stored `currentPreset`.
    pub fn current_preset(&self, stored: Option<&str>) -> Preset {
        resolve_preset(&self.all_presets(), stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.stats.skip_credit, SkipCredit::Full);
    }

    #[test]
    fn current_preset_honours_overridden_builtin() {
        let mut cfg = Config::default();
        cfg.presets.push(Preset::new("classic", 30, 5, 15));
        assert_eq!(cfg.current_preset(None).focus_minutes, 30);
        assert_eq!(cfg.current_preset(Some("missing")).focus_minutes, 30);
        assert_eq!(cfg.current_preset(Some("quick")).focus_minutes, 15);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [[presets]]
            name = "Sprint"
            focus_minutes = 10
            short_break_minutes = 2
            long_break_minutes = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.notifications.app_name, "pomobar");
        assert_eq!(parsed.presets.len(), 1);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.app_name").as_deref(), Some("pomobar"));
        assert_eq!(cfg.get("stats.skip_credit").as_deref(), Some("full"));
        assert!(cfg.get("notifications.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_enum_string() {
        let mut cfg = Config::default();
        cfg.set("stats.skip_credit", "elapsed").unwrap();
        assert_eq!(cfg.stats.skip_credit, SkipCredit::Elapsed);
    }

    #[test]
    fn set_rejects_bad_enum_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("stats.skip_credit", "half").is_err());
        assert_eq!(cfg.stats.skip_credit, SkipCredit::Full);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("notifications.volume", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_presets_from_json_is_validated() {
        let mut cfg = Config::default();
        cfg.set(
            "presets",
            r#"[{"name":"Sprint","focus_minutes":10,"short_break_minutes":2,"long_break_minutes":5}]"#,
        )
        .unwrap();
        assert_eq!(cfg.preset("sprint").unwrap().focus_minutes, 10);

        let err = cfg.set(
            "presets",
            r#"[{"name":"Zero","focus_minutes":0,"short_break_minutes":2,"long_break_minutes":5}]"#,
        );
        assert!(err.is_err());
        assert!(cfg.preset("Sprint").is_some());
    }

    #[test]
    fn custom_preset_overrides_builtin() {
        let mut cfg = Config::default();
        cfg.presets.push(Preset::new("classic", 30, 5, 20));
        let presets = cfg.all_presets();
        assert_eq!(presets.len(), Preset::builtin().len());
        assert_eq!(cfg.preset("Classic").unwrap().focus_minutes, 30);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.notifications.app_name = "focus".into();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn invalid_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "presets = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
