//! The key-value settings store seam.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::keys;
use crate::error::StoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Key-value persistence for flags, counters and the preset name.
///
/// Only the raw accessors are required; typed access is layered on top and
/// reports unparsable values as [`StoreError::InvalidValue`].
pub trait SettingsStore: Send {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn load_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.get_raw(key)?
            .map(|v| parse_value(key, &v, |s| s.parse::<bool>().ok()))
            .transpose()
    }

    fn save_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set_raw(key, if value { "true" } else { "false" })
    }

    fn load_counter(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.get_raw(key)?
            .map(|v| parse_value(key, &v, |s| s.parse::<u64>().ok()))
            .transpose()
    }

    fn save_counter(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.set_raw(key, &value.to_string())
    }

    fn load_date(&self, key: &str) -> Result<Option<NaiveDate>, StoreError> {
        self.get_raw(key)?
            .map(|v| parse_value(key, &v, |s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()))
            .transpose()
    }

    fn save_date(&self, key: &str, value: NaiveDate) -> Result<(), StoreError> {
        self.set_raw(key, &value.format(DATE_FORMAT).to_string())
    }

    fn load_preset_name(&self) -> Result<Option<String>, StoreError> {
        self.get_raw(keys::CURRENT_PRESET)
    }

    fn save_preset_name(&self, name: &str) -> Result<(), StoreError> {
        self.set_raw(keys::CURRENT_PRESET, name)
    }
}

impl<S: SettingsStore + Sync + ?Sized> SettingsStore for Arc<S> {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_raw(key, value)
    }
}

fn parse_value<T>(key: &str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<T, StoreError> {
    parse(raw.trim()).ok_or_else(|| StoreError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let store = MemoryStore::new();
        assert_eq!(store.load_bool(keys::AUTO_START_BREAKS).unwrap(), None);

        store.save_bool(keys::AUTO_START_BREAKS, true).unwrap();
        store.save_counter(keys::COMPLETED_CYCLES, 7).unwrap();
        store.save_preset_name("Quick").unwrap();

        assert_eq!(store.load_bool(keys::AUTO_START_BREAKS).unwrap(), Some(true));
        assert_eq!(store.load_counter(keys::COMPLETED_CYCLES).unwrap(), Some(7));
        assert_eq!(store.load_preset_name().unwrap().as_deref(), Some("Quick"));
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let store = MemoryStore::new();
        store.set_raw(keys::COMPLETED_CYCLES, "-3").unwrap();
        assert!(matches!(
            store.load_counter(keys::COMPLETED_CYCLES),
            Err(StoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn dates_use_iso_format() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        store.save_date(keys::STATS_DATE, date).unwrap();
        assert_eq!(store.get_raw(keys::STATS_DATE).unwrap().as_deref(), Some("2026-06-10"));
        assert_eq!(store.load_date(keys::STATS_DATE).unwrap(), Some(date));
    }
}
