//! Focus statistics: today's figures, the weekly total and the daily streak.
//!
//! Figures are keyed by local calendar date. A new date replaces the day
//! record wholesale; earlier days are never rewritten.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::storage::{keys, or_default_logged, SettingsStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatistics {
    pub date: NaiveDate,
    pub focus_minutes: u64,
    pub completed_cycles: u64,
    pub total_sessions: u64,
}

impl DayStatistics {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            focus_minutes: 0,
            completed_cycles: 0,
            total_sessions: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub today: DayStatistics,
    /// Monday of the week `week_focus_minutes` belongs to.
    pub week_start: NaiveDate,
    pub week_focus_minutes: u64,
    /// Consecutive days, ending today or yesterday, with a completed focus phase.
    pub current_streak: u64,
    pub last_active: Option<NaiveDate>,
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

impl Statistics {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: DayStatistics::new(today),
            week_start: week_start(today),
            week_focus_minutes: 0,
            current_streak: 0,
            last_active: None,
        }
    }

    /// Move the day record forward to `date`. Returns false when `date` is
    /// not after the current day (same day or a clock set backwards).
    pub fn roll_to(&mut self, date: NaiveDate) -> bool {
        if date <= self.today.date {
            return false;
        }
        self.today = DayStatistics::new(date);

        let monday = week_start(date);
        if monday != self.week_start {
            self.week_start = monday;
            self.week_focus_minutes = 0;
        }

        if let Some(last) = self.last_active {
            if date - last > Duration::days(1) {
                self.current_streak = 0;
            }
        }
        true
    }

    /// Credit one completed focus phase.
    pub fn record_focus(&mut self, date: NaiveDate, minutes: u64) {
        self.roll_to(date);
        self.today.focus_minutes = self.today.focus_minutes.saturating_add(minutes);
        self.today.completed_cycles += 1;
        self.today.total_sessions += 1;
        self.week_focus_minutes = self.week_focus_minutes.saturating_add(minutes);

        self.current_streak = match self.last_active {
            Some(last) if last == date => self.current_streak.max(1),
            Some(last) if last + Duration::days(1) == date => self.current_streak + 1,
            _ => 1,
        };
        self.last_active = Some(date);
    }

    /// Load from the settings store, falling back to zeroed figures for
    /// anything missing or unreadable, then roll forward to `today`.
    pub fn load(store: &dyn SettingsStore, today: NaiveDate) -> Self {
        let date = or_default_logged(store.load_date(keys::STATS_DATE), keys::STATS_DATE, today);
        let mut stats = Self::new(date);
        stats.today.focus_minutes =
            or_default_logged(store.load_counter(keys::TODAY_FOCUS_MINUTES), keys::TODAY_FOCUS_MINUTES, 0);
        stats.today.completed_cycles =
            or_default_logged(store.load_counter(keys::TODAY_CYCLES), keys::TODAY_CYCLES, 0);
        stats.today.total_sessions =
            or_default_logged(store.load_counter(keys::TODAY_SESSIONS), keys::TODAY_SESSIONS, 0);
        stats.week_start =
            or_default_logged(store.load_date(keys::WEEK_START), keys::WEEK_START, week_start(date));
        stats.week_focus_minutes =
            or_default_logged(store.load_counter(keys::WEEK_FOCUS_MINUTES), keys::WEEK_FOCUS_MINUTES, 0);
        stats.current_streak =
            or_default_logged(store.load_counter(keys::CURRENT_STREAK), keys::CURRENT_STREAK, 0);
        stats.last_active = match store.load_date(keys::LAST_ACTIVE_DATE) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(key = keys::LAST_ACTIVE_DATE, error = %e, "falling back to default");
                None
            }
        };

        stats.roll_to(today);
        stats
    }

    pub fn save(&self, store: &dyn SettingsStore) -> Result<(), StoreError> {
        store.save_date(keys::STATS_DATE, self.today.date)?;
        store.save_counter(keys::TODAY_FOCUS_MINUTES, self.today.focus_minutes)?;
        store.save_counter(keys::TODAY_CYCLES, self.today.completed_cycles)?;
        store.save_counter(keys::TODAY_SESSIONS, self.today.total_sessions)?;
        store.save_date(keys::WEEK_START, self.week_start)?;
        store.save_counter(keys::WEEK_FOCUS_MINUTES, self.week_focus_minutes)?;
        store.save_counter(keys::CURRENT_STREAK, self.current_streak)?;
        if let Some(last) = self.last_active {
            store.save_date(keys::LAST_ACTIVE_DATE, last)?;
        }
        Ok(())
    }
}
