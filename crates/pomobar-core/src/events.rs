use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::NotificationStatus;
use crate::phase::{Phase, Preset};
use crate::stats::Statistics;
use crate::timer::TimerState;

/// Every state change of the timer produces an Event.
/// Front ends print or render them; the service persists on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        finished: Phase,
        next: Phase,
        completed_cycles: u64,
        /// Focus minutes added to statistics; zero for breaks.
        focus_minutes_credited: u64,
        /// Completion came from `skip_to_break` rather than the countdown.
        skipped: bool,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    StoppedForToday {
        rollover_at: DateTime<Local>,
        at: DateTime<Utc>,
    },
    DayRolledOver {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    PhaseReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PresetChanged {
        preset: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        auto_start_breaks: bool,
        auto_start_focus: bool,
        notifications_enabled: bool,
        at: DateTime<Utc>,
    },
}

/// Full observable state of the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: TimerState,
    pub phase: Phase,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub completed_cycles: u64,
    pub preset: Preset,
    pub stats: Statistics,
    pub auto_start_breaks: bool,
    pub auto_start_focus: bool,
    pub notifications_enabled: bool,
    pub notification_status: NotificationStatus,
}
