//! # pomobar Core Library
//!
//! Core business logic for the pomobar focus timer. The CLI binary is a thin
//! front end over this crate; any other front end (menu bar, TUI) drives the
//! same [`PhaseTimer`] through a [`TimerHandle`].
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven state machine cycling Focus, ShortBreak and
//!   LongBreak phases. Ticks and the midnight rollover are armed through a
//!   [`Scheduler`] and cancelled through owned [`TaskHandle`]s.
//! - **Service**: a single tokio task owning the timer; every mutation runs
//!   on that task, so there is never more than one writer.
//! - **Storage**: SQLite key-value settings store and TOML configuration.
//! - **Notifications**: fire-and-forget desktop notifications.
//!
//! ## Key Components
//!
//! - [`PhaseTimer`]: phase-cycling timer state machine
//! - [`TimerService`]: actor that owns the timer and persists its progress
//! - [`SqliteStore`]: settings and counter persistence
//! - [`Config`]: presets and notification configuration

pub mod error;
pub mod events;
pub mod notify;
pub mod phase;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, StoreError};
pub use events::{Event, Snapshot};
pub use notify::{
    BackgroundNotifier, DesktopNotifier, LogNotifier, NotificationStatus, Notifier,
    RecordingNotifier,
};
pub use phase::{Phase, Preset};
pub use service::{Command, ServiceParts, TimerHandle, TimerService};
pub use stats::{DayStatistics, Statistics};
pub use storage::{Config, MemoryStore, Settings, SettingsStore, SqliteStore};
pub use timer::{
    Clock, ManualClock, ManualScheduler, PhaseTimer, Scheduler, SkipCredit, SystemClock,
    TaskHandle, TimerOptions, TimerState, TokioScheduler, Wake,
};
