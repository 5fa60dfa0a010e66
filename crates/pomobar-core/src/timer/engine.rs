//! Phase timer state machine.
//!
//! The timer never spawns anything itself. Ticking and the midnight rollover
//! are armed through a [`Scheduler`], and the returned [`TaskHandle`]s are
//! owned here; dropping one stops the corresponding wake-ups. Whoever owns
//! the timer feeds wakes back in through [`PhaseTimer::handle_wake`].
//!
//! A rollover is always pending for the next local midnight, whatever the
//! state, and re-arms itself after firing.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running <-> Paused
//!    ^          |
//!    +- stop ---+          any -> StoppedForToday -> (midnight) -> Stopped
//! ```
//!
//! Calls that do not apply in the current state are no-ops and return `None`.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{next_midnight, Clock};
use super::scheduler::{Scheduler, TaskHandle, Wake};
use crate::events::{Event, Snapshot};
use crate::notify::{NotificationStatus, Notifier};
use crate::phase::{Phase, Preset};
use crate::stats::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
    /// Sticky until the next local midnight.
    StoppedForToday,
}

/// Focus credit for a focus phase ended early with `skip_to_break`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCredit {
    /// Credit the preset's full focus length, same as a natural completion.
    #[default]
    Full,
    /// Credit only the whole minutes actually spent.
    Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOptions {
    pub auto_start_breaks: bool,
    pub auto_start_focus: bool,
    pub notifications_enabled: bool,
    pub skip_credit: SkipCredit,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            auto_start_breaks: false,
            auto_start_focus: false,
            notifications_enabled: true,
            skip_credit: SkipCredit::Full,
        }
    }
}

pub struct PhaseTimer {
    state: TimerState,
    phase: Phase,
    /// Seconds left in the current phase.
    remaining: u64,
    preset: Preset,
    completed_cycles: u64,
    options: TimerOptions,
    stats: Statistics,
    notification_status: NotificationStatus,

    notifier: Box<dyn Notifier>,
    scheduler: Box<dyn Scheduler>,
    clock: Box<dyn Clock>,

    ticker: Option<TaskHandle>,
    tick_generation: u64,
    rollover: Option<TaskHandle>,
    rollover_generation: u64,
    rollover_at: Option<DateTime<Local>>,
}

impl PhaseTimer {
    /// Create a stopped timer at the start of a focus phase, with the
    /// midnight rollover armed.
    pub fn new(
        preset: Preset,
        scheduler: Box<dyn Scheduler>,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let stats = Statistics::new(clock.today());
        let mut timer = Self {
            state: TimerState::Stopped,
            phase: Phase::Focus,
            remaining: preset.duration_secs(Phase::Focus),
            preset,
            completed_cycles: 0,
            options: TimerOptions::default(),
            stats,
            notification_status: NotificationStatus::Unknown,
            notifier,
            scheduler,
            clock,
            ticker: None,
            tick_generation: 0,
            rollover: None,
            rollover_generation: 0,
            rollover_at: None,
        };
        timer.arm_rollover();
        timer
    }

    pub fn with_options(mut self, options: TimerOptions) -> Self {
        self.options = options;
        if !options.notifications_enabled {
            self.notification_status = NotificationStatus::Disabled;
        }
        self
    }

    /// Resume counting cycles from a persisted value.
    pub fn with_completed_cycles(mut self, completed_cycles: u64) -> Self {
        self.completed_cycles = completed_cycles;
        self
    }

    pub fn with_statistics(mut self, mut stats: Statistics) -> Self {
        stats.roll_to(self.clock.today());
        self.stats = stats;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining
    }

    pub fn total_secs(&self) -> u64 {
        self.preset.duration_secs(self.phase)
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn options(&self) -> TimerOptions {
        self.options
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn notification_status(&self) -> &NotificationStatus {
        &self.notification_status
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn rollover_pending(&self) -> bool {
        self.rollover.is_some()
    }

    /// When the pending rollover is due.
    pub fn rollover_at(&self) -> Option<DateTime<Local>> {
        self.rollover_at
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            phase: self.phase,
            remaining_secs: self.remaining,
            total_secs: self.total_secs(),
            completed_cycles: self.completed_cycles,
            preset: self.preset.clone(),
            stats: self.stats.clone(),
            auto_start_breaks: self.options.auto_start_breaks,
            auto_start_focus: self.options.auto_start_focus,
            notifications_enabled: self.options.notifications_enabled,
            notification_status: self.notification_status.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state == TimerState::StoppedForToday {
            return None;
        }
        self.arm_ticker();
        self.state = TimerState::Running;
        tracing::debug!(phase = %self.phase, remaining = self.remaining, "timer started");
        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.cancel_ticker();
        self.state = TimerState::Paused;
        tracing::debug!(remaining = self.remaining, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.arm_ticker();
        self.state = TimerState::Running;
        tracing::debug!(remaining = self.remaining, "timer resumed");
        Some(Event::TimerResumed {
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    /// Cancel ticking and rewind the current phase to its full length.
    /// StoppedForToday stays in force until midnight.
    pub fn stop(&mut self) -> Option<Event> {
        self.cancel_ticker();
        if self.state != TimerState::StoppedForToday {
            self.state = TimerState::Stopped;
        }
        self.remaining = self.total_secs();
        tracing::debug!(phase = %self.phase, "timer stopped");
        Some(Event::TimerStopped {
            phase: self.phase,
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    /// End the current focus phase now, through the normal completion path.
    pub fn skip_to_break(&mut self) -> Option<Event> {
        if self.phase != Phase::Focus || self.state == TimerState::StoppedForToday {
            return None;
        }
        self.cancel_ticker();
        Some(self.complete_phase(true))
    }

    /// Stop until the next local midnight. Calling again re-arms the rollover.
    pub fn stop_for_today(&mut self) -> Option<Event> {
        self.cancel_ticker();
        self.state = TimerState::StoppedForToday;
        let rollover_at = self.arm_rollover();

        tracing::info!(%rollover_at, "stopped for today");
        Some(Event::StoppedForToday {
            rollover_at,
            at: Utc::now(),
        })
    }

    /// Called once per second while running.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.stats.roll_to(self.clock.today());
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return Some(self.complete_phase(false));
        }
        None
    }

    /// Daily rollover: leave StoppedForToday, start a fresh day of
    /// statistics and arm the next midnight. Cycle count, weekly total and
    /// streak carry over.
    ///
    /// A wake that arrives before the due instant only re-arms.
    pub fn rollover(&mut self) -> Option<Event> {
        let now = self.clock.now();
        if self.rollover_at.is_some_and(|due| now < due) {
            tracing::debug!(%now, "early rollover wake, re-arming");
            self.arm_rollover();
            return None;
        }

        let today = now.date_naive();
        self.stats.roll_to(today);
        if self.state == TimerState::StoppedForToday {
            self.state = TimerState::Stopped;
        }
        let next = self.arm_rollover();
        tracing::info!(%today, %next, "day rolled over");
        Some(Event::DayRolledOver {
            date: today,
            at: Utc::now(),
        })
    }

    /// Dispatch a scheduler wake. Wakes from cancelled tasks are dropped.
    pub fn handle_wake(&mut self, wake: Wake) -> Option<Event> {
        match wake {
            Wake::Tick(generation) if self.ticker.is_some() && generation == self.tick_generation => {
                self.tick()
            }
            Wake::Rollover(generation)
                if self.rollover.is_some() && generation == self.rollover_generation =>
            {
                self.rollover()
            }
            stale => {
                tracing::trace!(?stale, "ignoring stale wake");
                None
            }
        }
    }

    /// Jump to `phase` with its full duration. Ticking stops.
    pub fn reset_to_phase(&mut self, phase: Phase) -> Option<Event> {
        self.cancel_ticker();
        if self.state != TimerState::StoppedForToday {
            self.state = TimerState::Stopped;
        }
        self.phase = phase;
        self.remaining = self.total_secs();
        Some(Event::PhaseReset {
            phase,
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    /// Swap presets; the current phase restarts at the new length.
    pub fn select_preset(&mut self, preset: Preset) -> Option<Event> {
        self.cancel_ticker();
        if self.state != TimerState::StoppedForToday {
            self.state = TimerState::Stopped;
        }
        self.preset = preset;
        self.remaining = self.total_secs();
        tracing::debug!(preset = %self.preset.name, "preset selected");
        Some(Event::PresetChanged {
            preset: self.preset.name.clone(),
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    pub fn set_auto_start(&mut self, breaks: bool, focus: bool) -> Option<Event> {
        self.options.auto_start_breaks = breaks;
        self.options.auto_start_focus = focus;
        Some(self.settings_event())
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Option<Event> {
        self.options.notifications_enabled = enabled;
        self.notification_status = if enabled {
            NotificationStatus::Unknown
        } else {
            NotificationStatus::Disabled
        };
        Some(self.settings_event())
    }

    /// Take the outcome of a deferred delivery. Returns false, and keeps the
    /// current status, while notifications are disabled.
    pub fn record_notification(&mut self, status: NotificationStatus) -> bool {
        if !self.options.notifications_enabled {
            return false;
        }
        self.notification_status = status;
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self, skipped: bool) -> Event {
        let finished = self.phase;

        let mut credited = 0;
        if finished == Phase::Focus {
            credited = self.focus_credit(skipped);
            self.completed_cycles += 1;
            self.stats.record_focus(self.clock.today(), credited);
        }

        let next = finished.next(self.completed_cycles);
        self.dispatch_notification(finished, next);

        self.phase = next;
        self.remaining = self.total_secs();

        let auto_start = if next.is_break() {
            self.options.auto_start_breaks
        } else {
            self.options.auto_start_focus
        };
        if auto_start {
            self.start();
        } else {
            self.cancel_ticker();
            self.state = TimerState::Stopped;
        }

        tracing::info!(
            %finished,
            %next,
            completed_cycles = self.completed_cycles,
            credited,
            skipped,
            auto_start,
            "phase completed"
        );

        Event::PhaseCompleted {
            finished,
            next,
            completed_cycles: self.completed_cycles,
            focus_minutes_credited: credited,
            skipped,
            auto_started: auto_start,
            at: Utc::now(),
        }
    }

    fn focus_credit(&self, skipped: bool) -> u64 {
        if !skipped {
            return self.preset.focus_minutes;
        }
        match self.options.skip_credit {
            SkipCredit::Full => {
                tracing::info!(
                    minutes = self.preset.focus_minutes,
                    remaining = self.remaining,
                    "skipped focus phase credited in full"
                );
                self.preset.focus_minutes
            }
            SkipCredit::Elapsed => {
                let elapsed = self.total_secs().saturating_sub(self.remaining);
                elapsed / 60
            }
        }
    }

    fn dispatch_notification(&mut self, finished: Phase, next: Phase) {
        if !self.options.notifications_enabled {
            return;
        }
        let title = format!("{finished} complete");
        let body = match next {
            Phase::Focus => format!(
                "Break is over. Next: Focus ({} min)",
                self.preset.focus_minutes
            ),
            _ => format!(
                "Cycle {} done. Next: {} ({} min)",
                self.completed_cycles,
                next,
                self.preset.duration_minutes(next)
            ),
        };

        let result = self.notifier.notify(&title, &body);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "notification not delivered");
        }
        self.notification_status = match &result {
            Ok(()) if self.notifier.is_deferred() => NotificationStatus::Pending { at: Utc::now() },
            _ => NotificationStatus::from_result(&result),
        };
    }

    fn settings_event(&self) -> Event {
        Event::SettingsChanged {
            auto_start_breaks: self.options.auto_start_breaks,
            auto_start_focus: self.options.auto_start_focus,
            notifications_enabled: self.options.notifications_enabled,
            at: Utc::now(),
        }
    }

    /// Replace any pending rollover with one due at the next local midnight.
    fn arm_rollover(&mut self) -> DateTime<Local> {
        let now = self.clock.now();
        let due = next_midnight(&now);
        let delay = (due - now).to_std().unwrap_or_default();

        self.rollover = None;
        self.rollover_generation += 1;
        self.rollover = Some(self.scheduler.once_after(self.rollover_generation, delay));
        self.rollover_at = Some(due);
        due
    }

    /// Replace any live ticker with a fresh one.
    fn arm_ticker(&mut self) {
        self.cancel_ticker();
        self.tick_generation += 1;
        self.ticker = Some(self.scheduler.every_second(self.tick_generation));
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

impl std::fmt::Debug for PhaseTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseTimer")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("remaining", &self.remaining)
            .field("preset", &self.preset.name)
            .field("completed_cycles", &self.completed_cycles)
            .field("ticking", &self.ticker.is_some())
            .field("rollover_pending", &self.rollover.is_some())
            .finish()
    }
}
