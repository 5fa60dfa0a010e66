//! Timer service: the single task that owns the [`PhaseTimer`].
//!
//! Commands from front ends, wakes from the scheduler and notification
//! outcomes arrive on separate channels and are applied one at a time, so an
//! operation can never overlap a tick. After every message the service
//! persists whatever the resulting event changed and publishes a fresh
//! [`Snapshot`].
//!
//! Notifications are delivered off this task through a
//! [`BackgroundNotifier`]; their outcome comes back as a message.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::error::CoreError;
use crate::events::{Event, Snapshot};
use crate::notify::{BackgroundNotifier, NotificationStatus, Notifier};
use crate::phase::{find_preset, resolve_preset, Phase, Preset};
use crate::stats::Statistics;
use crate::storage::{keys, or_default_logged, Settings, SettingsStore};
use crate::timer::{Clock, PhaseTimer, SkipCredit, TimerOptions, TokioScheduler, Wake};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    SkipToBreak,
    StopForToday,
    ResetToPhase(Phase),
    SelectPreset(String),
    SetAutoStart { breaks: bool, focus: bool },
    SetNotifications(bool),
    Shutdown,
}

/// Everything the service needs from its surroundings.
pub struct ServiceParts {
    pub store: Box<dyn SettingsStore>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
    /// Selectable presets; the first one is the fallback.
    pub presets: Vec<Preset>,
    pub skip_credit: SkipCredit,
}

/// Cloneable client side of a running [`TimerService`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl TimerHandle {
    pub fn send(&self, command: Command) -> Result<(), CoreError> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::ServiceStopped)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }
}

pub struct TimerService {
    timer: PhaseTimer,
    store: Box<dyn SettingsStore>,
    presets: Vec<Preset>,
    commands: mpsc::UnboundedReceiver<Command>,
    wakes: mpsc::UnboundedReceiver<Wake>,
    notifications: mpsc::UnboundedReceiver<NotificationStatus>,
    snapshots: watch::Sender<Snapshot>,
    events: mpsc::UnboundedSender<Event>,
}

impl TimerService {
    /// Build the service from persisted settings and statistics.
    ///
    /// Must be called from within a tokio runtime; the scheduler spawns its
    /// tasks on the current one.
    pub fn new(parts: ServiceParts) -> (Self, TimerHandle, mpsc::UnboundedReceiver<Event>) {
        let ServiceParts {
            store,
            notifier,
            clock,
            mut presets,
            skip_credit,
        } = parts;
        if presets.is_empty() {
            presets = Preset::builtin();
        }

        let settings = Settings::load(store.as_ref());
        let preset = resolve_preset(&presets, settings.current_preset.as_deref());
        let stats = Statistics::load(store.as_ref(), clock.today());
        let completed_cycles = or_default_logged(
            store.load_counter(keys::COMPLETED_CYCLES),
            keys::COMPLETED_CYCLES,
            0,
        );

        let runtime = Handle::current();
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(runtime.clone(), wake_tx);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let notifier = BackgroundNotifier::new(Arc::from(notifier), runtime, outcome_tx);
        let mut timer = PhaseTimer::new(preset, Box::new(scheduler), Box::new(notifier), clock)
            .with_options(TimerOptions {
                auto_start_breaks: settings.auto_start_breaks,
                auto_start_focus: settings.auto_start_focus,
                notifications_enabled: settings.notifications_enabled,
                skip_credit,
            })
            .with_completed_cycles(completed_cycles)
            .with_statistics(stats);
        timer.record_notification(NotificationStatus::load(store.as_ref()));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(timer.snapshot());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let service = Self {
            timer,
            store,
            presets,
            commands: command_rx,
            wakes: wake_rx,
            notifications: outcome_rx,
            snapshots: snapshot_tx,
            events: event_tx,
        };
        let handle = TimerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (service, handle, event_rx)
    }

    /// Process commands and wakes until `Shutdown` or every handle is gone.
    pub async fn run(mut self) {
        tracing::debug!(preset = %self.timer.preset().name, "timer service running");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => {
                        let event = self.apply(command);
                        self.after(event);
                    }
                },
                Some(wake) = self.wakes.recv() => {
                    let event = self.timer.handle_wake(wake);
                    self.after(event);
                }
                Some(status) = self.notifications.recv() => {
                    self.record_notification(status);
                    self.after(None);
                }
            }
        }
        tracing::debug!("timer service stopped");
    }

    fn apply(&mut self, command: Command) -> Option<Event> {
        tracing::debug!(?command, "command");
        match command {
            Command::Start => self.timer.start(),
            Command::Pause => self.timer.pause(),
            Command::Resume => self.timer.resume(),
            Command::Stop => self.timer.stop(),
            Command::SkipToBreak => self.timer.skip_to_break(),
            Command::StopForToday => self.timer.stop_for_today(),
            Command::ResetToPhase(phase) => self.timer.reset_to_phase(phase),
            Command::SelectPreset(name) => match find_preset(&self.presets, &name) {
                Some(preset) => {
                    let preset = preset.clone();
                    self.timer.select_preset(preset)
                }
                None => {
                    tracing::warn!(%name, "unknown preset");
                    None
                }
            },
            Command::SetAutoStart { breaks, focus } => self.timer.set_auto_start(breaks, focus),
            Command::SetNotifications(enabled) => self.timer.set_notifications_enabled(enabled),
            Command::Shutdown => None,
        }
    }

    fn record_notification(&mut self, status: NotificationStatus) {
        if !self.timer.record_notification(status.clone()) {
            return;
        }
        if let Err(e) = status.save(self.store.as_ref()) {
            tracing::warn!(error = %e, "failed to persist notification status");
        }
    }

    fn after(&mut self, event: Option<Event>) {
        if let Some(event) = event {
            self.persist(&event);
            let _ = self.events.send(event);
        }
        let snapshot = self.timer.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn persist(&self, event: &Event) {
        let store = self.store.as_ref();
        let result = match event {
            Event::PhaseCompleted {
                completed_cycles, ..
            } => store
                .save_counter(keys::COMPLETED_CYCLES, *completed_cycles)
                .and_then(|()| self.timer.stats().save(store)),
            Event::DayRolledOver { .. } => self.timer.stats().save(store),
            Event::PresetChanged { preset, .. } => store.save_preset_name(preset),
            Event::SettingsChanged {
                auto_start_breaks,
                auto_start_focus,
                notifications_enabled,
                ..
            } => store
                .save_bool(keys::AUTO_START_BREAKS, *auto_start_breaks)
                .and_then(|()| store.save_bool(keys::AUTO_START_FOCUS, *auto_start_focus))
                .and_then(|()| {
                    store.save_bool(keys::NOTIFICATIONS_ENABLED, *notifications_enabled)
                }),
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist timer progress");
        }
    }
}
