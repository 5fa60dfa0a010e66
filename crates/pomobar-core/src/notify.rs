//! Notification delivery.
//!
//! Delivery is best effort: the timer reports a failure through tracing and
//! [`NotificationStatus`] and moves on. Nothing here retries.
//!
//! Desktop delivery blocks on a D-Bus round trip, so the timer service wraps
//! its notifier in a [`BackgroundNotifier`] and learns the outcome later.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use notify_rust::Notification;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::{NotifyError, StoreError};
use crate::storage::{keys, NotificationsConfig, SettingsStore};

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// `Ok` from [`Notifier::notify`] only means the notification was
    /// handed off; the outcome is reported elsewhere.
    fn is_deferred(&self) -> bool {
        false
    }
}

/// Outcome of the most recent delivery attempt, for status readouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Unknown,
    Disabled,
    /// Handed to a background delivery that has not finished yet.
    Pending {
        at: DateTime<Utc>,
    },
    Delivered {
        at: DateTime<Utc>,
    },
    Failed {
        reason: String,
        permission_denied: bool,
        at: DateTime<Utc>,
    },
}

impl NotificationStatus {
    pub fn from_result(result: &Result<(), NotifyError>) -> Self {
        match result {
            Ok(()) => NotificationStatus::Delivered { at: Utc::now() },
            Err(e) => NotificationStatus::Failed {
                reason: e.to_string(),
                permission_denied: matches!(e, NotifyError::PermissionDenied(_)),
                at: Utc::now(),
            },
        }
    }

    /// Last recorded delivery outcome; `Unknown` when nothing usable is stored.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let raw = match store.get_raw(keys::LAST_NOTIFICATION) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::Unknown,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read last notification status");
                return Self::Unknown;
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable notification status");
            Self::Unknown
        })
    }

    pub fn save(&self, store: &dyn SettingsStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self).map_err(|e| StoreError::InvalidValue {
            key: keys::LAST_NOTIFICATION.to_string(),
            value: e.to_string(),
        })?;
        store.set_raw(keys::LAST_NOTIFICATION, &raw)
    }
}

/// Native desktop notifications through `notify-rust`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
    sound_name: Option<String>,
}

impl DesktopNotifier {
    pub fn from_config(config: &NotificationsConfig, sound_enabled: bool) -> Self {
        Self {
            app_name: config.app_name.clone(),
            sound_name: sound_enabled.then(|| config.sound_name.clone()),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut notification = Notification::new();
        notification.summary(title).body(body).appname(&self.app_name);

        #[cfg(all(unix, not(target_os = "macos")))]
        if let Some(sound) = &self.sound_name {
            notification.hint(notify_rust::Hint::SoundName(sound.clone()));
        }

        notification
            .show()
            .map(|_| ())
            .map_err(|e| classify(e.to_string()))
    }
}

fn classify(message: String) -> NotifyError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") || lower.contains("denied") {
        NotifyError::PermissionDenied(message)
    } else {
        NotifyError::DeliveryFailed(message)
    }
}

/// Runs another notifier on tokio's blocking pool. `notify` returns as soon
/// as delivery is handed off; each outcome is sent on `outcomes`.
pub struct BackgroundNotifier {
    inner: Arc<dyn Notifier>,
    runtime: Handle,
    outcomes: mpsc::UnboundedSender<NotificationStatus>,
}

impl BackgroundNotifier {
    pub fn new(
        inner: Arc<dyn Notifier>,
        runtime: Handle,
        outcomes: mpsc::UnboundedSender<NotificationStatus>,
    ) -> Self {
        Self {
            inner,
            runtime,
            outcomes,
        }
    }
}

impl Notifier for BackgroundNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let inner = Arc::clone(&self.inner);
        let outcomes = self.outcomes.clone();
        let (title, body) = (title.to_string(), body.to_string());
        self.runtime.spawn_blocking(move || {
            let result = inner.notify(&title, &body);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "notification not delivered");
            }
            let _ = outcomes.send(NotificationStatus::from_result(&result));
        });
        Ok(())
    }

    fn is_deferred(&self) -> bool {
        true
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(title, body, "notification");
        Ok(())
    }
}

/// Keeps delivered notifications in memory. Clones share the record, and
/// [`RecordingNotifier::failing`] makes every delivery fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failure: Option<NotifyError>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: NotifyError) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
