//! Arming and cancelling the timer's periodic tick and one-shot rollover.
//!
//! A [`Scheduler`] never touches the timer. It delivers [`Wake`]s tagged with
//! the generation they were armed for, and the returned [`TaskHandle`]
//! cancels the underlying task when cancelled or dropped. The timer owns the
//! handles, so dropping a handle is how a transition stops ticking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant};

/// Wake-up delivered to whoever owns the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Tick(u64),
    Rollover(u64),
}

/// Owned cancellation handle for a scheduled task.
#[must_use = "dropping a TaskHandle cancels the task"]
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

pub trait Scheduler: Send {
    /// Deliver `Wake::Tick(generation)` once per second until cancelled.
    fn every_second(&mut self, generation: u64) -> TaskHandle;

    /// Deliver `Wake::Rollover(generation)` once after `delay`.
    fn once_after(&mut self, generation: u64, delay: Duration) -> TaskHandle;
}

/// Scheduler backed by tokio tasks feeding an mpsc channel.
pub struct TokioScheduler {
    runtime: Handle,
    wakes: mpsc::UnboundedSender<Wake>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle, wakes: mpsc::UnboundedSender<Wake>) -> Self {
        Self { runtime, wakes }
    }
}

impl Scheduler for TokioScheduler {
    fn every_second(&mut self, generation: u64) -> TaskHandle {
        let wakes = self.wakes.clone();
        let task = self.runtime.spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if wakes.send(Wake::Tick(generation)).is_err() {
                    break;
                }
            }
        });
        TaskHandle::new(move || task.abort())
    }

    fn once_after(&mut self, generation: u64, delay: Duration) -> TaskHandle {
        let wakes = self.wakes.clone();
        let task = self.runtime.spawn(async move {
            sleep(delay).await;
            let _ = wakes.send(Wake::Rollover(generation));
        });
        TaskHandle::new(move || task.abort())
    }
}

#[derive(Debug, Default)]
struct ManualState {
    tickers: BTreeSet<u64>,
    rollovers: BTreeMap<u64, Duration>,
    tickers_armed: u64,
}

/// Scheduler for callers that drive ticks themselves (tests, embedded
/// loops). It only records what is armed; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ManualState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Number of tickers armed and not yet cancelled.
    pub fn live_tickers(&self) -> usize {
        self.with_state(|s| s.tickers.len())
    }

    /// Generation of the live ticker, if exactly one is armed.
    pub fn live_ticker(&self) -> Option<u64> {
        self.with_state(|s| match s.tickers.len() {
            1 => s.tickers.iter().next().copied(),
            _ => None,
        })
    }

    /// Total tickers ever armed.
    pub fn tickers_armed(&self) -> u64 {
        self.with_state(|s| s.tickers_armed)
    }

    /// Generation and delay of the pending rollover, if any.
    pub fn pending_rollover(&self) -> Option<(u64, Duration)> {
        self.with_state(|s| s.rollovers.iter().next_back().map(|(g, d)| (*g, *d)))
    }

    pub fn live_rollovers(&self) -> usize {
        self.with_state(|s| s.rollovers.len())
    }
}

impl Scheduler for ManualScheduler {
    fn every_second(&mut self, generation: u64) -> TaskHandle {
        self.with_state(|s| {
            s.tickers.insert(generation);
            s.tickers_armed += 1;
        });
        let state = Arc::clone(&self.state);
        TaskHandle::new(move || {
            let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
            s.tickers.remove(&generation);
        })
    }

    fn once_after(&mut self, generation: u64, delay: Duration) -> TaskHandle {
        self.with_state(|s| {
            s.rollovers.insert(generation, delay);
        });
        let state = Arc::clone(&self.state);
        TaskHandle::new(move || {
            let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
            s.rollovers.remove(&generation);
        })
    }
}
