mod clock;
mod engine;
mod scheduler;

pub use clock::{next_midnight, Clock, ManualClock, SystemClock};
pub use engine::{PhaseTimer, SkipCredit, TimerOptions, TimerState};
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, TokioScheduler, Wake};
