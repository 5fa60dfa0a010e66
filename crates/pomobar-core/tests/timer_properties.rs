//! Property and scenario tests for the phase timer, driven through a
//! manual scheduler and clock.

use chrono::{Duration as ChronoDuration, Local, TimeZone};
use pomobar_core::{
    Event, ManualClock, ManualScheduler, Phase, PhaseTimer, Preset, RecordingNotifier,
    TimerOptions, TimerState, Wake,
};
use proptest::prelude::*;
use std::time::Duration;

fn timer_with(preset: Preset, options: TimerOptions) -> (PhaseTimer, ManualScheduler, ManualClock) {
    let scheduler = ManualScheduler::new();
    let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap());
    let timer = PhaseTimer::new(
        preset,
        Box::new(scheduler.clone()),
        Box::new(RecordingNotifier::new()),
        Box::new(clock.clone()),
    )
    .with_options(options);
    (timer, scheduler, clock)
}

/// Feed ticks through the live ticker until the phase completes.
fn tick_until_complete(timer: &mut PhaseTimer, scheduler: &ManualScheduler) -> Event {
    loop {
        let generation = scheduler.live_ticker().expect("timer should be ticking");
        if let Some(event) = timer.handle_wake(Wake::Tick(generation)) {
            return event;
        }
    }
}

fn arb_preset() -> impl Strategy<Value = Preset> {
    (1u64..=90, 1u64..=30, 1u64..=60).prop_map(|(f, s, l)| Preset::new("Arb", f, s, l))
}

fn arb_phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Focus),
        Just(Phase::ShortBreak),
        Just(Phase::LongBreak)
    ]
}

proptest! {
    #[test]
    fn reset_to_phase_uses_full_duration(preset in arb_preset(), phase in arb_phase()) {
        let (mut timer, _, _) = timer_with(preset.clone(), TimerOptions::default());
        timer.reset_to_phase(phase);
        prop_assert_eq!(timer.remaining_secs(), preset.duration_minutes(phase) * 60);
    }

    #[test]
    fn stop_restores_full_duration(preset in arb_preset(), elapsed in 0u64..3000) {
        let (mut timer, _, _) = timer_with(preset.clone(), TimerOptions::default());
        timer.start();
        let elapsed = elapsed.min(timer.remaining_secs() - 1);
        for _ in 0..elapsed {
            timer.tick();
        }
        timer.stop();
        prop_assert_eq!(timer.remaining_secs(), preset.duration_secs(Phase::Focus));
        prop_assert_eq!(timer.phase(), Phase::Focus);
        prop_assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn pause_resume_keeps_remaining(elapsed in 0u64..1499, pauses in 1usize..5) {
        let (mut timer, scheduler, _) = timer_with(Preset::default(), TimerOptions::default());
        timer.start();
        for _ in 0..elapsed {
            timer.tick();
        }
        let before = timer.remaining_secs();
        for _ in 0..pauses {
            timer.pause();
            timer.tick();
            timer.resume();
        }
        prop_assert_eq!(timer.remaining_secs(), before);
        prop_assert_eq!(scheduler.live_tickers(), 1);
    }

    #[test]
    fn only_focus_completions_count(skips in proptest::collection::vec(any::<bool>(), 1..12)) {
        let (mut timer, _, _) = timer_with(Preset::new("Tiny", 1, 1, 1), TimerOptions::default());
        let mut focus_done = 0u64;
        for skip in skips {
            let was_focus = timer.phase() == Phase::Focus;
            if skip && was_focus {
                timer.skip_to_break();
            } else {
                timer.start();
                for _ in 0..60 {
                    timer.tick();
                }
            }
            if was_focus {
                focus_done += 1;
                let expected = if focus_done % 4 == 0 { Phase::LongBreak } else { Phase::ShortBreak };
                prop_assert_eq!(timer.phase(), expected);
            } else {
                prop_assert_eq!(timer.phase(), Phase::Focus);
            }
            prop_assert_eq!(timer.completed_cycles(), focus_done);
        }
    }
}

#[test]
fn classic_focus_scenario() {
    let (mut timer, scheduler, _) =
        timer_with(Preset::new("Classic", 25, 5, 15), TimerOptions::default());
    timer.start();
    assert_eq!(timer.remaining_secs(), 1500);

    let mut ticks = 0;
    let event = loop {
        ticks += 1;
        if let Some(event) = timer.tick() {
            break event;
        }
    };
    assert_eq!(ticks, 1500);
    assert!(matches!(event, Event::PhaseCompleted { .. }));
    assert_eq!(timer.phase(), Phase::ShortBreak);
    assert_eq!(timer.remaining_secs(), 300);
    assert_eq!(timer.completed_cycles(), 1);
    assert_eq!(scheduler.live_tickers(), 0);
}

#[test]
fn auto_start_breaks_scenario() {
    let options = TimerOptions {
        auto_start_breaks: true,
        ..TimerOptions::default()
    };
    let (mut timer, scheduler, _) = timer_with(Preset::default(), options);
    timer.start();
    tick_until_complete(&mut timer, &scheduler);
    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(timer.phase(), Phase::ShortBreak);
    assert_eq!(scheduler.live_tickers(), 1);
}

#[test]
fn stop_for_today_at_eleven_pm_scenario() {
    let (mut timer, scheduler, clock) = timer_with(Preset::default(), TimerOptions::default());
    timer.start();
    tick_until_complete(&mut timer, &scheduler);
    timer.start();
    tick_until_complete(&mut timer, &scheduler);
    timer.start();
    tick_until_complete(&mut timer, &scheduler);
    let cycles = timer.completed_cycles();
    let week = timer.stats().week_focus_minutes;
    assert_eq!(timer.stats().today.focus_minutes, 50);

    clock.set(Local.with_ymd_and_hms(2026, 6, 10, 23, 0, 0).unwrap());
    timer.stop_for_today();
    let (generation, delay) = scheduler.pending_rollover().unwrap();
    assert_eq!(delay, Duration::from_secs(3600));

    clock.advance(ChronoDuration::hours(1));
    timer.handle_wake(Wake::Rollover(generation));

    assert_eq!(timer.state(), TimerState::Stopped);
    assert_eq!(timer.stats().today.focus_minutes, 0);
    assert_eq!(timer.completed_cycles(), cycles);
    assert_eq!(timer.stats().week_focus_minutes, week);
    assert_eq!(timer.stats().current_streak, 1);
}
