//! Foreground timer. Reads one command per line from stdin and prints every
//! event as a line of JSON on stdout.

use pomobar_core::storage::{Config, Settings, SettingsStore, SqliteStore};
use pomobar_core::{
    Command, CoreError, DesktopNotifier, LogNotifier, Notifier, Phase, ServiceParts,
    SystemClock, TimerService,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  start | pause | resume | stop
  skip                 end the focus phase now
  today                stop until midnight
  reset PHASE          focus, short, long
  preset NAME          switch preset
  auto BREAKS FOCUS    auto-start flags, e.g. 'auto on off'
  notify on|off
  status | help | quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Timer(Command),
    Status,
    Help,
    Quit,
}

fn parse_switch(word: Option<&str>) -> Result<bool, String> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("on" | "true" | "yes") => Ok(true),
        Some("off" | "false" | "no") => Ok(false),
        Some(other) => Err(format!("expected on/off, got '{other}'")),
        None => Err("expected on/off".to_string()),
    }
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "start" => Input::Timer(Command::Start),
        "pause" => Input::Timer(Command::Pause),
        "resume" => Input::Timer(Command::Resume),
        "stop" => Input::Timer(Command::Stop),
        "skip" => Input::Timer(Command::SkipToBreak),
        "today" => Input::Timer(Command::StopForToday),
        "reset" => {
            let phase = words
                .next()
                .ok_or("usage: reset focus|short|long")?
                .parse::<Phase>()?;
            Input::Timer(Command::ResetToPhase(phase))
        }
        "preset" => {
            let name = words.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err("usage: preset NAME".to_string());
            }
            Input::Timer(Command::SelectPreset(name))
        }
        "auto" => {
            let breaks = parse_switch(words.next())?;
            let focus = parse_switch(words.next())?;
            Input::Timer(Command::SetAutoStart { breaks, focus })
        }
        "notify" => Input::Timer(Command::SetNotifications(parse_switch(words.next())?)),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(Some(input))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn run(preset: Option<String>, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_foreground(preset, quiet));
    // The stdin reader sits on a blocking thread; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run_foreground(
    preset: Option<String>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = SqliteStore::open_default()?;

    if let Some(name) = preset {
        let preset = config
            .preset(&name)
            .ok_or(CoreError::UnknownPreset(name))?;
        store.save_preset_name(&preset.name)?;
    }

    let settings = Settings::load(&store);
    let notifier: Box<dyn Notifier> = if quiet {
        Box::new(LogNotifier)
    } else {
        Box::new(DesktopNotifier::from_config(
            &config.notifications,
            settings.sound_enabled,
        ))
    };

    let (service, handle, mut events) = TimerService::new(ServiceParts {
        store: Box::new(store),
        notifier,
        clock: Box::new(SystemClock),
        presets: config.all_presets(),
        skip_credit: config.stats.skip_credit,
    });
    let service = tokio::spawn(service.run());

    print_json(&handle.snapshot())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(None) => {}
                    Ok(Some(Input::Timer(command))) => handle.send(command)?,
                    Ok(Some(Input::Status)) => print_json(&handle.snapshot())?,
                    Ok(Some(Input::Help)) => eprintln!("{HELP}"),
                    Ok(Some(Input::Quit)) => break,
                    Err(message) => eprintln!("{message}"),
                }
            }
            Some(event) = events.recv() => print_json(&event)?,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = handle.send(Command::Shutdown);
    service.await?;
    while let Ok(event) = events.try_recv() {
        print_json(&event)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_verbs() {
        assert_eq!(parse_input("start").unwrap(), Some(Input::Timer(Command::Start)));
        assert_eq!(parse_input("  PAUSE ").unwrap(), Some(Input::Timer(Command::Pause)));
        assert_eq!(parse_input("skip").unwrap(), Some(Input::Timer(Command::SkipToBreak)));
        assert_eq!(parse_input("today").unwrap(), Some(Input::Timer(Command::StopForToday)));
        assert_eq!(parse_input("quit").unwrap(), Some(Input::Quit));
        assert_eq!(parse_input("").unwrap(), None);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            parse_input("preset Deep Work").unwrap(),
            Some(Input::Timer(Command::SelectPreset("Deep Work".into())))
        );
        assert_eq!(
            parse_input("reset long").unwrap(),
            Some(Input::Timer(Command::ResetToPhase(Phase::LongBreak)))
        );
        assert_eq!(
            parse_input("auto on off").unwrap(),
            Some(Input::Timer(Command::SetAutoStart {
                breaks: true,
                focus: false
            }))
        );
        assert_eq!(
            parse_input("notify off").unwrap(),
            Some(Input::Timer(Command::SetNotifications(false)))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("dance").is_err());
        assert!(parse_input("preset").is_err());
        assert!(parse_input("reset nap").is_err());
        assert!(parse_input("auto on").is_err());
    }
}
