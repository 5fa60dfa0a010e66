//! Phases and the presets that give them their durations.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the preset used when nothing else is selected.
pub const DEFAULT_PRESET: &str = "Classic";

/// Every Nth completed focus phase is followed by a long break.
pub const CYCLES_PER_LONG_BREAK: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Focus, Phase::ShortBreak, Phase::LongBreak];

    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Focus)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Phase that follows this one, given the cycle count *after* any
    /// increment for a just-completed focus phase.
    pub fn next(self, completed_cycles: u64) -> Phase {
        match self {
            Phase::Focus if completed_cycles % CYCLES_PER_LONG_BREAK == 0 => Phase::LongBreak,
            Phase::Focus => Phase::ShortBreak,
            Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "focus" => Ok(Phase::Focus),
            "short_break" | "short" => Ok(Phase::ShortBreak),
            "long_break" | "long" => Ok(Phase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// A named bundle of phase durations, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub focus_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
}

impl Preset {
    pub fn new(name: impl Into<String>, focus: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            name: name.into(),
            focus_minutes: focus,
            short_break_minutes: short_break,
            long_break_minutes: long_break,
        }
    }

    /// Built-in presets, default first.
    pub fn builtin() -> Vec<Preset> {
        vec![
            Preset::new(DEFAULT_PRESET, 25, 5, 15),
            Preset::new("Quick", 15, 3, 10),
            Preset::new("Deep Work", 50, 10, 30),
        ]
    }

    pub fn duration_minutes(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    /// Uses saturating arithmetic so oversized config values cannot overflow.
    pub fn duration_secs(&self, phase: Phase) -> u64 {
        self.duration_minutes(phase).saturating_mul(60)
    }

    /// Rejects empty names and zero-length phases.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "presets.name".into(),
                message: "preset name must not be empty".into(),
            });
        }
        for phase in Phase::ALL {
            if self.duration_minutes(phase) == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("presets.{}", self.name),
                    message: format!("{} duration must be at least one minute", phase.label()),
                });
            }
        }
        Ok(())
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::new(DEFAULT_PRESET, 25, 5, 15)
    }
}

/// Case-insensitive lookup by preset name.
pub fn find_preset<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
    presets
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// The preset a stored name selects. No name, or one that no longer exists,
/// gives the first preset in `presets` (the built-in default when empty).
pub fn resolve_preset(presets: &[Preset], name: Option<&str>) -> Preset {
    let fallback = || presets.first().cloned().unwrap_or_default();
    match name {
        None => fallback(),
        Some(name) => find_preset(presets, name).cloned().unwrap_or_else(|| {
            tracing::warn!(%name, "stored preset not found, using default");
            fallback()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_first_preset() {
        let presets = vec![Preset::new("Classic", 30, 5, 15), Preset::new("Quick", 15, 3, 10)];
        assert_eq!(resolve_preset(&presets, None).focus_minutes, 30);
        assert_eq!(resolve_preset(&presets, Some("gone")).focus_minutes, 30);
        assert_eq!(resolve_preset(&presets, Some("QUICK")).name, "Quick");
        assert_eq!(resolve_preset(&[], None), Preset::default());
    }

    #[test]
    fn long_break_every_fourth_cycle() {
        let picks: Vec<Phase> = (1..=8).map(|n| Phase::Focus.next(n)).collect();
        assert_eq!(
            picks,
            vec![
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
            ]
        );
    }

    #[test]
    fn breaks_return_to_focus() {
        assert_eq!(Phase::ShortBreak.next(3), Phase::Focus);
        assert_eq!(Phase::LongBreak.next(4), Phase::Focus);
    }

    #[test]
    fn builtin_presets_are_valid() {
        for preset in Preset::builtin() {
            preset.validate().unwrap();
        }
        assert_eq!(Preset::builtin()[0], Preset::default());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let preset = Preset::new("Broken", 25, 0, 15);
        assert!(preset.validate().is_err());
    }

    #[test]
    fn find_preset_ignores_case() {
        let presets = Preset::builtin();
        assert_eq!(find_preset(&presets, "deep work").unwrap().focus_minutes, 50);
        assert!(find_preset(&presets, "nope").is_none());
    }

    #[test]
    fn phase_parses_from_cli_spellings() {
        assert_eq!("short-break".parse::<Phase>().unwrap(), Phase::ShortBreak);
        assert_eq!("Long".parse::<Phase>().unwrap(), Phase::LongBreak);
        assert!("nap".parse::<Phase>().is_err());
    }
}
