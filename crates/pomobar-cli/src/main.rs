use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomobar", version, about = "Pomodoro focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer in the foreground, reading commands from stdin
    Run {
        /// Preset to select before starting
        #[arg(long)]
        preset: Option<String>,
        /// Log notifications instead of showing them on the desktop
        #[arg(long)]
        quiet: bool,
    },
    /// Print persisted settings, progress and statistics
    Status,
    /// Print focus statistics
    Stats,
    /// Preset management
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Boolean settings (auto-start, notifications, sound)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { preset, quiet } => commands::run::run(preset, quiet),
        Commands::Status => commands::status::run(),
        Commands::Stats => commands::stats::run(),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
