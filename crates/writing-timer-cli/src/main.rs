use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "writing-timer", version, about = "Writing timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Pomodoro cycle control
    Pomodoro {
        #[command(subcommand)]
        action: commands::pomodoro::PomodoroAction,
    },
    /// Switch session mode (writing, researching, creative, roaming)
    Mode {
        mode: String,
        /// Project attached to recorded sessions ("" clears it)
        #[arg(long)]
        project: Option<String>,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Task list for the writing session
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Word counts for the current work session
    Words {
        #[command(subcommand)]
        action: commands::words::WordsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the countdown in the foreground until it completes or Ctrl-C
    Run {
        /// Duration in minutes (defaults to the configured one)
        #[arg(long)]
        minutes: Option<u32>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WRITING_TIMER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Pomodoro { action } => commands::pomodoro::run(action),
        Commands::Mode { mode, project } => commands::mode::run(mode, project),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Words { action } => commands::words::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Run { minutes } => commands::run::run(minutes),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
