use clap::Subcommand;
use serde::Serialize;
use writing_timer_core::{CyclePhase, PomodoroConfig};

use super::{print_events, Session};

#[derive(Subcommand)]
pub enum PomodoroAction {
    /// Turn on the work/break cycle, starting at the first work session
    Enable,
    /// Return to plain sessions
    Disable,
    /// Print the cycle position and durations as JSON
    Status,
    /// Change cycle durations
    Set {
        #[arg(long)]
        work: Option<u32>,
        #[arg(long)]
        short_break: Option<u32>,
        #[arg(long)]
        long_break: Option<u32>,
        /// Work sessions before a long break (1-10)
        #[arg(long)]
        sessions: Option<u32>,
    },
}

#[derive(Serialize)]
struct PomodoroStatus {
    enabled: bool,
    phase: Option<CyclePhase>,
    session_index: Option<u32>,
    completed_work_sessions: Option<u32>,
    config: PomodoroConfig,
}

pub fn run(action: PomodoroAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let mut events = session.controller.tick();
    let mut status = None;

    match action {
        PomodoroAction::Enable => {
            events.extend(session.controller.enable_pomodoro());
            session.config.pomodoro.enabled = true;
            session.config.save()?;
        }
        PomodoroAction::Disable => {
            session.controller.disable_pomodoro();
            session.config.pomodoro.enabled = false;
            session.config.save()?;
        }
        PomodoroAction::Status => {
            let cycle = session.controller.cycle().copied();
            status = Some(PomodoroStatus {
                enabled: cycle.is_some(),
                phase: cycle.map(|c| c.phase()),
                session_index: cycle.map(|c| c.session_index()),
                completed_work_sessions: cycle.map(|c| c.completed_work_sessions()),
                config: *session.controller.pomodoro_config(),
            });
        }
        PomodoroAction::Set {
            work,
            short_break,
            long_break,
            sessions,
        } => {
            let current = *session.controller.pomodoro_config();
            let config = PomodoroConfig {
                work_minutes: work.unwrap_or(current.work_minutes),
                short_break_minutes: short_break.unwrap_or(current.short_break_minutes),
                long_break_minutes: long_break.unwrap_or(current.long_break_minutes),
                sessions_before_long_break: sessions.unwrap_or(current.sessions_before_long_break),
            };
            events.extend(session.controller.set_pomodoro_config(config)?);
            let settings = &mut session.config.pomodoro;
            settings.work_minutes = config.work_minutes;
            settings.short_break_minutes = config.short_break_minutes;
            settings.long_break_minutes = config.long_break_minutes;
            settings.sessions_before_long_break = config.sessions_before_long_break;
            session.config.save()?;
        }
    }

    print_events(&events)?;
    if let Some(status) = status {
        println!("{}", serde_json::to_string_pretty(&status)?);
    }
    session.save()?;
    Ok(())
}
