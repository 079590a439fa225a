use clap::Subcommand;

use super::{print_events, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Start, pause or resume depending on the current state
    Toggle,
    /// Stop and clear progress, recording the session if it lasted a minute
    Stop,
    /// Same as stop
    Reset,
    /// Set a new duration (1-999 minutes)
    Set {
        minutes: u32,
    },
    /// Extend the current session
    Add {
        minutes: u32,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let controller = &mut session.controller;

    // Catch up on anything that finished since the last invocation.
    let mut events = controller.tick();

    match action {
        TimerAction::Status => {}
        TimerAction::Start => events.extend(controller.start()),
        TimerAction::Pause => events.extend(controller.pause()),
        TimerAction::Resume => events.extend(controller.resume()),
        TimerAction::Toggle => events.extend(controller.toggle()),
        TimerAction::Stop => events.extend(controller.stop()),
        TimerAction::Reset => events.extend(controller.reset()),
        TimerAction::Set { minutes } => events.extend(controller.set_duration(minutes)?),
        TimerAction::Add { minutes } => events.extend(controller.add_time(minutes)?),
    }

    events.push(controller.snapshot());
    print_events(&events)?;
    session.save()?;
    Ok(())
}
