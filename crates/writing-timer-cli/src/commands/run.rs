//! Foreground loop: drives ticks until the session ends or Ctrl-C.

use std::io::Write;

use tokio::time::MissedTickBehavior;
use writing_timer_core::{CyclePhase, Event, SessionObserver};

use super::{print_events, Session};

/// Redraws a single progress line on stderr.
struct ProgressLine;

impl SessionObserver for ProgressLine {
    fn on_tick(&mut self, remaining_secs: u64, progress_pct: f64) {
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r{:02}:{:02}  {:5.1}%",
            remaining_secs / 60,
            remaining_secs % 60,
            progress_pct
        );
        let _ = stderr.flush();
    }

    fn on_phase_change(&mut self, from: CyclePhase, to: CyclePhase) {
        eprintln!("\n{from} complete, next up: {to}");
    }
}

pub fn run(minutes: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(&mut session, minutes));
    session.save()?;
    result
}

async fn drive(session: &mut Session, minutes: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let tick_interval = session.config.timer.tick_interval();

    let mut events = session.controller.tick();
    if let Some(minutes) = minutes {
        events.extend(session.controller.set_duration(minutes)?);
    }
    events.extend(session.controller.start());
    print_events(&events)?;
    if !session.controller.timer().is_running() {
        eprintln!("nothing to run: the countdown is at zero, set a duration first");
        return Ok(());
    }
    // Release the write lock; the loop only saves once it exits.
    session.save()?;

    let controller = &mut session.controller;
    controller.add_observer(Box::new(ProgressLine));

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = controller.tick();
                if events.is_empty() {
                    continue;
                }
                eprintln!();
                print_events(&events)?;
                let completed = events
                    .iter()
                    .any(|e| matches!(e, Event::TimerCompleted { .. }));
                if completed {
                    if !controller.pomodoro_enabled() {
                        break;
                    }
                    print_events(&controller.start())?;
                }
            }
            signal = &mut ctrl_c => {
                signal?;
                eprintln!();
                print_events(&controller.stop())?;
                break;
            }
        }
    }
    Ok(())
}
