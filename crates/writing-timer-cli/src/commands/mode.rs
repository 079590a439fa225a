use writing_timer_core::SessionMode;

use super::{print_events, Session};

/// Switch the session mode and, optionally, the project.
pub fn run(mode: String, project: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mode: SessionMode = mode.parse()?;
    let mut session = Session::open()?;
    let mut events = session.controller.tick();

    events.extend(session.controller.set_mode(mode));
    session.config.session.mode = mode;
    if let Some(project) = project {
        session.controller.set_project(Some(project));
        session.config.session.project = session.controller.project().unwrap_or_default().to_string();
    }
    session.config.save()?;

    events.push(session.controller.snapshot());
    print_events(&events)?;
    session.save()?;
    Ok(())
}
