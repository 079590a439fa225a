pub mod config;
pub mod mode;
pub mod pomodoro;
pub mod run;
pub mod stats;
pub mod task;
pub mod timer;
pub mod words;

use std::io::Write;
use std::rc::Rc;

use writing_timer_core::session::SessionController;
use writing_timer_core::storage::Database;
use writing_timer_core::{Config, CoreError, CountdownTimer, Event, NotificationSink, SessionState, SystemClock};

const SESSION_KEY: &str = "session_state";

/// Config keys that shape the live session, in the order they are applied
/// after a reset.
pub const SESSION_CONFIG_KEYS: [&str; 5] = [
    "pomodoro.work_minutes",
    "pomodoro.enabled",
    "session.mode",
    "session.project",
    "session.default_minutes",
];

/// Rings the terminal bell when a countdown completes.
pub struct TerminalNotifier {
    enabled: bool,
    bell: bool,
}

impl TerminalNotifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.notifications.enabled,
            bell: config.notifications.bell,
        }
    }
}

impl NotificationSink for TerminalNotifier {
    fn notify(&self, _event: &Event) -> Result<(), CoreError> {
        if !self.enabled {
            return Ok(());
        }
        let mut stderr = std::io::stderr();
        if self.bell {
            stderr.write_all(b"\x07")?;
        }
        stderr.flush()?;
        Ok(())
    }
}

/// The controller as it was left by the previous invocation.
///
/// Holds the database write lock from `open` until the first `save`, so two
/// invocations never handle the same completion.
pub struct Session {
    pub db: Rc<Database>,
    pub config: Config,
    pub controller: SessionController,
    locked: bool,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let db = Rc::new(Database::open()?);
        db.begin_immediate()?;
        let stored = db
            .kv_get(SESSION_KEY)?
            .and_then(|json| match serde_json::from_str::<SessionState>(&json) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable session state");
                    None
                }
            });

        let statistics = Box::new(Rc::clone(&db));
        let notifier = Box::new(TerminalNotifier::from_config(&config));
        let controller = match stored {
            Some(state) => SessionController::from_state(
                state,
                config.pomodoro.to_config(),
                SystemClock,
                statistics,
                notifier,
            ),
            None => {
                let mut controller = SessionController::new(
                    CountdownTimer::new(config.session.default_minutes),
                    statistics,
                    notifier,
                );
                controller.set_pomodoro_config(config.pomodoro.to_config())?;
                controller.set_mode(config.session.mode);
                controller.set_duration(config.session.default_minutes)?;
                controller.set_project(config.session.project());
                if config.pomodoro.enabled {
                    controller.enable_pomodoro();
                }
                controller
            }
        };

        Ok(Self {
            db,
            config,
            controller,
            locked: true,
        })
    }

    /// Persist the controller and release the write lock.
    pub fn save(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&self.controller.to_state())?;
        self.db.kv_set(SESSION_KEY, &json)?;
        if self.locked {
            self.db.commit()?;
            self.locked = false;
        }
        Ok(())
    }

    /// Bring the controller in line with a changed config key.
    pub fn apply_config(&mut self, key: &str) -> Result<Vec<Event>, CoreError> {
        let controller = &mut self.controller;
        let config = &self.config;
        let mut events = Vec::new();
        match key {
            "pomodoro.enabled" => {
                if !config.pomodoro.enabled {
                    controller.disable_pomodoro();
                } else if !controller.pomodoro_enabled() {
                    events.extend(controller.enable_pomodoro());
                }
            }
            k if k.starts_with("pomodoro.") => {
                events.extend(controller.set_pomodoro_config(config.pomodoro.to_config())?);
            }
            "session.mode" => events.extend(controller.set_mode(config.session.mode)),
            "session.project" => controller.set_project(config.session.project()),
            "session.default_minutes" => {
                if controller.timer().is_idle() && !controller.pomodoro_enabled() {
                    events.extend(controller.set_duration(config.session.default_minutes)?);
                }
            }
            _ => {}
        }
        Ok(events)
    }
}

pub fn affects_session(key: &str) -> bool {
    key.starts_with("pomodoro.") || SESSION_CONFIG_KEYS.contains(&key)
}

pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}
