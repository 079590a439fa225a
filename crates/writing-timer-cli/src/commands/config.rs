use clap::Subcommand;
use writing_timer_core::Config;

use super::{affects_session, print_events, Session, SESSION_CONFIG_KEYS};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "pomodoro.work_minutes", "session.mode")
        key: String,
    },
    /// Set a config value; session keys also update the live timer
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            if !affects_session(&key) {
                let mut config = Config::load()?;
                config.set(&key, &value)?;
                println!("{key} = {}", config.get(&key).unwrap_or(value));
                return Ok(());
            }
            let mut session = Session::open()?;
            let mut events = session.controller.tick();
            session.config.set(&key, &value)?;
            events.extend(session.apply_config(&key)?);
            events.push(session.controller.snapshot());
            print_events(&events)?;
            session.save()?;
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let mut session = Session::open()?;
            let mut events = session.controller.tick();
            session.config = Config::default();
            session.config.save()?;
            for key in SESSION_CONFIG_KEYS {
                events.extend(session.apply_config(key)?);
            }
            events.push(session.controller.snapshot());
            print_events(&events)?;
            session.save()?;
        }
    }
    Ok(())
}
