//! # Writing Timer Core Library
//!
//! This library provides the core logic for the writing timer: a countdown
//! with session modes, an optional Pomodoro work/break cycle, and local
//! session statistics. The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Countdown**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()`; elapsed time is recomputed from an
//!   anchor instant so throttled ticks never drift
//! - **Cycle**: The Pomodoro work/short-break/long-break state machine
//! - **Session**: The controller that wires the countdown and cycle to the
//!   statistics and notification collaborators
//! - **Storage**: SQLite-based session statistics, word counts and task list,
//!   and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CountdownTimer`]: Core countdown state machine
//! - [`SessionController`]: Completion handling and Pomodoro orchestration
//! - [`Database`]: Session and statistics persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use session::{
    CompletedSession, NotificationSink, SessionController, SessionMode, SessionObserver,
    SessionState, StatisticsSink, WordCount, WordSession,
};
pub use storage::{Config, Database, Statistics, Task, WordStatistics};
pub use timer::{
    Clock, CountdownTimer, CyclePhase, CycleState, ManualClock, PomodoroConfig, SystemClock,
    TimerState,
};
