use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionMode;
use crate::timer::CyclePhase;

/// Every state change in the system produces an Event.
/// Front ends print or render them; observers receive them as callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        run_id: u64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The run was cancelled. `elapsed_secs` is the progress at the moment
    /// of stopping, before the timer cleared it.
    TimerStopped {
        elapsed_secs: u64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        elapsed_secs: u64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    DurationSet {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimeAdded {
        added_secs: u64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        run_id: u64,
        duration_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: CyclePhase,
        to: CyclePhase,
        session_index: u32,
        completed_work_sessions: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        mode: SessionMode,
        minutes: u32,
        is_pomodoro_work: bool,
        project: Option<String>,
        at: DateTime<Utc>,
    },
    WordsRecorded {
        words_written: u32,
        target_words: Option<u32>,
        goal_achieved: Option<bool>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        remaining_secs: u64,
        elapsed_secs: u64,
        duration_secs: u64,
        running: bool,
        paused: bool,
        completed: bool,
        progress_pct: f64,
        formatted: String,
        mode: SessionMode,
        phase: Option<CyclePhase>,
        session_index: Option<u32>,
        at: DateTime<Utc>,
    },
}

/// Convert clock milliseconds into an event timestamp.
pub(crate) fn at_ms(ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}
