//! Pomodoro work/break cycle.
//!
//! A pure state machine: it only moves when the caller reports that the
//! countdown for the current phase completed, and tells the caller which
//! duration to configure next.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Work => "work",
            CyclePhase::ShortBreak => "short_break",
            CyclePhase::LongBreak => "long_break",
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durations (minutes) and cycle length of the Pomodoro technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_before_long_break: u32,
}

impl PomodoroConfig {
    pub const MAX_MINUTES: u32 = 999;
    pub const MAX_SESSIONS_BEFORE_LONG_BREAK: u32 = 10;

    /// Reject zero or out-of-range values.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ] {
            if value == 0 || value > Self::MAX_MINUTES {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("must be between 1 and {}, got {value}", Self::MAX_MINUTES),
                });
            }
        }
        if self.sessions_before_long_break == 0
            || self.sessions_before_long_break > Self::MAX_SESSIONS_BEFORE_LONG_BREAK
        {
            return Err(ValidationError::InvalidValue {
                field: "sessions_before_long_break".to_string(),
                message: format!(
                    "must be between 1 and {}, got {}",
                    Self::MAX_SESSIONS_BEFORE_LONG_BREAK,
                    self.sessions_before_long_break
                ),
            });
        }
        Ok(())
    }

    pub fn minutes_for(&self, phase: CyclePhase) -> u32 {
        match phase {
            CyclePhase::Work => self.work_minutes,
            CyclePhase::ShortBreak => self.short_break_minutes,
            CyclePhase::LongBreak => self.long_break_minutes,
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_before_long_break: 4,
        }
    }
}

/// Position within the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    phase: CyclePhase,
    session_index: u32,
    completed_work_sessions: u32,
}

/// Result of advancing the cycle after a phase completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CyclePhase,
    pub to: CyclePhase,
    /// Minutes the countdown should be configured with for `to`.
    pub next_minutes: u32,
}

impl CycleState {
    pub fn new() -> Self {
        Self {
            phase: CyclePhase::Work,
            session_index: 1,
            completed_work_sessions: 0,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn session_index(&self) -> u32 {
        self.session_index
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    /// Move to the next phase after the current one completed.
    pub fn advance(&mut self, config: &PomodoroConfig) -> Transition {
        let from = self.phase;
        let to = match from {
            CyclePhase::Work => {
                self.completed_work_sessions += 1;
                self.session_index += 1;
                let per_cycle = config.sessions_before_long_break.max(1);
                if self.completed_work_sessions % per_cycle == 0 {
                    CyclePhase::LongBreak
                } else {
                    CyclePhase::ShortBreak
                }
            }
            CyclePhase::ShortBreak => CyclePhase::Work,
            CyclePhase::LongBreak => {
                self.session_index = 1;
                self.completed_work_sessions = 0;
                CyclePhase::Work
            }
        };
        self.phase = to;
        Transition {
            from,
            to,
            next_minutes: config.minutes_for(to),
        }
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_first_work_session() {
        let state = CycleState::new();
        assert_eq!(state.phase(), CyclePhase::Work);
        assert_eq!(state.session_index(), 1);
        assert_eq!(state.completed_work_sessions(), 0);
    }

    #[test]
    fn four_work_sessions_then_long_break() {
        let config = PomodoroConfig::default();
        let mut state = CycleState::new();
        let mut phases = vec![state.phase()];
        let mut minutes = Vec::new();
        for _ in 0..7 {
            let t = state.advance(&config);
            phases.push(t.to);
            minutes.push(t.next_minutes);
        }
        use CyclePhase::*;
        assert_eq!(
            phases,
            vec![Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, LongBreak]
        );
        assert_eq!(minutes, vec![5, 25, 5, 25, 5, 25, 15]);
        assert_eq!(state.completed_work_sessions(), 4);
        assert_eq!(state.session_index(), 5);

        let back = state.advance(&config);
        assert_eq!(back.to, Work);
        assert_eq!(back.next_minutes, 25);
        assert_eq!(state.completed_work_sessions(), 0);
        assert_eq!(state.session_index(), 1);
    }

    #[test]
    fn short_break_keeps_session_index() {
        let config = PomodoroConfig::default();
        let mut state = CycleState::new();
        state.advance(&config);
        assert_eq!(state.session_index(), 2);
        state.advance(&config);
        assert_eq!(state.phase(), CyclePhase::Work);
        assert_eq!(state.session_index(), 2);
    }

    #[test]
    fn single_session_cycle_always_takes_long_break() {
        let config = PomodoroConfig {
            sessions_before_long_break: 1,
            ..PomodoroConfig::default()
        };
        let mut state = CycleState::new();
        assert_eq!(state.advance(&config).to, CyclePhase::LongBreak);
        assert_eq!(state.advance(&config).to, CyclePhase::Work);
        assert_eq!(state.advance(&config).to, CyclePhase::LongBreak);
    }

    #[test]
    fn validate_rejects_zero_and_out_of_range() {
        assert!(PomodoroConfig::default().validate().is_ok());
        let zero_work = PomodoroConfig {
            work_minutes: 0,
            ..PomodoroConfig::default()
        };
        assert!(zero_work.validate().is_err());
        let too_many = PomodoroConfig {
            sessions_before_long_break: 11,
            ..PomodoroConfig::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "sessions_before_long_break"
        ));
    }
}
