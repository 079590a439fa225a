//! Countdown timer implementation.
//!
//! The countdown is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically. Every tick recomputes elapsed time from an anchor instant
//! instead of counting ticks, so delayed or throttled ticks never make the
//! countdown drift.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running <-> Paused
//!    ^          |
//!    |          v
//!    +------ Completed   (only via set_duration / stop / reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = CountdownTimer::new(25);
//! timer.start();
//! // In a loop:
//! if let Some(event) = timer.tick() {
//!     // TimerCompleted, emitted exactly once per run
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::events::{at_ms, Event};

/// Serializable data of a countdown.
///
/// Fields are only mutated by [`CountdownTimer`]; restoring through
/// [`CountdownTimer::from_state`] re-establishes the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    duration_secs: u64,
    elapsed_secs: u64,
    running: bool,
    paused: bool,
    completed: bool,
    /// Wall-clock instant (epoch ms) from which elapsed time is measured.
    #[serde(default)]
    anchor_ms: Option<u64>,
    /// Instant the current pause began.
    #[serde(default)]
    paused_at_ms: Option<u64>,
    /// Bumped whenever a run is armed or cancelled.
    #[serde(default)]
    run_id: u64,
}

impl TimerState {
    fn with_duration_secs(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            elapsed_secs: 0,
            running: false,
            paused: false,
            completed: false,
            anchor_ms: None,
            paused_at_ms: None,
            run_id: 0,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.duration_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    fn sanitize(mut self) -> Self {
        self.elapsed_secs = self.elapsed_secs.min(self.duration_secs);
        if !self.running {
            self.paused = false;
            self.anchor_ms = None;
            self.paused_at_ms = None;
        }
        if !self.paused {
            self.paused_at_ms = None;
        }
        if self.completed {
            self.running = false;
            self.paused = false;
            self.elapsed_secs = self.duration_secs;
        }
        self
    }
}

/// Drift-resistant countdown timer.
#[derive(Debug, Clone)]
pub struct CountdownTimer<C: Clock = SystemClock> {
    clock: C,
    state: TimerState,
}

impl CountdownTimer<SystemClock> {
    /// Create a stopped timer of `minutes` on the system clock.
    pub fn new(minutes: u32) -> Self {
        Self::with_clock(minutes, SystemClock)
    }
}

impl<C: Clock> CountdownTimer<C> {
    pub fn with_clock(minutes: u32, clock: C) -> Self {
        Self {
            clock,
            state: TimerState::with_duration_secs(minutes_to_secs(minutes)),
        }
    }

    /// Restore a timer from persisted state.
    ///
    /// A restored running timer picks up the wall-clock time that passed
    /// while it was not being ticked on its next `tick()`.
    pub fn from_state(state: TimerState, clock: C) -> Self {
        Self {
            clock,
            state: state.sanitize(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn duration_secs(&self) -> u64 {
        self.state.duration_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.state.elapsed_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    /// Neither running nor paused.
    pub fn is_idle(&self) -> bool {
        !self.state.running
    }

    pub fn run_id(&self) -> u64 {
        self.state.run_id
    }

    /// 0.0 .. 100.0 progress through the current duration.
    pub fn progress(&self) -> f64 {
        let total = self.state.duration_secs;
        if total == 0 {
            return 0.0;
        }
        (total - self.remaining_secs()) as f64 / total as f64 * 100.0
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn formatted_time(&self) -> String {
        let remaining = self.remaining_secs();
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Stop any run and configure a new duration.
    pub fn set_duration(&mut self, minutes: u32) -> Option<Event> {
        let run_id = self.state.run_id.wrapping_add(1);
        self.state = TimerState {
            run_id,
            ..TimerState::with_duration_secs(minutes_to_secs(minutes))
        };
        debug!(minutes, run_id, "timer duration set");
        Some(Event::DurationSet {
            duration_secs: self.state.duration_secs,
            at: at_ms(self.clock.now_ms()),
        })
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.remaining_secs() == 0 {
            return None;
        }
        if self.state.running {
            return if self.state.paused { self.resume() } else { None };
        }
        let now = self.clock.now_ms();
        self.state.running = true;
        self.state.paused = false;
        self.state.completed = false;
        self.state.paused_at_ms = None;
        self.state.anchor_ms = Some(now.saturating_sub(self.state.elapsed_secs * 1000));
        self.state.run_id = self.state.run_id.wrapping_add(1);
        debug!(run_id = self.state.run_id, remaining_secs = self.remaining_secs(), "timer started");
        Some(Event::TimerStarted {
            run_id: self.state.run_id,
            duration_secs: self.state.duration_secs,
            at: at_ms(now),
        })
    }

    /// Freeze elapsed time.
    ///
    /// Does nothing when the wall clock has already run past the end of the
    /// run; the next `tick()` completes it instead.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running || self.state.paused {
            return None;
        }
        let now = self.clock.now_ms();
        let elapsed = self.wall_elapsed_secs(now);
        if elapsed >= self.state.duration_secs {
            return None;
        }
        self.state.elapsed_secs = elapsed;
        self.state.paused = true;
        self.state.paused_at_ms = Some(now);
        debug!(elapsed_secs = elapsed, "timer paused");
        Some(Event::TimerPaused {
            elapsed_secs: elapsed,
            remaining_secs: self.remaining_secs(),
            at: at_ms(now),
        })
    }

    /// Continue a paused run, shifting the anchor past the paused interval.
    pub fn resume(&mut self) -> Option<Event> {
        if !self.state.running || !self.state.paused {
            return None;
        }
        let now = self.clock.now_ms();
        let paused_for = self
            .state
            .paused_at_ms
            .map(|since| now.saturating_sub(since))
            .unwrap_or(0);
        self.state.anchor_ms = Some(match self.state.anchor_ms {
            Some(anchor) => anchor.saturating_add(paused_for),
            None => now.saturating_sub(self.state.elapsed_secs * 1000),
        });
        self.state.paused = false;
        self.state.paused_at_ms = None;
        debug!(paused_for_ms = paused_for, "timer resumed");
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs(),
            at: at_ms(now),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if !self.state.running {
            self.start()
        } else if self.state.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Cancel the run and clear progress. The duration is kept.
    pub fn stop(&mut self) -> Option<Event> {
        let (elapsed_secs, now) = self.clear();
        Some(Event::TimerStopped {
            elapsed_secs,
            duration_secs: self.state.duration_secs,
            at: at_ms(now),
        })
    }

    /// Same as [`stop`](Self::stop), reported as a reset.
    pub fn reset(&mut self) -> Option<Event> {
        let (elapsed_secs, now) = self.clear();
        Some(Event::TimerReset {
            elapsed_secs,
            duration_secs: self.state.duration_secs,
            at: at_ms(now),
        })
    }

    /// Extend the current duration without touching elapsed progress.
    ///
    /// Ignored once the run has completed; reconfigure with
    /// `set_duration` instead.
    pub fn add_time(&mut self, minutes: u32) -> Option<Event> {
        if minutes == 0 || self.state.completed {
            return None;
        }
        let added_secs = minutes_to_secs(minutes);
        self.state.duration_secs = self.state.duration_secs.saturating_add(added_secs);
        debug!(minutes, duration_secs = self.state.duration_secs, "time added");
        Some(Event::TimeAdded {
            added_secs,
            duration_secs: self.state.duration_secs,
            at: at_ms(self.clock.now_ms()),
        })
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` exactly once
    /// when the run reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state.completed || !self.state.running || self.state.paused {
            return None;
        }
        let now = self.clock.now_ms();
        if self.state.anchor_ms.is_none() {
            self.state.anchor_ms = Some(now.saturating_sub(self.state.elapsed_secs * 1000));
        }
        self.state.elapsed_secs = self.wall_elapsed_secs(now);
        if self.state.elapsed_secs < self.state.duration_secs {
            return None;
        }

        self.state.completed = true;
        self.state.running = false;
        self.state.paused = false;
        self.state.anchor_ms = None;
        self.state.paused_at_ms = None;
        info!(
            run_id = self.state.run_id,
            duration_secs = self.state.duration_secs,
            "timer completed"
        );
        Some(Event::TimerCompleted {
            run_id: self.state.run_id,
            duration_secs: self.state.duration_secs,
            elapsed_secs: self.state.elapsed_secs,
            at: at_ms(now),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Elapsed seconds according to the anchor, clamped to the duration.
    fn wall_elapsed_secs(&self, now: u64) -> u64 {
        if !self.state.running || self.state.paused {
            return self.state.elapsed_secs;
        }
        match self.state.anchor_ms {
            Some(anchor) => (now.saturating_sub(anchor) / 1000).min(self.state.duration_secs),
            None => self.state.elapsed_secs,
        }
    }

    /// Reset progress, returning the elapsed seconds it had reached.
    fn clear(&mut self) -> (u64, u64) {
        let now = self.clock.now_ms();
        let elapsed = self.wall_elapsed_secs(now);
        let was_armed = self.state.running || self.state.completed;
        let run_id = if was_armed {
            self.state.run_id.wrapping_add(1)
        } else {
            self.state.run_id
        };
        self.state = TimerState {
            run_id,
            ..TimerState::with_duration_secs(self.state.duration_secs)
        };
        debug!(elapsed_secs = elapsed, "timer cleared");
        (elapsed, now)
    }
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}
