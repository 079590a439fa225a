//! Collaborators the session controller reports to.
//!
//! These are injected rather than reached for globally, so the controller
//! can be exercised against in-memory fakes.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::words::WordSession;
use super::SessionMode;
use crate::error::Result;
use crate::events::Event;
use crate::timer::CyclePhase;

/// A finished (or stopped) session long enough to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub mode: SessionMode,
    pub minutes: u32,
    pub is_pomodoro_work: bool,
    pub project: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Persists and aggregates recorded sessions.
pub trait StatisticsSink {
    /// # Errors
    /// Implementations report storage failures; callers log and continue.
    fn record(&self, session: &CompletedSession) -> Result<()>;

    /// # Errors
    /// Implementations report storage failures; callers log and continue.
    fn record_words(&self, session: &WordSession) -> Result<()>;
}

/// Audible or visual cue when a countdown completes.
pub trait NotificationSink {
    /// # Errors
    /// Implementations report delivery failures; callers log and continue.
    fn notify(&self, event: &Event) -> Result<()>;
}

/// Callbacks for front ends that render the session.
pub trait SessionObserver {
    fn on_tick(&mut self, _remaining_secs: u64, _progress_pct: f64) {}

    fn on_complete(&mut self, _event: &Event) {}

    fn on_phase_change(&mut self, _from: CyclePhase, _to: CyclePhase) {}
}

impl<T: StatisticsSink + ?Sized> StatisticsSink for Rc<T> {
    fn record(&self, session: &CompletedSession) -> Result<()> {
        (**self).record(session)
    }

    fn record_words(&self, session: &WordSession) -> Result<()> {
        (**self).record_words(session)
    }
}

impl<T: StatisticsSink + ?Sized> StatisticsSink for Arc<T> {
    fn record(&self, session: &CompletedSession) -> Result<()> {
        (**self).record(session)
    }

    fn record_words(&self, session: &WordSession) -> Result<()> {
        (**self).record_words(session)
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Rc<T> {
    fn notify(&self, event: &Event) -> Result<()> {
        (**self).notify(event)
    }
}

/// Notification sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl NotificationSink for SilentNotifier {
    fn notify(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

/// Statistics sink that keeps sessions in memory.
#[derive(Debug, Default)]
pub struct MemoryStatistics {
    sessions: RefCell<Vec<CompletedSession>>,
    word_sessions: RefCell<Vec<WordSession>>,
}

impl MemoryStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<CompletedSession> {
        self.sessions.borrow().clone()
    }

    pub fn word_sessions(&self) -> Vec<WordSession> {
        self.word_sessions.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.borrow().is_empty()
    }
}

impl StatisticsSink for MemoryStatistics {
    fn record(&self, session: &CompletedSession) -> Result<()> {
        self.sessions.borrow_mut().push(session.clone());
        Ok(())
    }

    fn record_words(&self, session: &WordSession) -> Result<()> {
        self.word_sessions.borrow_mut().push(session.clone());
        Ok(())
    }
}
