//! Word-count tracking for writing sessions.
//!
//! The writer enters the manuscript's word count before and after a work
//! session and, optionally, a target. When the work session ends the
//! controller turns the counts into a [`WordSession`] and clears them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionMode;

/// Counts entered for the session in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    #[serde(default)]
    pub at_start: Option<u32>,
    #[serde(default)]
    pub at_end: Option<u32>,
    /// A target of zero counts as no target.
    #[serde(default)]
    pub target: Option<u32>,
}

impl WordCount {
    /// Words added between the two counts. Zero until both are known.
    pub fn written(&self) -> u32 {
        match (self.at_start, self.at_end) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }

    pub fn target(&self) -> Option<u32> {
        self.target.filter(|t| *t > 0)
    }

    /// Progress towards the target, rounded and capped at 100.
    pub fn progress_pct(&self) -> u32 {
        let Some(target) = self.target() else {
            return 0;
        };
        let target = u64::from(target);
        let pct = (u64::from(self.written()) * 100 + target / 2) / target;
        pct.min(100) as u32
    }

    pub fn goal_achieved(&self) -> Option<bool> {
        self.target().map(|t| self.written() >= t)
    }
}

/// Word counts of a finished work session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSession {
    pub mode: SessionMode,
    pub project: Option<String>,
    pub words_at_start: u32,
    pub words_at_end: u32,
    pub words_written: u32,
    pub target_words: Option<u32>,
    pub goal_achieved: Option<bool>,
    pub completed_at: DateTime<Utc>,
}

impl WordSession {
    /// Build a record from entered counts. `None` when nothing was written.
    pub fn from_counts(
        counts: &WordCount,
        mode: SessionMode,
        project: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (Some(words_at_start), Some(words_at_end)) = (counts.at_start, counts.at_end) else {
            return None;
        };
        let words_written = counts.written();
        if words_written == 0 {
            return None;
        }
        Some(Self {
            mode,
            project,
            words_at_start,
            words_at_end,
            words_written,
            target_words: counts.target(),
            goal_achieved: counts.goal_achieved(),
            completed_at,
        })
    }
}
