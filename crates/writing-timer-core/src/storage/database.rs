//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Recorded writing sessions and word counts
//! - Session statistics (daily and all-time)
//! - The task list (see `tasks.rs`)
//! - Key-value store for application state

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::session::{CompletedSession, SessionMode, StatisticsSink, WordSession};

/// Number of sessions kept in [`Statistics::recent`].
pub const RECENT_SESSIONS: usize = 10;

/// Number of word sessions kept in [`WordStatistics::recent`].
pub const RECENT_WORD_SESSIONS: usize = 20;

const LAST_RESET_KEY: &str = "statistics_last_reset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: String,
    pub minutes: u32,
    pub is_pomodoro_work: bool,
    pub project: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Statistics {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub sessions_by_mode: BTreeMap<String, u64>,
    pub minutes_by_mode: BTreeMap<String, u64>,
    pub completed_pomodoros: u64,
    /// Times a task was checked off. Deleting the task keeps the count.
    pub tasks_completed: u64,
    /// Most recent sessions first.
    pub recent: Vec<SessionRecord>,
    pub words: WordStatistics,
    pub last_reset: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WordStatistics {
    pub total_words_written: u64,
    pub total_sessions: u64,
    pub sessions_with_goal: u64,
    pub goals_achieved: u64,
    pub best_session: u64,
    /// Most recent first.
    pub recent: Vec<WordSession>,
}

impl Statistics {
    fn empty() -> Self {
        let zeroes: BTreeMap<String, u64> = SessionMode::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), 0))
            .collect();
        Self {
            sessions_by_mode: zeroes.clone(),
            minutes_by_mode: zeroes,
            ..Self::default()
        }
    }
}

/// SQLite database for session storage.
///
/// Stores recorded sessions and provides statistics.
pub struct Database {
    pub(super) conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/writing-timer/writing-timer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("writing-timer.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                mode             TEXT NOT NULL,
                minutes          INTEGER NOT NULL,
                is_pomodoro_work INTEGER NOT NULL DEFAULT 0,
                project          TEXT,
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS word_sessions (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                mode           TEXT NOT NULL,
                project        TEXT,
                words_at_start INTEGER NOT NULL,
                words_at_end   INTEGER NOT NULL,
                words_written  INTEGER NOT NULL,
                target_words   INTEGER,
                goal_achieved  INTEGER,
                completed_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                text         TEXT NOT NULL,
                completed    INTEGER NOT NULL DEFAULT 0,
                mode         TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE TABLE IF NOT EXISTS task_completions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id      INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode);",
        )?;
        Ok(())
    }

    /// Record a session to the database.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, session: &CompletedSession) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (mode, minutes, is_pomodoro_work, project, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.mode.as_str(),
                session.minutes,
                session.is_pomodoro_work,
                session.project,
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Record the word counts of a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_word_session(&self, session: &WordSession) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO word_sessions (mode, project, words_at_start, words_at_end, words_written,
                                        target_words, goal_achieved, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.mode.as_str(),
                session.project,
                session.words_at_start,
                session.words_at_end,
                session.words_written,
                session.target_words,
                session.goal_achieved,
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Statistics since local midnight.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats_today(&self) -> Result<Statistics, DatabaseError> {
        self.aggregate(&day_start_utc(&Local::now()).to_rfc3339())
    }

    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats_all(&self) -> Result<Statistics, DatabaseError> {
        self.aggregate("")
    }

    /// Delete all recorded sessions and stamp the reset time.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn reset_statistics(&self, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "DELETE FROM sessions;
             DELETE FROM word_sessions;
             DELETE FROM task_completions;",
        )?;
        self.kv_set(LAST_RESET_KEY, &at.to_rfc3339())?;
        Ok(())
    }

    /// Take the write lock until [`commit`](Self::commit). Other processes
    /// opening a write lock wait for the busy timeout, then fail with
    /// [`DatabaseError::Locked`].
    ///
    /// # Errors
    /// Returns `Locked` if another connection holds the lock.
    pub fn begin_immediate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if no transaction is open or the commit fails.
    pub fn commit(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn aggregate(&self, since: &str) -> Result<Statistics, DatabaseError> {
        let mut stats = Statistics::empty();

        let mut stmt = self.conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(minutes), 0), COALESCE(SUM(is_pomodoro_work), 0)
             FROM sessions
             WHERE completed_at >= ?1
             GROUP BY mode",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;
        for row in rows {
            let (mode, count, minutes, pomodoros) = row?;
            stats.total_sessions += count;
            stats.total_minutes += minutes;
            stats.completed_pomodoros += pomodoros;
            *stats.sessions_by_mode.entry(mode.clone()).or_default() += count;
            *stats.minutes_by_mode.entry(mode).or_default() += minutes;
        }

        let mut recent = self.conn.prepare(
            "SELECT id, mode, minutes, is_pomodoro_work, project, completed_at
             FROM sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = recent.query_map(params![since, RECENT_SESSIONS as i64], |row| {
            let completed_at: String = row.get(5)?;
            Ok(SessionRecord {
                id: row.get(0)?,
                mode: row.get(1)?,
                minutes: row.get(2)?,
                is_pomodoro_work: row.get(3)?,
                project: row.get(4)?,
                completed_at: parse_timestamp(&completed_at),
            })
        })?;
        for row in rows {
            stats.recent.push(row?);
        }

        stats.tasks_completed = self.conn.query_row(
            "SELECT COUNT(*) FROM task_completions WHERE completed_at >= ?1",
            params![since],
            |row| row.get(0),
        )?;
        stats.words = self.word_statistics(since)?;

        stats.last_reset = self
            .kv_get(LAST_RESET_KEY)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Ok(stats)
    }

    fn word_statistics(&self, since: &str) -> Result<WordStatistics, DatabaseError> {
        let mut words = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(words_written), 0),
                    COALESCE(SUM(target_words IS NOT NULL), 0),
                    COALESCE(SUM(goal_achieved), 0),
                    COALESCE(MAX(words_written), 0)
             FROM word_sessions
             WHERE completed_at >= ?1",
            params![since],
            |row| {
                Ok(WordStatistics {
                    total_sessions: row.get(0)?,
                    total_words_written: row.get(1)?,
                    sessions_with_goal: row.get(2)?,
                    goals_achieved: row.get(3)?,
                    best_session: row.get(4)?,
                    recent: Vec::new(),
                })
            },
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT mode, project, words_at_start, words_at_end, words_written,
                    target_words, goal_achieved, completed_at
             FROM word_sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![since, RECENT_WORD_SESSIONS as i64], |row| {
            let mode: String = row.get(0)?;
            let completed_at: String = row.get(7)?;
            Ok(WordSession {
                mode: mode.parse().unwrap_or_default(),
                project: row.get(1)?,
                words_at_start: row.get(2)?,
                words_at_end: row.get(3)?,
                words_written: row.get(4)?,
                target_words: row.get(5)?,
                goal_achieved: row.get(6)?,
                completed_at: parse_timestamp(&completed_at),
            })
        })?;
        for row in rows {
            words.recent.push(row?);
        }
        Ok(words)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StatisticsSink for Database {
    fn record(&self, session: &CompletedSession) -> crate::error::Result<()> {
        self.record_session(session)?;
        Ok(())
    }

    fn record_words(&self, session: &WordSession) -> crate::error::Result<()> {
        self.record_word_session(session)?;
        Ok(())
    }
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// The UTC instant at which `now`'s local calendar day began.
fn day_start_utc<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(mode: SessionMode, minutes: u32, pomodoro: bool, at: DateTime<Utc>) -> CompletedSession {
        CompletedSession {
            mode,
            minutes,
            is_pomodoro_work: pomodoro,
            project: None,
            completed_at: at,
        }
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(&session(SessionMode::Writing, 25, true, now))
            .unwrap();
        db.record_session(&session(SessionMode::Creative, 15, false, now))
            .unwrap();
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_minutes, 40);
        assert_eq!(stats.completed_pomodoros, 1);
        assert_eq!(stats.sessions_by_mode["writing"], 1);
        assert_eq!(stats.minutes_by_mode["creative"], 15);
        assert_eq!(stats.sessions_by_mode["roaming"], 0);
    }

    #[test]
    fn today_excludes_older_sessions() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(&session(SessionMode::Writing, 30, false, now - Duration::days(3)))
            .unwrap();
        db.record_session(&session(SessionMode::Writing, 10, false, now))
            .unwrap();
        assert_eq!(db.stats_today().unwrap().total_minutes, 10);
        assert_eq!(db.stats_all().unwrap().total_minutes, 40);
    }

    #[test]
    fn recent_is_capped_and_newest_first() {
        let db = Database::open_memory().unwrap();
        let base = Utc::now() - Duration::hours(1);
        for i in 0..12 {
            db.record_session(&session(SessionMode::Roaming, i + 1, false, base + Duration::minutes(i as i64)))
                .unwrap();
        }
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.recent.len(), RECENT_SESSIONS);
        assert_eq!(stats.recent[0].minutes, 12);
        assert_eq!(stats.recent[9].minutes, 3);
    }

    #[test]
    fn reset_clears_sessions_and_stamps_time() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(&session(SessionMode::Writing, 25, true, now))
            .unwrap();
        db.reset_statistics(now).unwrap();
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert!(stats.recent.is_empty());
        assert_eq!(
            stats.last_reset.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn database_is_a_statistics_sink() {
        let db = Database::open_memory().unwrap();
        let sink: &dyn StatisticsSink = &db;
        sink.record(&session(SessionMode::Researching, 45, false, Utc::now()))
            .unwrap();
        assert_eq!(db.stats_all().unwrap().sessions_by_mode["researching"], 1);
    }

    fn words(start: u32, end: u32, target: Option<u32>, at: DateTime<Utc>) -> WordSession {
        WordSession {
            mode: SessionMode::Writing,
            project: Some("Novel".into()),
            words_at_start: start,
            words_at_end: end,
            words_written: end - start,
            target_words: target,
            goal_achieved: target.map(|t| end - start >= t),
            completed_at: at,
        }
    }

    #[test]
    fn word_statistics_aggregate() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_word_session(&words(0, 400, Some(500), now - Duration::minutes(30)))
            .unwrap();
        db.record_word_session(&words(400, 1_100, Some(500), now))
            .unwrap();
        db.record_word_session(&words(1_100, 1_200, None, now))
            .unwrap();

        let stats = db.stats_all().unwrap().words;
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_words_written, 1_200);
        assert_eq!(stats.sessions_with_goal, 2);
        assert_eq!(stats.goals_achieved, 1);
        assert_eq!(stats.best_session, 700);
        assert_eq!(stats.recent[2].words_written, 400);
        assert_eq!(stats.recent[0].project.as_deref(), Some("Novel"));
    }

    #[test]
    fn reset_clears_words_and_task_completions() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_word_session(&words(0, 10, None, now)).unwrap();
        let task = db.add_task("Revise", SessionMode::Writing, now).unwrap();
        db.toggle_task(task.id, now).unwrap();
        db.reset_statistics(now).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.words.total_sessions, 0);
        assert_eq!(stats.tasks_completed, 0);
        // The task list itself is not statistics.
        assert_eq!(db.tasks().unwrap().len(), 1);
    }

    #[test]
    fn day_starts_at_local_midnight() {
        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap();
        assert_eq!(
            day_start_utc(&now),
            Utc.with_ymd_and_hms(2026, 10, 17, 15, 0, 0).unwrap()
        );

        let new_york = chrono::FixedOffset::west_opt(4 * 3600).unwrap();
        let now = new_york.with_ymd_and_hms(2026, 10, 18, 22, 30, 0).unwrap();
        assert_eq!(
            day_start_utc(&now),
            Utc.with_ymd_and_hms(2026, 10, 18, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn write_lock_excludes_other_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let first = Database::open_at(&path).unwrap();
        let second = Database::open_at(&path).unwrap();
        second
            .conn
            .busy_timeout(std::time::Duration::from_millis(20))
            .unwrap();

        first.begin_immediate().unwrap();
        first.kv_set("session_state", "a").unwrap();
        assert!(matches!(second.begin_immediate(), Err(DatabaseError::Locked)));

        first.commit().unwrap();
        second.begin_immediate().unwrap();
        assert_eq!(second.kv_get("session_state").unwrap().as_deref(), Some("a"));
        second.commit().unwrap();
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
