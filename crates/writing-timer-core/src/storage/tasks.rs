//! SQLite-backed task list.
//!
//! Tasks are short to-do items for the writing session. Checking one off
//! also logs a completion, which feeds `Statistics::tasks_completed` and
//! survives deleting or clearing the task.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::database::{parse_timestamp, Database};
use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::session::SessionMode;

/// Longest accepted task text, in characters.
pub const MAX_TASK_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    /// Session mode the task was added under.
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let mode: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let completed_at: Option<String> = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        text: row.get(1)?,
        completed: row.get(2)?,
        mode: mode.parse().unwrap_or_default(),
        created_at: parse_timestamp(&created_at),
        completed_at: completed_at.as_deref().map(parse_timestamp),
    })
}

const TASK_COLUMNS: &str = "id, text, completed, mode, created_at, completed_at";

impl Database {
    /// Append a task.
    ///
    /// # Errors
    /// Rejects blank or overlong text, or fails if the insert fails.
    pub fn add_task(&self, text: &str, mode: SessionMode, at: DateTime<Utc>) -> Result<Task, CoreError> {
        let text = text.trim();
        if text.is_empty() || text.chars().count() > MAX_TASK_LEN {
            return Err(ValidationError::InvalidValue {
                field: "text".to_string(),
                message: format!("must be 1 to {MAX_TASK_LEN} characters"),
            }
            .into());
        }
        self.conn.execute(
            "INSERT INTO tasks (text, completed, mode, created_at) VALUES (?1, 0, ?2, ?3)",
            params![text, mode.as_str(), at.to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "task added");
        Ok(self.task(id)?)
    }

    /// All tasks in the order they were added.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;
        let rows = stmt.query_map([], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// # Errors
    /// Returns `TaskNotFound` for an unknown id.
    pub fn task(&self, id: i64) -> Result<Task, DatabaseError> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                task_from_row,
            )
            .optional()?
            .ok_or(DatabaseError::TaskNotFound(id))
    }

    /// Flip a task between open and done. Checking it off counts as a
    /// completed task; unchecking does not take the count back.
    ///
    /// # Errors
    /// Returns `TaskNotFound` for an unknown id.
    pub fn toggle_task(&self, id: i64, at: DateTime<Utc>) -> Result<Task, DatabaseError> {
        let task = self.task(id)?;
        let completed_at = (!task.completed).then(|| at.to_rfc3339());
        self.conn.execute(
            "UPDATE tasks SET completed = ?1, completed_at = ?2 WHERE id = ?3",
            params![!task.completed, completed_at, id],
        )?;
        if let Some(completed_at) = &completed_at {
            self.conn.execute(
                "INSERT INTO task_completions (task_id, completed_at) VALUES (?1, ?2)",
                params![id, completed_at],
            )?;
        }
        self.task(id)
    }

    /// # Errors
    /// Returns `TaskNotFound` for an unknown id.
    pub fn delete_task(&self, id: i64) -> Result<(), DatabaseError> {
        let deleted = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DatabaseError::TaskNotFound(id));
        }
        Ok(())
    }

    /// Remove every checked-off task, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn clear_completed_tasks(&self) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM tasks WHERE completed = 1", [])?)
    }
}
