use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use writing_timer_core::storage::Database;
use writing_timer_core::Task;

use super::Session;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task under the current session mode
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List all tasks
    List,
    /// Check off a task, or reopen a checked one
    Toggle {
        id: i64,
    },
    /// Delete a task
    Delete {
        id: i64,
    },
    /// Remove every checked-off task
    Clear,
}

#[derive(Serialize)]
struct TaskList {
    open: usize,
    done: usize,
    tasks: Vec<Task>,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::Add { text } => {
            let mut session = Session::open()?;
            let task = session
                .db
                .add_task(&text.join(" "), session.controller.mode(), Utc::now())?;
            session.save()?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List => {
            let tasks = Database::open()?.tasks()?;
            let done = tasks.iter().filter(|t| t.completed).count();
            let list = TaskList {
                open: tasks.len() - done,
                done,
                tasks,
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        TaskAction::Toggle { id } => {
            let task = Database::open()?.toggle_task(id, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Delete { id } => {
            Database::open()?.delete_task(id)?;
            println!("task {id} deleted");
        }
        TaskAction::Clear => {
            let removed = Database::open()?.clear_completed_tasks()?;
            println!("{removed} completed task(s) removed");
        }
    }
    Ok(())
}
