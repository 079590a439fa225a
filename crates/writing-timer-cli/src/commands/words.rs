use clap::Subcommand;
use serde::Serialize;
use writing_timer_core::WordCount;

use super::{print_events, Session};

#[derive(Subcommand)]
pub enum WordsAction {
    /// Manuscript word count before writing
    Start {
        count: u32,
    },
    /// Manuscript word count after writing
    End {
        count: u32,
    },
    /// Words to aim for this session (0 clears it)
    Target {
        count: u32,
    },
    /// Forget the counts entered so far
    Clear,
    /// Print the counts and progress towards the target
    Status,
}

#[derive(Serialize)]
struct WordStatus {
    #[serde(flatten)]
    counts: WordCount,
    written: u32,
    progress_pct: u32,
    goal_achieved: Option<bool>,
}

impl From<&WordCount> for WordStatus {
    fn from(counts: &WordCount) -> Self {
        Self {
            counts: *counts,
            written: counts.written(),
            progress_pct: counts.progress_pct(),
            goal_achieved: counts.goal_achieved(),
        }
    }
}

pub fn run(action: WordsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let controller = &mut session.controller;

    // A closing count entered after the countdown ran out still belongs to
    // that session, so it goes in before catching up.
    if let WordsAction::End { count } = action {
        controller.set_words_at_end(Some(count));
    }
    let events = controller.tick();

    match action {
        WordsAction::Start { count } => controller.set_words_at_start(Some(count)),
        WordsAction::Target { count } => controller.set_word_target((count > 0).then_some(count)),
        WordsAction::Clear => controller.clear_words(),
        WordsAction::End { .. } | WordsAction::Status => {}
    }

    print_events(&events)?;
    println!("{}", serde_json::to_string_pretty(&WordStatus::from(controller.words()))?);
    session.save()?;
    Ok(())
}
