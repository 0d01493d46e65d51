//! Learner-facing session logic: browsing, flashcards, multiple-choice quizzes and
//! spaced-repetition review over one fetched vocabulary list.
//!
//! - [`view`] - the [`SessionView`] state object and its single transition function
//! - [`quiz`] / [`review`] / [`flashcard`] - per-mode state
//! - [`mastery`] / [`stats`] - persisted progress, shared per profile through [`progress`]
//! - [`snapshot`] - serializable derived state for clients

pub mod flashcard;
pub mod mastery;
pub mod progress;
pub mod quiz;
pub mod review;
pub mod snapshot;
pub mod stats;
pub mod view;

pub use mastery::{MasteryChange, MasteryMap, MASTERY_THRESHOLD};
pub use progress::{ProfileProgress, ProgressHandle};
pub use quiz::{QuizOption, QUIZ_LENGTHS};
pub use snapshot::SessionSnapshot;
pub use stats::SessionStats;
pub use view::{Action, AdvanceTicket, Mode, Outcome, SessionView};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::vocab::VocabEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("not enough vocabulary: need {needed}, have {available}")]
    NotEnoughItems { needed: usize, available: usize },
    #[error("{action} is not allowed in {mode}")]
    InvalidAction {
        action: &'static str,
        mode: &'static str,
    },
    #[error("option {index} out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("already answered")]
    AlreadyAnswered,
    #[error("no pending leave to confirm or cancel")]
    NothingPending,
    #[error("unsupported quiz length {0}")]
    UnsupportedQuizLength(usize),
}

const ALL_LEVELS: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelFilter {
    #[default]
    All,
    Level(String),
}

impl LevelFilter {
    pub fn matches(&self, entry: &VocabEntry) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Level(level) => entry.level == *level,
        }
    }

    pub fn apply<'a>(&'a self, entries: &'a [VocabEntry]) -> impl Iterator<Item = &'a VocabEntry> + 'a {
        entries.iter().filter(move |e| self.matches(e))
    }
}

impl From<String> for LevelFilter {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_LEVELS) {
            LevelFilter::All
        } else {
            LevelFilter::Level(trimmed.to_string())
        }
    }
}

impl From<LevelFilter> for String {
    fn from(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::All => ALL_LEVELS.to_string(),
            LevelFilter::Level(level) => level,
        }
    }
}
