use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::flashcard::FlashcardState;
use super::progress::ProgressHandle;
use super::quiz::{distinct_headwords, QuizState, DEFAULT_QUIZ_LENGTH, OPTIONS_PER_QUESTION, QUIZ_LENGTHS};
use super::review::{ReviewGrade, ReviewState};
use super::{LevelFilter, SessionError};
use crate::services::vocab::{VocabEntry, VocabPayload};

#[derive(Debug, Clone)]
pub enum Mode {
    List,
    Flashcard(FlashcardState),
    Quiz(QuizState),
    Review(ReviewState),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::List => "list",
            Mode::Flashcard(_) => "flashcard",
            Mode::Quiz(_) => "quiz",
            Mode::Review(_) => "review",
        }
    }

    /// Answered at least once and not finished.
    pub fn in_progress(&self) -> bool {
        match self {
            Mode::Quiz(quiz) => quiz.in_progress(),
            Mode::Review(review) => review.in_progress(),
            Mode::List | Mode::Flashcard(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    SetFilter { level: LevelFilter },
    SetQuizLength { length: usize },
    ShowList,
    StartFlashcards,
    StartQuiz,
    StartReview,
    FlipCard,
    NextCard,
    PrevCard,
    SelectOption { index: usize },
    Reveal,
    Grade { remembered: bool },
    Advance,
    Restart,
    ConfirmLeave,
    CancelLeave,
    Reload(VocabPayload),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetFilter { .. } => "setFilter",
            Action::SetQuizLength { .. } => "setQuizLength",
            Action::ShowList => "showList",
            Action::StartFlashcards => "startFlashcards",
            Action::StartQuiz => "startQuiz",
            Action::StartReview => "startReview",
            Action::FlipCard => "flipCard",
            Action::NextCard => "nextCard",
            Action::PrevCard => "prevCard",
            Action::SelectOption { .. } => "selectOption",
            Action::Reveal => "reveal",
            Action::Grade { .. } => "grade",
            Action::Advance => "advance",
            Action::Restart => "restart",
            Action::ConfirmLeave => "confirmLeave",
            Action::CancelLeave => "cancelLeave",
            Action::Reload(_) => "reload",
        }
    }

    /// Actions that throw away the current quiz or review.
    fn leaves_mode(&self) -> bool {
        matches!(
            self,
            Action::SetFilter { .. }
                | Action::ShowList
                | Action::StartFlashcards
                | Action::StartQuiz
                | Action::StartReview
                | Action::Reload(_)
        )
    }
}

/// Identifies one scheduled auto-advance. Only the newest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Outcome {
    Updated,
    Unchanged,
    ConfirmRequired {
        pending: Action,
    },
    QuizAnswered {
        correct: bool,
        correct_index: Option<usize>,
        auto_advance: AdvanceTicket,
    },
    ReviewGraded {
        grade: ReviewGrade,
        auto_advance: AdvanceTicket,
    },
}

impl Outcome {
    pub fn auto_advance(&self) -> Option<AdvanceTicket> {
        match self {
            Outcome::QuizAnswered { auto_advance, .. } | Outcome::ReviewGraded { auto_advance, .. } => {
                Some(*auto_advance)
            }
            _ => None,
        }
    }

    /// Whether the session state moved, which invalidates any scheduled advance.
    pub fn changed_state(&self) -> bool {
        !matches!(self, Outcome::Unchanged | Outcome::ConfirmRequired { .. })
    }
}

/// One learner's view over a fetched vocabulary list.
///
/// Every change goes through [`SessionView::apply`] (user actions) or
/// [`SessionView::on_timer`] (auto-advance). Randomness comes from `R` so quizzes are
/// reproducible under a seeded generator.
pub struct SessionView<R = StdRng> {
    list: Vec<VocabEntry>,
    levels: Vec<String>,
    filter: LevelFilter,
    quiz_length: usize,
    mode: Mode,
    pending_leave: Option<Action>,
    generation: u64,
    progress: ProgressHandle,
    rng: R,
}

impl<R: Rng> SessionView<R> {
    pub fn open(payload: VocabPayload, progress: ProgressHandle, rng: R) -> Self {
        tracing::debug!(
            profile = progress.profile(),
            words = payload.vocab_list.len(),
            tracked = progress.lock().mastery.len(),
            "session opened"
        );

        Self {
            list: payload.vocab_list,
            levels: payload.levels,
            filter: LevelFilter::All,
            quiz_length: DEFAULT_QUIZ_LENGTH,
            mode: Mode::List,
            pending_leave: None,
            generation: 0,
            progress,
            rng,
        }
    }

    pub fn apply(&mut self, action: Action, today: NaiveDate) -> Result<Outcome, SessionError> {
        match action {
            Action::ConfirmLeave => {
                let pending = self.pending_leave.take().ok_or(SessionError::NothingPending)?;
                tracing::debug!(action = pending.name(), "leave confirmed");
                return self.perform(pending, today);
            }
            Action::CancelLeave => {
                self.pending_leave.take().ok_or(SessionError::NothingPending)?;
                return Ok(Outcome::Unchanged);
            }
            _ => {}
        }

        if action.leaves_mode() && self.mode.in_progress() {
            self.pending_leave = Some(action.clone());
            return Ok(Outcome::ConfirmRequired { pending: action });
        }

        // a rejected action leaves any parked leave in place
        let outcome = self.perform(action, today)?;
        self.pending_leave = None;
        Ok(outcome)
    }

    /// Delivers a scheduled auto-advance. Returns `false` for a stale ticket.
    pub fn on_timer(&mut self, ticket: AdvanceTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }

        let advanced = match &mut self.mode {
            Mode::Quiz(quiz) if quiz.is_awaiting_advance() => quiz.advance(&mut self.rng).is_ok(),
            Mode::Review(review) if review.is_awaiting_advance() => review.advance().is_ok(),
            _ => false,
        };
        if advanced {
            self.generation += 1;
        }
        advanced
    }

    fn perform(&mut self, action: Action, today: NaiveDate) -> Result<Outcome, SessionError> {
        let outcome = self.transition(action, today)?;
        if outcome.changed_state() {
            self.generation += 1;
        }

        // tickets are stamped with the generation the transition produced
        Ok(match outcome {
            Outcome::QuizAnswered {
                correct,
                correct_index,
                ..
            } => Outcome::QuizAnswered {
                correct,
                correct_index,
                auto_advance: self.ticket(),
            },
            Outcome::ReviewGraded { grade, .. } => Outcome::ReviewGraded {
                grade,
                auto_advance: self.ticket(),
            },
            other => other,
        })
    }

    fn transition(&mut self, action: Action, today: NaiveDate) -> Result<Outcome, SessionError> {
        let mode = self.mode.name();
        let invalid = |action: &Action| SessionError::InvalidAction {
            action: action.name(),
            mode,
        };

        match action {
            Action::SetFilter { level } => {
                self.filter = level;
                if let Mode::Flashcard(card) = &mut self.mode {
                    *card = FlashcardState::default();
                } else {
                    self.mode = Mode::List;
                }
            }
            Action::SetQuizLength { length } => {
                if !QUIZ_LENGTHS.contains(&length) {
                    return Err(SessionError::UnsupportedQuizLength(length));
                }
                self.quiz_length = length;
            }
            Action::ShowList => self.mode = Mode::List,
            Action::StartFlashcards => self.mode = Mode::Flashcard(FlashcardState::default()),
            Action::StartQuiz => self.start_quiz()?,
            Action::StartReview => self.start_review()?,
            Action::FlipCard | Action::NextCard | Action::PrevCard => {
                let len = self.filtered_len();
                let Mode::Flashcard(card) = &mut self.mode else {
                    return Err(invalid(&action));
                };
                match action {
                    Action::FlipCard => card.flip(),
                    Action::NextCard => card.next(len),
                    _ => card.prev(len),
                }
            }
            Action::SelectOption { index } => {
                let Mode::Quiz(quiz) = &mut self.mode else {
                    return Err(invalid(&action));
                };
                let correct = quiz.select(index)?;
                let correct_index = quiz.question().and_then(|q| q.correct_index());
                self.progress
                    .update(|progress| progress.stats.record_answer(correct, today));
                return Ok(Outcome::QuizAnswered {
                    correct,
                    correct_index,
                    auto_advance: self.ticket(),
                });
            }
            Action::Reveal => {
                let Mode::Review(review) = &mut self.mode else {
                    return Err(invalid(&action));
                };
                review.reveal()?;
            }
            Action::Grade { remembered } => {
                let Mode::Review(review) = &mut self.mode else {
                    return Err(invalid(&action));
                };
                let grade = self.progress.try_update(|progress| {
                    let grade = review.grade(remembered, &mut progress.mastery)?;
                    progress.stats.record_answer(remembered, today);
                    Ok::<_, SessionError>(grade)
                })?;
                if grade.change.newly_mastered {
                    tracing::info!(profile = self.progress.profile(), "word mastered");
                }
                return Ok(Outcome::ReviewGraded {
                    grade,
                    auto_advance: self.ticket(),
                });
            }
            Action::Advance => match &mut self.mode {
                Mode::Quiz(quiz) => {
                    quiz.advance(&mut self.rng)?;
                }
                Mode::Review(review) => {
                    review.advance()?;
                }
                _ => return Err(invalid(&action)),
            },
            Action::Restart => {
                let (quiz_done, review_done) = match &self.mode {
                    Mode::Quiz(quiz) => (quiz.is_finished(), false),
                    Mode::Review(review) => (false, review.is_finished()),
                    _ => (false, false),
                };
                if quiz_done {
                    self.start_quiz()?;
                } else if review_done {
                    self.start_review()?;
                } else {
                    return Err(invalid(&action));
                }
            }
            Action::Reload(payload) => {
                self.list = payload.vocab_list;
                self.levels = payload.levels;
                let len = self.filtered_len();
                if let Mode::Flashcard(card) = &mut self.mode {
                    card.clamp(len);
                } else {
                    self.mode = Mode::List;
                }
            }
            Action::ConfirmLeave | Action::CancelLeave => return Err(SessionError::NothingPending),
        }

        Ok(Outcome::Updated)
    }

    fn start_quiz(&mut self) -> Result<(), SessionError> {
        let filtered = self.filtered();
        let quiz = QuizState::start(&mut self.rng, &filtered, self.quiz_length)?;
        tracing::debug!(questions = quiz.batch_len(), "quiz started");
        self.mode = Mode::Quiz(quiz);
        Ok(())
    }

    fn start_review(&mut self) -> Result<(), SessionError> {
        let filtered = self.filtered();
        let review = {
            let progress = self.progress.lock();
            ReviewState::start(&mut self.rng, &filtered, &progress.mastery)?
        };
        tracing::debug!(items = review.pool_len(), "review started");
        self.mode = Mode::Review(review);
        Ok(())
    }

    fn ticket(&self) -> AdvanceTicket {
        AdvanceTicket {
            generation: self.generation,
        }
    }
}

impl<R> SessionView<R> {
    pub fn filtered(&self) -> Vec<VocabEntry> {
        self.filter.apply(&self.list).cloned().collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filter.apply(&self.list).count()
    }

    pub fn can_start_quiz(&self) -> bool {
        distinct_headwords(&self.filtered()) >= OPTIONS_PER_QUESTION
    }

    pub fn can_start_review(&self) -> bool {
        self.filtered_len() > 0
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn list(&self) -> &[VocabEntry] {
        &self.list
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn quiz_length(&self) -> usize {
        self.quiz_length
    }

    pub fn pending_leave(&self) -> Option<&Action> {
        self.pending_leave.as_ref()
    }

    pub fn progress(&self) -> &ProgressHandle {
        &self.progress
    }

    pub fn profile(&self) -> &str {
        self.progress.profile()
    }
}
