use std::collections::HashSet;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::Serialize;

use super::SessionError;
use crate::services::vocab::VocabEntry;

pub const QUIZ_LENGTHS: [usize; 4] = [5, 10, 15, 20];
pub const DEFAULT_QUIZ_LENGTH: usize = 10;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub display_form: String,
    pub answer_form: String,
}

impl QuizOption {
    fn for_entry(entry: &VocabEntry) -> Self {
        Self {
            display_form: entry.translation.clone(),
            answer_form: entry.headword.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: VocabEntry,
    pub options: Vec<QuizOption>,
    pub selected: Option<usize>,
}

impl QuizQuestion {
    pub fn correct_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|o| o.answer_form == self.prompt.headword)
    }
}

pub fn distinct_headwords(entries: &[VocabEntry]) -> usize {
    entries
        .iter()
        .map(|e| e.headword.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// The correct option plus up to three distractors with other headwords, shuffled.
pub fn build_options<R>(rng: &mut R, correct: &VocabEntry, pool: &[VocabEntry]) -> Vec<QuizOption>
where
    R: Rng + ?Sized,
{
    let mut seen = HashSet::new();
    seen.insert(correct.headword.as_str());
    let candidates: Vec<&VocabEntry> = pool
        .iter()
        .filter(|e| seen.insert(e.headword.as_str()))
        .collect();

    let mut options: Vec<QuizOption> = candidates
        .choose_multiple(rng, OPTIONS_PER_QUESTION - 1)
        .map(|e| QuizOption::for_entry(e))
        .collect();
    options.push(QuizOption::for_entry(correct));
    options.shuffle(rng);
    options
}

#[derive(Debug, Clone)]
pub struct QuizState {
    pool: Vec<VocabEntry>,
    batch_len: usize,
    batch: Vec<VocabEntry>,
    index: usize,
    question: Option<QuizQuestion>,
    correct: usize,
    total: usize,
}

impl QuizState {
    pub fn start<R>(rng: &mut R, filtered: &[VocabEntry], length: usize) -> Result<Self, SessionError>
    where
        R: Rng + ?Sized,
    {
        let available = distinct_headwords(filtered);
        if available < OPTIONS_PER_QUESTION {
            return Err(SessionError::NotEnoughItems {
                needed: OPTIONS_PER_QUESTION,
                available,
            });
        }

        let mut batch = filtered.to_vec();
        batch.shuffle(rng);
        batch.truncate(length.min(filtered.len()));

        let mut state = Self {
            pool: filtered.to_vec(),
            batch_len: batch.len(),
            batch,
            index: 0,
            question: None,
            correct: 0,
            total: 0,
        };
        state.question = Some(state.make_question(rng, 0));
        Ok(state)
    }

    fn make_question<R: Rng + ?Sized>(&self, rng: &mut R, index: usize) -> QuizQuestion {
        let prompt = self.batch[index].clone();
        let options = build_options(rng, &prompt, &self.pool);
        QuizQuestion {
            prompt,
            options,
            selected: None,
        }
    }

    /// Records a choice. Returns whether it was correct.
    pub fn select(&mut self, index: usize) -> Result<bool, SessionError> {
        let question = self
            .question
            .as_mut()
            .ok_or(SessionError::InvalidAction {
                action: "selectOption",
                mode: "finished quiz",
            })?;
        if question.selected.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let option = question
            .options
            .get(index)
            .ok_or(SessionError::OptionOutOfRange {
                index,
                len: question.options.len(),
            })?;

        let is_correct = option.answer_form == question.prompt.headword;
        question.selected = Some(index);
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
        Ok(is_correct)
    }

    /// Moves past an answered question. Returns `true` once the batch is exhausted.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool, SessionError> {
        match &self.question {
            Some(q) if q.selected.is_some() => {}
            Some(_) => {
                return Err(SessionError::InvalidAction {
                    action: "advance",
                    mode: "unanswered quiz question",
                })
            }
            None => return Ok(true),
        }

        self.index += 1;
        if self.index >= self.batch.len() {
            self.question = None;
            return Ok(true);
        }
        self.question = Some(self.make_question(rng, self.index));
        Ok(false)
    }

    pub fn question(&self) -> Option<&QuizQuestion> {
        self.question.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.question.is_none()
    }

    pub fn is_awaiting_advance(&self) -> bool {
        self.question
            .as_ref()
            .is_some_and(|q| q.selected.is_some())
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    pub fn in_progress(&self) -> bool {
        self.total > 0 && !self.is_finished()
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.batch_len == 0 {
            return 0.0;
        }
        self.total as f64 / self.batch_len as f64
    }
}
