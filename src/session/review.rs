use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::mastery::{MasteryChange, MasteryMap};
use super::SessionError;
use crate::services::vocab::VocabEntry;

pub const REVIEW_POOL_SIZE: usize = 15;

/// Up to [`REVIEW_POOL_SIZE`] unmastered entries. When fewer than that many are still
/// unmastered, the head of the filtered list is used instead. Order is shuffled.
pub fn build_pool<R>(rng: &mut R, filtered: &[VocabEntry], mastery: &MasteryMap) -> Vec<VocabEntry>
where
    R: Rng + ?Sized,
{
    let due: Vec<&VocabEntry> = filtered
        .iter()
        .filter(|e| !mastery.is_mastered(&e.headword))
        .collect();

    let mut pool: Vec<VocabEntry> = if due.len() >= REVIEW_POOL_SIZE {
        due.into_iter().take(REVIEW_POOL_SIZE).cloned().collect()
    } else {
        filtered.iter().take(REVIEW_POOL_SIZE).cloned().collect()
    };
    pool.shuffle(rng);
    pool
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewGrade {
    pub remembered: bool,
    pub change: MasteryChange,
}

#[derive(Debug, Clone)]
pub struct ReviewState {
    pool: Vec<VocabEntry>,
    index: usize,
    revealed: bool,
    grade: Option<ReviewGrade>,
    remembered: usize,
    answered: usize,
}

impl ReviewState {
    pub fn start<R>(rng: &mut R, filtered: &[VocabEntry], mastery: &MasteryMap) -> Result<Self, SessionError>
    where
        R: Rng + ?Sized,
    {
        if filtered.is_empty() {
            return Err(SessionError::NotEnoughItems {
                needed: 1,
                available: 0,
            });
        }

        Ok(Self {
            pool: build_pool(rng, filtered, mastery),
            index: 0,
            revealed: false,
            grade: None,
            remembered: 0,
            answered: 0,
        })
    }

    pub fn current(&self) -> Option<&VocabEntry> {
        self.pool.get(self.index)
    }

    pub fn reveal(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::InvalidAction {
                action: "reveal",
                mode: "finished review",
            });
        }
        self.revealed = true;
        Ok(())
    }

    pub fn grade(&mut self, remembered: bool, mastery: &mut MasteryMap) -> Result<ReviewGrade, SessionError> {
        if self.grade.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let headword = match self.current() {
            Some(entry) => entry.headword.clone(),
            None => {
                return Err(SessionError::InvalidAction {
                    action: "grade",
                    mode: "finished review",
                })
            }
        };

        let change = mastery.record(&headword, remembered);
        let grade = ReviewGrade { remembered, change };
        self.grade = Some(grade);
        self.revealed = true;
        self.answered += 1;
        if remembered {
            self.remembered += 1;
        }
        Ok(grade)
    }

    /// Moves past a graded item. Returns `true` once the pool is exhausted.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        if self.is_finished() {
            return Ok(true);
        }
        if self.grade.is_none() {
            return Err(SessionError::InvalidAction {
                action: "advance",
                mode: "ungraded review item",
            });
        }

        self.index += 1;
        self.revealed = false;
        self.grade = None;
        Ok(self.is_finished())
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.pool.len()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn last_grade(&self) -> Option<ReviewGrade> {
        self.grade
    }

    pub fn is_awaiting_advance(&self) -> bool {
        self.grade.is_some() && !self.is_finished()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn remembered(&self) -> usize {
        self.remembered
    }

    pub fn in_progress(&self) -> bool {
        self.answered > 0 && !self.is_finished()
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.pool.is_empty() {
            return 0.0;
        }
        self.answered as f64 / self.pool.len() as f64
    }
}
