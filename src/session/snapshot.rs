use chrono::NaiveDate;
use serde::Serialize;

use super::quiz::QuizOption;
use super::review::ReviewGrade;
use super::view::{Action, Mode, SessionView};
use super::LevelFilter;

/// Everything a client needs to render the current screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub profile: String,
    pub mode: &'static str,
    pub filter: LevelFilter,
    pub levels: Vec<String>,
    pub total_count: usize,
    pub filtered_count: usize,
    pub mastered_count: usize,
    pub quiz_length: usize,
    pub can_start_quiz: bool,
    pub can_start_review: bool,
    pub pending_leave: Option<Action>,
    pub stats: StatsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<ListItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcard: Option<FlashcardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub xp: u32,
    pub level: u32,
    pub xp_into_level: u32,
    pub streak: u32,
    pub today_count: u32,
    pub daily_goal: u32,
    pub daily_goal_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub headword: String,
    pub reading: String,
    pub translation: String,
    pub level: String,
    pub mastery: i32,
    pub mastered: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardView {
    pub position: usize,
    pub total: usize,
    pub show_answer: bool,
    pub headword: Option<String>,
    pub reading: Option<String>,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub position: usize,
    pub batch_len: usize,
    pub correct: usize,
    pub total: usize,
    pub progress_ratio: f64,
    pub finished: bool,
    pub question: Option<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub headword: String,
    pub reading: String,
    pub options: Vec<QuizOption>,
    pub selected: Option<usize>,
    /// Only revealed once an option has been chosen.
    pub correct_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub position: usize,
    pub pool_len: usize,
    pub answered: usize,
    pub remembered: usize,
    pub progress_ratio: f64,
    pub finished: bool,
    pub card: Option<ReviewCard>,
    pub last_grade: Option<ReviewGrade>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub headword: String,
    pub level: String,
    pub mastery: i32,
    pub reading: Option<String>,
    pub translation: Option<String>,
}

impl<R> SessionView<R> {
    pub fn snapshot(&self, today: NaiveDate) -> SessionSnapshot {
        let filtered = self.filtered();
        let progress = self.progress().lock();
        let mastery = &progress.mastery;
        let stats = &progress.stats;

        let mut snapshot = SessionSnapshot {
            profile: self.profile().to_string(),
            mode: self.mode().name(),
            filter: self.filter().clone(),
            levels: self.levels().to_vec(),
            total_count: self.list().len(),
            filtered_count: filtered.len(),
            mastered_count: mastery.mastered_in(&filtered).len(),
            quiz_length: self.quiz_length(),
            can_start_quiz: self.can_start_quiz(),
            can_start_review: self.can_start_review(),
            pending_leave: self.pending_leave().cloned(),
            stats: StatsView {
                xp: stats.xp,
                level: stats.level,
                xp_into_level: stats.xp_into_level(),
                streak: stats.current_streak(today),
                today_count: stats.answers_today(today),
                daily_goal: stats.daily_goal,
                daily_goal_ratio: stats.daily_goal_ratio(today),
            },
            list: None,
            flashcard: None,
            quiz: None,
            review: None,
        };

        match self.mode() {
            Mode::List => {
                snapshot.list = Some(
                    filtered
                        .iter()
                        .map(|e| ListItem {
                            headword: e.headword.clone(),
                            reading: e.reading.clone(),
                            translation: e.translation.clone(),
                            level: e.level.clone(),
                            mastery: mastery.count(&e.headword),
                            mastered: mastery.is_mastered(&e.headword),
                        })
                        .collect(),
                );
            }
            Mode::Flashcard(card) => {
                let current = filtered.get(card.index);
                let answer = current.filter(|_| card.show_answer);
                snapshot.flashcard = Some(FlashcardView {
                    position: if current.is_some() { card.index + 1 } else { 0 },
                    total: filtered.len(),
                    show_answer: card.show_answer,
                    headword: current.map(|e| e.headword.clone()),
                    reading: answer.map(|e| e.reading.clone()),
                    translation: answer.map(|e| e.translation.clone()),
                });
            }
            Mode::Quiz(quiz) => {
                let question = quiz.question().map(|q| QuestionView {
                    headword: q.prompt.headword.clone(),
                    reading: q.prompt.reading.clone(),
                    options: q.options.clone(),
                    selected: q.selected,
                    correct_index: q.selected.and_then(|_| q.correct_index()),
                });
                snapshot.quiz = Some(QuizView {
                    position: (quiz.position() + 1).min(quiz.batch_len()),
                    batch_len: quiz.batch_len(),
                    correct: quiz.correct(),
                    total: quiz.total(),
                    progress_ratio: quiz.progress_ratio(),
                    finished: quiz.is_finished(),
                    question,
                });
            }
            Mode::Review(review) => {
                let revealed = review.is_revealed();
                let card = review.current().map(|e| ReviewCard {
                    headword: e.headword.clone(),
                    level: e.level.clone(),
                    mastery: mastery.count(&e.headword),
                    reading: revealed.then(|| e.reading.clone()),
                    translation: revealed.then(|| e.translation.clone()),
                });
                snapshot.review = Some(ReviewView {
                    position: (review.position() + 1).min(review.pool_len()),
                    pool_len: review.pool_len(),
                    answered: review.answered(),
                    remembered: review.remembered(),
                    progress_ratio: review.progress_ratio(),
                    finished: review.is_finished(),
                    card,
                    last_grade: review.last_grade(),
                });
            }
        }

        snapshot
    }
}
