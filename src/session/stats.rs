use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const XP_PER_LEVEL: u32 = 100;
pub const XP_CORRECT_ANSWER: u32 = 10;
pub const DEFAULT_DAILY_GOAL: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub xp: u32,
    pub level: u32,
    pub streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub daily_goal: u32,
    pub today_count: u32,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            last_active_date: None,
            daily_goal: DEFAULT_DAILY_GOAL,
            today_count: 0,
        }
    }
}

pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

impl SessionStats {
    /// Applies one graded answer on `today`.
    pub fn record_answer(&mut self, correct: bool, today: NaiveDate) {
        match self.last_active_date {
            Some(last) if last == today => {}
            Some(last) if last.succ_opt() == Some(today) => {
                self.streak = self.streak.saturating_add(1);
                self.today_count = 0;
            }
            _ => {
                self.streak = 1;
                self.today_count = 0;
            }
        }
        self.last_active_date = Some(today);
        self.today_count = self.today_count.saturating_add(1);

        if correct {
            self.xp = self.xp.saturating_add(XP_CORRECT_ANSWER);
        }
        self.level = level_for_xp(self.xp);
    }

    /// Streak as of `today`; a missed day means it is already broken.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        match self.last_active_date {
            Some(last) if last == today || last.succ_opt() == Some(today) => self.streak,
            _ => 0,
        }
    }

    pub fn answers_today(&self, today: NaiveDate) -> u32 {
        if self.last_active_date == Some(today) {
            self.today_count
        } else {
            0
        }
    }

    pub fn daily_goal_ratio(&self, today: NaiveDate) -> f64 {
        if self.daily_goal == 0 {
            return 1.0;
        }
        (self.answers_today(today) as f64 / self.daily_goal as f64).min(1.0)
    }

    pub fn xp_into_level(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }
}
