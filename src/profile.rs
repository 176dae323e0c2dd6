//! User study statistics and progression.
//!
//! Tracks cumulative study time, answer counts, day-granularity streaks,
//! experience/levels and append-only achievements. Everything here is plain
//! data persisted under the `user` key of the save document; callers pass
//! `today` explicitly so streak logic stays deterministic under test.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::session::types::{SessionOutcome, SessionSummary};

/// Experience awarded per minute of study.
const XP_PER_STUDY_MINUTE: u64 = 2;
/// Experience awarded per correctly answered question.
const XP_PER_CORRECT_ANSWER: u64 = 10;
/// Experience required per level.
const XP_PER_LEVEL: u64 = 100;

/// Streak lengths that unlock an achievement.
const STREAK_MILESTONES: [u32; 3] = [7, 30, 100];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub study_minutes: u64,
    pub questions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    /// Cumulative study time in minutes.
    pub total_study_time: u64,
    pub total_questions_answered: u64,
    pub correct_answers: u64,
    pub study_sessions: u64,
    pub streak_days: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    pub level: u32,
    pub experience: u64,
    pub achievements: Vec<String>,
    pub daily_stats: BTreeMap<String, DayStats>,
    pub session_history: Vec<SessionSummary>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new("Player")
    }
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            total_study_time: 0,
            total_questions_answered: 0,
            correct_answers: 0,
            study_sessions: 0,
            streak_days: 0,
            longest_streak: 0,
            last_study_date: None,
            level: 1,
            experience: 0,
            achievements: Vec::new(),
            daily_stats: BTreeMap::new(),
            session_history: Vec::new(),
        }
    }

    /// Add study time and update session count, daily stats, streak and XP.
    pub fn add_study_time(&mut self, minutes: u64, today: NaiveDate) {
        self.total_study_time += minutes;
        self.study_sessions += 1;
        self.day_entry(today).study_minutes += minutes;
        self.update_streak(today);
        self.add_experience(minutes * XP_PER_STUDY_MINUTE);
    }

    pub fn add_questions_answered(&mut self, count: u64, correct: u64, today: NaiveDate) {
        let correct = correct.min(count);
        self.total_questions_answered += count;
        self.correct_answers += correct;
        self.day_entry(today).questions += count;
        self.add_experience(correct * XP_PER_CORRECT_ANSWER);
    }

    pub fn add_experience(&mut self, amount: u64) {
        self.experience += amount;
        let new_level = (self.experience / XP_PER_LEVEL) as u32 + 1;
        if new_level > self.level {
            self.level = new_level;
            self.add_achievement(format!("Reached Level {}", self.level));
        }
    }

    /// Append-only, de-duplicated by name.
    pub fn add_achievement(&mut self, achievement: impl Into<String>) {
        let achievement = achievement.into();
        if !self.achievements.contains(&achievement) {
            self.achievements.push(achievement);
        }
    }

    /// Flush a finished session: minutes into the accumulators, one summary
    /// appended to the history.
    pub fn record_session(&mut self, outcome: &SessionOutcome, today: NaiveDate) {
        let minutes = outcome.total_study_seconds / 60;
        self.add_study_time(minutes, today);
        self.session_history.push(SessionSummary::from_outcome(outcome));
    }

    fn update_streak(&mut self, today: NaiveDate) {
        match self.last_study_date {
            None => {
                self.streak_days = 1;
                self.last_study_date = Some(today);
            }
            Some(last) => {
                let gap = (today - last).num_days();
                if gap == 1 {
                    self.streak_days += 1;
                    self.last_study_date = Some(today);
                } else if gap != 0 {
                    self.streak_days = 1;
                    self.last_study_date = Some(today);
                }
            }
        }

        self.longest_streak = self.longest_streak.max(self.streak_days);

        if STREAK_MILESTONES.contains(&self.streak_days) {
            self.add_achievement(format!("{}-Day Study Streak", self.streak_days));
        }
    }

    pub fn accuracy_percentage(&self) -> f64 {
        if self.total_questions_answered == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_questions_answered as f64 * 100.0
    }

    pub fn average_session_minutes(&self) -> f64 {
        if self.study_sessions == 0 {
            return 0.0;
        }
        self.total_study_time as f64 / self.study_sessions as f64
    }

    pub fn today_stats(&self, today: NaiveDate) -> DayStats {
        self.daily_stats
            .get(&day_key(today))
            .cloned()
            .unwrap_or_default()
    }

    /// Aggregate stats over the last seven days, `today` included.
    pub fn week_stats(&self, today: NaiveDate) -> DayStats {
        let mut totals = DayStats::default();
        for days_back in 0..7 {
            if let Some(date) = today.checked_sub_days(Days::new(days_back)) {
                if let Some(stats) = self.daily_stats.get(&day_key(date)) {
                    totals.study_minutes += stats.study_minutes;
                    totals.questions += stats.questions;
                }
            }
        }
        totals
    }

    fn day_entry(&mut self, date: NaiveDate) -> &mut DayStats {
        self.daily_stats.entry(day_key(date)).or_default()
    }
}

fn day_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}
