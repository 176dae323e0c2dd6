use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Study,
    Break,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Break => "break",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "break" => Self::Break,
            _ => Self::Study,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Study => "Study",
            Self::Break => "Break",
        }
    }
}

/// One timed interval in a session plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub duration_minutes: u64,
}

impl ScheduleBlock {
    pub fn new(block_type: BlockType, duration_minutes: u64) -> Self {
        Self {
            block_type,
            duration_minutes,
        }
    }

    pub fn study(duration_minutes: u64) -> Self {
        Self::new(BlockType::Study, duration_minutes)
    }

    pub fn pause(duration_minutes: u64) -> Self {
        Self::new(BlockType::Break, duration_minutes)
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_minutes * 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    pub blocks: Vec<ScheduleBlock>,
}

impl Schedule {
    pub fn new(name: impl Into<String>, blocks: Vec<ScheduleBlock>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.blocks.iter().map(|b| b.duration_minutes).sum()
    }
}

/// Record of a block that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub scheduled_minutes: u64,
    pub actual_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

/// What a finished session produced, before it is folded into the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub schedule_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_study_seconds: u64,
    pub blocks: Vec<CompletedBlock>,
}

/// Persisted session record, appended to `user.session_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub schedule_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_study_seconds: u64,
    pub blocks_completed: u32,
}

impl SessionSummary {
    pub fn from_outcome(outcome: &SessionOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            schedule_name: outcome.schedule_name.clone(),
            started_at: outcome.started_at,
            ended_at: outcome.ended_at,
            total_study_seconds: outcome.total_study_seconds,
            blocks_completed: outcome.blocks.len() as u32,
        }
    }
}

/// Point-in-time view of the running session, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub active: bool,
    pub paused: bool,
    pub awaiting_confirmation: bool,
    pub block_index: usize,
    pub total_blocks: usize,
    pub block_type: Option<BlockType>,
    pub remaining_seconds: u64,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            active: false,
            paused: false,
            awaiting_confirmation: false,
            block_index: 0,
            total_blocks: 0,
            block_type: None,
            remaining_seconds: 0,
        }
    }

    pub fn describe(&self) -> String {
        if !self.active {
            return "Session inactive".to_string();
        }
        let mins = self.remaining_seconds / 60;
        let secs = self.remaining_seconds % 60;
        let kind = self
            .block_type
            .map(|b| b.display_name())
            .unwrap_or("Study");
        if self.awaiting_confirmation {
            format!("Next {kind} block in: {mins:02}:{secs:02}")
        } else if self.paused {
            format!("{kind} paused: {mins:02}:{secs:02} remaining")
        } else {
            format!("{kind}: {mins:02}:{secs:02} remaining")
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot start a session without schedule blocks")]
    EmptySchedule,
    #[error("a session is already active")]
    AlreadyActive,
    #[error("no active session")]
    NotActive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_parse_defaults_to_study() {
        assert_eq!(BlockType::parse("BREAK"), BlockType::Break);
        assert_eq!(BlockType::parse("study"), BlockType::Study);
        assert_eq!(BlockType::parse("nonsense"), BlockType::Study);
    }

    #[test]
    fn test_schedule_total_minutes() {
        let schedule = Schedule::new(
            "Pomodoro",
            vec![ScheduleBlock::study(25), ScheduleBlock::pause(5)],
        );
        assert_eq!(schedule.total_minutes(), 30);
    }

    #[test]
    fn test_status_describe_formats() {
        let mut status = SessionStatus::idle();
        assert_eq!(status.describe(), "Session inactive");

        status.active = true;
        status.block_type = Some(BlockType::Study);
        status.remaining_seconds = 599;
        assert_eq!(status.describe(), "Study: 09:59 remaining");

        status.awaiting_confirmation = true;
        status.block_type = Some(BlockType::Break);
        status.remaining_seconds = 300;
        assert_eq!(status.describe(), "Next Break block in: 05:00");
    }
}
