//! Pure session state machine.
//!
//! Every transition takes `now` explicitly (a [`tokio::time::Instant`], so
//! paused-clock tests control it), which keeps this module free of timers.
//! The async shell that actually ticks it lives in [`super::driver`].

use std::mem;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::types::{
    BlockType, CompletedBlock, Schedule, SessionError, SessionOutcome, SessionStatus,
};

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    InBlock {
        index: usize,
        started_at: Instant,
    },
    AwaitingConfirmation {
        next_index: usize,
        deadline: Instant,
    },
}

/// What a single tick observed or caused.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionTick {
    Idle,
    Running {
        block_type: BlockType,
        remaining: Duration,
        paused: bool,
    },
    BlockCompleted {
        block_type: BlockType,
        actual: Duration,
    },
    AwaitingConfirmation {
        next_block: BlockType,
        remaining: Duration,
    },
    SessionEnded(SessionOutcome),
}

pub struct SessionRuntime {
    phase: Phase,
    schedule: Option<Schedule>,
    confirmation_window: Duration,
    started_wall: Option<DateTime<Utc>>,
    paused_at: Option<Instant>,
    study_time: Duration,
    completed: Vec<CompletedBlock>,
}

impl SessionRuntime {
    pub fn new(confirmation_window: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            schedule: None,
            confirmation_window,
            started_wall: None,
            paused_at: None,
            study_time: Duration::ZERO,
            completed: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn start(&mut self, schedule: Schedule, now: Instant) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        if schedule.blocks.is_empty() {
            return Err(SessionError::EmptySchedule);
        }
        self.schedule = Some(schedule);
        self.started_wall = Some(Utc::now());
        self.paused_at = None;
        self.study_time = Duration::ZERO;
        self.completed.clear();
        self.phase = Phase::InBlock {
            index: 0,
            started_at: now,
        };
        Ok(())
    }

    /// Advance the clock. Completes the current block when its time is up,
    /// auto-ends the session when the confirmation window expires, and ends
    /// it when the schedule is exhausted.
    pub fn tick(&mut self, now: Instant) -> SessionTick {
        match self.phase {
            Phase::Idle => SessionTick::Idle,
            Phase::InBlock { index, started_at } => {
                let block = match self.block_at(index) {
                    Some(block) => block,
                    None => return self.finish(),
                };
                let duration = Duration::from_secs(block.duration_seconds());
                // While paused the elapsed time is frozen at the pause point.
                let effective_now = self.paused_at.unwrap_or(now);
                let elapsed = effective_now.duration_since(started_at);

                if self.paused_at.is_none() && elapsed >= duration {
                    return self.complete_block(now);
                }

                SessionTick::Running {
                    block_type: block.block_type,
                    remaining: duration.saturating_sub(elapsed),
                    paused: self.paused_at.is_some(),
                }
            }
            Phase::AwaitingConfirmation {
                next_index,
                deadline,
            } => {
                if now >= deadline {
                    return self.finish();
                }
                let next_block = match self.block_at(next_index) {
                    Some(block) => block.block_type,
                    None => return self.finish(),
                };
                SessionTick::AwaitingConfirmation {
                    next_block,
                    remaining: deadline.duration_since(now),
                }
            }
        }
    }

    /// User accepted the next block within the confirmation window.
    pub fn confirm_next_block(&mut self, now: Instant) -> bool {
        if let Phase::AwaitingConfirmation { next_index, .. } = self.phase {
            if self.block_at(next_index).is_none() {
                self.finish();
                return false;
            }
            self.phase = Phase::InBlock {
                index: next_index,
                started_at: now,
            };
            true
        } else {
            false
        }
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if !self.is_active() || self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Shift the block's recorded start forward by the paused duration so
    /// the remaining time is unaffected by the pause.
    pub fn resume(&mut self, now: Instant) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        if !self.is_active() {
            return false;
        }
        let paused_for = now.duration_since(paused_at);
        if let Phase::InBlock { started_at, .. } = &mut self.phase {
            *started_at = *started_at + paused_for;
        }
        true
    }

    /// Explicit end. Returns the outcome when a session was actually running.
    pub fn end(&mut self) -> Option<SessionOutcome> {
        if !self.is_active() {
            return None;
        }
        match self.finish() {
            SessionTick::SessionEnded(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn status(&self, now: Instant) -> SessionStatus {
        let total_blocks = self
            .schedule
            .as_ref()
            .map(|s| s.blocks.len())
            .unwrap_or(0);
        match self.phase {
            Phase::Idle => SessionStatus::idle(),
            Phase::InBlock { index, started_at } => {
                let block = self.block_at(index);
                let duration = block
                    .map(|b| Duration::from_secs(b.duration_seconds()))
                    .unwrap_or(Duration::ZERO);
                let effective_now = self.paused_at.unwrap_or(now);
                let remaining = duration.saturating_sub(effective_now.duration_since(started_at));
                SessionStatus {
                    active: true,
                    paused: self.paused_at.is_some(),
                    awaiting_confirmation: false,
                    block_index: index,
                    total_blocks,
                    block_type: block.map(|b| b.block_type),
                    remaining_seconds: remaining.as_secs(),
                }
            }
            Phase::AwaitingConfirmation {
                next_index,
                deadline,
            } => SessionStatus {
                active: true,
                paused: self.paused_at.is_some(),
                awaiting_confirmation: true,
                block_index: next_index,
                total_blocks,
                block_type: self.block_at(next_index).map(|b| b.block_type),
                remaining_seconds: deadline.saturating_duration_since(now).as_secs(),
            },
        }
    }

    fn block_at(&self, index: usize) -> Option<super::types::ScheduleBlock> {
        self.schedule
            .as_ref()
            .and_then(|s| s.blocks.get(index))
            .copied()
    }

    fn complete_block(&mut self, now: Instant) -> SessionTick {
        let Phase::InBlock { index, started_at } = self.phase else {
            return SessionTick::Idle;
        };
        let Some(block) = self.block_at(index) else {
            return self.finish();
        };

        let actual = now.duration_since(started_at);
        if block.block_type == BlockType::Study {
            self.study_time += actual;
        }
        self.completed.push(CompletedBlock {
            block_type: block.block_type,
            scheduled_minutes: block.duration_minutes,
            actual_seconds: actual.as_secs(),
            completed_at: Utc::now(),
        });

        let next_index = index + 1;
        let schedule_len = self.schedule.as_ref().map(|s| s.blocks.len()).unwrap_or(0);
        if next_index >= schedule_len {
            return self.finish();
        }

        self.phase = Phase::AwaitingConfirmation {
            next_index,
            deadline: now + self.confirmation_window,
        };
        SessionTick::BlockCompleted {
            block_type: block.block_type,
            actual,
        }
    }

    /// Build the outcome and reset every runtime field to inactive defaults.
    fn finish(&mut self) -> SessionTick {
        let schedule_name = self
            .schedule
            .take()
            .map(|s| s.name)
            .unwrap_or_else(|| "Custom".to_string());
        let outcome = SessionOutcome {
            schedule_name,
            started_at: self.started_wall.take().unwrap_or_else(Utc::now),
            ended_at: Utc::now(),
            total_study_seconds: self.study_time.as_secs(),
            blocks: mem::take(&mut self.completed),
        };
        self.phase = Phase::Idle;
        self.paused_at = None;
        self.study_time = Duration::ZERO;
        SessionTick::SessionEnded(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::ScheduleBlock;

    const WINDOW: Duration = Duration::from_secs(300);

    fn schedule(blocks: Vec<ScheduleBlock>) -> Schedule {
        Schedule::new("Test", blocks)
    }

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn test_start_rejects_empty_schedule() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let err = runtime.start(schedule(vec![]), Instant::now()).unwrap_err();
        assert!(matches!(err, SessionError::EmptySchedule));
        assert!(!runtime.is_active());
    }

    #[test]
    fn test_start_rejects_double_start() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(schedule(vec![ScheduleBlock::study(10)]), t0)
            .unwrap();
        let err = runtime
            .start(schedule(vec![ScheduleBlock::study(5)]), t0)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive));
    }

    #[test]
    fn test_block_runs_then_awaits_confirmation() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(
                schedule(vec![ScheduleBlock::study(10), ScheduleBlock::pause(5)]),
                t0,
            )
            .unwrap();

        match runtime.tick(t0 + secs(1)) {
            SessionTick::Running {
                block_type,
                remaining,
                paused,
            } => {
                assert_eq!(block_type, BlockType::Study);
                assert_eq!(remaining, secs(599));
                assert!(!paused);
            }
            other => panic!("unexpected tick: {other:?}"),
        }

        match runtime.tick(t0 + secs(600)) {
            SessionTick::BlockCompleted { block_type, actual } => {
                assert_eq!(block_type, BlockType::Study);
                assert_eq!(actual, secs(600));
            }
            other => panic!("unexpected tick: {other:?}"),
        }

        match runtime.tick(t0 + secs(601)) {
            SessionTick::AwaitingConfirmation {
                next_block,
                remaining,
            } => {
                assert_eq!(next_block, BlockType::Break);
                assert_eq!(remaining, secs(299));
            }
            other => panic!("unexpected tick: {other:?}"),
        }
    }

    #[test]
    fn test_full_session_accounts_study_time_exactly() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(
                schedule(vec![ScheduleBlock::study(10), ScheduleBlock::pause(5)]),
                t0,
            )
            .unwrap();

        assert!(matches!(
            runtime.tick(t0 + secs(600)),
            SessionTick::BlockCompleted { .. }
        ));
        assert!(runtime.confirm_next_block(t0 + secs(610)));

        match runtime.tick(t0 + secs(610 + 300)) {
            SessionTick::SessionEnded(outcome) => {
                assert_eq!(outcome.total_study_seconds, 600);
                assert_eq!(outcome.blocks.len(), 2);
                assert_eq!(outcome.blocks[0].block_type, BlockType::Study);
                assert_eq!(outcome.blocks[1].block_type, BlockType::Break);
                assert_eq!(outcome.schedule_name, "Test");
            }
            other => panic!("unexpected tick: {other:?}"),
        }
        assert!(!runtime.is_active());
        assert_eq!(runtime.tick(t0 + secs(2000)), SessionTick::Idle);
    }

    #[test]
    fn test_confirmation_timeout_auto_ends_session() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(
                schedule(vec![ScheduleBlock::study(1), ScheduleBlock::study(1)]),
                t0,
            )
            .unwrap();

        assert!(matches!(
            runtime.tick(t0 + secs(60)),
            SessionTick::BlockCompleted { .. }
        ));

        // Window still open just before the deadline.
        assert!(matches!(
            runtime.tick(t0 + secs(60) + WINDOW - secs(1)),
            SessionTick::AwaitingConfirmation { .. }
        ));

        match runtime.tick(t0 + secs(60) + WINDOW) {
            SessionTick::SessionEnded(outcome) => {
                assert_eq!(outcome.total_study_seconds, 60);
                assert_eq!(outcome.blocks.len(), 1);
            }
            other => panic!("unexpected tick: {other:?}"),
        }
    }

    #[test]
    fn test_pause_freezes_remaining_and_resume_shifts_start() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(schedule(vec![ScheduleBlock::study(10)]), t0)
            .unwrap();

        assert!(runtime.pause(t0 + secs(60)));
        assert!(!runtime.pause(t0 + secs(61)));

        // Remaining is frozen at the pause point, even far in the future.
        match runtime.tick(t0 + secs(5000)) {
            SessionTick::Running {
                remaining, paused, ..
            } => {
                assert_eq!(remaining, secs(540));
                assert!(paused);
            }
            other => panic!("unexpected tick: {other:?}"),
        }

        assert!(runtime.resume(t0 + secs(120)));

        // One minute of study elapsed before the pause; the block now ends
        // a full pause-length later.
        match runtime.tick(t0 + secs(659)) {
            SessionTick::Running { remaining, .. } => assert_eq!(remaining, secs(1)),
            other => panic!("unexpected tick: {other:?}"),
        }
        match runtime.tick(t0 + secs(660)) {
            SessionTick::SessionEnded(outcome) => {
                assert_eq!(outcome.total_study_seconds, 600);
            }
            other => panic!("unexpected tick: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_end_skips_partial_block() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        runtime
            .start(
                schedule(vec![ScheduleBlock::study(1), ScheduleBlock::study(10)]),
                t0,
            )
            .unwrap();

        assert!(matches!(
            runtime.tick(t0 + secs(60)),
            SessionTick::BlockCompleted { .. }
        ));
        assert!(runtime.confirm_next_block(t0 + secs(70)));
        runtime.tick(t0 + secs(100));

        let outcome = runtime.end().expect("session was active");
        // Only the completed block counts; the interrupted one does not.
        assert_eq!(outcome.total_study_seconds, 60);
        assert_eq!(outcome.blocks.len(), 1);
        assert!(runtime.end().is_none());
    }

    #[test]
    fn test_status_reflects_phases() {
        let mut runtime = SessionRuntime::new(WINDOW);
        let t0 = Instant::now();
        assert_eq!(runtime.status(t0), SessionStatus::idle());

        runtime
            .start(
                schedule(vec![ScheduleBlock::study(10), ScheduleBlock::pause(5)]),
                t0,
            )
            .unwrap();
        let status = runtime.status(t0 + secs(30));
        assert!(status.active);
        assert_eq!(status.block_type, Some(BlockType::Study));
        assert_eq!(status.remaining_seconds, 570);
        assert_eq!(status.total_blocks, 2);

        runtime.tick(t0 + secs(600));
        let status = runtime.status(t0 + secs(601));
        assert!(status.awaiting_confirmation);
        assert_eq!(status.block_type, Some(BlockType::Break));
        assert_eq!(status.remaining_seconds, 299);
    }
}
