//! Async shell around [`SessionRuntime`].
//!
//! Runs a cancellable 1-second tick loop, publishes status on a watch
//! channel for UI observers and flushes finished sessions into the user
//! profile, the session history and the pet's mastery.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::pet::PetEngine;
use crate::store::SaveStore;

use super::runtime::{SessionRuntime, SessionTick};
use super::types::{Schedule, SessionError, SessionOutcome, SessionStatus};

struct DriverInner {
    runtime: Mutex<SessionRuntime>,
    engine: Arc<PetEngine>,
    store: Arc<SaveStore>,
    status_tx: watch::Sender<SessionStatus>,
    tick_interval: Duration,
    mastery_per_study_minute: i64,
}

pub struct SessionDriver {
    inner: Arc<DriverInner>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionDriver {
    pub fn new(engine: Arc<PetEngine>, store: Arc<SaveStore>, config: &Config) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::idle());
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(DriverInner {
                runtime: Mutex::new(SessionRuntime::new(config.confirmation_window)),
                engine,
                store,
                status_tx,
                tick_interval: config.tick_interval,
                mastery_per_study_minute: config.mastery_per_study_minute,
            }),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// Spawn the tick loop. Idempotent.
    pub fn start(&self) {
        let mut guard = self.handle.lock();
        if guard.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => inner.step(),
                }
            }
            debug!("session tick loop stopped");
        }));
        info!("session driver started");
    }

    /// Cancel the tick loop and wait for it to finish.
    pub async fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = self.shutdown_tx.send(());
            let _ = handle.await;
            info!("session driver stopped");
        }
    }

    pub fn start_session(&self, schedule: Schedule) -> Result<(), SessionError> {
        let now = Instant::now();
        {
            let mut runtime = self.inner.runtime.lock();
            runtime.start(schedule, now)?;
        }
        self.inner.publish_status(now);
        info!("study session started");
        Ok(())
    }

    pub fn confirm_next_block(&self) -> bool {
        let now = Instant::now();
        let confirmed = self.inner.runtime.lock().confirm_next_block(now);
        self.inner.publish_status(now);
        confirmed
    }

    pub fn pause(&self) -> bool {
        let now = Instant::now();
        let paused = self.inner.runtime.lock().pause(now);
        self.inner.publish_status(now);
        paused
    }

    pub fn resume(&self) -> bool {
        let now = Instant::now();
        let resumed = self.inner.runtime.lock().resume(now);
        self.inner.publish_status(now);
        resumed
    }

    /// Explicitly end the running session and flush its results.
    pub fn end_session(&self) -> Option<SessionOutcome> {
        let now = Instant::now();
        let outcome = self.inner.runtime.lock().end();
        if let Some(ref outcome) = outcome {
            self.inner.flush(outcome);
        }
        self.inner.publish_status(now);
        outcome
    }

    pub fn is_active(&self) -> bool {
        self.inner.runtime.lock().is_active()
    }

    /// Watch-channel view of the running session for UI observers.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status_tx.subscribe()
    }
}

impl DriverInner {
    fn step(&self) {
        let now = Instant::now();
        let event = self.runtime.lock().tick(now);
        match event {
            SessionTick::BlockCompleted { block_type, actual } => {
                info!(
                    block = block_type.as_str(),
                    seconds = actual.as_secs(),
                    "block completed, awaiting confirmation"
                );
            }
            SessionTick::SessionEnded(outcome) => self.flush(&outcome),
            _ => {}
        }
        self.publish_status(now);
    }

    fn publish_status(&self, now: Instant) {
        let status = self.runtime.lock().status(now);
        self.status_tx.send_replace(status);
    }

    fn flush(&self, outcome: &SessionOutcome) {
        let today = Local::now().date_naive();
        if let Err(err) = self
            .store
            .update(|doc| doc.user.record_session(outcome, today))
        {
            warn!(error = %err, "failed to persist session results");
        }

        let minutes = (outcome.total_study_seconds / 60) as i64;
        let grant = minutes * self.mastery_per_study_minute;
        if grant > 0 {
            self.engine.grant_mastery(grant);
        }

        info!(
            study_seconds = outcome.total_study_seconds,
            blocks = outcome.blocks.len(),
            "session completed"
        );
    }
}
