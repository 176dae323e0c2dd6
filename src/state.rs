use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::config::Config;
use crate::core::ChangeNotifier;
use crate::pet::PetEngine;
use crate::profile::UserProfile;
use crate::session::SessionDriver;
use crate::store::{SaveStore, StoreError};

/// Application root: every component is constructed here and handed out by
/// reference. There is no global state; tests build as many isolated
/// `AppState`s as they like.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    config: Config,
    store: Arc<SaveStore>,
    notifier: Arc<ChangeNotifier>,
    pet: Arc<PetEngine>,
    session: Arc<SessionDriver>,
}

impl AppState {
    /// Load persisted state (falling back to first-run defaults) and wire
    /// the components together.
    pub fn load(config: Config) -> Self {
        let store = Arc::new(SaveStore::open(
            config.save_file_path(),
            config.backup_retention,
        ));
        let notifier = Arc::new(ChangeNotifier::new());
        let pet = Arc::new(PetEngine::new(Arc::clone(&store), Arc::clone(&notifier)));
        let session = Arc::new(SessionDriver::new(
            Arc::clone(&pet),
            Arc::clone(&store),
            &config,
        ));

        Self {
            started_at: Instant::now(),
            config,
            store,
            notifier,
            pet,
            session,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<SaveStore> {
        Arc::clone(&self.store)
    }

    pub fn notifier(&self) -> Arc<ChangeNotifier> {
        Arc::clone(&self.notifier)
    }

    pub fn pet(&self) -> Arc<PetEngine> {
        Arc::clone(&self.pet)
    }

    pub fn session(&self) -> Arc<SessionDriver> {
        Arc::clone(&self.session)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// First-time users have not picked a pet yet.
    pub fn is_first_time_user(&self) -> bool {
        self.store.with_document(|doc| doc.pet.is_none())
    }

    pub fn user_profile(&self) -> UserProfile {
        self.store.with_document(|doc| doc.user.clone())
    }

    /// Record answered questions into the profile (write-through).
    pub fn record_answers(&self, count: u64, correct: u64) {
        let today = chrono::Local::now().date_naive();
        if let Err(err) = self
            .store
            .update(|doc| doc.user.add_questions_answered(count, correct, today))
        {
            warn!(error = %err, "failed to persist answer stats");
        }
    }

    pub fn setting(&self, key: &str) -> Option<serde_json::Value> {
        self.store.with_document(|doc| doc.settings.get(key).cloned())
    }

    pub fn set_setting(&self, key: &str, value: serde_json::Value) {
        if let Err(err) = self
            .store
            .update(|doc| {
                doc.settings.insert(key.to_string(), value.clone());
            })
        {
            warn!(error = %err, "failed to persist setting");
        }
    }

    pub fn theme(&self) -> String {
        self.setting("theme")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "soft_pink".to_string())
    }

    pub fn set_theme(&self, theme: &str) {
        self.set_setting("theme", serde_json::Value::String(theme.to_string()));
    }

    /// Destructive full reset: wipe the save data and start over as a fresh
    /// egg. Callers are expected to confirm with the user first.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        self.store.reset()?;
        self.pet.reset();
        Ok(())
    }

    /// Forced save of the full document (used at shutdown).
    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.persist()
    }
}
