use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::core::{ChangeNotifier, StateChange};
use crate::store::SaveStore;

use super::machine::{Evolution, PetMachine};
use super::types::{PetEmotion, PetProfile, PetStage, PetStateSnapshot, PetType};

/// Owns the pet state machine and wires its mutations to persistence and
/// change notifications.
///
/// Persistence is write-through and fire-and-forget: a failed save is logged
/// and the in-memory state keeps the mutation. See DESIGN.md for the
/// durability discussion.
pub struct PetEngine {
    machine: Mutex<PetMachine>,
    store: Arc<SaveStore>,
    notifier: Arc<ChangeNotifier>,
}

impl PetEngine {
    /// Build the engine from whatever the store loaded at startup.
    pub fn new(store: Arc<SaveStore>, notifier: Arc<ChangeNotifier>) -> Self {
        let machine = store.with_document(|doc| PetMachine::from_snapshot(&doc.pet_state));
        Self {
            machine: Mutex::new(machine),
            store,
            notifier,
        }
    }

    pub fn snapshot(&self) -> PetStateSnapshot {
        self.machine.lock().snapshot()
    }

    pub fn stage(&self) -> PetStage {
        self.machine.lock().stage()
    }

    pub fn emotion(&self) -> PetEmotion {
        self.machine.lock().emotion()
    }

    pub fn mastery(&self) -> i64 {
        self.machine.lock().mastery()
    }

    pub fn mastery_percentage(&self) -> f64 {
        self.machine.lock().mastery_percentage()
    }

    /// Add mastery earned from study time (or remove it, floor-clamped).
    ///
    /// Returns the evolution the grant triggered, if any, so callers can
    /// react directly; observers get STAGE/EMOTION notifications either way.
    pub fn grant_mastery(&self, amount: i64) -> Option<Evolution> {
        let (snapshot, evolution, emotion_changed) = {
            let mut machine = self.machine.lock();
            let emotion_before = machine.emotion();
            let evolution = machine.grant_mastery(amount);
            (
                machine.snapshot(),
                evolution,
                machine.emotion() != emotion_before,
            )
        };

        self.write_through(&snapshot);

        if let Some(evolution) = evolution {
            info!(
                from = evolution.from.as_str(),
                to = evolution.to.as_str(),
                "pet evolved"
            );
            self.notifier.notify(StateChange::Stage);
        }
        if emotion_changed {
            self.notifier.notify(StateChange::Emotion);
        }

        evolution
    }

    /// Developer-tooling override: force a stage without evolution semantics.
    pub fn set_stage(&self, stage: PetStage) {
        let (snapshot, changed, emotion_changed) = {
            let mut machine = self.machine.lock();
            let emotion_before = machine.emotion();
            let changed = machine.set_stage(stage);
            (
                machine.snapshot(),
                changed,
                machine.emotion() != emotion_before,
            )
        };

        if !changed {
            return;
        }

        self.write_through(&snapshot);
        info!(stage = stage.as_str(), "pet stage overridden");
        self.notifier.notify(StateChange::Stage);
        if emotion_changed {
            self.notifier.notify(StateChange::Emotion);
        }
    }

    /// Full reset back to a fresh egg.
    pub fn reset(&self) {
        let snapshot = {
            let mut machine = self.machine.lock();
            machine.reset();
            machine.snapshot()
        };
        self.write_through(&snapshot);
        info!("pet state reset");
        self.notifier.notify(StateChange::All);
    }

    /// Record the user's chosen companion.
    pub fn choose_pet(&self, pet_type: PetType, name: impl Into<String>) {
        let profile = PetProfile {
            pet_type,
            name: name.into(),
        };
        if let Err(err) = self
            .store
            .update(|doc| doc.pet = Some(profile.clone()))
        {
            warn!(error = %err, "failed to persist pet selection");
        }
        info!(pet = %profile.name, kind = pet_type.as_str(), "pet selected");
        self.notifier.notify(StateChange::PetType);
    }

    pub fn pet_profile(&self) -> Option<PetProfile> {
        self.store.with_document(|doc| doc.pet.clone())
    }

    fn write_through(&self, snapshot: &PetStateSnapshot) {
        let result = self.store.update(|doc| doc.pet_state = snapshot.clone());
        if let Err(err) = result {
            warn!(error = %err, "failed to persist pet state, keeping in-memory value");
        }
    }
}
