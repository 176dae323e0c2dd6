//! Pet evolution state machine.
//!
//! Pure transition logic over (stage, emotion, mastery):
//! - mastery is clamped to `[0, mastery_cap(stage)]`
//! - reaching the cap below the terminal stage evolves the pet one stage,
//!   resets mastery and forces a HAPPY emotion
//! - otherwise emotion is derived from the mastery percentage bands
//!
//! Persistence and notifications live in [`super::engine`]; nothing here
//! touches I/O.

use super::types::{PetEmotion, PetStage, PetStateSnapshot};

/// Mastery required to evolve out of stages 1-4.
pub const STAGE_MASTERY_CAP: i64 = 200;
/// Mastery ceiling at the terminal stage.
pub const TERMINAL_MASTERY_CAP: i64 = 1000;

/// A completed forward stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evolution {
    pub from: PetStage,
    pub to: PetStage,
}

#[derive(Debug, Clone)]
pub struct PetMachine {
    stage: PetStage,
    emotion: PetEmotion,
    mastery: i64,
    last_updated: i64,
}

impl PetMachine {
    pub fn new() -> Self {
        Self {
            stage: PetStage::Egg,
            emotion: PetEmotion::Happy,
            mastery: 0,
            last_updated: now_ts(),
        }
    }

    /// Restore from a persisted snapshot, clamping mastery back into range.
    ///
    /// The persisted emotion is kept as-is: it is a snapshot of what the pet
    /// was displaying, and will be re-derived on the next mastery change.
    pub fn from_snapshot(snapshot: &PetStateSnapshot) -> Self {
        let cap = mastery_cap(snapshot.stage);
        Self {
            stage: snapshot.stage,
            emotion: snapshot.emotion,
            mastery: snapshot.mastery.clamp(0, cap),
            last_updated: snapshot.last_updated,
        }
    }

    pub fn stage(&self) -> PetStage {
        self.stage
    }

    pub fn emotion(&self) -> PetEmotion {
        self.emotion
    }

    pub fn mastery(&self) -> i64 {
        self.mastery
    }

    pub fn mastery_cap(&self) -> i64 {
        mastery_cap(self.stage)
    }

    /// Unix timestamp of the last mutation.
    pub fn last_updated_ts(&self) -> i64 {
        self.last_updated
    }

    pub fn mastery_percentage(&self) -> f64 {
        let cap = self.mastery_cap();
        if cap > 0 {
            self.mastery as f64 / cap as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Apply a mastery delta (negative amounts allowed, floor-clamped).
    ///
    /// Returns the evolution that the grant triggered, if any. Evolution is
    /// forward-only and resets mastery; at the terminal stage mastery simply
    /// saturates at the cap.
    pub fn grant_mastery(&mut self, amount: i64) -> Option<Evolution> {
        let cap = self.mastery_cap();
        self.mastery = self.mastery.saturating_add(amount).clamp(0, cap);
        self.last_updated = now_ts();

        if self.mastery >= cap && !self.stage.is_terminal() {
            let from = self.stage;
            if let Some(to) = from.next() {
                self.stage = to;
                self.mastery = 0;
                self.emotion = PetEmotion::Happy;
                return Some(Evolution { from, to });
            }
        }

        self.recompute_emotion();
        None
    }

    /// Administrative stage override. Resets mastery and re-derives the
    /// emotion; does not produce an [`Evolution`].
    pub fn set_stage(&mut self, stage: PetStage) -> bool {
        if self.stage == stage {
            return false;
        }
        self.stage = stage;
        self.mastery = 0;
        self.last_updated = now_ts();
        self.recompute_emotion();
        true
    }

    /// Back to a fresh egg.
    pub fn reset(&mut self) {
        self.stage = PetStage::Egg;
        self.emotion = PetEmotion::Happy;
        self.mastery = 0;
        self.last_updated = now_ts();
    }

    fn recompute_emotion(&mut self) -> bool {
        let next = emotion_for(self.mastery, self.mastery_cap());
        if next != self.emotion {
            self.emotion = next;
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> PetStateSnapshot {
        PetStateSnapshot {
            stage: self.stage,
            emotion: self.emotion,
            mastery: self.mastery,
            mastery_cap: self.mastery_cap(),
            last_updated: self.last_updated,
        }
    }
}

impl Default for PetMachine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn mastery_cap(stage: PetStage) -> i64 {
    if stage.is_terminal() {
        TERMINAL_MASTERY_CAP
    } else {
        STAGE_MASTERY_CAP
    }
}

/// Emotion band for a mastery value.
///
/// NOTE: the top band maps to ANGRY and the second-highest to HAPPY. That
/// reads inverted, but it is the shipped behavior; see DESIGN.md before
/// changing it.
pub fn emotion_for(mastery: i64, cap: i64) -> PetEmotion {
    let percentage = if cap > 0 {
        mastery as f64 / cap as f64 * 100.0
    } else {
        0.0
    };

    if percentage < 20.0 {
        PetEmotion::Sad
    } else if percentage < 40.0 {
        PetEmotion::Worried
    } else if percentage < 60.0 {
        PetEmotion::Hungry
    } else if percentage < 80.0 {
        PetEmotion::Happy
    } else {
        PetEmotion::Angry
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
