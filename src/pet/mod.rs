pub mod engine;
pub mod machine;
pub mod types;

pub use engine::PetEngine;
pub use machine::{Evolution, PetMachine};
pub use types::{PetEmotion, PetProfile, PetStage, PetStateSnapshot, PetType};
