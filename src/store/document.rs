use serde::{Deserialize, Serialize};

use crate::pet::{PetProfile, PetStateSnapshot};
use crate::profile::UserProfile;

pub const SAVE_VERSION: &str = "1.5";

/// The whole persisted application state, one JSON document on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub pet: Option<PetProfile>,
    #[serde(default)]
    pub pet_state: PetStateSnapshot,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION.to_string(),
            user: UserProfile::default(),
            settings: serde_json::Map::new(),
            pet: None,
            pet_state: PetStateSnapshot::default(),
        }
    }
}

/// Shape validation run before full deserialization: the version must be a
/// known one and the top-level sections must all be present.
pub(super) fn validate_document(value: &serde_json::Value) -> Result<(), String> {
    let object = value
        .as_object()
        .ok_or_else(|| "document root is not an object".to_string())?;

    let version = object
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing version field".to_string())?;
    if version != SAVE_VERSION {
        return Err(format!("unsupported document version {version}"));
    }

    for key in ["user", "settings", "pet", "pet_state"] {
        if !object.contains_key(key) {
            return Err(format!("missing required key {key}"));
        }
    }

    Ok(())
}
