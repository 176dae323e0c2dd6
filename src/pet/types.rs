use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Evolution stage, ordered. Persisted as its ordinal (1..=5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PetStage {
    #[default]
    Egg,
    Baby,
    Child,
    Grown,
    BattleFit,
}

impl PetStage {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Egg => 1,
            Self::Baby => 2,
            Self::Child => 3,
            Self::Grown => 4,
            Self::BattleFit => 5,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Egg),
            2 => Some(Self::Baby),
            3 => Some(Self::Child),
            4 => Some(Self::Grown),
            5 => Some(Self::BattleFit),
            _ => None,
        }
    }

    /// Next stage in the evolution chain, `None` at the terminal stage.
    pub fn next(&self) -> Option<Self> {
        Self::from_ordinal(i64::from(self.ordinal()) + 1)
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::BattleFit
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Egg => "EGG",
            Self::Baby => "BABY",
            Self::Child => "CHILD",
            Self::Grown => "GROWN",
            Self::BattleFit => "BATTLE_FIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EGG" => Some(Self::Egg),
            "BABY" => Some(Self::Baby),
            "CHILD" => Some(Self::Child),
            "GROWN" => Some(Self::Grown),
            "BATTLE_FIT" => Some(Self::BattleFit),
            _ => None,
        }
    }
}

/// Displayed mood. Persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetEmotion {
    #[default]
    Happy,
    Sad,
    Worried,
    Hungry,
    Angry,
}

impl PetEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "HAPPY",
            Self::Sad => "SAD",
            Self::Worried => "WORRIED",
            Self::Hungry => "HUNGRY",
            Self::Angry => "ANGRY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HAPPY" => Some(Self::Happy),
            "SAD" => Some(Self::Sad),
            "WORRIED" => Some(Self::Worried),
            "HUNGRY" => Some(Self::Hungry),
            "ANGRY" => Some(Self::Angry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Cat,
    Dog,
    Axolotl,
    Raccoon,
    #[default]
    Penguin,
}

impl PetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::Dog => "dog",
            Self::Axolotl => "axolotl",
            Self::Raccoon => "raccoon",
            Self::Penguin => "penguin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cat" => Some(Self::Cat),
            "dog" => Some(Self::Dog),
            "axolotl" => Some(Self::Axolotl),
            "raccoon" => Some(Self::Raccoon),
            "penguin" => Some(Self::Penguin),
            _ => None,
        }
    }
}

/// The selected companion, as persisted under the `pet` document key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    #[serde(deserialize_with = "deserialize_pet_type")]
    pub pet_type: PetType,
    pub name: String,
}

/// Persisted pet state, the unit written under the `pet_state` document key.
///
/// Stage and emotion go through a lenient deserialization boundary: persisted
/// values that are out of range or unrecognized fall back to defaults with a
/// logged warning instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetStateSnapshot {
    #[serde(
        serialize_with = "serialize_stage",
        deserialize_with = "deserialize_stage"
    )]
    pub stage: PetStage,
    #[serde(deserialize_with = "deserialize_emotion")]
    pub emotion: PetEmotion,
    pub mastery: i64,
    #[serde(default)]
    pub mastery_cap: i64,
    #[serde(default)]
    pub last_updated: i64,
}

impl Default for PetStateSnapshot {
    fn default() -> Self {
        Self {
            stage: PetStage::Egg,
            emotion: PetEmotion::Happy,
            mastery: 0,
            mastery_cap: 200,
            last_updated: 0,
        }
    }
}

fn serialize_stage<S: Serializer>(stage: &PetStage, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(stage.ordinal())
}

fn deserialize_stage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PetStage, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let stage = match &value {
        serde_json::Value::Number(n) => n.as_i64().and_then(PetStage::from_ordinal),
        serde_json::Value::String(s) => PetStage::parse(s),
        _ => None,
    };
    Ok(stage.unwrap_or_else(|| {
        warn!(value = %value, "invalid stage value in save data, defaulting to EGG");
        PetStage::default()
    }))
}

fn deserialize_emotion<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PetEmotion, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let emotion = match &value {
        serde_json::Value::String(s) => PetEmotion::parse(s),
        _ => None,
    };
    Ok(emotion.unwrap_or_else(|| {
        warn!(value = %value, "invalid emotion value in save data, defaulting to HAPPY");
        PetEmotion::default()
    }))
}

fn deserialize_pet_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PetType, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let pet_type = match &value {
        serde_json::Value::String(s) => PetType::parse(s),
        _ => None,
    };
    Ok(pet_type.unwrap_or_else(|| {
        warn!(value = %value, "invalid pet type in save data, defaulting to penguin");
        PetType::default()
    }))
}
