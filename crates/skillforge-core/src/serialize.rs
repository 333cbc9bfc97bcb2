//! Save-game codec.
//!
//! Saves are JSON envelopes `{version, timestamp, gameState}`. Loading parses
//! to an untyped value first and checks the required structure, so a
//! corrupt or foreign blob is rejected with a precise reason before any typed
//! decoding happens. Callers that only need "state or nothing" use
//! [`try_deserialize`] and start a new game on `None`.

use crate::fixed::Millis;
use crate::id::{SkillId, UpgradeId};
use crate::ledger::InventoryLedger;
use crate::session::ActiveTraining;
use crate::skill::SkillProgress;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Save format version written into every envelope.
pub const SAVE_VERSION: &str = "1.0.0";

/// Default storage key for the single save slot.
pub const SAVE_KEY: &str = "@SkillForgeIdle:save";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("json encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("save is not valid json: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("save is missing required field {0}")]
    MissingField(&'static str),
    #[error("save field {field} should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("save failed to decode: {0}")]
    Decode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Snapshot shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    #[serde(deserialize_with = "lenient_millis")]
    pub created_at: Millis,
    #[serde(deserialize_with = "lenient_millis")]
    pub last_save: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default = "enabled")]
    pub sound_enabled: bool,
    #[serde(default = "enabled")]
    pub music_enabled: bool,
    #[serde(default = "enabled")]
    pub notifications_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            notifications_enabled: true,
        }
    }
}

/// Everything a save restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player: PlayerProfile,
    pub skills: BTreeMap<SkillId, SkillProgress>,
    pub inventory: InventoryLedger,
    #[serde(default)]
    pub active_training: Option<ActiveTraining>,
    pub settings: GameSettings,
    #[serde(default, deserialize_with = "lenient_upgrade_list")]
    pub purchased_upgrades: Vec<UpgradeId>,
}

/// A decoded save envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub version: String,
    #[serde(deserialize_with = "lenient_millis")]
    pub timestamp: Millis,
    pub game_state: GameState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveEnvelope<'a> {
    version: &'a str,
    timestamp: Millis,
    game_state: &'a GameState,
}

/// Accepts fractional millisecond values and rounds them. Negative or
/// non-finite values are rejected.
pub(crate) fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Millis, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(D::Error::custom(format!("invalid millisecond value {value}")));
    }
    Ok(value.round() as Millis)
}

/// A missing or malformed upgrade list loads as empty; non-string entries are skipped.
fn lenient_upgrade_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<UpgradeId>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(UpgradeId::new(id)),
            _ => None,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode `state` into a save blob stamped with `timestamp`.
pub fn serialize(state: &GameState, timestamp: Millis) -> Result<String, SerializeError> {
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        timestamp,
        game_state: state,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a full envelope after structural validation.
pub fn deserialize_save(blob: &str) -> Result<SaveData, DeserializeError> {
    let value: Value = serde_json::from_str(blob).map_err(DeserializeError::Parse)?;
    validate_structure(&value)?;
    serde_json::from_value(value).map_err(DeserializeError::Decode)
}

/// Decode the game state from a save blob.
pub fn deserialize(blob: &str) -> Result<GameState, DeserializeError> {
    deserialize_save(blob).map(|save| save.game_state)
}

/// Like [`deserialize`], but logs the failure and returns `None`.
pub fn try_deserialize(blob: &str) -> Option<GameState> {
    match deserialize_save(blob) {
        Ok(save) => {
            if save.version != SAVE_VERSION {
                tracing::warn!(
                    target: "skillforge::persistence",
                    found = %save.version,
                    expected = SAVE_VERSION,
                    "save.version_mismatch"
                );
            }
            Some(save.game_state)
        }
        Err(err) => {
            tracing::warn!(
                target: "skillforge::persistence",
                error = %err,
                "save.rejected"
            );
            None
        }
    }
}

#[derive(Clone, Copy)]
enum Expected {
    String,
    Number,
    Object,
}

impl Expected {
    fn name(self) -> &'static str {
        match self {
            Expected::String => "a string",
            Expected::Number => "a number",
            Expected::Object => "an object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Expected::String => value.is_string(),
            Expected::Number => value.is_number(),
            Expected::Object => value.is_object(),
        }
    }
}

/// Required fields as JSON pointers, parents before children.
const REQUIRED_FIELDS: &[(&str, Expected)] = &[
    ("/version", Expected::String),
    ("/timestamp", Expected::Number),
    ("/gameState", Expected::Object),
    ("/gameState/player", Expected::Object),
    ("/gameState/player/id", Expected::String),
    ("/gameState/player/createdAt", Expected::Number),
    ("/gameState/player/lastSave", Expected::Number),
    ("/gameState/skills", Expected::Object),
    ("/gameState/inventory", Expected::Object),
    ("/gameState/settings", Expected::Object),
];

fn validate_structure(root: &Value) -> Result<(), DeserializeError> {
    if !root.is_object() {
        return Err(DeserializeError::WrongType {
            field: "/",
            expected: Expected::Object.name(),
        });
    }
    for &(pointer, expected) in REQUIRED_FIELDS {
        let value = root
            .pointer(pointer)
            .ok_or(DeserializeError::MissingField(pointer))?;
        if !expected.matches(value) {
            return Err(DeserializeError::WrongType {
                field: pointer,
                expected: expected.name(),
            });
        }
    }
    Ok(())
}
