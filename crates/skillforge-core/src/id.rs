use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// A trainable skill. The set of skills is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    Woodcutting,
    Mining,
    Fishing,
    Cooking,
    Smithing,
    Crafting,
}

impl SkillId {
    /// Every skill, in display order.
    pub const ALL: [SkillId; 6] = [
        SkillId::Woodcutting,
        SkillId::Mining,
        SkillId::Fishing,
        SkillId::Cooking,
        SkillId::Smithing,
        SkillId::Crafting,
    ];

    /// The persisted key for this skill.
    pub fn as_str(self) -> &'static str {
        match self {
            SkillId::Woodcutting => "woodcutting",
            SkillId::Mining => "mining",
            SkillId::Fishing => "fishing",
            SkillId::Cooking => "cooking",
            SkillId::Smithing => "smithing",
            SkillId::Crafting => "crafting",
        }
    }

    /// Capitalized name used in notification messages.
    pub fn display_name(self) -> &'static str {
        match self {
            SkillId::Woodcutting => "Woodcutting",
            SkillId::Mining => "Mining",
            SkillId::Fishing => "Fishing",
            SkillId::Cooking => "Cooking",
            SkillId::Smithing => "Smithing",
            SkillId::Crafting => "Crafting",
        }
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown skill: {0}")]
pub struct UnknownSkill(pub String);

impl FromStr for SkillId {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillId::ALL
            .into_iter()
            .find(|skill| skill.as_str() == s)
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

/// Declares a string-keyed catalog identifier. Catalog content is authored
/// by name, and saves persist those names, so the ids stay textual.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifies an activity within its skill.
    ActivityId
}

string_id! {
    /// Identifies a resource (inventory item).
    ResourceId
}

string_id! {
    /// Identifies a purchasable upgrade.
    UpgradeId
}

/// Identifies a notification in the queue. Monotonic per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);
