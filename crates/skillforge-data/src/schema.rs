//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for resources, skills (with their
//! activities) and upgrades. They are deserialized from RON, JSON, or TOML
//! data files and then resolved into a core `Catalog` by the loader.
//! Resource amounts use the short tuple form `("resource_id", quantity)`.

use serde::Deserialize;

// ===========================================================================
// Resources
// ===========================================================================

/// A resource definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub gold_value: u64,
    #[serde(default)]
    pub category: CategoryData,
}

/// Inventory grouping of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CategoryData {
    Wood,
    Ore,
    Fish,
    Food,
    Bar,
    Crafted,
    #[default]
    Other,
}

// ===========================================================================
// Skills and activities
// ===========================================================================

/// A skill definition in a data file. `id` is a skill name such as
/// `"woodcutting"`.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub activities: Vec<ActivityData>,
}

/// An activity within a skill.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_level")]
    pub level_required: u32,
    pub xp: f64,
    pub duration_ms: u64,
    #[serde(default)]
    pub requirements: Vec<(String, u64)>,
    #[serde(default)]
    pub products: Vec<(String, u64)>,
}

fn default_level() -> u32 {
    1
}

// ===========================================================================
// Upgrades
// ===========================================================================

/// An upgrade definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub skill: String,
    #[serde(default = "default_level")]
    pub level_required: u32,
    #[serde(default)]
    pub cost: Vec<(String, u64)>,
    pub effect: EffectData,
    /// Empty means every activity of the skill.
    #[serde(default)]
    pub applies_to: Vec<String>,
}

/// What an upgrade does.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum EffectData {
    /// Fraction of the base duration removed.
    TimeReduction(f64),
    /// Extra units added to every product line.
    ProductionIncrease(u32),
}
