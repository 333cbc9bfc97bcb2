use crate::fixed::{Fixed64, Millis};
use crate::id::*;
use crate::xp::{MAX_LEVEL, MIN_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A resource and a quantity of it: an activity input/output or an upgrade cost line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAmount {
    pub resource: ResourceId,
    pub quantity: u64,
}

impl ResourceAmount {
    pub fn new(resource: impl Into<ResourceId>, quantity: u64) -> Self {
        Self {
            resource: resource.into(),
            quantity,
        }
    }
}

/// Inventory grouping used by item views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Wood,
    Ore,
    Fish,
    Food,
    Bar,
    Crafted,
    #[default]
    Other,
}

/// A resource definition.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub gold_value: u64,
    pub category: ItemCategory,
}

/// One repeatable action within a skill.
#[derive(Debug, Clone)]
pub struct ActivityDef {
    pub id: ActivityId,
    pub name: String,
    pub description: String,
    pub level_required: u32,
    pub xp_gained: f64,
    pub duration_ms: Millis,
    pub requirements: Vec<ResourceAmount>,
    pub products: Vec<ResourceAmount>,
}

/// A skill and its activities, in unlock order.
#[derive(Debug, Clone)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub activities: Vec<ActivityDef>,
}

/// What an upgrade does once purchased.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeEffect {
    /// Fraction of the base duration removed, in [0, 1].
    TimeReduction(Fixed64),
    /// Flat extra units added to every product line.
    ProductionIncrease(u32),
}

/// A one-time purchasable upgrade.
#[derive(Debug, Clone)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub skill: SkillId,
    pub level_required: u32,
    pub cost: Vec<ResourceAmount>,
    pub effect: UpgradeEffect,
    /// Empty means every activity of `skill`.
    pub applies_to: Vec<ActivityId>,
}

impl UpgradeDef {
    /// Whether this upgrade affects `activity` of `skill`.
    pub fn applies(&self, skill: SkillId, activity: &str) -> bool {
        self.skill == skill
            && (self.applies_to.is_empty() || self.applies_to.iter().any(|a| a.as_str() == activity))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects definitions and validates them into an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceDef>,
    skills: Vec<SkillDef>,
    upgrades: Vec<UpgradeDef>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resource(&mut self, def: ResourceDef) -> &mut Self {
        self.resources.push(def);
        self
    }

    pub fn register_skill(&mut self, def: SkillDef) -> &mut Self {
        self.skills.push(def);
        self
    }

    pub fn register_upgrade(&mut self, def: UpgradeDef) -> &mut Self {
        self.upgrades.push(def);
        self
    }

    /// Validate every cross-reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut resource_index = HashMap::with_capacity(self.resources.len());
        for (i, def) in self.resources.iter().enumerate() {
            if resource_index.insert(def.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateResource(def.id.clone()));
            }
        }
        let known = |resource: &ResourceId, context: String| {
            if resource_index.contains_key(resource) {
                Ok(())
            } else {
                Err(CatalogError::UnknownResource {
                    context,
                    resource: resource.clone(),
                })
            }
        };

        let mut skills = BTreeMap::new();
        for skill in self.skills {
            let mut seen = HashSet::new();
            for activity in &skill.activities {
                if !seen.insert(activity.id.clone()) {
                    return Err(CatalogError::DuplicateActivity {
                        skill: skill.id,
                        activity: activity.id.clone(),
                    });
                }
                let context = format!("{}/{}", skill.id, activity.id);
                check_level(activity.level_required, &context)?;
                if activity.duration_ms == 0 {
                    return Err(CatalogError::ZeroDuration {
                        skill: skill.id,
                        activity: activity.id.clone(),
                    });
                }
                if !activity.xp_gained.is_finite() || activity.xp_gained < 0.0 {
                    return Err(CatalogError::InvalidXp {
                        skill: skill.id,
                        activity: activity.id.clone(),
                    });
                }
                for line in activity.requirements.iter().chain(&activity.products) {
                    known(&line.resource, context.clone())?;
                }
            }
            let id = skill.id;
            if skills.insert(id, skill).is_some() {
                return Err(CatalogError::DuplicateSkill(id));
            }
        }

        let mut upgrade_index = HashMap::with_capacity(self.upgrades.len());
        for (i, upgrade) in self.upgrades.iter().enumerate() {
            if upgrade_index.insert(upgrade.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateUpgrade(upgrade.id.clone()));
            }
            check_level(upgrade.level_required, upgrade.id.as_str())?;
            for line in &upgrade.cost {
                known(&line.resource, format!("upgrade {}", upgrade.id))?;
            }
            if let UpgradeEffect::TimeReduction(value) = upgrade.effect
                && !(Fixed64::ZERO..=Fixed64::ONE).contains(&value)
            {
                return Err(CatalogError::InvalidTimeReduction {
                    upgrade: upgrade.id.clone(),
                    value,
                });
            }
            let activities = skills.get(&upgrade.skill).map(|s: &SkillDef| &s.activities);
            for target in &upgrade.applies_to {
                let exists = activities.is_some_and(|list| list.iter().any(|a| &a.id == target));
                if !exists {
                    return Err(CatalogError::UnknownActivity {
                        upgrade: upgrade.id.clone(),
                        skill: upgrade.skill,
                        activity: target.clone(),
                    });
                }
            }
        }

        Ok(Catalog {
            resources: self.resources,
            resource_index,
            skills,
            upgrades: self.upgrades,
            upgrade_index,
        })
    }
}

fn check_level(level: u32, context: &str) -> Result<(), CatalogError> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(CatalogError::InvalidLevel {
            context: context.to_string(),
            level,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable game content. Frozen after build(); share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    resource_index: HashMap<ResourceId, usize>,
    skills: BTreeMap<SkillId, SkillDef>,
    upgrades: Vec<UpgradeDef>,
    upgrade_index: HashMap<UpgradeId, usize>,
}

impl Catalog {
    pub fn skill(&self, id: SkillId) -> Option<&SkillDef> {
        self.skills.get(&id)
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillDef> {
        self.skills.values()
    }

    pub fn activity(&self, skill: SkillId, activity: &str) -> Option<&ActivityDef> {
        self.skill(skill)?
            .activities
            .iter()
            .find(|a| a.id.as_str() == activity)
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceDef> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    /// Resources in registration order.
    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrade_index.get(id).map(|&i| &self.upgrades[i])
    }

    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    pub fn upgrades_for_skill(&self, skill: SkillId) -> impl Iterator<Item = &UpgradeDef> {
        self.upgrades.iter().filter(move |u| u.skill == skill)
    }

    /// Upgrades of `skill` that affect `activity` (an empty applicability list matches all).
    pub fn upgrades_for_activity<'a>(
        &'a self,
        skill: SkillId,
        activity: &'a str,
    ) -> impl Iterator<Item = &'a UpgradeDef> {
        self.upgrades.iter().filter(move |u| u.applies(skill, activity))
    }

    /// Activities of `skill` whose level requirement is at most `level`, in catalog order.
    pub fn unlocked_activities(&self, skill: SkillId, level: u32) -> Vec<ActivityId> {
        self.skill(skill)
            .map(|s| {
                s.activities
                    .iter()
                    .filter(|a| a.level_required <= level)
                    .map(|a| a.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn upgrade_count(&self) -> usize {
        self.upgrades.len()
    }

    pub fn activity_count(&self) -> usize {
        self.skills.values().map(|s| s.activities.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate resource: {0}")]
    DuplicateResource(ResourceId),
    #[error("duplicate skill: {0}")]
    DuplicateSkill(SkillId),
    #[error("duplicate activity {activity} in skill {skill}")]
    DuplicateActivity { skill: SkillId, activity: ActivityId },
    #[error("duplicate upgrade: {0}")]
    DuplicateUpgrade(UpgradeId),
    #[error("{context} references unknown resource {resource}")]
    UnknownResource { context: String, resource: ResourceId },
    #[error("upgrade {upgrade} applies to unknown {skill} activity {activity}")]
    UnknownActivity {
        upgrade: UpgradeId,
        skill: SkillId,
        activity: ActivityId,
    },
    #[error("{context}: level requirement {level} outside 1..=99")]
    InvalidLevel { context: String, level: u32 },
    #[error("{skill}/{activity} has zero duration")]
    ZeroDuration { skill: SkillId, activity: ActivityId },
    #[error("{skill}/{activity} has a negative or non-finite xp reward")]
    InvalidXp { skill: SkillId, activity: ActivityId },
    #[error("upgrade {upgrade}: time reduction {value} outside [0, 1]")]
    InvalidTimeReduction { upgrade: UpgradeId, value: Fixed64 },
}
