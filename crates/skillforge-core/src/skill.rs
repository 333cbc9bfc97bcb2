use crate::catalog::Catalog;
use crate::id::{ActivityId, SkillId};
use crate::xp::{self, MIN_LEVEL};
use serde::{Deserialize, Serialize};

/// Per-skill progression. `level` and `unlocked_activities` are derived from
/// `experience` and the catalog; they are stored only so saves stay readable
/// and are recomputed after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    #[serde(default = "min_level")]
    pub level: u32,
    pub experience: f64,
    #[serde(default)]
    pub unlocked_activities: Vec<ActivityId>,
}

fn min_level() -> u32 {
    MIN_LEVEL
}

/// Outcome of an experience award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub skill: SkillId,
    pub previous_level: u32,
    pub new_level: u32,
    pub newly_unlocked: Vec<ActivityId>,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

impl SkillProgress {
    /// Fresh level-1 progress with the starting activities unlocked.
    pub fn new(skill: SkillId, catalog: &Catalog) -> Self {
        let mut progress = Self {
            level: MIN_LEVEL,
            experience: 0.0,
            unlocked_activities: Vec::new(),
        };
        progress.recompute(skill, catalog);
        progress
    }

    /// Re-derive level and unlocks from experience. The only writer of both.
    pub fn recompute(&mut self, skill: SkillId, catalog: &Catalog) {
        if !self.experience.is_finite() || self.experience < 0.0 {
            self.experience = 0.0;
        }
        self.level = xp::level_from_xp(self.experience);
        self.unlocked_activities = catalog.unlocked_activities(skill, self.level);
    }

    /// Add experience and recompute. Non-positive or non-finite amounts are ignored.
    pub fn award(&mut self, skill: SkillId, amount: f64, catalog: &Catalog) -> LevelChange {
        let previous_level = self.level;
        let previously_unlocked = self.unlocked_activities.clone();
        if amount.is_finite() && amount > 0.0 {
            self.experience += amount;
        }
        self.recompute(skill, catalog);
        let newly_unlocked = self
            .unlocked_activities
            .iter()
            .filter(|id| !previously_unlocked.contains(id))
            .cloned()
            .collect();
        LevelChange {
            skill,
            previous_level,
            new_level: self.level,
            newly_unlocked,
        }
    }

    pub fn is_unlocked(&self, activity: &str) -> bool {
        self.unlocked_activities.iter().any(|a| a.as_str() == activity)
    }

    /// Percentage toward the next level.
    pub fn progress(&self) -> f64 {
        xp::progress_to_next_level(self.experience, self.level)
    }

    pub fn xp_to_next_level(&self) -> f64 {
        xp::xp_to_next_level(self.experience, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::small_catalog;

    #[test]
    fn new_progress_unlocks_level_one_activities() {
        let catalog = small_catalog();
        let progress = SkillProgress::new(SkillId::Woodcutting, &catalog);
        assert_eq!(progress.level, 1);
        assert!(progress.is_unlocked("regular_tree"));
        assert!(!progress.is_unlocked("oak_tree"));
    }

    #[test]
    fn award_reports_level_up_and_unlocks() {
        let catalog = small_catalog();
        let mut progress = SkillProgress::new(SkillId::Woodcutting, &catalog);
        let change = progress.award(SkillId::Woodcutting, 2400.0, &catalog);
        assert_eq!(change.previous_level, 1);
        assert_eq!(change.new_level, 14);
        assert!(change.leveled_up());
        assert_eq!(change.newly_unlocked, vec![ActivityId::new("oak_tree")]);
        assert!(progress.is_unlocked("oak_tree"));
    }

    #[test]
    fn award_without_level_up() {
        let catalog = small_catalog();
        let mut progress = SkillProgress::new(SkillId::Woodcutting, &catalog);
        let change = progress.award(SkillId::Woodcutting, 25.0, &catalog);
        assert!(!change.leveled_up());
        assert!(change.newly_unlocked.is_empty());
        assert_eq!(progress.experience, 25.0);
    }

    #[test]
    fn invalid_amounts_are_ignored() {
        let catalog = small_catalog();
        let mut progress = SkillProgress::new(SkillId::Woodcutting, &catalog);
        progress.award(SkillId::Woodcutting, -10.0, &catalog);
        progress.award(SkillId::Woodcutting, f64::NAN, &catalog);
        progress.award(SkillId::Woodcutting, f64::INFINITY, &catalog);
        assert_eq!(progress.experience, 0.0);
        assert_eq!(progress.level, 1);
    }

    #[test]
    fn recompute_repairs_stale_derived_fields() {
        let catalog = small_catalog();
        let mut progress = SkillProgress {
            level: 50,
            experience: 83.0,
            unlocked_activities: vec![ActivityId::new("magic_tree")],
        };
        progress.recompute(SkillId::Woodcutting, &catalog);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.unlocked_activities, vec![ActivityId::new("regular_tree")]);
    }

    #[test]
    fn serde_uses_camel_case() {
        let catalog = small_catalog();
        let progress = SkillProgress::new(SkillId::Woodcutting, &catalog);
        let json = serde_json::to_value(&progress).unwrap();
        assert!(json.get("unlockedActivities").is_some());
        let partial: SkillProgress = serde_json::from_str(r#"{"experience": 90}"#).unwrap();
        assert_eq!(partial.level, 1);
    }
}
