//! Purchased-upgrade bookkeeping and effect aggregation.
//!
//! Time reductions from every matching upgrade are summed in fixed point and
//! capped at [`MAX_TIME_REDUCTION`]; production bonuses are summed as flat
//! units. An upgrade matches an activity when it belongs to the same skill
//! and its applicability list is empty or names the activity.

use crate::catalog::{Catalog, UpgradeEffect};
use crate::fixed::{Fixed64, Millis, scale_ms};
use crate::id::{ResourceId, SkillId, UpgradeId};
use std::collections::HashSet;

/// Largest fraction of an activity's duration that upgrades can remove (0.75).
pub const MAX_TIME_REDUCTION: Fixed64 = Fixed64::from_bits(3 << 30);

/// Shortest effective duration any cycle can have.
pub const MIN_EFFECTIVE_DURATION_MS: Millis = 1;

// ---------------------------------------------------------------------------
// Purchased set
// ---------------------------------------------------------------------------

/// Owned upgrades. Order-independent in memory; sorted only when persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchasedUpgrades {
    owned: HashSet<UpgradeId>,
}

impl PurchasedUpgrades {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.owned.contains(id)
    }

    /// Returns false if the id was already owned.
    pub fn insert(&mut self, id: UpgradeId) -> bool {
        self.owned.insert(id)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpgradeId> {
        self.owned.iter()
    }

    /// Drop ids the catalog does not know. Returns the removed ids.
    pub fn retain_known(&mut self, catalog: &Catalog) -> Vec<UpgradeId> {
        let unknown: Vec<UpgradeId> = self
            .owned
            .iter()
            .filter(|id| catalog.upgrade(id.as_str()).is_none())
            .cloned()
            .collect();
        for id in &unknown {
            self.owned.remove(id);
        }
        unknown
    }

    /// Persisted form: ids in ascending order.
    pub fn to_sorted_vec(&self) -> Vec<UpgradeId> {
        let mut ids: Vec<UpgradeId> = self.owned.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<UpgradeId> for PurchasedUpgrades {
    fn from_iter<I: IntoIterator<Item = UpgradeId>>(iter: I) -> Self {
        Self {
            owned: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Aggregated effect of owned upgrades on one activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityModifiers {
    pub time_reduction: Fixed64,
    pub production_bonus: u64,
}

/// Read-only view combining the catalog with the owned set.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeResolver<'a> {
    catalog: &'a Catalog,
    purchased: &'a PurchasedUpgrades,
}

impl<'a> UpgradeResolver<'a> {
    pub fn new(catalog: &'a Catalog, purchased: &'a PurchasedUpgrades) -> Self {
        Self { catalog, purchased }
    }

    fn fold_owned<T>(
        &self,
        skill: SkillId,
        activity: &str,
        init: T,
        f: impl Fn(T, UpgradeEffect) -> T,
    ) -> T {
        self.catalog
            .upgrades_for_activity(skill, activity)
            .filter(|u| self.purchased.contains(u.id.as_str()))
            .fold(init, |acc, u| f(acc, u.effect))
    }

    /// Summed time reduction, capped at 0.75.
    pub fn time_reduction(&self, skill: SkillId, activity: &str) -> Fixed64 {
        let total = self.fold_owned(skill, activity, Fixed64::ZERO, |acc, effect| match effect {
            UpgradeEffect::TimeReduction(value) => acc.saturating_add(value),
            UpgradeEffect::ProductionIncrease(_) => acc,
        });
        total.clamp(Fixed64::ZERO, MAX_TIME_REDUCTION)
    }

    /// Summed flat bonus added to each product line.
    pub fn production_bonus(&self, skill: SkillId, activity: &str) -> u64 {
        self.fold_owned(skill, activity, 0u64, |acc, effect| match effect {
            UpgradeEffect::ProductionIncrease(units) => acc.saturating_add(u64::from(units)),
            UpgradeEffect::TimeReduction(_) => acc,
        })
    }

    pub fn modifiers(&self, skill: SkillId, activity: &str) -> ActivityModifiers {
        ActivityModifiers {
            time_reduction: self.time_reduction(skill, activity),
            production_bonus: self.production_bonus(skill, activity),
        }
    }

    /// `base * (1 - reduction)`, rounded, never below one millisecond.
    pub fn effective_duration_ms(&self, skill: SkillId, activity: &str, base: Millis) -> Millis {
        let factor = Fixed64::ONE - self.time_reduction(skill, activity);
        scale_ms(base, factor).max(MIN_EFFECTIVE_DURATION_MS)
    }
}

// ---------------------------------------------------------------------------
// Purchase errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(UpgradeId),
    #[error("upgrade already owned: {0}")]
    AlreadyOwned(UpgradeId),
    #[error("{skill} level {current} is below the required {required}")]
    LevelTooLow {
        skill: SkillId,
        required: u32,
        current: u32,
    },
    #[error("not enough {resource}: need {required}, have {available}")]
    Insufficient {
        resource: ResourceId,
        required: u64,
        available: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::small_catalog;

    fn owned(ids: &[&str]) -> PurchasedUpgrades {
        ids.iter().map(|id| UpgradeId::new(*id)).collect()
    }

    #[test]
    fn cap_constant_is_three_quarters() {
        assert_eq!(MAX_TIME_REDUCTION, Fixed64::from_num(0.75));
    }

    #[test]
    fn nothing_owned_means_no_effect() {
        let catalog = small_catalog();
        let purchased = PurchasedUpgrades::new();
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        assert_eq!(resolver.time_reduction(SkillId::Woodcutting, "regular_tree"), Fixed64::ZERO);
        assert_eq!(resolver.production_bonus(SkillId::Woodcutting, "regular_tree"), 0);
        assert_eq!(
            resolver.effective_duration_ms(SkillId::Woodcutting, "regular_tree", 3000),
            3000
        );
    }

    #[test]
    fn single_reduction() {
        let catalog = small_catalog();
        let purchased = owned(&["regular_focus"]);
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        assert_eq!(
            resolver.effective_duration_ms(SkillId::Woodcutting, "regular_tree", 3000),
            2700
        );
        // regular_focus only targets regular_tree.
        assert_eq!(
            resolver.effective_duration_ms(SkillId::Woodcutting, "oak_tree", 4000),
            4000
        );
    }

    #[test]
    fn stacked_reductions_are_capped() {
        let catalog = small_catalog();
        let purchased = owned(&["sharp_axe", "steel_axe", "regular_focus"]);
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        assert_eq!(
            resolver.time_reduction(SkillId::Woodcutting, "regular_tree"),
            MAX_TIME_REDUCTION
        );
        assert_eq!(
            resolver.effective_duration_ms(SkillId::Woodcutting, "regular_tree", 3000),
            750
        );
    }

    #[test]
    fn production_bonus_sums_matching_upgrades() {
        let catalog = small_catalog();
        let purchased = owned(&["lumber_sack", "sharp_axe", "fishing_net"]);
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        let mods = resolver.modifiers(SkillId::Woodcutting, "oak_tree");
        assert_eq!(mods.production_bonus, 1);
        assert_eq!(mods.time_reduction, Fixed64::from_num(0.5));
        assert_eq!(resolver.production_bonus(SkillId::Fishing, "shrimp"), 1);
    }

    #[test]
    fn upgrades_of_other_skills_do_not_apply() {
        let catalog = small_catalog();
        let purchased = owned(&["sharp_axe"]);
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        assert_eq!(resolver.time_reduction(SkillId::Fishing, "shrimp"), Fixed64::ZERO);
    }

    #[test]
    fn effective_duration_never_below_one_ms() {
        let catalog = small_catalog();
        let purchased = owned(&["sharp_axe", "steel_axe"]);
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        assert_eq!(
            resolver.effective_duration_ms(SkillId::Woodcutting, "regular_tree", 1),
            1
        );
    }

    #[test]
    fn sorted_vec_and_retain_known() {
        let catalog = small_catalog();
        let mut purchased = owned(&["steel_axe", "ghost_upgrade", "sharp_axe"]);
        let dropped = purchased.retain_known(&catalog);
        assert_eq!(dropped, vec![UpgradeId::new("ghost_upgrade")]);
        assert_eq!(
            purchased.to_sorted_vec(),
            vec![UpgradeId::new("sharp_axe"), UpgradeId::new("steel_axe")]
        );
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut purchased = PurchasedUpgrades::new();
        assert!(purchased.insert(UpgradeId::new("sharp_axe")));
        assert!(!purchased.insert(UpgradeId::new("sharp_axe")));
        assert_eq!(purchased.len(), 1);
    }
}
