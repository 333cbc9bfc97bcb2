//! Property-based tests for the SkillForge core building blocks.
//!
//! Uses proptest to generate experience values, upgrade purchases and
//! notification bursts, then verifies the curve, resolver and queue
//! invariants hold.

use proptest::prelude::*;
use skillforge_core::id::{NotificationId, SkillId, UpgradeId};
use skillforge_core::notification::{NotificationDraft, NotificationKind, NotificationQueue};
use skillforge_core::test_utils::*;
use skillforge_core::upgrade::{MAX_TIME_REDUCTION, PurchasedUpgrades, UpgradeResolver};
use skillforge_core::xp::{MAX_LEVEL, MIN_LEVEL, level_from_xp, total_xp_to_reach};

const UPGRADES: [&str; 5] = ["sharp_axe", "steel_axe", "regular_focus", "lumber_sack", "fishing_net"];

// ===========================================================================
// Generators
// ===========================================================================

fn arb_purchases() -> impl Strategy<Value = PurchasedUpgrades> {
    proptest::sample::subsequence(UPGRADES.to_vec(), 0..=UPGRADES.len())
        .prop_map(|ids| ids.into_iter().map(UpgradeId::new).collect())
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// More experience never means a lower level, and the level never
    /// leaves 1..=99.
    #[test]
    fn level_from_xp_is_monotonic(a in 0.0..20_000_000.0f64, b in 0.0..20_000_000.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_from_xp(low) <= level_from_xp(high));
        prop_assert!((MIN_LEVEL..=MAX_LEVEL).contains(&level_from_xp(high)));
    }

    /// Each threshold is exactly where its level starts.
    #[test]
    fn thresholds_are_exact(level in 2..=MAX_LEVEL) {
        let threshold = total_xp_to_reach(level);
        prop_assert!(threshold > total_xp_to_reach(level - 1));
        prop_assert_eq!(level_from_xp(threshold as f64), level);
        prop_assert_eq!(level_from_xp(threshold as f64 - 1.0), level - 1);
    }

    /// However upgrades stack, a cycle keeps at least a quarter of its base
    /// duration and never gets longer.
    #[test]
    fn stacked_reductions_respect_the_cap(purchased in arb_purchases(), base in 1..100_000u64) {
        let catalog = small_catalog();
        let resolver = UpgradeResolver::new(&catalog, &purchased);
        for activity in ["regular_tree", "oak_tree", "magic_tree"] {
            let reduction = resolver.time_reduction(SkillId::Woodcutting, activity);
            prop_assert!(reduction <= MAX_TIME_REDUCTION);
            let effective = resolver.effective_duration_ms(SkillId::Woodcutting, activity, base);
            prop_assert!(effective <= base);
            prop_assert!(effective >= (base / 4).max(1));
        }
        prop_assert_eq!(
            resolver.production_bonus(SkillId::Fishing, "shrimp"),
            u64::from(purchased.contains("fishing_net"))
        );
    }

    /// The queue never holds more than its capacity, ids only grow, and every
    /// push is either retained or counted as dropped.
    #[test]
    fn notification_queue_is_bounded(capacity in 1..12usize, pushes in 0..60u64) {
        let mut queue = NotificationQueue::new(capacity, 3, 3500);
        let mut last: Option<NotificationId> = None;
        for i in 0..pushes {
            let draft = NotificationDraft::new(NotificationKind::XpGain, format!("+{i} XP"));
            let id = queue.push(draft, i).unwrap();
            if let Some(previous) = last {
                prop_assert!(id > previous);
            }
            last = Some(id);
            prop_assert!(queue.len() <= capacity);
        }
        prop_assert_eq!(queue.total_written(), pushes);
        prop_assert_eq!(queue.dropped_count(), pushes.saturating_sub(capacity as u64));
        prop_assert!(queue.visible().count() <= 3);
        let ids: Vec<NotificationId> = queue.iter().map(|n| n.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
