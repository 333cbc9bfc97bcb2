//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers are
//! available to unit tests and, via the `test-utils` feature, to other crates.

use crate::catalog::*;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::fixed::{Millis, f64_to_fixed64};
use crate::id::*;
use std::sync::Arc;

/// Seed used by [`test_engine`], so player ids are reproducible.
pub const TEST_SEED: u64 = 0x5EED;

// ===========================================================================
// Definition constructors
// ===========================================================================

/// `oak_tree` -> `Oak Tree`.
fn title_case(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn amounts(lines: &[(&str, u64)]) -> Vec<ResourceAmount> {
    lines
        .iter()
        .map(|&(resource, quantity)| ResourceAmount::new(resource, quantity))
        .collect()
}

pub fn resource(id: &str, gold_value: u64) -> ResourceDef {
    ResourceDef {
        id: ResourceId::new(id),
        name: title_case(id),
        description: format!("A stack of {}.", title_case(id).to_lowercase()),
        icon: "📦".to_string(),
        gold_value,
        category: ItemCategory::Other,
    }
}

fn described(mut def: ResourceDef, category: ItemCategory, description: &str) -> ResourceDef {
    def.category = category;
    def.description = description.to_string();
    def
}

pub fn activity(
    id: &str,
    level_required: u32,
    xp_gained: f64,
    duration_ms: Millis,
    requirements: &[(&str, u64)],
    products: &[(&str, u64)],
) -> ActivityDef {
    ActivityDef {
        id: ActivityId::new(id),
        name: title_case(id),
        description: String::new(),
        level_required,
        xp_gained,
        duration_ms,
        requirements: amounts(requirements),
        products: amounts(products),
    }
}

pub fn skill(id: SkillId, activities: Vec<ActivityDef>) -> SkillDef {
    SkillDef {
        id,
        name: id.display_name().to_string(),
        description: String::new(),
        icon: String::new(),
        activities,
    }
}

fn upgrade(
    id: &str,
    skill: SkillId,
    level_required: u32,
    effect: UpgradeEffect,
    applies_to: &[&str],
    cost: &[(&str, u64)],
) -> UpgradeDef {
    UpgradeDef {
        id: UpgradeId::new(id),
        name: title_case(id),
        description: format!("{} for {}.", title_case(id), skill.display_name()),
        icon: "⚙️".to_string(),
        skill,
        level_required,
        cost: amounts(cost),
        effect,
        applies_to: applies_to.iter().map(|a| ActivityId::new(*a)).collect(),
    }
}

pub fn time_upgrade(
    id: &str,
    skill: SkillId,
    level_required: u32,
    reduction: f64,
    applies_to: &[&str],
    cost: &[(&str, u64)],
) -> UpgradeDef {
    upgrade(
        id,
        skill,
        level_required,
        UpgradeEffect::TimeReduction(f64_to_fixed64(reduction)),
        applies_to,
        cost,
    )
}

pub fn production_upgrade(
    id: &str,
    skill: SkillId,
    level_required: u32,
    units: u32,
    applies_to: &[&str],
    cost: &[(&str, u64)],
) -> UpgradeDef {
    upgrade(
        id,
        skill,
        level_required,
        UpgradeEffect::ProductionIncrease(units),
        applies_to,
        cost,
    )
}

// ===========================================================================
// Catalog
// ===========================================================================

/// A small catalog covering gathering, processing and both upgrade effects.
///
/// | skill       | activity     | lvl | xp   | ms    | in            | out             |
/// |-------------|--------------|-----|------|-------|---------------|-----------------|
/// | woodcutting | regular_tree | 1   | 25   | 3000  |               | logs 1          |
/// | woodcutting | oak_tree     | 10  | 37.5 | 4000  |               | oak_logs 1      |
/// | woodcutting | magic_tree   | 75  | 250  | 10000 |               | magic_logs 1    |
/// | fishing     | shrimp       | 1   | 10   | 2000  |               | raw_shrimp 1    |
/// | cooking     | cook_shrimp  | 1   | 30   | 2000  | raw_shrimp 1  | cooked_shrimp 1 |
pub fn small_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    b.register_resource(described(
        resource("logs", 1),
        ItemCategory::Wood,
        "Plain logs from a regular tree.",
    ))
    .register_resource(described(
        resource("oak_logs", 3),
        ItemCategory::Wood,
        "Sturdy logs from an oak.",
    ))
    .register_resource(described(
        resource("magic_logs", 40),
        ItemCategory::Wood,
        "Logs humming with energy.",
    ))
    .register_resource(described(
        resource("raw_shrimp", 2),
        ItemCategory::Fish,
        "A small shrimp from the ocean shallows.",
    ))
    .register_resource(described(
        resource("cooked_shrimp", 4),
        ItemCategory::Food,
        "Nicely cooked.",
    ));

    b.register_skill(skill(
        SkillId::Woodcutting,
        vec![
            activity("regular_tree", 1, 25.0, 3000, &[], &[("logs", 1)]),
            activity("oak_tree", 10, 37.5, 4000, &[], &[("oak_logs", 1)]),
            activity("magic_tree", 75, 250.0, 10_000, &[], &[("magic_logs", 1)]),
        ],
    ))
    .register_skill(skill(
        SkillId::Fishing,
        vec![activity("shrimp", 1, 10.0, 2000, &[], &[("raw_shrimp", 1)])],
    ))
    .register_skill(skill(
        SkillId::Cooking,
        vec![activity(
            "cook_shrimp",
            1,
            30.0,
            2000,
            &[("raw_shrimp", 1)],
            &[("cooked_shrimp", 1)],
        )],
    ))
    .register_skill(skill(SkillId::Smithing, Vec::new()));

    b.register_upgrade(time_upgrade(
        "sharp_axe",
        SkillId::Woodcutting,
        1,
        0.5,
        &[],
        &[("logs", 10)],
    ))
    .register_upgrade(time_upgrade(
        "steel_axe",
        SkillId::Woodcutting,
        1,
        0.4,
        &[],
        &[("logs", 20)],
    ))
    .register_upgrade(time_upgrade(
        "regular_focus",
        SkillId::Woodcutting,
        1,
        0.1,
        &["regular_tree"],
        &[("logs", 5)],
    ))
    .register_upgrade(production_upgrade(
        "lumber_sack",
        SkillId::Woodcutting,
        5,
        1,
        &[],
        &[("logs", 15)],
    ))
    .register_upgrade(production_upgrade(
        "fishing_net",
        SkillId::Fishing,
        1,
        1,
        &[],
        &[("raw_shrimp", 5)],
    ));

    match b.build() {
        Ok(catalog) => catalog,
        Err(err) => panic!("test catalog is invalid: {err}"),
    }
}

pub fn shared_catalog() -> Arc<Catalog> {
    Arc::new(small_catalog())
}

// ===========================================================================
// Engine
// ===========================================================================

/// A new game at t = 0 over [`small_catalog`].
pub fn test_engine() -> Engine {
    test_engine_with(EngineConfig::default())
}

pub fn test_engine_with(config: EngineConfig) -> Engine {
    Engine::new_game(shared_catalog(), config, 0, TEST_SEED)
}
