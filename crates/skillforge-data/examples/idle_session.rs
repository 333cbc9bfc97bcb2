//! Idle session example: a simulated hour of play on the built-in content.
//!
//! Chops regular trees, buys the first woodcutting upgrade, fishes and cooks
//! shrimp until the raw fish runs out, then saves and reloads the game.
//! Time is driven by a manual clock, so the run finishes instantly.
//!
//! Run with: `RUST_LOG=skillforge=debug cargo run -p skillforge-data --example idle_session`

use skillforge_core::clock::ManualClock;
use skillforge_core::game::Game;
use skillforge_core::id::SkillId;
use skillforge_core::query::{InventoryQuery, InventorySort};
use skillforge_core::storage::MemoryStorage;
use skillforge_data::{builtin_catalog, builtin_engine_config};
use std::sync::Arc;

const MINUTE: u64 = 60_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let catalog = Arc::new(builtin_catalog()?);
    let config = builtin_engine_config()?;
    let clock = ManualClock::new(0);
    let mut game = Game::new(
        Arc::clone(&catalog),
        config.clone(),
        MemoryStorage::new(),
        clock.clone(),
    );

    // --- Woodcutting for 20 minutes, ticking at 50 ms ---

    game.start_training(SkillId::Woodcutting, "regular_tree")?;
    for _ in 0..(20 * MINUTE / 50) {
        clock.advance(50);
        game.update();
    }
    let wc = game.engine().skill(SkillId::Woodcutting);
    println!(
        "Woodcutting level {} ({:.0} xp), {} regular wood",
        wc.level,
        wc.experience,
        game.engine().resource_count("regular_wood"),
    );

    match game.purchase_upgrade("wc_regular_speed") {
        Ok(()) => println!("Bought Basic Axe Mastery"),
        Err(err) => println!("Could not buy Basic Axe Mastery: {err}"),
    }
    game.stop_training();

    // --- Fishing, then cooking everything that was caught ---

    game.start_training(SkillId::Fishing, "shrimp")?;
    clock.advance(15 * MINUTE);
    game.update();
    game.stop_training();
    println!("Caught {} raw shrimp", game.engine().resource_count("raw_shrimp"));

    game.start_training(SkillId::Cooking, "cook_shrimp")?;
    clock.advance(25 * MINUTE);
    let report = game.update();
    println!(
        "Cooked {} shrimp, training stopped: {:?}",
        game.engine().resource_count("cooked_shrimp"),
        report.stopped.or_else(|| game.engine().last_stop_reason().cloned()),
    );

    // --- Inventory by value ---

    println!("\nInventory (worth {} gold):", game.engine().total_inventory_value());
    for item in game.inventory(&InventoryQuery::sorted(InventorySort::GoldValue)) {
        println!(
            "  {} {:<16} x{:<5} {} gold",
            item.icon, item.name, item.quantity, item.total_value
        );
    }

    println!("\nNotifications:");
    for n in game.drain_notifications() {
        println!("  [{:?}] {}", n.kind, n.message);
    }

    // --- Save and reload ---

    game.save()?;
    let storage = game.storage().clone();
    let (reloaded, outcome) = Game::open(catalog, config, storage, clock);
    println!(
        "\nReloaded ({outcome:?}): player {}, cooking level {}",
        reloaded.engine().player().id,
        reloaded.engine().skill_level(SkillId::Cooking),
    );
    Ok(())
}
