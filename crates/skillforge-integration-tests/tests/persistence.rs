//! Save/load scenarios: blob compatibility, damaged saves, and a real
//! filesystem backend driven through `Game`.

use skillforge_core::catalog::Catalog;
use skillforge_core::clock::ManualClock;
use skillforge_core::config::EngineConfig;
use skillforge_core::engine::Engine;
use skillforge_core::game::{Game, LoadOutcome};
use skillforge_core::id::{ResourceId, SkillId, UpgradeId};
use skillforge_core::serialize::{self, SAVE_KEY, SAVE_VERSION};
use skillforge_core::storage::{FileStorage, MemoryStorage, Storage};
use skillforge_data::builtin_catalog;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

fn catalog() -> Arc<Catalog> {
    static CATALOG: OnceLock<Arc<Catalog>> = OnceLock::new();
    Arc::clone(CATALOG.get_or_init(|| Arc::new(builtin_catalog().unwrap())))
}

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "skillforge_persistence_test_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

fn storage_with(blob: &str) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    storage.set(SAVE_KEY, blob).unwrap();
    storage
}

/// A save written by the first release of the game: camelCase keys,
/// fractional timestamps, a stale level and no upgrade list.
const LEGACY_SAVE: &str = r#"{
    "version": "1.0.0",
    "timestamp": 5000.6,
    "gameState": {
        "player": { "id": "player_legacy", "createdAt": 0, "lastSave": 5000.4 },
        "skills": {
            "woodcutting": { "level": 3, "experience": 400, "unlockedActivities": ["regular_tree"] },
            "cooking": { "level": 1, "experience": 0, "unlockedActivities": [] }
        },
        "inventory": { "regular_wood": 16, "raw_shrimp": 2 },
        "activeTraining": {
            "skillType": "woodcutting",
            "activityId": "regular_tree",
            "startTime": 4000.2,
            "duration": 3000.0
        },
        "settings": { "soundEnabled": true, "musicEnabled": false, "notificationsEnabled": true }
    }
}"#;

// ===========================================================================
// Blob compatibility
// ===========================================================================

#[test]
fn played_game_round_trips_through_a_blob() {
    let mut engine = Engine::new_game(catalog(), EngineConfig::default(), 0, 7);
    engine.add_resource(&ResourceId::new("regular_wood"), 100);
    engine.purchase_upgrade("wc_regular_speed").unwrap();
    engine.start_training(SkillId::Woodcutting, "regular_tree").unwrap();
    engine.advance(10_000);

    let state = engine.to_state();
    let blob = serialize::serialize(&state, engine.now()).unwrap();
    let save = serialize::deserialize_save(&blob).unwrap();
    assert_eq!(save.version, SAVE_VERSION);
    assert_eq!(save.timestamp, 10_000);
    assert_eq!(save.game_state, state);

    let restored = Engine::from_state(catalog(), EngineConfig::default(), save.game_state, 10_000);
    assert_eq!(restored.to_state(), state);
    assert!(restored.is_purchased("wc_regular_speed"));
    assert_eq!(restored.session(), engine.session());
}

#[test]
fn exported_blob_keeps_the_legacy_field_names() {
    let clock = ManualClock::new(1000);
    let mut game = Game::new(
        catalog(),
        EngineConfig::default(),
        MemoryStorage::new(),
        clock.clone(),
    );
    game.add_resource(&ResourceId::new("regular_wood"), 150);
    game.purchase_upgrade("wc_regular_speed").unwrap();
    game.start_training(SkillId::Woodcutting, "regular_tree").unwrap();
    clock.set(1500);

    let blob: serde_json::Value = serde_json::from_str(&game.export_save().unwrap()).unwrap();
    assert_eq!(blob["version"], SAVE_VERSION);
    assert_eq!(blob["timestamp"], 1500);

    let state = &blob["gameState"];
    assert_eq!(state["player"]["lastSave"], 1500);
    assert!(state["player"]["createdAt"].is_u64());
    assert_eq!(state["settings"]["notificationsEnabled"], true);
    assert!(state["skills"]["woodcutting"]["unlockedActivities"].is_array());
    assert_eq!(state["inventory"]["regular_wood"], 50);
    assert_eq!(state["purchasedUpgrades"], serde_json::json!(["wc_regular_speed"]));

    let training = &state["activeTraining"];
    assert_eq!(training["skillType"], "woodcutting");
    assert_eq!(training["activityId"], "regular_tree");
    assert_eq!(training["startTime"], 1000);
    assert!(training["duration"].is_u64());
}

#[test]
fn legacy_save_loads_and_resumes() {
    let clock = ManualClock::new(5000);
    let (mut game, outcome) = Game::open(
        catalog(),
        EngineConfig::default(),
        storage_with(LEGACY_SAVE),
        clock.clone(),
    );
    assert_eq!(outcome, LoadOutcome::Restored);

    let engine = game.engine();
    assert_eq!(engine.player().id, "player_legacy");
    assert_eq!(engine.skill_level(SkillId::Woodcutting), 5);
    assert_eq!(engine.skill_level(SkillId::Mining), 1);
    assert!(engine.purchased().is_empty());
    assert!(!engine.settings().music_enabled);
    let session = engine.session().unwrap();
    assert_eq!(session.start_ms, 4000);
    assert_eq!(session.duration_ms, 3000);

    clock.set(7000);
    assert_eq!(game.update().completed(), 1);
    assert_eq!(game.engine().resource_count("regular_wood"), 17);
    assert_eq!(game.engine().skill_experience(SkillId::Woodcutting), 425.0);
}

#[test]
fn unknown_upgrades_and_sessions_are_dropped_on_load() {
    let blob = LEGACY_SAVE
        .replace("\"activityId\": \"regular_tree\"", "\"activityId\": \"petrified_tree\"")
        .replace(
            "\"settings\"",
            "\"purchasedUpgrades\": [\"wc_regular_speed\", \"retired_upgrade\", 3],\n        \"settings\"",
        );
    let state = serialize::deserialize(&blob).unwrap();
    assert_eq!(
        state.purchased_upgrades,
        vec![UpgradeId::new("wc_regular_speed"), UpgradeId::new("retired_upgrade")]
    );

    let engine = Engine::from_state(catalog(), EngineConfig::default(), state, 5000);
    assert!(engine.session().is_none());
    assert!(engine.is_purchased("wc_regular_speed"));
    assert!(!engine.is_purchased("retired_upgrade"));
}

// ===========================================================================
// Damaged saves
// ===========================================================================

#[test]
fn damaged_blobs_start_a_new_game() {
    let truncated = &LEGACY_SAVE[..LEGACY_SAVE.len() / 2];
    let no_inventory = LEGACY_SAVE.replace("\"inventory\"", "\"bag\"");
    let negative = LEGACY_SAVE.replace("\"regular_wood\": 16", "\"regular_wood\": -16");
    for blob in ["", "not json", "[]", truncated, no_inventory.as_str(), negative.as_str()] {
        let (game, outcome) = Game::open(
            catalog(),
            EngineConfig::default(),
            storage_with(blob),
            ManualClock::new(9000),
        );
        assert_eq!(outcome, LoadOutcome::Rejected, "blob: {blob:?}");
        assert_ne!(game.engine().player().id, "player_legacy");
        assert!(game.engine().ledger().is_empty());
        assert!(game.engine().session().is_none());
    }
}

#[test]
fn empty_storage_starts_a_new_game() {
    let (game, outcome) = Game::open(
        catalog(),
        EngineConfig::default(),
        MemoryStorage::new(),
        ManualClock::new(0),
    );
    assert_eq!(outcome, LoadOutcome::NoSave);
    assert!(game.engine().player().id.starts_with("player-"));
}

#[test]
fn rejected_import_keeps_current_game() {
    let mut game = Game::new(
        catalog(),
        EngineConfig::default(),
        MemoryStorage::new(),
        ManualClock::new(0),
    );
    game.add_resource(&ResourceId::new("coal"), 3);
    let before = game.engine().to_state();
    assert!(game.import_save("{\"version\":\"1.0.0\"}").is_err());
    assert_eq!(game.engine().to_state(), before);
    assert!(game.storage().is_empty());
}

// ===========================================================================
// Filesystem backend
// ===========================================================================

#[test]
fn file_storage_survives_a_restart() {
    let dir = make_test_dir("restart");
    let clock = ManualClock::new(1000);

    let player = {
        let mut game = Game::new(
            catalog(),
            EngineConfig::default(),
            FileStorage::new(&dir),
            clock.clone(),
        );
        game.start_training(SkillId::Mining, "copper_ore").unwrap();
        clock.advance(3000);
        game.update();
        game.save().unwrap();
        game.engine().player().id.clone()
    };
    assert_eq!(dir.read_dir().unwrap().count(), 1);

    // Twelve seconds pass while the game is closed.
    clock.advance(12_000);
    let (game, outcome) = Game::open(
        catalog(),
        EngineConfig::default(),
        FileStorage::new(&dir),
        clock.clone(),
    );
    assert_eq!(outcome, LoadOutcome::Restored);
    assert_eq!(game.engine().player().id, player);
    assert_eq!(game.engine().resource_count("copper_ore"), 5);
    assert!(game.engine().is_training());

    cleanup(&dir);
}

#[test]
fn clearing_file_save_leaves_nothing_to_load() {
    let dir = make_test_dir("clear");
    let mut game = Game::new(
        catalog(),
        EngineConfig::default(),
        FileStorage::new(&dir),
        ManualClock::new(0),
    );
    game.save().unwrap();
    game.clear_save().unwrap();
    assert_eq!(game.load(), LoadOutcome::NoSave);
    cleanup(&dir);
}

#[test]
fn saving_twice_writes_the_same_state() {
    let clock = ManualClock::new(2000);
    let mut game = Game::new(
        catalog(),
        EngineConfig::default(),
        MemoryStorage::new(),
        clock.clone(),
    );
    game.add_experience(SkillId::Fishing, 500.0);
    game.save().unwrap();
    let first = serialize::deserialize(&game.storage().get(SAVE_KEY).unwrap().unwrap()).unwrap();
    game.save().unwrap();
    let second = serialize::deserialize(&game.storage().get(SAVE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.player.last_save, 2000);
}
