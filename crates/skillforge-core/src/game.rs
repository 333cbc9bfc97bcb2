//! The game controller: one engine, its storage and its clock behind a
//! single mutation gate.
//!
//! Every command first brings the engine up to the clock, so a command never
//! observes a cycle that should already have completed. [`GameHandle`] wraps
//! the controller in a mutex for callers on several threads (a UI thread
//! issuing commands, a timer calling [`Game::update`]); saves take the same
//! lock, so a snapshot always reflects whole operations.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::engine::{Engine, TickReport, TrainingError};
use crate::fixed::Millis;
use crate::id::{ResourceId, SkillId};
use crate::notification::{Notification, NotificationListener};
use crate::query::{InventoryItem, InventoryQuery};
use crate::rng::SplitMix64;
use crate::serialize::{self, DeserializeError, GameSettings, SerializeError};
use crate::skill::LevelChange;
use crate::storage::{Storage, StorageError};
use crate::upgrade::PurchaseError;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

/// How [`Game::load`] ended up with its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored save was decoded and restored.
    Restored,
    /// Nothing was stored; a new game was started.
    NoSave,
    /// The stored blob was invalid; a new game was started.
    Rejected,
    /// The storage backend failed; a new game was started.
    StorageFailed,
}

impl LoadOutcome {
    pub fn is_restored(self) -> bool {
        self == LoadOutcome::Restored
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Game<S: Storage, C: Clock> {
    engine: Engine,
    storage: S,
    clock: C,
    seeds: SplitMix64,
    last_autosave: Millis,
}

impl<S: Storage, C: Clock> Game<S, C> {
    /// A new game. Nothing is read from storage.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, storage: S, clock: C) -> Self {
        let now = clock.now_ms();
        let mut seeds = SplitMix64::new(now);
        let engine = Engine::new_game(catalog, config, now, seeds.next_u64());
        Self {
            engine,
            storage,
            clock,
            seeds,
            last_autosave: now,
        }
    }

    /// Restore the stored save, or start a new game if there is none or it
    /// cannot be used.
    pub fn open(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        storage: S,
        clock: C,
    ) -> (Self, LoadOutcome) {
        let mut game = Self::new(catalog, config, storage, clock);
        let outcome = game.load();
        (game, outcome)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn save_key(&self) -> &str {
        &self.engine.config().save_key
    }

    /// Advance the engine to the clock.
    fn sync(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        self.engine.tick(now)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Tick to the clock and autosave once the configured interval has passed.
    /// Autosave failures are logged and leave the game running.
    pub fn update(&mut self) -> TickReport {
        let report = self.sync();
        let now = self.engine.now();
        if now.saturating_sub(self.last_autosave) >= self.engine.config().autosave_interval_ms {
            self.last_autosave = now;
            if let Err(err) = self.save() {
                tracing::error!(
                    target: "skillforge::persistence",
                    error = %err,
                    "autosave.failed"
                );
            }
        }
        report
    }

    pub fn start_training(&mut self, skill: SkillId, activity: &str) -> Result<(), TrainingError> {
        self.sync();
        self.engine.start_training(skill, activity)
    }

    pub fn stop_training(&mut self) -> bool {
        self.sync();
        self.engine.stop_training()
    }

    pub fn add_experience(&mut self, skill: SkillId, amount: f64) -> LevelChange {
        self.sync();
        self.engine.add_experience(skill, amount)
    }

    pub fn purchase_upgrade(&mut self, upgrade: &str) -> Result<(), PurchaseError> {
        self.sync();
        self.engine.purchase_upgrade(upgrade)
    }

    pub fn add_resource(&mut self, resource: &ResourceId, quantity: u64) {
        self.sync();
        self.engine.add_resource(resource, quantity);
    }

    pub fn set_settings(&mut self, settings: GameSettings) {
        self.engine.set_settings(settings);
    }

    pub fn inventory(&self, query: &InventoryQuery) -> Vec<InventoryItem> {
        self.engine.inventory_items(query)
    }

    /// Register a passive notification listener. Listeners survive loads,
    /// imports and new games.
    pub fn subscribe(&mut self, listener: NotificationListener) {
        self.engine.notifications_mut().subscribe(listener);
    }

    /// Take every queued notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.engine.notifications_mut().drain()
    }

    /// Discard all progress and start over. The stored save is kept until the
    /// next save overwrites it.
    pub fn new_game(&mut self) {
        self.sync();
        self.engine.reset(self.seeds.next_u64());
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn encode(&mut self) -> Result<String, PersistenceError> {
        self.sync();
        encode_engine(&self.engine)
    }

    /// Write the current state to storage. On failure the in-memory state is
    /// untouched.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        let blob = self.encode()?;
        let now = self.engine.now();
        let key = self.save_key().to_string();
        self.storage.set(&key, &blob)?;
        self.engine.mark_saved(now);
        self.last_autosave = now;
        tracing::info!(
            target: "skillforge::persistence",
            key = %key,
            bytes = blob.len(),
            "save.written"
        );
        Ok(())
    }

    /// Replace the current game with the stored one. Anything unusable falls
    /// back to a new game; this never fails.
    pub fn load(&mut self) -> LoadOutcome {
        let now = self.clock.now_ms();
        let key = self.save_key().to_string();
        let outcome = match self.storage.get(&key) {
            Ok(Some(blob)) => match serialize::try_deserialize(&blob) {
                Some(state) => {
                    let catalog = Arc::clone(self.engine.catalog());
                    let config = self.engine.config().clone();
                    let start = state.player.last_save.min(now);
                    let mut restored = Engine::from_state(catalog, config, state, start);
                    restored.adopt_listeners(&mut self.engine);
                    self.engine = restored;
                    let report = self.sync();
                    tracing::info!(
                        target: "skillforge::persistence",
                        player = %self.engine.player().id,
                        offline_completions = report.completed(),
                        "save.loaded"
                    );
                    LoadOutcome::Restored
                }
                None => LoadOutcome::Rejected,
            },
            Ok(None) => LoadOutcome::NoSave,
            Err(err) => {
                tracing::error!(
                    target: "skillforge::persistence",
                    error = %err,
                    "load.storage_failed"
                );
                LoadOutcome::StorageFailed
            }
        };
        if !outcome.is_restored() {
            self.engine.tick(now);
            self.engine.reset(self.seeds.next_u64());
        }
        self.last_autosave = self.engine.now();
        outcome
    }

    /// The current state as a save blob, without touching storage.
    pub fn export_save(&mut self) -> Result<String, PersistenceError> {
        self.encode()
    }

    /// Replace the current game with `blob` and persist it. If the blob is
    /// invalid or cannot be stored, the current game stays in place.
    pub fn import_save(&mut self, blob: &str) -> Result<(), PersistenceError> {
        let state = serialize::deserialize(blob)?;
        let now = self.clock.now_ms();
        let catalog = Arc::clone(self.engine.catalog());
        let config = self.engine.config().clone();
        let mut imported = Engine::from_state(catalog, config, state, now);
        let encoded = encode_engine(&imported)?;
        let key = self.save_key().to_string();
        self.storage.set(&key, &encoded)?;

        imported.mark_saved(now);
        imported.adopt_listeners(&mut self.engine);
        self.engine = imported;
        self.last_autosave = now;
        tracing::info!(
            target: "skillforge::persistence",
            player = %self.engine.player().id,
            key = %key,
            "save.imported"
        );
        Ok(())
    }

    /// Delete the stored save.
    pub fn clear_save(&mut self) -> Result<(), PersistenceError> {
        let key = self.save_key().to_string();
        self.storage.remove(&key)?;
        tracing::info!(target: "skillforge::persistence", key = %key, "save.cleared");
        Ok(())
    }
}

/// `engine`'s state as a save blob stamped with the engine's current time.
fn encode_engine(engine: &Engine) -> Result<String, PersistenceError> {
    let now = engine.now();
    let mut state = engine.to_state();
    state.player.last_save = now;
    Ok(serialize::serialize(&state, now)?)
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// A cloneable, thread-safe handle to one [`Game`].
#[derive(Debug)]
pub struct GameHandle<S: Storage, C: Clock> {
    inner: Arc<Mutex<Game<S, C>>>,
}

impl<S: Storage, C: Clock> Clone for GameHandle<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage, C: Clock> GameHandle<S, C> {
    pub fn new(game: Game<S, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    /// Exclusive access. A panic in another holder does not leave the state
    /// half-updated (every operation validates before mutating), so a
    /// poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Game<S, C>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Game<S, C>) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::id::ActivityId;
    use crate::storage::MemoryStorage;
    use crate::test_utils::*;

    type TestGame = Game<MemoryStorage, ManualClock>;

    fn new_game(clock: &ManualClock) -> TestGame {
        Game::new(
            shared_catalog(),
            EngineConfig::default(),
            MemoryStorage::new(),
            clock.clone(),
        )
    }

    /// Storage whose every call fails.
    #[derive(Debug, Default)]
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn set(&mut self, _key: &str, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn commands_see_the_clock() {
        let clock = ManualClock::new(0);
        let mut game = new_game(&clock);
        game.start_training(SkillId::Woodcutting, "regular_tree").unwrap();
        clock.advance(3000);
        // stop syncs first, so the finished cycle is credited
        assert!(game.stop_training());
        assert_eq!(game.engine().resource_count("logs"), 1);
    }

    #[test]
    fn update_ticks_and_autosaves() {
        let clock = ManualClock::new(0);
        let mut game = new_game(&clock);
        game.start_training(SkillId::Woodcutting, "regular_tree").unwrap();
        clock.advance(6000);
        assert_eq!(game.update().completed(), 2);
        assert!(game.storage().is_empty());

        clock.set(30_000);
        game.update();
        assert_eq!(game.storage().len(), 1);
        assert_eq!(game.engine().player().last_save, 30_000);
    }

    #[test]
    fn save_and_reload_with_offline_progress() {
        let clock = ManualClock::new(0);
        let mut game = new_game(&clock);
        game.add_resource(&ResourceId::new("logs"), 10);
        game.purchase_upgrade("sharp_axe").unwrap();
        game.start_training(SkillId::Woodcutting, "regular_tree").unwrap();
        clock.set(1000);
        game.save().unwrap();

        let storage = game.storage().clone();
        clock.set(4000);
        let (restored, outcome) =
            Game::open(shared_catalog(), EngineConfig::default(), storage, clock.clone());
        assert_eq!(outcome, LoadOutcome::Restored);
        let engine = restored.engine();
        assert!(engine.is_purchased("sharp_axe"));
        assert_eq!(engine.session().unwrap().activity, ActivityId::new("regular_tree"));
        // 1500 ms cycles from t = 0: completions at 1500, 3000.
        assert_eq!(engine.resource_count("logs"), 2);
        assert_eq!(engine.player().id, game.engine().player().id);
    }

    #[test]
    fn missing_save_starts_new_game() {
        let clock = ManualClock::new(500);
        let (game, outcome) = Game::open(
            shared_catalog(),
            EngineConfig::default(),
            MemoryStorage::new(),
            clock,
        );
        assert_eq!(outcome, LoadOutcome::NoSave);
        assert_eq!(game.engine().player().created_at, 500);
    }

    #[test]
    fn corrupt_save_starts_new_game() {
        let mut storage = MemoryStorage::new();
        storage.set(serialize::SAVE_KEY, "{\"version\": 1").unwrap();
        let (game, outcome) = Game::open(
            shared_catalog(),
            EngineConfig::default(),
            storage,
            ManualClock::new(0),
        );
        assert_eq!(outcome, LoadOutcome::Rejected);
        assert_eq!(game.engine().skill_level(SkillId::Woodcutting), 1);
    }

    #[test]
    fn storage_failures_are_contained() {
        let (mut game, outcome) = Game::open(
            shared_catalog(),
            EngineConfig::default(),
            BrokenStorage,
            ManualClock::new(0),
        );
        assert_eq!(outcome, LoadOutcome::StorageFailed);
        game.add_experience(SkillId::Mining, 100.0);
        assert!(matches!(game.save(), Err(PersistenceError::Storage(_))));
        assert_eq!(game.engine().skill_level(SkillId::Mining), 2);
        assert_eq!(game.engine().player().last_save, 0);
    }

    #[test]
    fn export_import_round_trip() {
        let clock = ManualClock::new(0);
        let mut source = new_game(&clock);
        source.add_experience(SkillId::Fishing, 2400.0);
        source.add_resource(&ResourceId::new("raw_shrimp"), 7);
        let blob = source.export_save().unwrap();

        let mut target = new_game(&clock);
        target.import_save(&blob).unwrap();
        assert_eq!(target.engine().skill_level(SkillId::Fishing), 14);
        assert_eq!(target.engine().resource_count("raw_shrimp"), 7);
        assert_eq!(target.storage().len(), 1);
    }

    #[test]
    fn invalid_import_keeps_current_game() {
        let clock = ManualClock::new(0);
        let mut game = new_game(&clock);
        game.add_experience(SkillId::Mining, 100.0);
        assert!(matches!(
            game.import_save("{}"),
            Err(PersistenceError::Deserialize(_))
        ));
        assert_eq!(game.engine().skill_level(SkillId::Mining), 2);
        assert!(game.storage().is_empty());
    }

    #[test]
    fn import_that_cannot_be_stored_keeps_current_game() {
        let clock = ManualClock::new(0);
        let mut source = new_game(&clock);
        source.add_experience(SkillId::Fishing, 2400.0);
        let blob = source.export_save().unwrap();

        let mut game = Game::new(
            shared_catalog(),
            EngineConfig::default(),
            BrokenStorage,
            clock.clone(),
        );
        game.add_experience(SkillId::Mining, 100.0);
        let player = game.engine().player().id.clone();
        assert!(matches!(
            game.import_save(&blob),
            Err(PersistenceError::Storage(_))
        ));
        assert_eq!(game.engine().skill_level(SkillId::Mining), 2);
        assert_eq!(game.engine().skill_level(SkillId::Fishing), 1);
        assert_eq!(game.engine().player().id, player);
    }

    #[test]
    fn listeners_survive_load_and_import() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let clock = ManualClock::new(0);
        let mut source = new_game(&clock);
        source.add_experience(SkillId::Mining, 10.0);
        source.save().unwrap();
        let blob = source.export_save().unwrap();

        let heard = Arc::new(AtomicUsize::new(0));
        let (mut game, outcome) = Game::open(
            shared_catalog(),
            EngineConfig::default(),
            MemoryStorage::new(),
            clock.clone(),
        );
        assert_eq!(outcome, LoadOutcome::NoSave);
        let counter = Arc::clone(&heard);
        game.subscribe(Box::new(move |_: &Notification| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        game.import_save(&blob).unwrap();
        assert_eq!(game.engine().notifications().listener_count(), 1);
        assert_eq!(game.load(), LoadOutcome::Restored);
        assert_eq!(game.engine().notifications().listener_count(), 1);
        game.new_game();
        assert_eq!(game.engine().notifications().listener_count(), 1);

        // 83 xp reaches level 2 and announces it.
        game.add_experience(SkillId::Mining, 83.0);
        assert_eq!(heard.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_save_then_load_is_new_game() {
        let clock = ManualClock::new(0);
        let mut game = new_game(&clock);
        game.add_experience(SkillId::Mining, 100.0);
        game.save().unwrap();
        game.clear_save().unwrap();
        assert_eq!(game.load(), LoadOutcome::NoSave);
        assert_eq!(game.engine().skill_level(SkillId::Mining), 1);
    }

    #[test]
    fn handle_serializes_threads() {
        let clock = ManualClock::new(0);
        let handle = GameHandle::new(new_game(&clock));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        handle.with(|game| game.add_resource(&ResourceId::new("logs"), 1));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(handle.lock().engine().resource_count("logs"), 100);
    }
}
