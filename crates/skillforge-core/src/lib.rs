//! SkillForge Core -- the progression engine for idle skill-training games.
//!
//! This crate provides the XP curve, the immutable content catalog, the
//! inventory ledger, upgrade resolution, the training state machine,
//! notifications, inventory views, save-file encoding and the game controller
//! that ties them to a clock and a storage backend.
//!
//! # Training loop
//!
//! The player trains one activity at a time. [`engine::Engine::tick`] compares
//! the current time with the session's start and effective duration; every
//! elapsed cycle awards experience, credits products and re-arms the session.
//! Results depend only on elapsed time, never on how often `tick` runs:
//!
//! ```rust,ignore
//! let mut engine = Engine::new_game(catalog, EngineConfig::default(), now, seed);
//! engine.start_training(SkillId::Woodcutting, "regular_tree")?;
//! let report = engine.tick(now + 6_000); // two 3 s cycles
//! assert_eq!(report.completed(), 2);
//! ```
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Skills, activities, resources and upgrades,
//!   validated once by [`catalog::CatalogBuilder`] and shared read-only.
//! - [`engine::Engine`] -- All mutable game state and every command.
//! - [`ledger::InventoryLedger`] -- Resource balances with atomic debits.
//! - [`upgrade::UpgradeResolver`] -- Time reduction and production bonus
//!   of the purchased upgrades.
//! - [`game::Game`] / [`game::GameHandle`] -- Clock, storage, autosave and the
//!   single mutation gate.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for upgrade fractions.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod fixed;
pub mod forecast;
pub mod game;
pub mod id;
pub mod ledger;
pub mod notification;
pub mod query;
pub mod rng;
pub mod serialize;
pub mod session;
pub mod skill;
pub mod storage;
pub mod upgrade;
pub mod xp;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
