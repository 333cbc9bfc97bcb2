//! The progression engine: skills, inventory, the training session and
//! upgrades, advanced by wall-clock ticks.
//!
//! # Training lifecycle
//!
//! ```text
//!            start_training (level + inputs ok, inputs paid)
//!   Idle ───────────────────────────────────────────────▶ Training
//!    ▲                                                     │  tick: cycle due
//!    │ stop_training / re-arm unaffordable                 │  -> complete, re-arm
//!    └─────────────────────────────────────────────────────┘
//! ```
//!
//! A cycle completes once `now >= start + duration`. Completion awards XP,
//! credits products plus the production bonus, and re-arms the session at the
//! instant the cycle finished, so the number of completions depends only on
//! elapsed time and never on how often `tick` is called. A long gap is caught
//! up in one tick, bounded by [`EngineConfig::max_completions_per_tick`].

use crate::catalog::{ActivityDef, Catalog, ResourceAmount};
use crate::config::{EngineConfig, RepeatPolicy};
use crate::fixed::Millis;
use crate::forecast::{self, SessionForecast};
use crate::id::{ActivityId, ResourceId, SkillId, UpgradeId};
use crate::ledger::{InventoryLedger, LedgerError};
use crate::notification::{NotificationDraft, NotificationKind, NotificationQueue};
use crate::query::{self, InventoryItem, InventoryQuery};
use crate::rng::{self, SplitMix64};
use crate::serialize::{GameSettings, GameState, PlayerProfile};
use crate::session::ActiveTraining;
use crate::skill::{LevelChange, SkillProgress};
use crate::upgrade::{PurchaseError, PurchasedUpgrades, UpgradeResolver};
use std::collections::BTreeMap;
use std::sync::Arc;

const LEVEL_UP_ICON: &str = "🎉";
const UNLOCK_ICON: &str = "🔓";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrainingError {
    #[error("unknown {skill} activity: {activity}")]
    ActivityNotFound { skill: SkillId, activity: ActivityId },
    #[error("already training {skill}/{activity}")]
    AlreadyTraining { skill: SkillId, activity: ActivityId },
    #[error("{skill} level {current} is below the required {required}")]
    LevelTooLow {
        skill: SkillId,
        required: u32,
        current: u32,
    },
    #[error(transparent)]
    Insufficient(#[from] LedgerError),
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The player stopped it.
    Requested,
    /// The next cycle's inputs could not be paid.
    OutOfResources(LedgerError),
}

/// One finished cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub skill: SkillId,
    pub activity: ActivityId,
    pub xp_gained: f64,
    /// Product lines credited, bonus included.
    pub products: Vec<ResourceAmount>,
    pub level_change: LevelChange,
    pub completed_at: Millis,
}

/// What a tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub completions: Vec<Completion>,
    /// Set when the session ended during this tick.
    pub stopped: Option<StopReason>,
    /// Due cycles dropped because the per-tick cap was reached.
    pub discarded_cycles: u64,
}

impl TickReport {
    pub fn completed(&self) -> usize {
        self.completions.len()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The whole mutable game state plus a shared handle to the catalog.
#[derive(Debug)]
pub struct Engine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    player: PlayerProfile,
    skills: BTreeMap<SkillId, SkillProgress>,
    ledger: InventoryLedger,
    session: Option<ActiveTraining>,
    settings: GameSettings,
    purchased: PurchasedUpgrades,
    notifications: NotificationQueue,
    last_stop: Option<StopReason>,
    now_ms: Millis,
}

impl Engine {
    /// A fresh level-1 game created at `now`. `seed` feeds the player id.
    pub fn new_game(catalog: Arc<Catalog>, config: EngineConfig, now: Millis, seed: u64) -> Self {
        let mut rng = SplitMix64::new(seed);
        let player = PlayerProfile {
            id: rng::player_id(now, &mut rng),
            created_at: now,
            last_save: now,
        };
        let skills = SkillId::ALL
            .into_iter()
            .map(|skill| (skill, SkillProgress::new(skill, &catalog)))
            .collect();
        let notifications = notification_queue(&config);
        tracing::debug!(target: "skillforge::engine", player = %player.id, "game.new");
        Self {
            catalog,
            config,
            player,
            skills,
            ledger: InventoryLedger::new(),
            session: None,
            settings: GameSettings::default(),
            purchased: PurchasedUpgrades::new(),
            notifications,
            last_stop: None,
            now_ms: now,
        }
    }

    /// Rebuild an engine from a decoded snapshot.
    ///
    /// Derived skill fields are recomputed, unknown upgrades are dropped, and
    /// a session whose activity no longer exists is discarded.
    pub fn from_state(catalog: Arc<Catalog>, config: EngineConfig, state: GameState, now: Millis) -> Self {
        let GameState {
            player,
            skills: mut saved_skills,
            mut inventory,
            active_training,
            settings,
            purchased_upgrades,
        } = state;

        let skills = SkillId::ALL
            .into_iter()
            .map(|skill| {
                let mut progress = saved_skills
                    .remove(&skill)
                    .unwrap_or_else(|| SkillProgress::new(skill, &catalog));
                progress.recompute(skill, &catalog);
                (skill, progress)
            })
            .collect();

        inventory.normalize();

        let mut purchased: PurchasedUpgrades = purchased_upgrades.into_iter().collect();
        let dropped = purchased.retain_known(&catalog);
        if !dropped.is_empty() {
            tracing::warn!(
                target: "skillforge::engine",
                dropped = ?dropped,
                "load.unknown_upgrades_dropped"
            );
        }

        let session = active_training.filter(|s| {
            let known = catalog.activity(s.skill, s.activity.as_str()).is_some();
            if !known {
                tracing::warn!(
                    target: "skillforge::engine",
                    skill = %s.skill,
                    activity = %s.activity,
                    "load.unknown_session_dropped"
                );
            }
            known
        });

        let mut notifications = notification_queue(&config);
        notifications.set_suppressed(!settings.notifications_enabled);

        Self {
            catalog,
            config,
            player,
            skills,
            ledger: inventory,
            session,
            settings,
            purchased,
            notifications,
            last_stop: None,
            now_ms: now,
        }
    }

    /// Snapshot of everything a save persists.
    pub fn to_state(&self) -> GameState {
        GameState {
            player: self.player.clone(),
            skills: self.skills.clone(),
            inventory: self.ledger.clone(),
            active_training: self.session.clone(),
            settings: self.settings,
            purchased_upgrades: self.purchased.to_sorted_vec(),
        }
    }

    /// Replace all progress with a fresh game at the current time, keeping
    /// the catalog, config and notification listeners.
    pub fn reset(&mut self, seed: u64) {
        let fresh = Self::new_game(
            Arc::clone(&self.catalog),
            self.config.clone(),
            self.now_ms,
            seed,
        );
        let mut notifications =
            std::mem::replace(&mut self.notifications, notification_queue(&self.config));
        notifications.clear();
        notifications.set_suppressed(false);
        *self = Self {
            notifications,
            ..fresh
        };
        tracing::info!(target: "skillforge::engine", player = %self.player.id, "game.reset");
    }

    /// Take over the notification listeners of the engine this one replaces,
    /// as when a loaded or imported game supersedes the running one.
    pub fn adopt_listeners(&mut self, previous: &mut Engine) {
        self.notifications
            .adopt_listeners(&mut previous.notifications);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.now_ms
    }

    pub fn player(&self) -> &PlayerProfile {
        &self.player
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: GameSettings) {
        self.settings = settings;
        self.notifications
            .set_suppressed(!settings.notifications_enabled);
    }

    /// Record the time of a successful save.
    pub fn mark_saved(&mut self, at: Millis) {
        self.player.last_save = at;
    }

    pub fn skill(&self, skill: SkillId) -> &SkillProgress {
        // Every SkillId is inserted at construction.
        &self.skills[&skill]
    }

    pub fn skills(&self) -> impl Iterator<Item = (SkillId, &SkillProgress)> {
        self.skills.iter().map(|(&id, progress)| (id, progress))
    }

    pub fn skill_level(&self, skill: SkillId) -> u32 {
        self.skill(skill).level
    }

    pub fn skill_experience(&self, skill: SkillId) -> f64 {
        self.skill(skill).experience
    }

    pub fn unlocked_activities(&self, skill: SkillId) -> &[ActivityId] {
        &self.skill(skill).unlocked_activities
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn resource_count(&self, resource: &str) -> u64 {
        self.ledger.count(resource)
    }

    pub fn has_resources(&self, requirements: &[ResourceAmount]) -> bool {
        self.ledger.has_all(requirements)
    }

    /// Credit resources directly (rewards, debugging, tests).
    pub fn add_resource(&mut self, resource: &ResourceId, quantity: u64) {
        self.ledger.add(resource, quantity);
    }

    pub fn remove_resource(&mut self, resource: &str, quantity: u64) -> bool {
        self.ledger.remove(resource, quantity)
    }

    pub fn purchased(&self) -> &PurchasedUpgrades {
        &self.purchased
    }

    pub fn is_purchased(&self, upgrade: &str) -> bool {
        self.purchased.contains(upgrade)
    }

    pub fn resolver(&self) -> UpgradeResolver<'_> {
        UpgradeResolver::new(&self.catalog, &self.purchased)
    }

    pub fn session(&self) -> Option<&ActiveTraining> {
        self.session.as_ref()
    }

    pub fn is_training(&self) -> bool {
        self.session.is_some()
    }

    /// Why the most recent session ended, until the next one starts.
    pub fn last_stop_reason(&self) -> Option<&StopReason> {
        self.last_stop.as_ref()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    // -----------------------------------------------------------------------
    // Inventory views
    // -----------------------------------------------------------------------

    pub fn inventory_items(&self, query: &InventoryQuery) -> Vec<InventoryItem> {
        query::query_inventory(&self.catalog, &self.ledger, query)
    }

    pub fn total_inventory_value(&self) -> u64 {
        query::total_inventory_value(&self.catalog, &self.ledger)
    }

    pub fn inventory_item_count(&self) -> usize {
        query::inventory_item_count(&self.ledger)
    }

    // -----------------------------------------------------------------------
    // Training
    // -----------------------------------------------------------------------

    /// Start a session. On any error nothing changes.
    pub fn start_training(&mut self, skill: SkillId, activity: &str) -> Result<(), TrainingError> {
        if let Some(current) = &self.session {
            return Err(TrainingError::AlreadyTraining {
                skill: current.skill,
                activity: current.activity.clone(),
            });
        }
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .activity(skill, activity)
            .ok_or_else(|| TrainingError::ActivityNotFound {
                skill,
                activity: ActivityId::new(activity),
            })?;
        let current = self.skill_level(skill);
        if current < def.level_required {
            return Err(TrainingError::LevelTooLow {
                skill,
                required: def.level_required,
                current,
            });
        }
        self.ledger.remove_all(&def.requirements)?;

        let duration_ms = self
            .resolver()
            .effective_duration_ms(skill, activity, def.duration_ms);
        self.session = Some(ActiveTraining {
            skill,
            activity: def.id.clone(),
            start_ms: self.now_ms,
            duration_ms,
        });
        self.last_stop = None;
        tracing::debug!(
            target: "skillforge::engine",
            skill = %skill,
            activity,
            duration_ms,
            "training.started"
        );
        Ok(())
    }

    /// End the session without refund or partial credit. Returns false if idle.
    pub fn stop_training(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::debug!(
                    target: "skillforge::engine",
                    skill = %session.skill,
                    activity = %session.activity,
                    "training.stopped"
                );
                self.last_stop = Some(StopReason::Requested);
                true
            }
            None => false,
        }
    }

    /// Move the clock forward by `delta` and process due cycles.
    pub fn advance(&mut self, delta: Millis) -> TickReport {
        self.tick(self.now_ms.saturating_add(delta))
    }

    /// Set the clock to `now` (never backwards) and process every due cycle.
    /// Safe to call at any frequency.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        self.now_ms = self.now_ms.max(now);
        let now = self.now_ms;
        let mut report = TickReport::default();
        let Some(mut session) = self.session.take() else {
            return report;
        };
        let catalog = Arc::clone(&self.catalog);
        // Only catalog activities are ever armed, and the catalog is immutable.
        let def = catalog.activity(session.skill, session.activity.as_str());
        debug_assert!(def.is_some(), "session armed for {}", session.activity);
        let Some(def) = def else {
            return report;
        };

        let cap = self.config.max_completions_per_tick;
        while session.is_due(now) {
            if report.completions.len() as u64 >= u64::from(cap) {
                report.discarded_cycles = (now - session.start_ms) / session.duration_ms.max(1);
                tracing::warn!(
                    target: "skillforge::engine",
                    discarded = report.discarded_cycles,
                    "training.backlog_discarded"
                );
                session.start_ms = now;
                break;
            }
            let completed_at = session.due_at();
            report
                .completions
                .push(self.complete(session.skill, def, completed_at));

            if self.config.repeat_policy == RepeatPolicy::PayPerCycle
                && let Err(err) = self.ledger.remove_all(&def.requirements)
            {
                tracing::debug!(
                    target: "skillforge::engine",
                    skill = %session.skill,
                    activity = %session.activity,
                    error = %err,
                    "training.out_of_resources"
                );
                report.stopped = Some(StopReason::OutOfResources(err));
                self.last_stop = report.stopped.clone();
                return report;
            }
            session.start_ms = completed_at;
            session.duration_ms = self.resolver().effective_duration_ms(
                session.skill,
                def.id.as_str(),
                def.duration_ms,
            );
        }
        self.session = Some(session);
        report
    }

    /// Grant one cycle's rewards and announce them.
    fn complete(&mut self, skill: SkillId, def: &ActivityDef, at: Millis) -> Completion {
        let change = self.award(skill, def.xp_gained);
        let bonus = self.resolver().production_bonus(skill, def.id.as_str());
        let products: Vec<ResourceAmount> = def
            .products
            .iter()
            .map(|p| ResourceAmount::new(p.resource.clone(), p.quantity.saturating_add(bonus)))
            .collect();
        self.ledger.add_all(&products);

        let details = products
            .iter()
            .map(|p| format!("+{} {}", p.quantity, self.resource_name(&p.resource)))
            .collect();
        let draft = if change.leveled_up() {
            self.level_up_draft(&change).details(details)
        } else {
            NotificationDraft::new(
                NotificationKind::XpGain,
                format!("+{} {} XP", def.xp_gained, skill.display_name()),
            )
            .skill(skill)
            .details(details)
        };
        self.notifications.push(draft, at);
        self.notify_unlocks(&change, at);

        Completion {
            skill,
            activity: def.id.clone(),
            xp_gained: def.xp_gained,
            products,
            level_change: change,
            completed_at: at,
        }
    }

    // -----------------------------------------------------------------------
    // Experience
    // -----------------------------------------------------------------------

    /// Award experience outside of training. Levels and unlocks update exactly
    /// as they do on completion.
    pub fn add_experience(&mut self, skill: SkillId, amount: f64) -> LevelChange {
        let change = self.award(skill, amount);
        if change.leveled_up() {
            let draft = self.level_up_draft(&change);
            self.notifications.push(draft, self.now_ms);
        }
        self.notify_unlocks(&change, self.now_ms);
        change
    }

    fn award(&mut self, skill: SkillId, amount: f64) -> LevelChange {
        let catalog = Arc::clone(&self.catalog);
        let progress = self
            .skills
            .entry(skill)
            .or_insert_with(|| SkillProgress::new(skill, &catalog));
        let change = progress.award(skill, amount, &catalog);
        if change.leveled_up() {
            tracing::info!(
                target: "skillforge::engine",
                skill = %skill,
                from = change.previous_level,
                to = change.new_level,
                "skill.level_up"
            );
        }
        change
    }

    fn level_up_draft(&self, change: &LevelChange) -> NotificationDraft {
        NotificationDraft::new(
            NotificationKind::LevelUp,
            format!("Level {} {}!", change.new_level, change.skill.display_name()),
        )
        .skill(change.skill)
        .icon(LEVEL_UP_ICON)
        .duration(self.config.level_up_duration_ms)
    }

    fn notify_unlocks(&mut self, change: &LevelChange, at: Millis) {
        for activity in &change.newly_unlocked {
            let name = self
                .catalog
                .activity(change.skill, activity.as_str())
                .map_or_else(|| activity.to_string(), |a| a.name.clone());
            let draft = NotificationDraft::new(
                NotificationKind::ActivityUnlock,
                format!("New {} activity: {name}", change.skill.display_name()),
            )
            .skill(change.skill)
            .icon(UNLOCK_ICON);
            self.notifications.push(draft, at);
        }
    }

    fn resource_name(&self, resource: &ResourceId) -> String {
        self.catalog
            .resource(resource.as_str())
            .map_or_else(|| resource.to_string(), |r| r.name.clone())
    }

    // -----------------------------------------------------------------------
    // Upgrades
    // -----------------------------------------------------------------------

    /// Buy an upgrade. All checks run before the cost is deducted; on error
    /// nothing changes.
    pub fn purchase_upgrade(&mut self, upgrade: &str) -> Result<(), PurchaseError> {
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .upgrade(upgrade)
            .ok_or_else(|| PurchaseError::UnknownUpgrade(UpgradeId::new(upgrade)))?;
        if self.purchased.contains(upgrade) {
            return Err(PurchaseError::AlreadyOwned(def.id.clone()));
        }
        let current = self.skill_level(def.skill);
        if current < def.level_required {
            return Err(PurchaseError::LevelTooLow {
                skill: def.skill,
                required: def.level_required,
                current,
            });
        }
        self.ledger
            .remove_all(&def.cost)
            .map_err(|LedgerError::Insufficient { resource, required, available }| {
                PurchaseError::Insufficient {
                    resource,
                    required,
                    available,
                }
            })?;
        self.purchased.insert(def.id.clone());

        let draft = NotificationDraft::new(
            NotificationKind::ItemGain,
            format!("Upgrade purchased: {}", def.name),
        )
        .skill(def.skill)
        .icon(def.icon.clone())
        .details(vec![def.description.clone()]);
        self.notifications.push(draft, self.now_ms);
        tracing::info!(
            target: "skillforge::engine",
            upgrade = %def.id,
            skill = %def.skill,
            "upgrade.purchased"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Forecast
    // -----------------------------------------------------------------------

    /// Where the active session stands, or `None` when idle.
    pub fn session_forecast(&self) -> Option<SessionForecast> {
        let session = self.session.as_ref()?;
        let def = self.catalog.activity(session.skill, session.activity.as_str())?;
        let progress = self.skill(session.skill);
        Some(SessionForecast {
            skill: session.skill,
            activity: session.activity.clone(),
            progress_pct: session.progress(self.now_ms),
            remaining_ms: session.remaining(self.now_ms),
            time_to_next_level_ms: forecast::time_to_next_level(
                progress.experience,
                progress.level,
                def.xp_gained,
                session.duration_ms,
            ),
            time_until_out_of_materials_ms: forecast::time_until_out_of_materials(
                &def.requirements,
                &self.ledger,
                session.duration_ms,
            ),
        })
    }
}

fn notification_queue(config: &EngineConfig) -> NotificationQueue {
    NotificationQueue::new(
        config.notification_capacity,
        config.visible_notifications,
        config.notification_duration_ms,
    )
}
