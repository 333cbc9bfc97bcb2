use crate::fixed::Millis;
use serde::{Deserialize, Serialize};

/// What happens to input requirements when a session re-arms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Each new cycle must afford and pay its inputs; otherwise the session stops.
    #[default]
    PayPerCycle,
    /// Inputs are paid once at start; later cycles repeat for free.
    FrontLoaded,
}

/// Engine tunables. Every field has a default, so partial config files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub repeat_policy: RepeatPolicy,
    /// Upper bound on completions processed by one tick. Backlog beyond it is discarded.
    pub max_completions_per_tick: u32,
    pub notification_capacity: usize,
    pub visible_notifications: usize,
    pub notification_duration_ms: Millis,
    pub level_up_duration_ms: Millis,
    pub autosave_interval_ms: Millis,
    pub save_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repeat_policy: RepeatPolicy::PayPerCycle,
            max_completions_per_tick: 1000,
            notification_capacity: 10,
            visible_notifications: 3,
            notification_duration_ms: 3500,
            level_up_duration_ms: 4000,
            autosave_interval_ms: 30_000,
            save_key: crate::serialize::SAVE_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_completions_per_tick == 0 {
            return Err(ConfigError::Zero("max_completions_per_tick"));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Zero("notification_capacity"));
        }
        if self.autosave_interval_ms == 0 {
            return Err(ConfigError::Zero("autosave_interval_ms"));
        }
        if self.visible_notifications > self.notification_capacity {
            return Err(ConfigError::VisibleExceedsCapacity {
                visible: self.visible_notifications,
                capacity: self.notification_capacity,
            });
        }
        if self.save_key.trim().is_empty() {
            return Err(ConfigError::EmptySaveKey);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("visible_notifications ({visible}) exceeds notification_capacity ({capacity})")]
    VisibleExceedsCapacity { visible: usize, capacity: usize },
    #[error("save_key must not be empty")]
    EmptySaveKey,
}
