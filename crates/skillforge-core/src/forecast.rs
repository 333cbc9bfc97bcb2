//! Time predictions for an ongoing training session.

use crate::catalog::ResourceAmount;
use crate::fixed::Millis;
use crate::id::{ActivityId, SkillId};
use crate::ledger::InventoryLedger;
use crate::xp::{self, MAX_LEVEL};

/// Milliseconds of training needed to reach `level + 1`. Zero at the level
/// cap, or when the activity grants no experience.
pub fn time_to_next_level(xp: f64, level: u32, activity_xp: f64, duration_ms: Millis) -> Millis {
    if level >= MAX_LEVEL || activity_xp.is_nan() || activity_xp <= 0.0 {
        return 0;
    }
    let needed = xp::xp_to_next_level(xp, level);
    let actions = (needed / activity_xp).ceil() as u64;
    actions.saturating_mul(duration_ms)
}

/// Milliseconds until the inventory can no longer pay for another cycle.
/// `None` for activities without inputs.
pub fn time_until_out_of_materials(
    requirements: &[ResourceAmount],
    ledger: &InventoryLedger,
    duration_ms: Millis,
) -> Option<Millis> {
    requirements
        .iter()
        .filter(|line| line.quantity > 0)
        .map(|line| ledger.count(line.resource.as_str()) / line.quantity)
        .min()
        .map(|cycles| cycles.saturating_mul(duration_ms))
}

/// Snapshot of where the current session stands.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionForecast {
    pub skill: SkillId,
    pub activity: ActivityId,
    pub progress_pct: f64,
    pub remaining_ms: Millis,
    pub time_to_next_level_ms: Millis,
    pub time_until_out_of_materials_ms: Option<Millis>,
}
