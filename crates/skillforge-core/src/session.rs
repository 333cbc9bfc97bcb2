use crate::fixed::Millis;
use crate::id::{ActivityId, SkillId};
use crate::serialize::lenient_millis;
use serde::{Deserialize, Serialize};

/// The single in-progress training session. `duration_ms` is the effective
/// duration of the current cycle, fixed when the cycle is armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTraining {
    #[serde(rename = "skillType")]
    pub skill: SkillId,
    #[serde(rename = "activityId")]
    pub activity: ActivityId,
    #[serde(rename = "startTime", deserialize_with = "lenient_millis")]
    pub start_ms: Millis,
    #[serde(rename = "duration", deserialize_with = "lenient_millis")]
    pub duration_ms: Millis,
}

impl ActiveTraining {
    /// Instant at which the current cycle completes.
    pub fn due_at(&self) -> Millis {
        self.start_ms.saturating_add(self.duration_ms)
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.start_ms)
    }

    pub fn remaining(&self, now: Millis) -> Millis {
        self.due_at().saturating_sub(now)
    }

    pub fn is_due(&self, now: Millis) -> bool {
        now >= self.due_at()
    }

    /// Percentage of the current cycle elapsed, clamped to 0..=100.
    pub fn progress(&self, now: Millis) -> f64 {
        if self.duration_ms == 0 {
            return 100.0;
        }
        let pct = self.elapsed(now) as f64 / self.duration_ms as f64 * 100.0;
        pct.min(100.0)
    }
}
