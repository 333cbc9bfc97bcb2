//! Level and experience conversions.
//!
//! The curve is cumulative: each level costs `floor(n + 300 * 2^(n / 7)) / 4`
//! more experience than the previous one, where `n` is the level being left.
//! Cumulative totals are floored once, after summing, so the table for
//! levels 1..=99 is fixed and must never change (saves store raw XP).

use std::sync::LazyLock;

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 99;

/// Cumulative thresholds indexed by level. Index 0 is unused.
static XP_TABLE: LazyLock<[u64; MAX_LEVEL as usize + 1]> = LazyLock::new(|| {
    let mut table = [0u64; MAX_LEVEL as usize + 1];
    let mut sum = 0.0f64;
    for level in 2..=MAX_LEVEL {
        sum += xp_for_level(level);
        table[level as usize] = sum.floor() as u64;
    }
    table
});

/// Experience needed to go from `level - 1` to `level`. Zero for level <= 1.
///
/// The per-level deltas are multiples of 0.25, so summing them in f64 is exact.
pub fn xp_for_level(level: u32) -> f64 {
    if level <= MIN_LEVEL {
        return 0.0;
    }
    let n = f64::from(level - 1);
    (n + 300.0 * 2f64.powf(n / 7.0)).floor() / 4.0
}

/// Total experience required to reach `level` from zero.
pub fn total_xp_to_reach(level: u32) -> u64 {
    if level <= MIN_LEVEL {
        return 0;
    }
    if level <= MAX_LEVEL {
        return XP_TABLE[level as usize];
    }
    let sum: f64 = (2..=level).map(xp_for_level).sum();
    // Float-to-int casts saturate.
    sum.floor() as u64
}

/// Highest level in 1..=99 whose threshold does not exceed `xp`.
pub fn level_from_xp(xp: f64) -> u32 {
    if xp.is_nan() || xp <= 0.0 {
        return MIN_LEVEL;
    }
    let thresholds = &XP_TABLE[MIN_LEVEL as usize..];
    let reached = thresholds.partition_point(|&threshold| threshold as f64 <= xp);
    reached as u32
}

/// Percentage (0..=100) of the way from `level` to `level + 1`.
pub fn progress_to_next_level(xp: f64, level: u32) -> f64 {
    if level >= MAX_LEVEL {
        return 100.0;
    }
    let current = total_xp_to_reach(level);
    let next = total_xp_to_reach(level + 1);
    if next <= current {
        return 0.0;
    }
    let pct = (xp - current as f64) / (next - current) as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Experience still missing before `level + 1`. Zero at the level cap.
pub fn xp_to_next_level(xp: f64, level: u32) -> f64 {
    if level >= MAX_LEVEL {
        return 0.0;
    }
    (total_xp_to_reach(level + 1) as f64 - xp).max(0.0)
}
