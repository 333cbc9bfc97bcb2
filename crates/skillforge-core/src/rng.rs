//! SplitMix64 generator used for player ids.

use crate::fixed::Millis;

/// SplitMix64 pseudo-random number generator. 8 bytes of state, deterministic
/// for a given seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `player-{created_at}-{9 base36 chars}`.
pub fn player_id(created_at: Millis, rng: &mut SplitMix64) -> String {
    let mut bits = rng.next_u64();
    let suffix: String = (0..9)
        .map(|_| {
            let c = BASE36[(bits % 36) as usize] as char;
            bits /= 36;
            c
        })
        .collect();
    format!("player-{created_at}-{suffix}")
}
