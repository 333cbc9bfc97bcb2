use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Wall-clock milliseconds. All simulation time is expressed in this unit.
pub type Millis = u64;

/// Convert an f64 to Fixed64. Use only when loading data.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Scale a millisecond duration by a fixed-point factor, rounding to the
/// nearest millisecond. Saturates instead of overflowing.
pub fn scale_ms(duration: Millis, factor: Fixed64) -> Millis {
    if factor <= Fixed64::ZERO {
        return 0;
    }
    // u64 * Q32.32 fits in u128 with room to spare.
    let raw = u128::from(duration) * factor.to_bits() as u128;
    let rounded = (raw + (1u128 << 31)) >> 32;
    u64::try_from(rounded).unwrap_or(u64::MAX)
}
