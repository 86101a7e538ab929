//! Pure combat formulas.
//!
//! These functions are deliberately free of battle state and randomness so
//! they can be tested against exact values. The action engine composes them
//! with variance, affinity, and critical modifiers.
//!
//! # Damage model
//!
//! `attack / 2^(defense / attack) * potency / 100`, truncated toward zero.
//! The exponential defense term means defense approaching or exceeding
//! attack sharply suppresses damage, while defense 0 reduces the formula to
//! `attack * potency / 100`.

/// Raw damage before variance, affinity, and critical modifiers.
///
/// Zero or negative attack yields 0 (the exponent would be undefined).
#[must_use]
pub fn damage(attack: i32, defense: i32, potency: i32) -> i32 {
    if attack <= 0 {
        return 0;
    }
    let exponent = f64::from(defense) / f64::from(attack);
    let raw = f64::from(attack) / 2.0_f64.powf(exponent) * (f64::from(potency) / 100.0);
    #[allow(clippy::cast_possible_truncation)]
    let raw = raw.trunc() as i32;
    raw
}

/// Healing amount: `magic / 2 * potency / 100`, scaled by the variance roll
/// before the single truncation.
#[must_use]
pub fn heal(magic: i32, potency: i32, variance: f64) -> i32 {
    let raw = f64::from(magic) / 2.0 * (f64::from(potency) / 100.0) * variance;
    #[allow(clippy::cast_possible_truncation)]
    let raw = raw.trunc() as i32;
    raw
}
