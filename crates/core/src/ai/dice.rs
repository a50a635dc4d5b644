//! Deterministic sampling helpers over the seeded run RNG.

use rand_chacha::rand_core::RngCore;

/// Uniform value in `[0, n)`. `n` must be positive.
pub fn range(rng: &mut impl RngCore, n: u32) -> u32 {
    debug_assert!(n > 0, "range requires a positive bound");
    rng.next_u32() % n
}

/// Uniform value in `[lo, hi]`.
pub fn range_inclusive(rng: &mut impl RngCore, lo: u32, hi: u32) -> u32 {
    debug_assert!(lo <= hi, "range_inclusive requires lo <= hi");
    lo + range(rng, hi - lo + 1)
}

/// Uniform offset in `[-radius, radius]`.
pub fn offset(rng: &mut impl RngCore, radius: i32) -> i32 {
    debug_assert!(radius >= 0, "offset requires a non-negative radius");
    range(rng, (2 * radius + 1) as u32) as i32 - radius
}

/// True with probability `1 / n`.
pub fn one_in(rng: &mut impl RngCore, n: u32) -> bool {
    range(rng, n) == 0
}

pub fn pick<T: Copy>(rng: &mut impl RngCore, items: &[T]) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    Some(items[range(rng, items.len() as u32) as usize])
}
