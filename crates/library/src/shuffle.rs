//! Deterministic shuffling.
//!
//! A seed string is hashed with 32-bit FNV-1a, the hash seeds a linear
//! congruential generator, and the generator drives a Fisher–Yates shuffle.
//! The same seed over the same input always yields the same permutation, so
//! clients can page through a random ordering without the server holding
//! any state.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// 32-bit FNV-1a over the UTF-8 bytes of `seed`.
pub fn hash_seed(seed: &str) -> u32 {
    seed.bytes()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME))
}

/// Numerical Recipes LCG, all arithmetic mod 2³².
#[derive(Debug, Clone)]
struct Lcg(u32);

impl Iterator for Lcg {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.0 = self.0.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
        Some(self.0)
    }
}

/// Shuffle `items` in place, deterministically for a given `seed`.
///
/// An empty seed behaves as `"0"`.
pub fn seeded_shuffle<T>(items: &mut [T], seed: &str) {
    let seed = if seed.is_empty() { "0" } else { seed };
    let mut rng = Lcg(hash_seed(seed));
    for i in (1..items.len()).rev() {
        let Some(state) = rng.next() else { break };
        // `usize` is at least 32 bits on every supported target.
        let j = state as usize % (i + 1);
        items.swap(i, j);
    }
}
