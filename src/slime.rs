//! The deterministic slime-chunk predicate.

use crate::rng::JavaRng;

/// XORed into the chunk seed before it drives the RNG. Named so the
/// formula in [`is_slime`] doesn't read as a bare magic number.
const SEED_XOR: i64 = 987234911;

/// Returns whether the chunk at `(x, z)` is a slime chunk for the given
/// world seed.
///
/// The arithmetic here is load-bearing and intentionally asymmetric: the
/// `x` terms are squared and multiplied entirely in wrapping 32-bit
/// arithmetic before being widened to 64 bits, while the `z*z` term widens
/// to 64 bits *before* its multiplier is applied. Do not "fix" this into a
/// symmetric form — doing so changes which chunks are classified as slime
/// chunks for every seed. // sic
pub fn is_slime(world_seed: i64, x: i32, z: i32) -> bool {
    let x_sq_term = x.wrapping_mul(x).wrapping_mul(4987142) as i64;
    let x_lin_term = x.wrapping_mul(5947611) as i64;
    let z_sq_term = (z.wrapping_mul(z) as i64).wrapping_mul(4392871);
    let z_lin_term = z.wrapping_mul(389711) as i64;

    let chunk_seed = world_seed
        .wrapping_add(x_sq_term)
        .wrapping_add(x_lin_term)
        .wrapping_add(z_sq_term)
        .wrapping_add(z_lin_term)
        ^ SEED_XOR;

    let mut rng = JavaRng::new(chunk_seed);
    rng.next_int(10) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_1_origin_is_not_slime() {
        // Reproduced from a bit-exact reference simulation of this predicate.
        assert!(!is_slime(1, 0, 0));
    }

    #[test]
    fn is_deterministic() {
        for _ in 0..5 {
            assert_eq!(is_slime(1234, 17, -42), is_slime(1234, 17, -42));
        }
    }

    #[test]
    fn varies_across_seeds() {
        let results: Vec<bool> = (0..20).map(|s| is_slime(s, 5, 5)).collect();
        assert!(results.iter().any(|&b| b));
        assert!(results.iter().any(|&b| !b));
    }
}
