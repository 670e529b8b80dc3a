//! Deterministic sequence fixtures for unit tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random DNA, reproducible per `seed`.
pub fn random_dna(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}
