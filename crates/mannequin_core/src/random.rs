//! # Random Stream
//!
//! The single pseudo-random stream a stage load consumes.
//!
//! Selection policies never own randomness; they borrow this stream (or any
//! other [`rand::Rng`]) from the caller. Two loads fed the same seed make the
//! same choices, which is what replay and tests rely on.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded, replayable random stream.
#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: ChaCha8Rng,
    seed: u64,
}

impl RandomStream {
    /// Creates a stream from a 64-bit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed this stream was created from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for RandomStream {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
