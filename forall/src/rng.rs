//! Deterministic, replayable randomness threaded through every generator.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// A seeded pseudo-random generator that remembers its seed
///
/// Two sources built from the same seed and driven through the same sequence
/// of generator calls yield identical values. Every generator in the crate
/// draws from an explicitly passed `RandomSource`; there is no process-wide
/// default generator.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    seed: u64,
}

impl RandomSource {
    /// Create a reproducible source from a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a source from a fresh seed drawn from process entropy
    ///
    /// The drawn seed is kept so a failing run can be replayed with
    /// [`RandomSource::seeded`].
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        let seed = StdRng::from_entropy().next_u64();
        tracing::trace!(seed, "drew fresh random seed");
        Self::seeded(seed)
    }

    /// Create a seeded source when a seed is given, a fresh one otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::default(),
        }
    }

    /// The seed this source was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = RandomSource::seeded(12345);
        let mut b = RandomSource::seeded(12345);

        let xs: Vec<u32> = (0..16).map(|_| a.r#gen()).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.r#gen()).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.seed(), 12345);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = RandomSource::seeded(1);
        let mut b = RandomSource::seeded(2);

        let xs: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_default_source_is_replayable() {
        let mut fresh = RandomSource::default();
        let mut replay = RandomSource::seeded(fresh.seed());

        for _ in 0..8 {
            assert_eq!(fresh.gen_range(0..1000), replay.gen_range(0..1000));
        }
    }

    #[test]
    fn test_from_seed_option() {
        assert_eq!(RandomSource::from_seed_option(Some(9)).seed(), 9);

        let mut a = RandomSource::from_seed_option(Some(9));
        let mut b = RandomSource::seeded(9);
        assert_eq!(a.next_u32(), b.next_u32());
    }
}
