//! Entropy source abstraction for channel realisations.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Source of every random draw the emulator makes.
///
/// Each consumer asks for its own RNG stream by a stable `stream` id
/// instead of sharing one generator, so the order in which ports are
/// registered or read never changes what a given stream produces.
///
/// # Implementations
///
/// - **Reproducible**: `SeededEntropy` - fixed master seed
/// - **Interactive**: `OsEntropy` - master seed drawn once from the OS
pub trait EntropySource: Send + Sync + 'static {
    /// Returns the master seed (for logging / replay).
    fn seed(&self) -> u64;
    
    /// Derives an independent, reproducible RNG for `stream`.
    ///
    /// Same master seed + same stream id = same sequence.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(mix_seed(self.seed(), stream))
    }
}

/// Combines a master seed with a stream id.
///
/// `master XOR (stream * prime)` after spreading the master with the
/// golden-ratio constant, so neighbouring stream ids land far apart.
pub(crate) fn mix_seed(master: u64, stream: u64) -> u64 {
    master
        .wrapping_mul(0x9e3779b97f4a7c15)
        .wrapping_add(stream.wrapping_mul(0x517cc1b727220a95))
}

/// Deterministic entropy backed by a fixed master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededEntropy {
    seed: u64,
}

impl SeededEntropy {
    /// Creates a new source with the given master seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl EntropySource for SeededEntropy {
    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    
    #[test]
    fn test_same_seed_same_stream() {
        let a = SeededEntropy::new(42);
        let b = SeededEntropy::new(42);
        
        let x: u64 = a.derive_rng(3).gen();
        let y: u64 = b.derive_rng(3).gen();
        assert_eq!(x, y);
    }
    
    #[test]
    fn test_streams_are_independent() {
        let entropy = SeededEntropy::new(42);
        
        let x: u64 = entropy.derive_rng(1).gen();
        let y: u64 = entropy.derive_rng(2).gen();
        assert_ne!(x, y);
    }
    
    #[test]
    fn test_different_seeds_differ() {
        let x: u64 = SeededEntropy::new(1).derive_rng(0).gen();
        let y: u64 = SeededEntropy::new(2).derive_rng(0).gen();
        assert_ne!(x, y);
    }
}
