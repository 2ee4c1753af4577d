//! Entropy source seeded from the operating system.

use crate::EntropySource;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

/// Entropy source for interactive use.
///
/// Draws a single master seed from `OsRng` at construction and derives
/// everything from it afterwards, so a surprising channel realisation can
/// still be replayed with `SeededEntropy::new(source.seed())`.
#[derive(Debug, Clone, Copy)]
pub struct OsEntropy {
    seed: u64,
}

impl OsEntropy {
    /// Creates a new source with a fresh OS-drawn seed.
    pub fn new() -> Self {
        Self {
            seed: OsRng.next_u64(),
        }
    }
    
    /// Creates an Arc-wrapped source for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for OsEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for OsEntropy {
    fn seed(&self) -> u64 {
        self.seed
    }
}
