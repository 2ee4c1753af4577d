//! chanemu Environment Layer
//!
//! Vocabulary shared by every chanemu crate: port and stream identifiers,
//! the hardware identity record, the error type, and the entropy source
//! that every stochastic channel parameter is drawn from.
//!
//! # Core Concept: Injected Entropy
//!
//! The emulator never touches ambient randomness. All channel realisations
//! are drawn from an [`EntropySource`]:
//! - **Tests / simulation**: [`SeededEntropy`] - fixed 64-bit master seed
//! - **Interactive use**: [`OsEntropy`] - one seed drawn from the OS, reported
//!   back through [`EntropySource::seed`] so a run can be replayed
//!
//! # Example
//!
//! ```ignore
//! use chanemu_env::{EntropySource, SeededEntropy};
//!
//! let entropy = SeededEntropy::new(42);
//! let mut pair_rng = entropy.derive_rng((0u64 << 32) | 1);
//! ```

mod context;
mod error;
mod os_impl;
pub mod stream_flags;
mod types;

pub use context::{EntropySource, SeededEntropy};
pub use error::{EmuError, EmuResult};
pub use os_impl::OsEntropy;
pub use stream_flags::{ticks_to_time_ns, time_ns_to_ticks};
pub use types::{Direction, HardwareInfo, PortId, Sample, StreamFormat, StreamResult};
