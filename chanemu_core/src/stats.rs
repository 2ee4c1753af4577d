//! Medium activity counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of medium activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumStats {
    /// Registered ports
    pub ports: usize,
    /// Completed `read` calls
    pub reads: u64,
    /// Completed `write` calls
    pub writes: u64,
    /// Samples returned by reads
    pub samples_read: u64,
    /// Samples stored by writes
    pub samples_written: u64,
    /// Buffer resets
    pub resets: u64,
}

/// Lock-free counters updated on the I/O path.
#[derive(Debug, Default)]
pub(crate) struct MediumCounters {
    reads: AtomicU64,
    writes: AtomicU64,
    samples_read: AtomicU64,
    samples_written: AtomicU64,
    resets: AtomicU64,
}

impl MediumCounters {
    pub(crate) fn record_read(&self, samples: usize) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.samples_read.fetch_add(samples as u64, Ordering::Relaxed);
    }
    
    pub(crate) fn record_write(&self, samples: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.samples_written.fetch_add(samples as u64, Ordering::Relaxed);
    }
    
    pub(crate) fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
    
    pub(crate) fn snapshot(&self, ports: usize) -> MediumStats {
        MediumStats {
            ports,
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            samples_read: self.samples_read.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}
