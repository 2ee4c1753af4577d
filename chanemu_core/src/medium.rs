//! Shared Medium
//! =============
//!
//! The one resource every virtual radio talks through. Each registered port
//! owns a transmit buffer and a gain pair; every ordered pair of ports owns a
//! [`PropagationModel`]. A read on port `r` channelizes every *other* port's
//! buffer through `model(p, r)` and sums the results, so a port never hears
//! itself.
//!
//! # Locking
//!
//! ```text
//! table: RwLock ── shared by read/write/gain/reset, exclusive by register_port
//!   └─ ports[i].buffer: RwLock ── exclusive by write(i), shared by read(r != i)
//!   └─ ports[i].gains:  Mutex
//! ```
//!
//! Readers copy a source buffer out under its lock and channelize after
//! releasing it, so a writer never waits on convolution work.
//!
//! # Model arena
//!
//! Models live in a flat append-only `Vec` laid out in square "shells":
//! registering port `k` appends `(0,k) .. (k-1,k)` followed by
//! `(k,0) .. (k,k)`. Existing entries never move, and each pair draws from
//! its own entropy stream, so growing the medium never perturbs old pairs.

use crate::config::{GainRange, MediumConfig};
use crate::frontend::{clip, db_to_linear};
use crate::propagation::PropagationModel;
use crate::stats::{MediumCounters, MediumStats};
use chanemu_env::{
    Direction, EmuError, EmuResult, EntropySource, OsEntropy, PortId, Sample, SeededEntropy,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Gain state of one port, in dB.
#[derive(Debug, Clone, Copy, Default)]
struct PortGains {
    tx_db: f64,
    rx_db: f64,
}

#[derive(Debug)]
struct PortSlot {
    buffer: RwLock<Vec<Sample>>,
    gains: Mutex<PortGains>,
}

#[derive(Debug, Default)]
struct PortTable {
    ports: Vec<PortSlot>,
    models: Vec<Arc<PropagationModel>>,
}

impl PortTable {
    fn check(&self, port: PortId) -> EmuResult<&PortSlot> {
        self.ports
            .get(port.index())
            .ok_or_else(|| EmuError::invalid_port(port, self.ports.len()))
    }
    
    fn model(&self, tx: usize, rx: usize) -> &Arc<PropagationModel> {
        &self.models[arena_index(tx, rx)]
    }
}

/// Position of `(tx, rx)` in the shell-ordered arena.
fn arena_index(tx: usize, rx: usize) -> usize {
    let shell = tx.max(rx);
    if tx < shell {
        shell * shell + tx
    } else {
        shell * shell + shell + rx
    }
}

/// Entropy stream id of the `(tx, rx)` pair.
fn pair_stream(tx: usize, rx: usize) -> u64 {
    ((tx as u64) << 32) | rx as u64
}

/// The shared RF medium.
pub struct SharedMedium {
    config: MediumConfig,
    entropy: Box<dyn EntropySource>,
    table: RwLock<PortTable>,
    counters: MediumCounters,
}

impl SharedMedium {
    /// Creates a medium from `config`.
    ///
    /// Without a configured seed one is drawn from the OS and logged so the
    /// run can be reproduced.
    pub fn new(config: MediumConfig) -> EmuResult<Self> {
        let entropy: Box<dyn EntropySource> = match config.seed {
            Some(seed) => Box::new(SeededEntropy::new(seed)),
            None => {
                let entropy = OsEntropy::new();
                info!(seed = entropy.seed(), "shared medium seeded from OS entropy");
                Box::new(entropy)
            }
        };
        Self::with_entropy(config, entropy)
    }
    
    /// Creates a medium drawing every channel realisation from `entropy`.
    pub fn with_entropy(config: MediumConfig, entropy: Box<dyn EntropySource>) -> EmuResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entropy,
            table: RwLock::new(PortTable::default()),
            counters: MediumCounters::default(),
        })
    }
    
    /// Creates an Arc-wrapped medium for sharing between radios.
    pub fn shared(config: MediumConfig) -> EmuResult<Arc<Self>> {
        Self::new(config).map(Arc::new)
    }
    
    /// Returns the configuration.
    pub fn config(&self) -> &MediumConfig {
        &self.config
    }
    
    /// Returns the master seed channel realisations derive from.
    pub fn seed(&self) -> u64 {
        self.entropy.seed()
    }
    
    /// Number of registered ports.
    pub fn port_count(&self) -> usize {
        self.table.read().ports.len()
    }
    
    /// Capacity of each transmit buffer.
    pub fn buffer_len(&self) -> usize {
        self.config.buffer_len
    }
    
    /// Gain range applied to both directions.
    pub fn gain_range(&self) -> GainRange {
        self.config.gain_range
    }
    
    fn draw_model(&self, tx: usize, rx: usize) -> Arc<PropagationModel> {
        let rng = self.entropy.derive_rng(pair_stream(tx, rx));
        Arc::new(PropagationModel::new(&self.config.channel, rng))
    }
    
    /// Registers a new port and returns its id.
    ///
    /// Extends the model matrix by one row and one column. The self-pair
    /// model is built too; it only supplies receive-side DC offset and IQ
    /// imbalance, never a propagation path.
    pub fn register_port(&self) -> PortId {
        let mut table = self.table.write();
        self.push_port(&mut table)
    }
    
    /// Registers `count` ports under one lock, so the ids are consecutive
    /// even when other threads register concurrently.
    pub fn register_ports(&self, count: usize) -> Vec<PortId> {
        let mut table = self.table.write();
        (0..count).map(|_| self.push_port(&mut table)).collect()
    }
    
    fn push_port(&self, table: &mut PortTable) -> PortId {
        let new = table.ports.len();
        
        for tx in 0..new {
            let model = self.draw_model(tx, new);
            table.models.push(model);
        }
        for rx in 0..=new {
            let model = self.draw_model(new, rx);
            table.models.push(model);
        }
        
        table.ports.push(PortSlot {
            buffer: RwLock::new(vec![Sample::new(0.0, 0.0); self.config.buffer_len]),
            gains: Mutex::new(PortGains::default()),
        });
        debug_assert_eq!(table.models.len(), table.ports.len() * table.ports.len());
        
        debug!(port = new, ports = new + 1, "registered port");
        PortId(new)
    }
    
    /// Returns the model from `tx` to `rx`.
    pub fn model(&self, tx: PortId, rx: PortId) -> EmuResult<Arc<PropagationModel>> {
        let table = self.table.read();
        table.check(tx)?;
        table.check(rx)?;
        Ok(Arc::clone(table.model(tx.index(), rx.index())))
    }
    
    /// Stores `samples` as the current transmission of `port`.
    ///
    /// Samples are clipped, then scaled by the port's transmit gain, and
    /// written from offset 0. Buffer contents past `samples.len()` are left
    /// as they were; input beyond the buffer capacity is dropped.
    pub fn write(&self, port: PortId, samples: &[Sample]) -> EmuResult<()> {
        let table = self.table.read();
        let slot = table.check(port)?;
        
        let len = samples.len().min(self.config.buffer_len);
        let gain = db_to_linear(slot.gains.lock().tx_db) as f32;
        let mut staged = samples[..len].to_vec();
        clip(&mut staged);
        for s in staged.iter_mut() {
            *s *= gain;
        }
        
        slot.buffer.write()[..len].copy_from_slice(&staged);
        
        self.counters.record_write(len);
        trace!(port = port.index(), len, "write");
        Ok(())
    }
    
    /// Returns `count` samples as received on `port`.
    ///
    /// Sums every other port's buffer through its model to this port, then
    /// applies receive gain, this port's receive IQ imbalance and DC offset,
    /// and clips. Requests past the buffer capacity see silence there.
    pub fn read(&self, port: PortId, count: usize) -> EmuResult<Vec<Sample>> {
        let table = self.table.read();
        let slot = table.check(port)?;
        let rx = port.index();
        
        let zero = Sample::new(0.0, 0.0);
        let mut out = vec![zero; count];
        let mut source = vec![zero; count];
        let visible = count.min(self.config.buffer_len);
        
        for (tx, other) in table.ports.iter().enumerate() {
            if tx == rx {
                continue;
            }
            {
                let buffer = other.buffer.read();
                source[..visible].copy_from_slice(&buffer[..visible]);
            }
            let heard = table.model(tx, rx).channelize(&source);
            for (o, h) in out.iter_mut().zip(heard) {
                *o += h;
            }
        }
        
        let gain = db_to_linear(slot.gains.lock().rx_db) as f32;
        let own = table.model(rx, rx);
        let iq = own.iq_imbalance_rx();
        let dc = own.dc_rx();
        for o in out.iter_mut() {
            *o *= gain;
            o.re *= iq;
            *o += dc;
        }
        clip(&mut out);
        
        self.counters.record_read(count);
        trace!(port = rx, count, "read");
        Ok(out)
    }
    
    /// Zeroes every transmit buffer. Gains and models are kept.
    pub fn reset(&self) {
        let table = self.table.read();
        for slot in &table.ports {
            slot.buffer.write().fill(Sample::new(0.0, 0.0));
        }
        self.counters.record_reset();
        debug!(ports = table.ports.len(), "medium buffers reset");
    }
    
    /// Returns the gain of `port` in `direction`, in dB.
    pub fn gain(&self, port: PortId, direction: Direction) -> EmuResult<f64> {
        let table = self.table.read();
        let gains = *table.check(port)?.gains.lock();
        Ok(match direction {
            Direction::Tx => gains.tx_db,
            Direction::Rx => gains.rx_db,
        })
    }
    
    /// Sets the gain of `port` in `direction`, clamped to the gain range.
    ///
    /// Returns the value actually stored.
    pub fn set_gain(&self, port: PortId, direction: Direction, gain_db: f64) -> EmuResult<f64> {
        let table = self.table.read();
        let slot = table.check(port)?;
        let clamped = self.config.gain_range.clamp(gain_db);
        let mut gains = slot.gains.lock();
        match direction {
            Direction::Tx => gains.tx_db = clamped,
            Direction::Rx => gains.rx_db = clamped,
        }
        Ok(clamped)
    }
    
    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> MediumStats {
        self.counters.snapshot(self.port_count())
    }
}

impl std::fmt::Debug for SharedMedium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMedium")
            .field("seed", &self.seed())
            .field("ports", &self.port_count())
            .field("buffer_len", &self.config.buffer_len)
            .finish()
    }
}
