//! chanemu Core - Shared RF-Medium Emulator
//!
//! Lets control and test software drive an SDR hardware-abstraction API
//! with no radios attached. Every virtual radio transmits into and receives
//! from one [`SharedMedium`], which carries samples between ports through a
//! static multipath [`PropagationModel`] per port pair:
//! 1. **Propagation**: taps, delay, CFO, DC offset, IQ imbalance, noise
//! 2. **Medium**: per-port buffers and gains, self-excluded superposition
//! 3. **Façade**: [`VirtualRadio`] with streams, gains and cached tuning

pub mod compat;
pub mod config;
pub mod frontend;
pub mod medium;
pub mod propagation;
pub mod radio;
pub mod stats;
pub mod stream;

// Re-export key types for convenience
pub use compat::HalCompat;
pub use config::{ChannelParams, GainRange, MediumConfig};
pub use medium::SharedMedium;
pub use propagation::{ChannelRealisation, PropagationModel, Tap};
pub use radio::{DeviceArgs, RadioHal, VirtualRadio};
pub use stats::MediumStats;
pub use stream::StreamHandle;

pub use chanemu_env::{Direction, EmuError, EmuResult, HardwareInfo, PortId, Sample, StreamFormat, StreamResult};
