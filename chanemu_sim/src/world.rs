//! SimWorld - a shared medium with a fleet of virtual radios attached.

use chanemu_core::{ChannelParams, DeviceArgs, MediumConfig, SharedMedium, VirtualRadio};
use chanemu_env::{EmuResult, PortId};
use std::sync::Arc;
use tracing::debug;

/// Configuration for a simulated deployment.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for the medium
    pub seed: u64,
    
    /// Number of radios to open
    pub num_radios: usize,
    
    /// Channels (ports) per radio
    pub channels_per_radio: usize,
    
    /// Per-port buffer capacity in samples
    pub buffer_len: usize,
    
    /// Propagation parameters for every port pair
    pub channel: ChannelParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_radios: 4,
            channels_per_radio: 2,
            buffer_len: 4096,
            channel: ChannelParams::default(),
        }
    }
}

impl SimConfig {
    fn medium_config(&self) -> MediumConfig {
        MediumConfig {
            buffer_len: self.buffer_len,
            ..MediumConfig::seeded(self.seed, self.channel.clone())
        }
    }
    
    fn device_args(&self, index: usize) -> DeviceArgs {
        DeviceArgs::new()
            .with("driver", "sim")
            .with("serial", format!("RF3E{:06}", index))
            .with("num_chan", self.channels_per_radio.to_string())
    }
}

/// The SimWorld - container for one medium and its radios.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,
    
    /// Medium shared by every radio
    pub medium: Arc<SharedMedium>,
    
    /// Radios in open order
    pub radios: Vec<VirtualRadio>,
}

impl SimWorld {
    /// Builds the medium and opens `num_radios` radios on it.
    pub fn new(config: SimConfig) -> EmuResult<Self> {
        let medium = SharedMedium::shared(config.medium_config())?;
        let args: Vec<DeviceArgs> = (0..config.num_radios)
            .map(|i| config.device_args(i))
            .collect();
        let radios = VirtualRadio::open_all(&medium, &args)?;
        
        debug!(
            seed = config.seed,
            radios = radios.len(),
            ports = medium.port_count(),
            "sim world ready"
        );
        
        Ok(Self {
            config,
            medium,
            radios,
        })
    }
    
    /// Every port in the medium, in registration order.
    pub fn ports(&self) -> Vec<PortId> {
        self.radios
            .iter()
            .flat_map(|r| r.ports().iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanemu_core::RadioHal;
    
    #[test]
    fn test_world_layout() {
        let world = SimWorld::new(SimConfig {
            num_radios: 3,
            channels_per_radio: 2,
            buffer_len: 64,
            ..Default::default()
        })
        .unwrap();
        
        assert_eq!(world.medium.port_count(), 6);
        assert_eq!(world.ports(), (0..6).map(PortId).collect::<Vec<_>>());
        assert_eq!(world.radios[1].ports(), &[PortId(2), PortId(3)]);
        assert_eq!(world.radios[2].hardware_info().serial, "RF3E000002-SIM");
    }
    
    #[test]
    fn test_zero_buffer_rejected() {
        let result = SimWorld::new(SimConfig {
            buffer_len: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
