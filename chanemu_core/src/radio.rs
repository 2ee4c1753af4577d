//! Virtual Radio
//! =============
//!
//! Device façade over the shared medium. Each radio owns a contiguous range
//! of ports, one per logical channel, and exposes the slice of the
//! hardware-abstraction surface that control software actually depends on:
//!
//! - tuning (sample rate, frequency, bandwidth): cached, no physical effect
//! - gain: stored in the medium, applied on every read/write
//! - streams: handles bound to a subset of this radio's ports
//! - identity: a static record whose serial ends in `-SIM`
//!
//! Everything else lives on [`HalCompat`](crate::compat::HalCompat) as
//! no-ops.
//!
//! # Known divergence from hardware
//!
//! Stream reads and writes never block, time out or short-transfer: `ret`
//! always equals the requested count. Flags, timestamps and timeouts are
//! accepted and ignored.

use crate::config::GainRange;
use crate::medium::SharedMedium;
use crate::stream::StreamHandle;
use chanemu_env::{
    Direction, EmuError, EmuResult, HardwareInfo, PortId, Sample, StreamFormat, StreamResult,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

/// Channels per radio when the device arguments do not say otherwise.
pub const DEFAULT_CHANNELS: usize = 2;

const BUILD_TAG: &str = "2020.11.0.1-f0f0f0";

/// Device arguments in `key=value,key=value` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceArgs {
    args: BTreeMap<String, String>,
}

impl DeviceArgs {
    /// Creates empty arguments.
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Parses `"driver=iris,serial=RF3E000123"`. Entries without `=` are
    /// skipped.
    pub fn parse(args: &str) -> Self {
        let mut parsed = BTreeMap::new();
        for pair in args.split(',') {
            if let Some((key, value)) = pair.split_once('=') {
                parsed.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { args: parsed }
    }
    
    /// Adds or replaces one argument.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
    
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
    
    pub fn serial(&self) -> Option<&str> {
        self.get("serial")
    }
    
    /// Number of channels to register, from `num_chan`.
    pub fn num_channels(&self) -> EmuResult<usize> {
        match self.get("num_chan") {
            None => Ok(DEFAULT_CHANNELS),
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| EmuError::config(format!("num_chan is not a count: {}", raw))),
        }
    }
}

impl std::fmt::Display for DeviceArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .args
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl From<HashMap<String, String>> for DeviceArgs {
    fn from(map: HashMap<String, String>) -> Self {
        Self {
            args: map.into_iter().collect(),
        }
    }
}

/// The meaningful part of the hardware-abstraction surface.
pub trait RadioHal {
    /// Static identity of the device.
    fn hardware_info(&self) -> HardwareInfo;
    
    /// Number of logical channels in `direction`.
    fn num_channels(&self, direction: Direction) -> usize;
    
    fn sample_rate(&self, direction: Direction, channel: usize) -> EmuResult<Option<f64>>;
    fn set_sample_rate(&mut self, direction: Direction, channel: usize, rate: f64) -> EmuResult<()>;
    
    fn frequency(&self, direction: Direction, channel: usize, name: &str) -> EmuResult<Option<f64>>;
    fn set_frequency(
        &mut self,
        direction: Direction,
        channel: usize,
        name: &str,
        frequency: f64,
    ) -> EmuResult<()>;
    
    fn bandwidth(&self, direction: Direction, channel: usize) -> EmuResult<Option<f64>>;
    fn set_bandwidth(&mut self, direction: Direction, channel: usize, bandwidth: f64) -> EmuResult<()>;
    
    /// Overall gain in dB.
    fn gain(&self, direction: Direction, channel: usize) -> EmuResult<f64>;
    
    /// Sets the overall gain in dB, clamped to the range. Returns the
    /// stored value.
    fn set_gain(&mut self, direction: Direction, channel: usize, gain_db: f64) -> EmuResult<f64>;
    
    fn gain_range(&self, direction: Direction, channel: usize) -> EmuResult<GainRange>;
    
    /// Gain of a named stage. Only one stage is modelled, so every name
    /// addresses the overall gain.
    fn gain_element(&self, direction: Direction, channel: usize, _name: &str) -> EmuResult<f64> {
        self.gain(direction, channel)
    }
    
    fn set_gain_element(
        &mut self,
        direction: Direction,
        channel: usize,
        _name: &str,
        gain_db: f64,
    ) -> EmuResult<f64> {
        self.set_gain(direction, channel, gain_db)
    }
    
    fn gain_element_range(
        &self,
        direction: Direction,
        channel: usize,
        _name: &str,
    ) -> EmuResult<GainRange> {
        self.gain_range(direction, channel)
    }
    
    /// Opens a stream over the given logical channels.
    fn setup_stream(
        &mut self,
        direction: Direction,
        format: StreamFormat,
        channels: &[usize],
        args: &DeviceArgs,
    ) -> EmuResult<StreamHandle>;
    
    fn activate_stream(&mut self, _stream: &StreamHandle) -> EmuResult<()> {
        Ok(())
    }
    
    fn deactivate_stream(&mut self, _stream: &StreamHandle) -> EmuResult<()> {
        Ok(())
    }
    
    fn close_stream(&mut self, _stream: StreamHandle) {}
    
    fn write_stream(
        &self,
        stream: &StreamHandle,
        buffers: &[&[Sample]],
        count: usize,
        flags: i32,
        time_ns: i64,
        timeout_us: i64,
    ) -> EmuResult<StreamResult>;
    
    fn read_stream(
        &self,
        stream: &StreamHandle,
        buffers: &mut [&mut [Sample]],
        count: usize,
        flags: i32,
        time_ns: i64,
        timeout_us: i64,
    ) -> EmuResult<StreamResult>;
}

/// Cached tuning of one channel in one direction.
#[derive(Debug, Clone, Default)]
struct Tuning {
    sample_rate: Option<f64>,
    bandwidth: Option<f64>,
    frequencies: HashMap<String, f64>,
}

/// A simulated SDR attached to a shared medium.
#[derive(Debug)]
pub struct VirtualRadio {
    medium: Arc<SharedMedium>,
    ports: Vec<PortId>,
    info: HardwareInfo,
    /// Indexed `[channel][direction]`
    tuning: Vec<[Tuning; 2]>,
}

impl VirtualRadio {
    /// Creates a radio, registering one new port per channel.
    pub fn open(medium: Arc<SharedMedium>, args: &DeviceArgs) -> EmuResult<Self> {
        let channels = args.num_channels()?;
        let ports = medium.register_ports(channels);
        let serial = match args.serial() {
            Some(serial) => format!("{}-SIM", serial),
            None => "NoSerial-SIM".to_string(),
        };
        let info = HardwareInfo {
            driver: BUILD_TAG.to_string(),
            firmware: BUILD_TAG.to_string(),
            fpga: BUILD_TAG.to_string(),
            frontend: "SIM".to_string(),
            revision: "Simulated-1.00-MIMO".to_string(),
            serial,
        };
        
        debug!(
            serial = %info.serial,
            first_port = ports.first().map(|p| p.index()),
            channels,
            "opened virtual radio"
        );
        
        Ok(Self {
            medium,
            ports,
            info,
            tuning: vec![Default::default(); channels],
        })
    }
    
    /// Creates one radio per argument set, in order.
    pub fn open_all(medium: &Arc<SharedMedium>, args: &[DeviceArgs]) -> EmuResult<Vec<Self>> {
        args.iter()
            .map(|a| Self::open(Arc::clone(medium), a))
            .collect()
    }
    
    /// The medium this radio transmits into.
    pub fn medium(&self) -> &Arc<SharedMedium> {
        &self.medium
    }
    
    /// Ports owned by this radio, channel 0 first.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }
    
    /// Port backing logical `channel`.
    pub fn port(&self, channel: usize) -> EmuResult<PortId> {
        self.ports
            .get(channel)
            .copied()
            .ok_or(EmuError::InvalidChannel {
                channel,
                count: self.ports.len(),
            })
    }
    
    fn tuning(&self, direction: Direction, channel: usize) -> EmuResult<&Tuning> {
        self.port(channel)?;
        Ok(&self.tuning[channel][direction as usize])
    }
    
    fn tuning_mut(&mut self, direction: Direction, channel: usize) -> EmuResult<&mut Tuning> {
        self.port(channel)?;
        Ok(&mut self.tuning[channel][direction as usize])
    }
}

impl RadioHal for VirtualRadio {
    fn hardware_info(&self) -> HardwareInfo {
        self.info.clone()
    }
    
    fn num_channels(&self, _direction: Direction) -> usize {
        self.ports.len()
    }
    
    fn sample_rate(&self, direction: Direction, channel: usize) -> EmuResult<Option<f64>> {
        Ok(self.tuning(direction, channel)?.sample_rate)
    }
    
    fn set_sample_rate(&mut self, direction: Direction, channel: usize, rate: f64) -> EmuResult<()> {
        self.tuning_mut(direction, channel)?.sample_rate = Some(rate);
        Ok(())
    }
    
    fn frequency(&self, direction: Direction, channel: usize, name: &str) -> EmuResult<Option<f64>> {
        Ok(self.tuning(direction, channel)?.frequencies.get(name).copied())
    }
    
    fn set_frequency(
        &mut self,
        direction: Direction,
        channel: usize,
        name: &str,
        frequency: f64,
    ) -> EmuResult<()> {
        self.tuning_mut(direction, channel)?
            .frequencies
            .insert(name.to_string(), frequency);
        Ok(())
    }
    
    fn bandwidth(&self, direction: Direction, channel: usize) -> EmuResult<Option<f64>> {
        Ok(self.tuning(direction, channel)?.bandwidth)
    }
    
    fn set_bandwidth(&mut self, direction: Direction, channel: usize, bandwidth: f64) -> EmuResult<()> {
        self.tuning_mut(direction, channel)?.bandwidth = Some(bandwidth);
        Ok(())
    }
    
    fn gain(&self, direction: Direction, channel: usize) -> EmuResult<f64> {
        self.medium.gain(self.port(channel)?, direction)
    }
    
    fn set_gain(&mut self, direction: Direction, channel: usize, gain_db: f64) -> EmuResult<f64> {
        self.medium.set_gain(self.port(channel)?, direction, gain_db)
    }
    
    fn gain_range(&self, _direction: Direction, channel: usize) -> EmuResult<GainRange> {
        self.port(channel)?;
        Ok(self.medium.gain_range())
    }
    
    fn setup_stream(
        &mut self,
        direction: Direction,
        format: StreamFormat,
        channels: &[usize],
        _args: &DeviceArgs,
    ) -> EmuResult<StreamHandle> {
        let ports = channels
            .iter()
            .map(|&ch| self.port(ch))
            .collect::<EmuResult<Vec<_>>>()?;
        debug!(serial = %self.info.serial, ?direction, %format, ?ports, "stream set up");
        Ok(StreamHandle::new(Arc::clone(&self.medium), direction, format, ports))
    }
    
    fn write_stream(
        &self,
        stream: &StreamHandle,
        buffers: &[&[Sample]],
        count: usize,
        flags: i32,
        time_ns: i64,
        _timeout_us: i64,
    ) -> EmuResult<StreamResult> {
        trace!(count, flags, time_ns, "write_stream");
        stream.write(buffers, count)
    }
    
    fn read_stream(
        &self,
        stream: &StreamHandle,
        buffers: &mut [&mut [Sample]],
        count: usize,
        flags: i32,
        time_ns: i64,
        _timeout_us: i64,
    ) -> EmuResult<StreamResult> {
        trace!(count, flags, time_ns, "read_stream");
        stream.read(buffers, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelParams, MediumConfig};
    
    fn medium() -> Arc<SharedMedium> {
        let config = MediumConfig {
            buffer_len: 512,
            ..MediumConfig::seeded(11, ChannelParams::ideal())
        };
        SharedMedium::shared(config).unwrap()
    }
    
    #[test]
    fn test_parse_args() {
        let args = DeviceArgs::parse("driver=iris, serial = RF3E000123,bogus");
        assert_eq!(args.get("driver"), Some("iris"));
        assert_eq!(args.serial(), Some("RF3E000123"));
        assert_eq!(args.get("bogus"), None);
        assert_eq!(args.to_string(), "driver=iris,serial=RF3E000123");
    }
    
    #[test]
    fn test_num_channels_arg() {
        assert_eq!(DeviceArgs::new().num_channels().unwrap(), 2);
        assert_eq!(DeviceArgs::new().with("num_chan", "4").num_channels().unwrap(), 4);
        assert!(DeviceArgs::new().with("num_chan", "two").num_channels().is_err());
    }
    
    #[test]
    fn test_identity() {
        let medium = medium();
        let radio = VirtualRadio::open(medium.clone(), &DeviceArgs::parse("serial=RF3E000123")).unwrap();
        let info = radio.hardware_info();
        assert_eq!(info.serial, "RF3E000123-SIM");
        assert_eq!(info.frontend, "SIM");
        
        let anon = VirtualRadio::open(medium, &DeviceArgs::new()).unwrap();
        assert_eq!(anon.hardware_info().serial, "NoSerial-SIM");
    }
    
    #[test]
    fn test_radios_get_consecutive_ports() {
        let medium = medium();
        let args = vec![
            DeviceArgs::parse("serial=A"),
            DeviceArgs::parse("serial=B,num_chan=3"),
        ];
        let radios = VirtualRadio::open_all(&medium, &args).unwrap();
        
        assert_eq!(radios[0].ports(), &[PortId(0), PortId(1)]);
        assert_eq!(radios[1].ports(), &[PortId(2), PortId(3), PortId(4)]);
        assert_eq!(medium.port_count(), 5);
    }
    
    #[test]
    fn test_dropping_radio_keeps_ports() {
        let medium = medium();
        {
            let _radio = VirtualRadio::open(medium.clone(), &DeviceArgs::new()).unwrap();
        }
        let next = VirtualRadio::open(medium.clone(), &DeviceArgs::new()).unwrap();
        assert_eq!(next.ports()[0], PortId(2));
        assert_eq!(medium.port_count(), 4);
    }
    
    #[test]
    fn test_tuning_is_store_only() {
        let mut radio = VirtualRadio::open(medium(), &DeviceArgs::new()).unwrap();
        assert_eq!(radio.sample_rate(Direction::Rx, 0).unwrap(), None);
        
        radio.set_sample_rate(Direction::Rx, 0, 5e6).unwrap();
        radio.set_frequency(Direction::Tx, 1, "RF", 3.6e9).unwrap();
        radio.set_bandwidth(Direction::Rx, 0, 30e6).unwrap();
        
        assert_eq!(radio.sample_rate(Direction::Rx, 0).unwrap(), Some(5e6));
        assert_eq!(radio.sample_rate(Direction::Tx, 0).unwrap(), None);
        assert_eq!(radio.frequency(Direction::Tx, 1, "RF").unwrap(), Some(3.6e9));
        assert_eq!(radio.frequency(Direction::Tx, 1, "BB").unwrap(), None);
        assert_eq!(radio.bandwidth(Direction::Rx, 0).unwrap(), Some(30e6));
    }
    
    #[test]
    fn test_gain_lives_in_medium() {
        let medium = medium();
        let mut radio = VirtualRadio::open(medium.clone(), &DeviceArgs::new()).unwrap();
        
        assert_eq!(radio.set_gain(Direction::Tx, 1, 80.0).unwrap(), 50.0);
        assert_eq!(radio.gain(Direction::Tx, 1).unwrap(), 50.0);
        assert_eq!(medium.gain(radio.port(1).unwrap(), Direction::Tx).unwrap(), 50.0);
        assert_eq!(radio.gain(Direction::Rx, 1).unwrap(), 0.0);
        
        radio.set_gain_element(Direction::Rx, 0, "ATTN1", -70.0).unwrap();
        assert_eq!(radio.gain(Direction::Rx, 0).unwrap(), -50.0);
        assert_eq!(radio.gain_range(Direction::Rx, 0).unwrap().as_array(), [-50.0, 50.0]);
    }
    
    #[test]
    fn test_bad_channel() {
        let mut radio = VirtualRadio::open(medium(), &DeviceArgs::new()).unwrap();
        assert!(matches!(
            radio.gain(Direction::Rx, 2),
            Err(EmuError::InvalidChannel { channel: 2, count: 2 })
        ));
        assert!(radio.set_sample_rate(Direction::Tx, 5, 1e6).is_err());
        assert!(radio
            .setup_stream(Direction::Rx, StreamFormat::CF32, &[0, 3], &DeviceArgs::new())
            .is_err());
    }
    
    #[test]
    fn test_stream_between_radios() {
        let medium = medium();
        let mut tx = VirtualRadio::open(medium.clone(), &DeviceArgs::parse("serial=TX")).unwrap();
        let mut rx = VirtualRadio::open(medium, &DeviceArgs::parse("serial=RX")).unwrap();
        
        let tx_stream = tx
            .setup_stream(Direction::Tx, StreamFormat::CF32, &[1], &DeviceArgs::new())
            .unwrap();
        let rx_stream = rx
            .setup_stream(Direction::Rx, StreamFormat::CF32, &[0], &DeviceArgs::new())
            .unwrap();
        assert_eq!(tx_stream.ports(), &[PortId(1)]);
        assert_eq!(rx_stream.ports(), &[PortId(2)]);
        tx.activate_stream(&tx_stream).unwrap();
        rx.activate_stream(&rx_stream).unwrap();
        
        let sent = vec![Sample::new(0.5, -0.25); 64];
        let status = tx
            .write_stream(&tx_stream, &[&sent[..]], 64, 0, 0, 1_000_000)
            .unwrap();
        assert_eq!(status.ret, 64);
        
        let mut heard = vec![Sample::new(0.0, 0.0); 64];
        let status = rx
            .read_stream(&rx_stream, &mut [&mut heard[..]], 64, 0, 0, 1_000_000)
            .unwrap();
        assert_eq!(status.ret, 64);
        assert_eq!(heard, sent);
        
        rx.deactivate_stream(&rx_stream).unwrap();
        rx.close_stream(rx_stream);
        tx.close_stream(tx_stream);
    }
}
