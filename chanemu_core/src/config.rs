//! Channel and medium configuration.
//!
//! Defaults describe a deliberately impaired indoor link: roughly 40 dB of
//! path loss, four taps over a five-sample spread, a small DC offset and IQ
//! imbalance, a slow CFO and a -70 dB noise floor. Every field can be
//! overridden from JSON; missing fields keep their defaults.

use chanemu_env::{EmuError, EmuResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters a `PropagationModel` is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    /// Noise floor in dB (per I/Q component); `None` disables noise
    pub noise_floor_db: Option<f64>,
    /// Give every tap a uniform random phase
    pub phase_shift: bool,
    /// Mean attenuation of the first tap in dB (negative = loss)
    pub attenuation_db: f64,
    /// Standard deviation of the per-tap attenuation jitter in dB
    pub attenuation_std_db: f64,
    /// Fixed propagation delay in samples
    pub base_delay: usize,
    /// Upper bound (inclusive) of the random extra delay in samples
    pub delay_jitter: usize,
    /// Standard deviation of each DC-offset component
    pub dc_offset_std: f64,
    /// Standard deviation of the IQ-imbalance factor around 1.0
    pub iq_imbalance_std: f64,
    /// Carrier frequency offset in radians per sample
    pub cfo: f64,
    /// Maximum tap delay offset in samples
    pub delay_spread: usize,
    /// Number of propagation paths
    pub tap_count: usize,
    /// Extra attenuation per secondary tap in dB
    pub tap_attenuation_db: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            noise_floor_db: Some(-70.0),
            phase_shift: true,
            attenuation_db: -40.0,
            attenuation_std_db: 5.0,
            base_delay: 48,
            delay_jitter: 5,
            dc_offset_std: 0.1,
            iq_imbalance_std: 0.1,
            cfo: 0.00005,
            delay_spread: 5,
            tap_count: 4,
            tap_attenuation_db: 12.0,
        }
    }
}

impl ChannelParams {
    /// A single unit-gain tap with no delay and no impairments.
    pub fn ideal() -> Self {
        Self {
            noise_floor_db: None,
            phase_shift: false,
            attenuation_db: 0.0,
            attenuation_std_db: 0.0,
            base_delay: 0,
            delay_jitter: 0,
            dc_offset_std: 0.0,
            iq_imbalance_std: 0.0,
            cfo: 0.0,
            delay_spread: 1,
            tap_count: 1,
            tap_attenuation_db: 0.0,
        }
    }
    
    /// Sets the attenuation and removes its jitter.
    pub fn with_attenuation(mut self, attenuation_db: f64) -> Self {
        self.attenuation_db = attenuation_db;
        self.attenuation_std_db = 0.0;
        self
    }
    
    /// Sets a fixed base delay with no jitter.
    pub fn with_delay(mut self, base_delay: usize) -> Self {
        self.base_delay = base_delay;
        self.delay_jitter = 0;
        self
    }
    
    /// Sets the noise floor (`None` disables noise).
    pub fn with_noise(mut self, noise_floor_db: Option<f64>) -> Self {
        self.noise_floor_db = noise_floor_db;
        self
    }
}

/// Allowed gain range in dB for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainRange {
    pub min_db: f64,
    pub max_db: f64,
}

impl GainRange {
    /// Clamps `value_db` into the range. NaN maps to the lower bound.
    pub fn clamp(&self, value_db: f64) -> f64 {
        if value_db.is_nan() {
            return self.min_db;
        }
        value_db.clamp(self.min_db, self.max_db)
    }
    
    /// Returns `[min, max]`.
    pub fn as_array(&self) -> [f64; 2] {
        [self.min_db, self.max_db]
    }
}

impl Default for GainRange {
    fn default() -> Self {
        Self {
            min_db: -50.0,
            max_db: 50.0,
        }
    }
}

/// Configuration of one shared medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediumConfig {
    /// Capacity of each per-port transmit buffer in samples
    pub buffer_len: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Parameters every port pair is drawn from
    pub channel: ChannelParams,
    /// Gain range applied to both directions
    pub gain_range: GainRange,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            buffer_len: 204_800,
            seed: None,
            channel: ChannelParams::default(),
            gain_range: GainRange::default(),
        }
    }
}

impl MediumConfig {
    /// Creates a seeded config with the given channel parameters.
    pub fn seeded(seed: u64, channel: ChannelParams) -> Self {
        Self {
            seed: Some(seed),
            channel,
            ..Default::default()
        }
    }
    
    /// Parses a config from JSON text.
    pub fn from_json_str(json: &str) -> EmuResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
    
    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EmuResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
    
    /// Rejects settings the medium cannot run with.
    ///
    /// Channel parameters are not checked here; out-of-range tap settings
    /// are corrected when each model is built.
    pub fn validate(&self) -> EmuResult<()> {
        if self.buffer_len == 0 {
            return Err(EmuError::config("buffer_len must be at least 1"));
        }
        if !(self.gain_range.min_db <= self.gain_range.max_db) {
            return Err(EmuError::config(format!(
                "gain range [{}, {}] is empty",
                self.gain_range.min_db, self.gain_range.max_db
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_default_channel_matches_indoor_link() {
        let params = ChannelParams::default();
        assert_eq!(params.tap_count, 4);
        assert_eq!(params.delay_spread, 5);
        assert_eq!(params.base_delay, 48);
        assert_eq!(params.noise_floor_db, Some(-70.0));
    }
    
    #[test]
    fn test_gain_range_clamp() {
        let range = GainRange::default();
        assert_eq!(range.clamp(75.0), 50.0);
        assert_eq!(range.clamp(-80.0), -50.0);
        assert_eq!(range.clamp(12.5), 12.5);
        assert_eq!(range.clamp(f64::NAN), -50.0);
    }
    
    #[test]
    fn test_config_partial_json() {
        let config = MediumConfig::from_json_str(
            r#"{ "buffer_len": 4096, "seed": 7, "channel": { "tap_count": 2 } }"#,
        )
        .unwrap();
        
        assert_eq!(config.buffer_len, 4096);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.channel.tap_count, 2);
        // Untouched fields keep defaults
        assert_eq!(config.channel.delay_spread, 5);
        assert_eq!(config.gain_range, GainRange::default());
    }
    
    #[test]
    fn test_config_rejects_zero_buffer() {
        let err = MediumConfig::from_json_str(r#"{ "buffer_len": 0 }"#).unwrap_err();
        assert!(matches!(err, EmuError::Config(_)));
    }
    
    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medium.json");
        let config = MediumConfig {
            buffer_len: 8192,
            gain_range: GainRange { min_db: -30.0, max_db: 20.0 },
            ..MediumConfig::seeded(99, ChannelParams::default().with_delay(12))
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        
        assert_eq!(MediumConfig::from_json_file(&path).unwrap(), config);
    }
    
    #[test]
    fn test_config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = MediumConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, EmuError::Io(_)));
        
        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{ buffer_len: ").unwrap();
        let err = MediumConfig::from_json_file(&garbled).unwrap_err();
        assert!(matches!(err, EmuError::Json(_)));
    }
    
    #[test]
    fn test_config_null_noise_disables() {
        let config =
            MediumConfig::from_json_str(r#"{ "channel": { "noise_floor_db": null } }"#).unwrap();
        assert_eq!(config.channel.noise_floor_db, None);
    }
}
