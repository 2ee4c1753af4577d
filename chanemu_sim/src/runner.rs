//! Scenario runner - executes emulator self-check scenarios.

use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use chanemu_core::{ChannelParams, MediumStats, RadioHal, VirtualRadio};
use chanemu_env::{Direction, EmuError, PortId, Sample, StreamFormat};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,
    
    /// Seed used
    pub seed: u64,
    
    /// Whether scenario passed all assertions
    pub passed: bool,
    
    /// Failure message if any
    pub failure_reason: Option<String>,
    
    /// Medium activity at the end of the run
    pub stats: MediumStats,
}

type Outcome = Result<MediumStats, String>;

fn fail(e: EmuError) -> String {
    e.to_string()
}

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(reason())
    }
}

fn close(a: Sample, b: Sample, tol: f32) -> bool {
    (a - b).norm() <= tol
}

/// Runs emulator scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,
    
    /// Number of radios
    num_radios: usize,
    
    /// Samples per transfer
    block_len: usize,
    
    /// Channel override for channel-agnostic scenarios
    channel: Option<ChannelParams>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_radios: usize) -> Self {
        Self {
            seed,
            num_radios: num_radios.max(2),
            block_len: 512,
            channel: None,
        }
    }
    
    /// Sets the samples moved per read or write.
    pub fn with_block_len(mut self, block_len: usize) -> Self {
        self.block_len = block_len.max(1);
        self
    }
    
    /// Replaces the default channel in scenarios that do not need a
    /// specific one.
    pub fn with_channel(mut self, channel: Option<ChannelParams>) -> Self {
        self.channel = channel;
        self
    }
    
    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        
        let outcome = match scenario {
            ScenarioId::ToneLoopback => self.run_tone_loopback(),
            ScenarioId::SelfExclusion => self.run_self_exclusion(),
            ScenarioId::ResetFloor => self.run_reset_floor(),
            ScenarioId::GainClamp => self.run_gain_clamp(),
            ScenarioId::PortGrowth => self.run_port_growth(),
            ScenarioId::ThreadedDuplex => self.run_threaded_duplex(),
        };
        
        match outcome {
            Ok(stats) => ScenarioResult {
                scenario,
                seed: self.seed,
                passed: true,
                failure_reason: None,
                stats,
            },
            Err(reason) => {
                warn!(scenario = scenario.name(), seed = self.seed, %reason, "scenario failed");
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    failure_reason: Some(reason),
                    stats: MediumStats::default(),
                }
            }
        }
    }
    
    fn channel(&self) -> ChannelParams {
        self.channel.clone().unwrap_or_default()
    }
    
    fn world(&self, channels_per_radio: usize, channel: ChannelParams) -> Result<SimWorld, String> {
        SimWorld::new(SimConfig {
            seed: self.seed,
            num_radios: self.num_radios,
            channels_per_radio,
            buffer_len: self.block_len * 2,
            channel,
        })
        .map_err(fail)
    }
    
    /// Test-signal RNG, kept apart from the medium's pair streams.
    fn signal_rng(&self, salt: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed.wrapping_mul(0x9e3779b97f4a7c15) ^ salt)
    }
    
    fn random_block(rng: &mut ChaCha8Rng, len: usize) -> Vec<Sample> {
        let amplitude = Uniform::new_inclusive(-0.5f32, 0.5);
        (0..len)
            .map(|_| Sample::new(amplitude.sample(rng), amplitude.sample(rng)))
            .collect()
    }
    
    /// EMU-001: ToneLoopback - fixed channel between two radios.
    ///
    /// **Assertion**: a 100-sample tone through -20 dB and a 10-sample delay
    /// reads back as 10 zeros, the tone at 0.1 amplitude, then 10 zeros.
    fn run_tone_loopback(&self) -> Outcome {
        info!("EMU-001: ToneLoopback - delayed, attenuated tone");
        
        let channel = ChannelParams::ideal().with_attenuation(-20.0).with_delay(10);
        let world = SimWorld::new(SimConfig {
            seed: self.seed,
            num_radios: 2,
            channels_per_radio: 1,
            buffer_len: 256,
            channel,
        })
        .map_err(fail)?;
        let mut radios = world.radios;
        let (tx_radio, rx_radio) = radios.split_at_mut(1);
        let (tx_radio, rx_radio) = (&mut tx_radio[0], &mut rx_radio[0]);
        
        // Phase offset keeps every component well above the converter floor
        let tone: Vec<Sample> = (0..100)
            .map(|k| Sample::from_polar(0.5, std::f32::consts::FRAC_PI_4 * k as f32 + std::f32::consts::FRAC_PI_8))
            .collect();
        
        let tx = tx_radio
            .setup_stream(Direction::Tx, StreamFormat::CF32, &[0], &Default::default())
            .map_err(fail)?;
        let rx = rx_radio
            .setup_stream(Direction::Rx, StreamFormat::CF32, &[0], &Default::default())
            .map_err(fail)?;
        
        tx_radio
            .write_stream(&tx, &[tone.as_slice()], tone.len(), 0, 0, 100_000)
            .map_err(fail)?;
        let mut heard = vec![Sample::new(0.0, 0.0); 120];
        let status = rx_radio
            .read_stream(&rx, &mut [&mut heard[..]], 120, 0, 0, 100_000)
            .map_err(fail)?;
        ensure(status.ret == 120, || format!("short read: {}", status.ret))?;
        
        let zero = Sample::new(0.0, 0.0);
        for (k, &s) in heard.iter().enumerate() {
            let expected = if (10..110).contains(&k) {
                tone[k - 10] * 0.1
            } else {
                zero
            };
            ensure(close(s, expected, 1e-6), || {
                format!("sample {} is {} (expected {})", k, s, expected)
            })?;
        }
        
        Ok(world.medium.stats())
    }
    
    /// EMU-002: SelfExclusion - each port transmits alone in turn.
    ///
    /// **Assertion**: the transmitting port reads silence while every other
    /// port reads the clipped transmission.
    fn run_self_exclusion(&self) -> Outcome {
        info!("EMU-002: SelfExclusion - no port hears itself");
        
        let world = self.world(2, ChannelParams::ideal())?;
        let ports = world.ports();
        let len = self.block_len;
        let mut rng = self.signal_rng(2);
        
        for &talker in &ports {
            world.medium.reset();
            let signal = Self::random_block(&mut rng, len);
            world.medium.write(talker, &signal).map_err(fail)?;
            let mut expected = signal;
            chanemu_core::frontend::clip(&mut expected);
            
            for &listener in &ports {
                let heard = world.medium.read(listener, len).map_err(fail)?;
                if listener == talker {
                    ensure(heard.iter().all(|s| s.norm() == 0.0), || {
                        format!("port {} hears its own transmission", talker)
                    })?;
                } else {
                    let matches = heard.iter().zip(&expected).all(|(&h, &e)| close(h, e, 1e-6));
                    ensure(matches, || {
                        format!("port {} does not hear port {}", listener, talker)
                    })?;
                }
            }
            debug!(talker = talker.index(), "self exclusion held");
        }
        
        Ok(world.medium.stats())
    }
    
    /// EMU-003: ResetFloor - impairments without noise, then a reset.
    ///
    /// **Assertion**: after the reset each port reads one constant value
    /// (the DC and IQ contributions of zeroed transmitters), and gains set
    /// before the reset survive it.
    fn run_reset_floor(&self) -> Outcome {
        info!("EMU-003: ResetFloor - reset leaves a constant floor");
        
        let world = self.world(1, self.channel().with_noise(None))?;
        let ports = world.ports();
        let len = self.block_len;
        let mut rng = self.signal_rng(3);
        
        for &port in &ports {
            world.medium.write(port, &Self::random_block(&mut rng, len)).map_err(fail)?;
        }
        let rx_gain = rng.gen_range(-10.0..10.0);
        world.medium.set_gain(ports[0], Direction::Rx, rx_gain).map_err(fail)?;
        
        world.medium.reset();
        
        for &port in &ports {
            let heard = world.medium.read(port, len).map_err(fail)?;
            let floor = heard[0];
            ensure(heard.iter().all(|&s| close(s, floor, 1e-6)), || {
                format!("port {} reads a varying signal after reset", port)
            })?;
        }
        let kept = world.medium.gain(ports[0], Direction::Rx).map_err(fail)?;
        ensure(kept == rx_gain, || format!("rx gain {} lost on reset (now {})", rx_gain, kept))?;
        
        Ok(world.medium.stats())
    }
    
    /// EMU-004: GainClamp - random gains far outside the range.
    ///
    /// **Assertion**: every set returns and stores the value clamped to the
    /// reported gain range.
    fn run_gain_clamp(&self) -> Outcome {
        info!("EMU-004: GainClamp - gains clamp to the range");
        
        let mut world = self.world(2, self.channel())?;
        let mut rng = self.signal_rng(4);
        
        for radio in world.radios.iter_mut() {
            for channel in 0..radio.num_channels(Direction::Tx) {
                for direction in Direction::both() {
                    let range = radio.gain_range(direction, channel).map_err(fail)?;
                    let requested: f64 = rng.gen_range(-200.0..200.0);
                    let stored = radio.set_gain(direction, channel, requested).map_err(fail)?;
                    let read_back = radio.gain(direction, channel).map_err(fail)?;
                    
                    let expected = requested.clamp(range.min_db, range.max_db);
                    ensure(stored == expected && read_back == expected, || {
                        format!(
                            "{:?} gain {} on channel {} stored {} / read {} (expected {})",
                            direction, requested, channel, stored, read_back, expected
                        )
                    })?;
                }
            }
        }
        
        Ok(world.medium.stats())
    }
    
    /// EMU-005: PortGrowth - register extra ports on a live medium.
    ///
    /// **Assertion**: models between pre-existing ports are the same
    /// objects with the same realisations, and every model matches a fresh
    /// medium built with the same seed.
    fn run_port_growth(&self) -> Outcome {
        info!("EMU-005: PortGrowth - existing channels survive growth");
        
        let world = self.world(2, self.channel())?;
        let before = world.ports();
        let snapshot = Self::models(&world, &before)?;
        
        let extra = self.signal_rng(5).gen_range(1..=8);
        world.medium.register_ports(extra);
        debug!(extra, ports = world.medium.port_count(), "medium grown");
        
        let after = Self::models(&world, &before)?;
        for ((pair, old), (_, new)) in snapshot.iter().zip(&after) {
            ensure(Arc::ptr_eq(old, new) && old.realisation() == new.realisation(), || {
                format!("model {:?} changed when the medium grew", pair)
            })?;
        }
        
        let all: Vec<PortId> = (0..world.medium.port_count()).map(PortId).collect();
        let fresh = chanemu_core::SharedMedium::new(world.medium.config().clone()).map_err(fail)?;
        fresh.register_ports(all.len());
        for &tx in &all {
            for &rx in &all {
                let grown = world.medium.model(tx, rx).map_err(fail)?;
                let rebuilt = fresh.model(tx, rx).map_err(fail)?;
                ensure(grown.realisation() == rebuilt.realisation(), || {
                    format!("model {}->{} depends on registration history", tx, rx)
                })?;
            }
        }
        
        Ok(world.medium.stats())
    }
    
    #[allow(clippy::type_complexity)]
    fn models(
        world: &SimWorld,
        ports: &[PortId],
    ) -> Result<Vec<((PortId, PortId), Arc<chanemu_core::PropagationModel>)>, String> {
        let mut models = Vec::with_capacity(ports.len() * ports.len());
        for &tx in ports {
            for &rx in ports {
                models.push(((tx, rx), world.medium.model(tx, rx).map_err(fail)?));
            }
        }
        Ok(models)
    }
    
    /// EMU-006: ThreadedDuplex - one thread per radio.
    ///
    /// **Assertion**: every transfer reports the full count, every sample
    /// read is finite and within full scale, and the medium counted every
    /// call.
    fn run_threaded_duplex(&self) -> Outcome {
        info!("EMU-006: ThreadedDuplex - concurrent streaming");
        
        const ROUNDS: usize = 16;
        let mut world = self.world(2, self.channel())?;
        let channels = world.config.channels_per_radio;
        let block_len = self.block_len;
        let seed = self.seed;
        
        let results: Vec<Result<(), String>> = std::thread::scope(|s| {
            let handles: Vec<_> = world
                .radios
                .iter_mut()
                .enumerate()
                .map(|(i, radio)| {
                    let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64 + 1));
                    s.spawn(move || duplex_worker(radio, rng, ROUNDS, block_len))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err("radio thread panicked".to_string())))
                .collect()
        });
        for result in results {
            result?;
        }
        
        let stats = world.medium.stats();
        let transfers = (self.num_radios * ROUNDS * channels) as u64;
        ensure(stats.writes == transfers && stats.reads == transfers, || {
            format!("expected {} reads and writes, saw {:?}", transfers, stats)
        })?;
        ensure(stats.samples_written == transfers * block_len as u64, || {
            format!("expected {} samples written, saw {}", transfers * block_len as u64, stats.samples_written)
        })?;
        
        Ok(stats)
    }
}

fn duplex_worker(
    radio: &mut VirtualRadio,
    mut rng: ChaCha8Rng,
    rounds: usize,
    block_len: usize,
) -> Result<(), String> {
    let channels: Vec<usize> = (0..radio.num_channels(Direction::Tx)).collect();
    let tx = radio
        .setup_stream(Direction::Tx, StreamFormat::CF32, &channels, &Default::default())
        .map_err(fail)?;
    let rx = radio
        .setup_stream(Direction::Rx, StreamFormat::CF32, &channels, &Default::default())
        .map_err(fail)?;
    radio.activate_stream(&tx).map_err(fail)?;
    radio.activate_stream(&rx).map_err(fail)?;
    
    let mut heard = vec![vec![Sample::new(0.0, 0.0); block_len]; channels.len()];
    for _ in 0..rounds {
        let blocks: Vec<Vec<Sample>> = channels
            .iter()
            .map(|_| ScenarioRunner::random_block(&mut rng, block_len))
            .collect();
        let refs: Vec<&[Sample]> = blocks.iter().map(|b| b.as_slice()).collect();
        let status = radio
            .write_stream(&tx, &refs, block_len, 0, 0, 100_000)
            .map_err(fail)?;
        ensure(status.ret == block_len, || format!("short write: {}", status.ret))?;
        
        let mut outs: Vec<&mut [Sample]> = heard.iter_mut().map(|b| b.as_mut_slice()).collect();
        let status = radio
            .read_stream(&rx, &mut outs, block_len, 0, 0, 100_000)
            .map_err(fail)?;
        ensure(status.ret == block_len, || format!("short read: {}", status.ret))?;
        
        let sane = heard
            .iter()
            .flatten()
            .all(|s| s.re.is_finite() && s.im.is_finite() && s.re.abs() <= 1.0 && s.im.abs() <= 1.0);
        ensure(sane, || "read returned samples outside full scale".to_string())?;
    }
    
    radio.deactivate_stream(&tx).map_err(fail)?;
    radio.deactivate_stream(&rx).map_err(fail)?;
    radio.close_stream(tx);
    radio.close_stream(rx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    
    fn runner(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(seed, 3).with_block_len(128)
    }
    
    #[test]
    fn test_all_scenarios_pass() {
        for id in ScenarioId::all() {
            let result = runner(42).run(id);
            assert!(result.passed, "{} failed: {:?}", id, result.failure_reason);
        }
    }
    
    #[test]
    fn test_result_carries_stats() {
        let result = runner(7).run(ScenarioId::ThreadedDuplex);
        assert!(result.passed);
        assert_eq!(result.seed, 7);
        assert_eq!(result.stats.ports, 6);
        assert_eq!(result.stats.writes, 3 * 16 * 2);
    }
    
    #[test]
    fn test_channel_override_used() {
        let quiet = ChannelParams::default().with_noise(None);
        let result = runner(9).with_channel(Some(quiet)).run(ScenarioId::ThreadedDuplex);
        assert!(result.passed, "{:?}", result.failure_reason);
    }
    
    #[test]
    fn test_runner_needs_two_radios() {
        let result = ScenarioRunner::new(1, 0).with_block_len(64).run(ScenarioId::SelfExclusion);
        assert!(result.passed);
        assert_eq!(result.stats.ports, 4);
    }
    
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]
        
        #[test]
        fn prop_invariant_scenarios_hold_for_any_seed(seed in any::<u64>()) {
            for id in [ScenarioId::SelfExclusion, ScenarioId::ResetFloor, ScenarioId::PortGrowth] {
                let result = runner(seed).run(id);
                prop_assert!(result.passed, "{} failed: {:?}", id, result.failure_reason);
            }
        }
    }
}
