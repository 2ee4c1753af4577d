//! Propagation Model
//! =================
//!
//! A static multipath channel between one transmitting port and one
//! receiving port. Every stochastic parameter (tap gains and delays, extra
//! delay, DC offsets, IQ imbalance) is drawn once at construction and frozen
//! for the life of the model; only the additive noise changes per call.
//!
//! # Signal path
//!
//! ```text
//! x[n] ──┬── g0 · z^-(D+d0) ──┐
//!        ├── g1 · z^-(D+d1) ──┤
//!        └── ...            ──┴─(Σ)── ·e^(j·cfo·n) ── +dc_tx ── I·iq_tx ── +noise ── y[n]
//! ```
//!
//! `D` is the base delay, `d_i` the per-tap delay offsets (`d_0 = 0`,
//! `i <= d_i <= delay_spread`).

use crate::config::ChannelParams;
use crate::frontend::db_to_linear;
use chanemu_env::Sample;
use num_complex::Complex64;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use tracing::warn;

/// One discrete propagation path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    /// Complex linear gain (attenuation and phase)
    pub gain: Sample,
    /// Delay offset relative to the base delay, in samples
    pub delay: usize,
}

/// The frozen parameters of one channel realisation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRealisation {
    /// Propagation delay shared by all taps
    pub base_delay: usize,
    /// Maximum tap delay offset
    pub delay_spread: usize,
    /// Paths, tap 0 first
    pub taps: Vec<Tap>,
    /// DC offset added on the transmit side
    pub dc_tx: Sample,
    /// DC offset added on the receive side (used from self-pair models)
    pub dc_rx: Sample,
    /// Real-component gain on the transmit side
    pub iq_imbalance_tx: f32,
    /// Real-component gain on the receive side (used from self-pair models)
    pub iq_imbalance_rx: f32,
    /// Noise floor per component in dB, `None` = noiseless
    pub noise_floor_db: Option<f64>,
    /// Phase rotation per sample in radians
    pub cfo: f64,
}

impl ChannelRealisation {
    /// Draws a realisation from `params`.
    ///
    /// `tap_count == 0` is raised to 1 and a `delay_spread` smaller than
    /// `tap_count` is raised to `tap_count + 1`, each with a warning.
    /// Construction never fails.
    pub fn draw<R: Rng + ?Sized>(params: &ChannelParams, rng: &mut R) -> Self {
        let mut tap_count = params.tap_count;
        let mut delay_spread = params.delay_spread;
        
        if tap_count < 1 {
            warn!(tap_count, "channel needs at least one tap, using 1");
            tap_count = 1;
        }
        if delay_spread < tap_count {
            warn!(
                delay_spread,
                tap_count,
                "delay spread shorter than tap count, raising to {}",
                tap_count + 1
            );
            delay_spread = tap_count + 1;
        }
        
        let mut base_delay = params.base_delay;
        if params.delay_jitter > 0 {
            base_delay += rng.gen_range(0..=params.delay_jitter);
        }
        
        let dc_rx = draw_dc(rng, params.dc_offset_std);
        let dc_tx = draw_dc(rng, params.dc_offset_std);
        let iq_imbalance_tx = draw_iq(rng, params.iq_imbalance_std);
        let iq_imbalance_rx = draw_iq(rng, params.iq_imbalance_std);
        
        let tap_floor = db_to_linear(params.tap_attenuation_db);
        let mut taps = Vec::with_capacity(tap_count);
        for i in 0..tap_count {
            let mut magnitude =
                db_to_linear(params.attenuation_db + gaussian(rng, params.attenuation_std_db));
            if i > 0 {
                // Later paths arrive progressively weaker
                magnitude /= i as f64 * tap_floor;
            }
            let phase = if params.phase_shift {
                rng.gen_range(0.0..2.0 * PI)
            } else {
                0.0
            };
            let delay = if i > 0 {
                rng.gen_range(i..=delay_spread)
            } else {
                0
            };
            
            let gain = Complex64::from_polar(magnitude, phase);
            taps.push(Tap {
                gain: Sample::new(gain.re as f32, gain.im as f32),
                delay,
            });
        }
        
        Self {
            base_delay,
            delay_spread,
            taps,
            dc_tx,
            dc_rx,
            iq_imbalance_tx,
            iq_imbalance_rx,
            noise_floor_db: params.noise_floor_db,
            cfo: params.cfo,
        }
    }
    
    /// Number of samples of delay the longest path adds.
    pub fn max_delay(&self) -> usize {
        self.base_delay + self.delay_spread
    }
}

/// Static channel from one port to another.
#[derive(Debug)]
pub struct PropagationModel {
    realisation: ChannelRealisation,
    
    /// Per-call noise draws
    noise_rng: Mutex<ChaCha8Rng>,
}

impl PropagationModel {
    /// Draws a new model from `params` using `rng`.
    ///
    /// The noise stream is seeded from the first draw, so it stays fixed
    /// even if the set of frozen parameters changes.
    pub fn new(params: &ChannelParams, mut rng: ChaCha8Rng) -> Self {
        let noise_seed: u64 = rng.gen();
        let realisation = ChannelRealisation::draw(params, &mut rng);
        Self::from_realisation(realisation, ChaCha8Rng::seed_from_u64(noise_seed))
    }
    
    /// Wraps an explicit realisation.
    pub fn from_realisation(realisation: ChannelRealisation, noise_rng: ChaCha8Rng) -> Self {
        Self {
            realisation,
            noise_rng: Mutex::new(noise_rng),
        }
    }
    
    /// Returns the frozen parameters.
    pub fn realisation(&self) -> &ChannelRealisation {
        &self.realisation
    }
    
    /// Receive-side DC offset.
    pub fn dc_rx(&self) -> Sample {
        self.realisation.dc_rx
    }
    
    /// Receive-side IQ imbalance factor.
    pub fn iq_imbalance_rx(&self) -> f32 {
        self.realisation.iq_imbalance_rx
    }
    
    /// Applies the channel to `samples`, returning the same number of
    /// samples as observed at the receiver.
    pub fn channelize(&self, samples: &[Sample]) -> Vec<Sample> {
        let ch = &self.realisation;
        let n = samples.len();
        let zero = Sample::new(0.0, 0.0);
        let mut out = vec![zero; n + ch.max_delay()];
        
        for tap in &ch.taps {
            let start = ch.base_delay + tap.delay;
            for (o, &s) in out[start..start + n].iter_mut().zip(samples) {
                *o += s * tap.gain;
            }
        }
        
        // Everything below is per-sample over absolute index, so dropping the
        // tail now gives the same result as dropping it at the end.
        out.truncate(n);
        
        if ch.cfo != 0.0 {
            for (k, o) in out.iter_mut().enumerate() {
                let phase = ch.cfo * k as f64;
                *o *= Sample::new(phase.cos() as f32, phase.sin() as f32);
            }
        }
        
        for o in out.iter_mut() {
            *o += ch.dc_tx;
            o.re *= ch.iq_imbalance_tx;
        }
        
        if let Some(floor_db) = ch.noise_floor_db {
            let std_dev = db_to_linear(floor_db);
            let mut rng = self.noise_rng.lock();
            for o in out.iter_mut() {
                o.re += gaussian(&mut *rng, std_dev) as f32;
                o.im += gaussian(&mut *rng, std_dev) as f32;
            }
        }
        
        out
    }
}

/// Zero-mean Gaussian draw; zero when `std_dev` is not a positive finite value.
fn gaussian<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    if !(std_dev > 0.0) || !std_dev.is_finite() {
        return 0.0;
    }
    match Normal::new(0.0, std_dev) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}

fn draw_dc<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> Sample {
    if std_dev == 0.0 {
        return Sample::new(0.0, 0.0);
    }
    let re = gaussian(rng, std_dev);
    let im = gaussian(rng, std_dev);
    Sample::new(re as f32, im as f32)
}

fn draw_iq<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f32 {
    if std_dev == 0.0 {
        return 1.0;
    }
    (1.0 + gaussian(rng, std_dev)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    
    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }
    
    fn tone(len: usize, amplitude: f32) -> Vec<Sample> {
        (0..len)
            .map(|k| {
                let phase = 0.1 * k as f32;
                Sample::new(amplitude * phase.cos(), amplitude * phase.sin())
            })
            .collect()
    }
    
    fn realisation(taps: Vec<Tap>, base_delay: usize, delay_spread: usize) -> ChannelRealisation {
        ChannelRealisation {
            base_delay,
            delay_spread,
            taps,
            dc_tx: Sample::new(0.0, 0.0),
            dc_rx: Sample::new(0.0, 0.0),
            iq_imbalance_tx: 1.0,
            iq_imbalance_rx: 1.0,
            noise_floor_db: None,
            cfo: 0.0,
        }
    }
    
    #[test]
    fn test_ideal_channel_passes_through() {
        let model = PropagationModel::new(&ChannelParams::ideal(), rng(1));
        let input = tone(64, 0.5);
        assert_eq!(model.channelize(&input), input);
    }
    
    #[test]
    fn test_single_tap_delay_and_gain() {
        let params = ChannelParams::ideal().with_attenuation(-20.0).with_delay(10);
        let model = PropagationModel::new(&params, rng(2));
        
        let input = tone(100, 0.5);
        let out = model.channelize(&input);
        
        assert_eq!(out.len(), 100);
        for s in &out[..10] {
            assert_eq!(*s, Sample::new(0.0, 0.0));
        }
        for k in 10..100 {
            assert_relative_eq!(out[k].re, input[k - 10].re * 0.1, epsilon = 1e-6);
            assert_relative_eq!(out[k].im, input[k - 10].im * 0.1, epsilon = 1e-6);
        }
    }
    
    #[test]
    fn test_taps_superpose() {
        let taps = vec![
            Tap { gain: Sample::new(1.0, 0.0), delay: 0 },
            Tap { gain: Sample::new(0.0, 0.5), delay: 2 },
        ];
        let model = PropagationModel::from_realisation(realisation(taps, 1, 3), rng(0));
        
        let mut impulse = vec![Sample::new(0.0, 0.0); 6];
        impulse[0] = Sample::new(1.0, 0.0);
        let out = model.channelize(&impulse);
        
        assert_eq!(out[1], Sample::new(1.0, 0.0));
        assert_eq!(out[3], Sample::new(0.0, 0.5));
        let energy: f32 = out.iter().map(|s| s.norm_sqr()).sum();
        assert_relative_eq!(energy, 1.25);
    }
    
    #[test]
    fn test_cfo_rotates_absolute_index() {
        let mut ch = realisation(vec![Tap { gain: Sample::new(1.0, 0.0), delay: 0 }], 2, 1);
        ch.cfo = 0.25;
        let model = PropagationModel::from_realisation(ch, rng(0));
        
        let out = model.channelize(&vec![Sample::new(1.0, 0.0); 8]);
        // Sample 2 is the first non-zero and carries the rotation of index 2
        assert_relative_eq!(out[2].arg(), 0.5, epsilon = 1e-6);
        for s in &out[2..] {
            assert_relative_eq!(s.norm(), 1.0, epsilon = 1e-6);
        }
    }
    
    #[test]
    fn test_dc_and_iq_imbalance() {
        let mut ch = realisation(vec![Tap { gain: Sample::new(1.0, 0.0), delay: 0 }], 0, 1);
        ch.dc_tx = Sample::new(0.1, -0.2);
        ch.iq_imbalance_tx = 2.0;
        let model = PropagationModel::from_realisation(ch, rng(0));
        
        let out = model.channelize(&[Sample::new(0.25, 0.25)]);
        // DC is added before the I-branch gain
        assert_relative_eq!(out[0].re, 0.7, epsilon = 1e-6);
        assert_relative_eq!(out[0].im, 0.05, epsilon = 1e-6);
    }
    
    #[test]
    fn test_noise_only_varies_per_call() {
        let params = ChannelParams::ideal().with_noise(Some(-40.0));
        let model = PropagationModel::new(&params, rng(3));
        let silence = vec![Sample::new(0.0, 0.0); 4096];
        
        let a = model.channelize(&silence);
        let b = model.channelize(&silence);
        assert_ne!(a, b);
        
        let power: f32 = a.iter().map(|s| s.norm_sqr()).sum::<f32>() / a.len() as f32;
        // Two components at 0.01 std each -> 2e-4 total power
        assert_relative_eq!(power, 2e-4, max_relative = 0.15);
    }
    
    #[test]
    fn test_same_rng_same_realisation() {
        let params = ChannelParams::default();
        let a = PropagationModel::new(&params, rng(99));
        let b = PropagationModel::new(&params, rng(99));
        assert_eq!(a.realisation(), b.realisation());
        
        // Including the noise stream
        let silence = vec![Sample::new(0.0, 0.0); 32];
        assert_eq!(a.channelize(&silence), b.channelize(&silence));
    }
    
    #[test]
    fn test_zero_taps_corrected() {
        let params = ChannelParams {
            tap_count: 0,
            delay_spread: 0,
            ..ChannelParams::default()
        };
        let ch = ChannelRealisation::draw(&params, &mut rng(4));
        assert_eq!(ch.taps.len(), 1);
        assert_eq!(ch.delay_spread, 2);
    }
    
    #[test]
    fn test_short_spread_raised() {
        let params = ChannelParams {
            tap_count: 6,
            delay_spread: 3,
            ..ChannelParams::default()
        };
        let ch = ChannelRealisation::draw(&params, &mut rng(5));
        assert_eq!(ch.taps.len(), 6);
        assert_eq!(ch.delay_spread, 7);
    }
    
    #[test]
    fn test_secondary_taps_weaker() {
        let params = ChannelParams {
            attenuation_std_db: 0.0,
            ..ChannelParams::default()
        };
        let ch = ChannelRealisation::draw(&params, &mut rng(6));
        let first = ch.taps[0].gain.norm();
        for (i, tap) in ch.taps.iter().enumerate().skip(1) {
            let expected = first / (i as f32 * 10f32.powf(12.0 / 20.0));
            assert_relative_eq!(tap.gain.norm(), expected, max_relative = 1e-5);
        }
    }
    
    proptest! {
        #[test]
        fn prop_any_params_construct(
            tap_count in 0usize..12,
            delay_spread in 0usize..16,
            base_delay in 0usize..64,
            delay_jitter in 0usize..8,
            seed in any::<u64>(),
        ) {
            let params = ChannelParams {
                tap_count,
                delay_spread,
                base_delay,
                delay_jitter,
                ..ChannelParams::default()
            };
            let model = PropagationModel::new(&params, rng(seed));
            let ch = model.realisation();
            
            prop_assert_eq!(ch.taps.len(), tap_count.max(1));
            prop_assert!(ch.delay_spread >= ch.taps.len());
            prop_assert!(ch.base_delay >= base_delay);
            prop_assert!(ch.base_delay <= base_delay + delay_jitter);
            prop_assert_eq!(ch.taps[0].delay, 0);
            for (i, tap) in ch.taps.iter().enumerate().skip(1) {
                prop_assert!(tap.delay >= i);
                prop_assert!(tap.delay <= ch.delay_spread);
            }
            
            let input = vec![Sample::new(0.5, -0.5); 37];
            prop_assert_eq!(model.channelize(&input).len(), 37);
        }
    }
}
