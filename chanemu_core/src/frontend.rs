//! Analog front-end approximations shared by transmit and receive paths.

use chanemu_env::Sample;

/// Default full-scale amplitude per I/Q component.
pub const FULL_SCALE: f32 = 1.0;

/// Default converter resolution used for the quantization floor.
pub const ADC_BITS: u32 = 12;

/// Converts a gain in dB to a linear amplitude factor.
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Clamps I and Q independently to `[-limit, limit]` and zeroes any
/// component whose magnitude falls below `2^-(bits-1)`.
///
/// The floor stands in for converter resolution (the top bit is the
/// sign) and is what makes receive gain matter for weak signals. It is not
/// a requantization: values above the floor keep full float precision.
pub fn clip_with(samples: &mut [Sample], limit: f32, bits: u32) {
    let floor = quantization_floor(bits);
    for s in samples.iter_mut() {
        s.re = clip_component(s.re, limit, floor);
        s.im = clip_component(s.im, limit, floor);
    }
}

/// `clip_with` at full scale and 12-bit resolution.
pub fn clip(samples: &mut [Sample]) {
    clip_with(samples, FULL_SCALE, ADC_BITS);
}

/// Smallest component magnitude that survives clipping at `bits`.
pub fn quantization_floor(bits: u32) -> f32 {
    0.5f32.powi(bits.saturating_sub(1) as i32)
}

fn clip_component(x: f32, limit: f32, floor: f32) -> f32 {
    let clamped = x.clamp(-limit, limit);
    if clamped.abs() < floor {
        0.0
    } else {
        clamped
    }
}
