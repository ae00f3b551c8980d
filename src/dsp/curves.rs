//! Parameter curves shared by notes and modulation sources.
//!
//! Instrument parameters arrive as 7-bit (or 14-bit) controls; these functions
//! map them onto gains, cents and sensitivities.

use std::f32::consts::LN_10;

/// Velocity sensing exponent base: scaling 0 maps velocity through `v^8`.
const VELOCITY_MAX_SCALE: f32 = 8.0;

/// Relative difference above which gain is ramped across a buffer.
const AMPLITUDE_INTERPOLATION_THRESHOLD: f32 = 0.0001;

#[inline]
pub fn db_to_rap(db: f32) -> f32 {
    (db * LN_10 / 20.0).exp()
}

#[inline]
pub fn rap_to_db(rap: f32) -> f32 {
    20.0 * rap.ln() / LN_10
}

/// Velocity sensitivity. `scaling` 127 (or a full-scale velocity) disables it,
/// 64 is linear, lower values get steeper.
pub fn vel_f(velocity: f32, scaling: u8) -> f32 {
    if scaling == 127 || velocity > 0.99 {
        return 1.0;
    }
    let x = VELOCITY_MAX_SCALE.powf((64.0 - scaling as f32) / 64.0);
    velocity.powf(x)
}

/// Detune in cents from a detune type and the coarse/fine controls.
///
/// `coarse` packs an octave in its top bits (`coarse / 1024`, two's
/// complement over 16) and a signed coarse step below; `fine` is centred on
/// 8192. Types: 1 = L35 cents, 2 = L10 cents, 3 = E100 cents, 4 = E1200
/// cents (steps of a perfect fifth).
pub fn detune_cents(detune_type: u8, coarse: u16, fine: u16) -> f32 {
    let mut octave = (coarse / 1024) as i32;
    if octave >= 8 {
        octave -= 16;
    }
    let octave_cents = octave as f32 * 1200.0;

    let mut cdetune = (coarse % 1024) as i32;
    if cdetune > 512 {
        cdetune -= 1024;
    }
    let fdetune = fine as i32 - 8192;
    let fine_amount = (fdetune as f32 / 8192.0).abs();

    let (mut cdet, mut findet) = match detune_type {
        2 => ((cdetune as f32 * 10.0).abs(), fine_amount * 10.0),
        3 => (
            (cdetune as f32 * 100.0).abs(),
            10.0f32.powf(fine_amount * 3.0) / 10.0 - 0.1,
        ),
        4 => (
            (cdetune as f32 * 701.955).abs(),
            (2.0f32.powf(fine_amount * 12.0) - 1.0) / 4095.0 * 1200.0,
        ),
        _ => ((cdetune as f32 * 50.0).abs(), fine_amount * 35.0),
    };
    if fine < 8192 {
        findet = -findet;
    }
    if cdetune < 0 {
        cdet = -cdet;
    }
    octave_cents + cdet + findet
}

/// True when the gain moved enough between buffers to need a ramp.
#[inline]
pub fn above_amplitude_threshold(old: f32, new: f32) -> bool {
    2.0 * (new - old).abs() / (new + old + 1e-10).abs() > AMPLITUDE_INTERPOLATION_THRESHOLD
}

#[inline]
pub fn interpolate_amplitude(old: f32, new: f32, index: usize, size: usize) -> f32 {
    old + (new - old) * index as f32 / size as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_roundtrip_reference_points() {
        assert!((db_to_rap(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_rap(-20.0) - 0.1).abs() < 1e-6);
        assert!((rap_to_db(0.5) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn velocity_sensing() {
        assert_eq!(vel_f(0.3, 127), 1.0);
        assert_eq!(vel_f(1.0, 0), 1.0);
        assert!((vel_f(0.5, 64) - 0.5).abs() < 1e-6, "64 is linear");
        assert!(vel_f(0.5, 0) < vel_f(0.5, 64));
    }

    #[test]
    fn centred_detune_is_zero() {
        for detune_type in 1..=4 {
            assert!(detune_cents(detune_type, 0, 8192).abs() < 1e-6);
        }
    }

    #[test]
    fn detune_octaves_and_fine_sign() {
        // one octave up, one octave down (16 - 1 in the octave field)
        assert!((detune_cents(1, 1024, 8192) - 1200.0).abs() < 1e-3);
        assert!((detune_cents(1, 15 * 1024, 8192) + 1200.0).abs() < 1e-3);
        // full fine range on the default type is +/-35 cents
        assert!((detune_cents(1, 0, 16384) - 35.0).abs() < 1e-3);
        assert!((detune_cents(1, 0, 0) + 35.0).abs() < 1e-3);
        // E100: coarse steps are semitones
        assert!((detune_cents(3, 1023, 8192) + 100.0).abs() < 1e-3);
    }

    #[test]
    fn amplitude_threshold() {
        assert!(!above_amplitude_threshold(0.5, 0.5));
        assert!(!above_amplitude_threshold(0.5, 0.500_001));
        assert!(above_amplitude_threshold(0.5, 0.6));
        assert!(!above_amplitude_threshold(0.0, 0.0));
        assert_eq!(interpolate_amplitude(0.0, 1.0, 64, 256), 0.25);
    }
}
