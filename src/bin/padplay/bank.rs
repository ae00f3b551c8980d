//! Sample bank generation for the demo patch.
//!
//! Each table is built in the frequency domain: every harmonic becomes a
//! gaussian band whose width grows with the harmonic number, each bin gets a
//! random phase, and one inverse FFT turns the spectrum into a seamless loop.

use padsynth_dsp::{
    patch::{PadSample, SampleBank},
    util::rng::Rng,
};
use rustfft::{num_complex::Complex, FftPlanner};

/// Samples per table.
const TABLE_SIZE: usize = 1 << 16;
/// One table per octave starting here.
const LOWEST_BASE: f32 = 55.0;
const OCTAVES: i32 = 7;
const HARMONICS: usize = 32;
/// Band width of the first harmonic.
const BANDWIDTH_CENTS: f32 = 40.0;
const TARGET_RMS: f32 = 0.15;

pub fn harmonic_bank(sample_rate: u32, seed: u64) -> SampleBank {
    let mut planner = FftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(TABLE_SIZE);
    let mut rng = Rng::new_with_seed(seed);
    let sr = sample_rate as f32;

    let entries = (0..OCTAVES)
        .map(|octave| {
            let base = LOWEST_BASE * 2.0f32.powi(octave);
            let mut bins: Vec<Complex<f32>> = band_spectrum(base, sr)
                .into_iter()
                .map(|amp| Complex::from_polar(amp, rng.rand_float() * std::f32::consts::TAU))
                .collect();
            bins[0] = Complex::new(0.0, 0.0);
            bins.resize(TABLE_SIZE, Complex::new(0.0, 0.0));
            ifft.process(&mut bins);

            let mut table: Vec<f32> = bins.iter().map(|c| c.re).collect();
            normalize(&mut table);
            tracing::debug!(base, size = table.len(), "generated pad table");
            PadSample::new(&table, base)
        })
        .collect();

    SampleBank::new(entries)
}

/// Magnitudes for bins `0..TABLE_SIZE / 2`.
fn band_spectrum(base: f32, sr: f32) -> Vec<f32> {
    let half = TABLE_SIZE / 2;
    let mut amps = vec![0.0f32; half];
    for h in 1..=HARMONICS {
        let freq = base * h as f32;
        if freq >= sr * 0.5 {
            break;
        }
        let bw_hz = (2.0f32.powf(BANDWIDTH_CENTS / 1200.0) - 1.0) * base * (h as f32).powf(1.1);
        let bw = bw_hz / (2.0 * sr);
        let center = freq / sr;

        // skip bins more than a few widths away, exp(-x^2) is nothing there
        let lo = (((center - 4.0 * bw) * TABLE_SIZE as f32).floor().max(0.0)) as usize;
        let hi = (((center + 4.0 * bw) * TABLE_SIZE as f32).ceil() as usize).min(half);
        let gain = 1.0 / h as f32;
        for (i, amp) in amps.iter_mut().enumerate().take(hi).skip(lo) {
            let x = (i as f32 / TABLE_SIZE as f32 - center) / bw;
            *amp += (-x * x).exp() / bw * gain;
        }
    }
    amps
}

fn normalize(table: &mut [f32]) {
    let rms = (table.iter().map(|s| s * s).sum::<f32>() / table.len() as f32).sqrt();
    if rms > 0.0 {
        let scale = TARGET_RMS / rms;
        table.iter_mut().for_each(|s| *s *= scale);
    }
}
