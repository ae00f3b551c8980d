//! Benchmarks for the analog and state-variable filter cascades.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use padsynth_dsp::dsp::filter::{AnalogFilter, AnalogType, FilterType, SVFilter};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = AnalogFilter::new(AnalogType::LowPass2, 1000.0, 2.0, 1, 0.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("analog_lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.filter_out(black_box(&mut buffer));
            })
        });

        // Five stages is the deepest cascade a patch can ask for
        let mut filter = AnalogFilter::new(AnalogType::LowPass2, 1000.0, 2.0, 5, 0.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("analog_lowpass_x5", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.filter_out(black_box(&mut buffer));
            })
        });

        // Cutoff jumping every buffer forces the old/new crossfade
        let mut filter = AnalogFilter::new(AnalogType::Peak, 500.0, 2.0, 1, 6.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        let mut high = false;
        group.bench_with_input(BenchmarkId::new("analog_crossfade", size), &size, |b, _| {
            b.iter(|| {
                high = !high;
                filter.set_freq(if high { 4000.0 } else { 500.0 });
                buffer.copy_from_slice(&input);
                filter.filter_out(black_box(&mut buffer));
            })
        });

        let mut filter = SVFilter::new(FilterType::LowPass, 1000.0, 2.0, 1, 0.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("svf_lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.filter_out(black_box(&mut buffer));
            })
        });

        let mut filter = SVFilter::new(FilterType::Notch, 1000.0, 2.0, 1, 0.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("svf_notch", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.filter_out(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
