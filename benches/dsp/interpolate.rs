//! Benchmarks for table playback kernels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use padsynth_dsp::{
    dsp::interpolate::{fade_in, split_ratio, Interpolation, PlaybackPosition},
    patch::PadSample,
};

use crate::BLOCK_SIZES;

const TABLE_SIZE: usize = 1 << 16;

pub fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/interpolate");

    let table: Vec<f32> = (0..TABLE_SIZE)
        .map(|i| (std::f32::consts::TAU * 220.0 * i as f32 / TABLE_SIZE as f32).sin())
        .collect();
    let sample = PadSample::new(&table, 220.0);
    // a fifth above the table's pitch: non-integer step
    let (freq_hi, freq_lo) = split_ratio(1.5 * 1.0001);

    for &size in BLOCK_SIZES {
        let mut out_l = vec![0.0f32; size];
        let mut out_r = vec![0.0f32; size];

        for (name, mode) in [
            ("linear", Interpolation::Linear),
            ("cubic", Interpolation::Cubic),
        ] {
            let mut pos = PlaybackPosition::start(sample.size(), true, 0.3);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    mode.render(
                        black_box(&sample),
                        &mut pos,
                        freq_hi,
                        freq_lo,
                        black_box(&mut out_l),
                        black_box(&mut out_r),
                    )
                })
            });
        }

        let input: Vec<f32> = (0..size).map(|i| ((i % 37) as f32 / 18.0) - 1.0).collect();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("fade_in", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                fade_in(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
