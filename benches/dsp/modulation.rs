//! Benchmarks for per-buffer modulation sources.
//!
//! Envelopes and LFOs step once per buffer, so these are independent of
//! block size; they are measured per call.

use std::hint::black_box;

use criterion::Criterion;
use padsynth_dsp::{
    dsp::{Envelope, Lfo},
    patch::{EnvelopeParams, LfoKind, LfoParams, LfoShape},
    util::rng::Rng,
    SynthConfig,
};

pub fn bench_modulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/modulation");
    let config = SynthConfig::default();

    let params = EnvelopeParams::adsr_db(40, 60, 100, 60);
    let mut envelope = Envelope::new(&params, 220.0, config.dt());
    group.bench_function("envelope_db", |b| {
        b.iter(|| black_box(envelope.out_db()))
    });

    let params = EnvelopeParams::adsr_filter(0, 60, 127, 60, 60, 64);
    let mut envelope = Envelope::new(&params, 220.0, config.dt());
    group.bench_function("envelope_linear", |b| b.iter(|| black_box(envelope.out())));

    let mut params = LfoParams::new(LfoKind::Frequency).with_intensity(40);
    params.randomness = 64;
    params.freq_rand = 64;
    let mut lfo = Lfo::new(&params, 220.0, &config, Rng::new_with_seed(1));
    group.bench_function("lfo_sine_random", |b| b.iter(|| black_box(lfo.out())));

    let params = LfoParams::new(LfoKind::Amplitude)
        .with_intensity(80)
        .with_shape(LfoShape::ExpDown2);
    let mut lfo = Lfo::new(&params, 220.0, &config, Rng::new_with_seed(1));
    group.bench_function("lfo_amp_exp", |b| b.iter(|| black_box(lfo.amp_out())));

    group.finish();
}
