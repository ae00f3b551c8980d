//! Pitched playback from a guarded sample table.

use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::patch::bank::PadSample;

/*
Reading a table at a pitch
==========================

A table recorded at `base_freq` played back at `freq` advances by
`freq / base_freq` samples per output sample. That ratio splits into an
integer step `freq_hi` and a fractional step `freq_lo`:

    position = hi + lo        hi: table index, lo: 0..1 between samples

Each output sample adds both steps, carries `lo` into `hi` when it reaches 1,
and wraps `hi` back into the loop. Left and right keep separate `hi` but share
`lo`, so a stereo note is the same table read from two offsets.

Kernels
-------

  Linear    s[hi]·(1 - lo) + s[hi+1]·lo

  Cubic     Catmull-Rom through s[hi], s[hi+1], s[hi+2], s[hi+3], evaluated
            between s[hi+1] and s[hi+2]. At lo = 0 it returns s[hi+1].

Taps run up to hi+3 while hi < size, so tables carry PAD_GUARD_SAMPLES of
mirrored start samples past their end (see `patch::bank`).
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    Linear,
    Cubic,
}

/// Integer read positions per channel and their shared fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackPosition {
    pub hi_l: usize,
    pub hi_r: usize,
    pub lo: f32,
}

impl PlaybackPosition {
    /// Random start in the loop; stereo notes read the right channel half a
    /// table ahead.
    pub fn start(size: usize, stereo: bool, rnd: f32) -> Self {
        let size = size.max(1);
        let hi_l = (rnd * (size - 1) as f32) as usize;
        let hi_r = if stereo { (hi_l + size / 2) % size } else { hi_l };
        Self { hi_l, hi_r, lo: 0.0 }
    }

    #[inline]
    fn advance(&mut self, freq_hi: usize, freq_lo: f32, size: usize) {
        self.hi_l += freq_hi;
        self.hi_r += freq_hi;
        self.lo += freq_lo;
        if self.lo >= 1.0 {
            self.hi_l += 1;
            self.hi_r += 1;
            self.lo -= 1.0;
        }
        if self.hi_l >= size {
            self.hi_l %= size;
        }
        if self.hi_r >= size {
            self.hi_r %= size;
        }
    }
}

/// Split a playback ratio into integer and fractional steps.
#[inline]
pub fn split_ratio(ratio: f32) -> (usize, f32) {
    if !ratio.is_finite() || ratio <= 0.0 {
        return (0, 0.0);
    }
    let hi = ratio.floor();
    (hi as usize, ratio - hi)
}

impl Interpolation {
    /// Fill both channels from `sample`. Returns `false`, leaving the
    /// outputs untouched, when the slot has no data.
    pub fn render(
        self,
        sample: &PadSample,
        pos: &mut PlaybackPosition,
        freq_hi: usize,
        freq_lo: f32,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> bool {
        let Some(table) = sample.data() else {
            return false;
        };
        let size = sample.size().max(1);
        let freq_hi = freq_hi % size;
        match self {
            Interpolation::Linear => linear(table, size, pos, freq_hi, freq_lo, out_l, out_r),
            Interpolation::Cubic => cubic(table, size, pos, freq_hi, freq_lo, out_l, out_r),
        }
        true
    }
}

#[inline]
fn linear_tap(table: &[f32], hi: usize, t: f32) -> f32 {
    table[hi] * (1.0 - t) + table[hi + 1] * t
}

#[inline]
fn cubic_tap(table: &[f32], hi: usize, t: f32) -> f32 {
    let xm1 = table[hi];
    let x0 = table[hi + 1];
    let x1 = table[hi + 2];
    let x2 = table[hi + 3];
    let a = (3.0 * (x0 - x1) - xm1 + x2) * 0.5;
    let b = 2.0 * x1 + xm1 - (5.0 * x0 + x2) * 0.5;
    let c = (x1 - xm1) * 0.5;
    ((a * t + b) * t + c) * t + x0
}

/// `table` must be guarded: at least `size + 2` long.
pub fn linear(
    table: &[f32],
    size: usize,
    pos: &mut PlaybackPosition,
    freq_hi: usize,
    freq_lo: f32,
    out_l: &mut [f32],
    out_r: &mut [f32],
) {
    for (l, r) in out_l.iter_mut().zip(out_r.iter_mut()) {
        pos.advance(freq_hi, freq_lo, size);
        *l = linear_tap(table, pos.hi_l, pos.lo);
        *r = linear_tap(table, pos.hi_r, pos.lo);
    }
}

/// `table` must be guarded: at least `size + 4` long.
pub fn cubic(
    table: &[f32],
    size: usize,
    pos: &mut PlaybackPosition,
    freq_hi: usize,
    freq_lo: f32,
    out_l: &mut [f32],
    out_r: &mut [f32],
) {
    for (l, r) in out_l.iter_mut().zip(out_r.iter_mut()) {
        pos.advance(freq_hi, freq_lo, size);
        *l = cubic_tap(table, pos.hi_l, pos.lo);
        *r = cubic_tap(table, pos.hi_r, pos.lo);
    }
}

/// Raised-cosine fade over the head of a note's first buffer. The fade is
/// shorter for busier signals: a third of the average distance between
/// positive zero crossings, at least 8 samples.
pub fn fade_in(buffer: &mut [f32]) {
    let len = buffer.len();
    if len == 0 {
        return;
    }
    let crossings = buffer
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] > 0.0)
        .count();

    let n = ((len as f32 - 1.0) / (crossings + 1) as f32 / 3.0).max(8.0) as usize;
    let n = n.min(len);
    for (i, sample) in buffer[..n].iter_mut().enumerate() {
        *sample *= 0.5 - (i as f32 / n as f32 * PI).cos() * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_sample(size: usize) -> PadSample {
        let samples: Vec<f32> = (0..size).map(|i| i as f32).collect();
        PadSample::new(&samples, 440.0)
    }

    #[test]
    fn linear_continues_across_calls() {
        let sample = ramp_sample(64);
        let mut split = PlaybackPosition::default();
        let mut whole = PlaybackPosition::default();
        let (hi, lo) = split_ratio(1.25);

        let (mut a_l, mut a_r) = (vec![0.0; 16], vec![0.0; 16]);
        let (mut b_l, mut b_r) = (vec![0.0; 16], vec![0.0; 16]);
        Interpolation::Linear.render(&sample, &mut split, hi, lo, &mut a_l, &mut a_r);
        Interpolation::Linear.render(&sample, &mut split, hi, lo, &mut b_l, &mut b_r);

        let (mut w_l, mut w_r) = (vec![0.0; 32], vec![0.0; 32]);
        Interpolation::Linear.render(&sample, &mut whole, hi, lo, &mut w_l, &mut w_r);

        assert_eq!(&w_l[..16], &a_l[..]);
        assert_eq!(&w_l[16..], &b_l[..]);
        assert_eq!(split, whole);
    }

    #[test]
    fn integer_ratio_returns_the_x0_tap() {
        let sample = ramp_sample(32);
        let table = sample.data().unwrap();

        let mut pos = PlaybackPosition::default();
        let (mut l, mut r) = (vec![0.0; 4], vec![0.0; 4]);
        Interpolation::Linear.render(&sample, &mut pos, 1, 0.0, &mut l, &mut r);
        assert_eq!(l, vec![table[1], table[2], table[3], table[4]]);

        let mut pos = PlaybackPosition::default();
        Interpolation::Cubic.render(&sample, &mut pos, 1, 0.0, &mut l, &mut r);
        assert_eq!(l, vec![table[2], table[3], table[4], table[5]]);
    }

    #[test]
    fn cubic_is_smooth_across_the_wrap() {
        let size = 256;
        let samples: Vec<f32> = (0..size)
            .map(|i| (std::f32::consts::TAU * i as f32 / size as f32).sin())
            .collect();
        let sample = PadSample::new(&samples, 440.0);
        let mut pos = PlaybackPosition {
            hi_l: size - 8,
            hi_r: size - 8,
            lo: 0.0,
        };
        let (mut l, mut r) = (vec![0.0; 64], vec![0.0; 64]);
        Interpolation::Cubic.render(&sample, &mut pos, 0, 0.5, &mut l, &mut r);

        let max_step = l.windows(2).map(|w| (w[1] - w[0]).abs()).fold(0.0, f32::max);
        let expected = std::f32::consts::TAU / size as f32 * 0.5;
        assert!(max_step <= expected * 1.05, "step {} at the wrap", max_step);
        assert!(pos.hi_l < size);
    }

    #[test]
    fn split_ratio_rejects_nonsense() {
        assert_eq!(split_ratio(2.25), (2, 0.25));
        assert_eq!(split_ratio(-1.0), (0, 0.0));
        assert_eq!(split_ratio(f32::NAN), (0, 0.0));
        assert_eq!(split_ratio(f32::INFINITY), (0, 0.0));
    }

    #[test]
    fn stereo_start_is_half_a_table_apart() {
        let pos = PlaybackPosition::start(100, true, 0.9);
        assert_eq!(pos.hi_l, 89);
        assert_eq!(pos.hi_r, (89 + 50) % 100);
        let mono = PlaybackPosition::start(100, false, 0.9);
        assert_eq!(mono.hi_l, mono.hi_r);
        assert_eq!(PlaybackPosition::start(0, true, 0.5).hi_l, 0);
    }

    #[test]
    fn empty_slot_renders_nothing() {
        let sample = PadSample::empty(440.0);
        let mut pos = PlaybackPosition::default();
        let (mut l, mut r) = (vec![7.0; 8], vec![7.0; 8]);
        assert!(!Interpolation::Cubic.render(&sample, &mut pos, 1, 0.0, &mut l, &mut r));
        assert_eq!(l, vec![7.0; 8]);
        assert_eq!(pos, PlaybackPosition::default());
    }

    #[test]
    fn fade_in_length_follows_zero_crossings() {
        // no crossings: (256 - 1) / 1 / 3 = 85 samples
        let mut flat = vec![1.0; 256];
        fade_in(&mut flat);
        assert_eq!(flat[0], 0.0);
        assert!(flat[84] < 1.0);
        assert_eq!(flat[85], 1.0);

        // busy signal: floor at 8 samples
        let mut busy: Vec<f32> = (0..256).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        fade_in(&mut busy);
        assert!(busy[7].abs() < 1.0);
        assert_eq!(busy[8], -1.0);

        let mut tiny = vec![1.0; 4];
        fade_in(&mut tiny);
        assert_eq!(tiny[0], 0.0);
    }
}
