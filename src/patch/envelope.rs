#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

pub const MAX_ENVELOPE_POINTS: usize = 40;

/// What an envelope's point values mean once converted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeMode {
    /// Gain. Linear 0..1 when `linear` is set, otherwise -40..0 dB.
    Amplitude,
    /// Pitch offset in cents (+/- 6300).
    Frequency,
    /// Cutoff offset in octaves (+/- 6).
    Filter,
    /// Bandwidth offset (+/- 10).
    Bandwidth,
}

/// One breakpoint: time to reach it from the previous point, and its level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopePoint {
    pub dt: u8,
    pub value: u8,
}

impl EnvelopePoint {
    pub const fn new(dt: u8, value: u8) -> Self {
        Self { dt, value }
    }
}

/// Breakpoint envelope description. Point 0 is the starting level; the note
/// holds at `sustain` until the key is released.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeParams {
    pub mode: EnvelopeMode,
    points: Vec<EnvelopePoint>,
    sustain: Option<usize>,
    /// Stretch by note pitch; 0 disables, 64 doubles length per octave down.
    pub stretch: u8,
    /// On release, jump straight into the release segment from wherever we are.
    pub forced_release: bool,
    pub linear: bool,
}

impl EnvelopeParams {
    pub fn new(
        mode: EnvelopeMode,
        points: Vec<EnvelopePoint>,
        sustain: Option<usize>,
    ) -> Result<Self, ParamsError> {
        if points.len() < 2 {
            return Err(ParamsError::TooFewPoints(points.len()));
        }
        if points.len() > MAX_ENVELOPE_POINTS {
            return Err(ParamsError::TooManyPoints {
                count: points.len(),
                max: MAX_ENVELOPE_POINTS,
            });
        }
        if let Some(sustain) = sustain {
            // the point after sustain is the release target
            if sustain == 0 || sustain + 1 >= points.len() {
                return Err(ParamsError::SustainOutOfRange {
                    sustain,
                    points: points.len(),
                });
            }
        }
        Ok(Self {
            mode,
            points,
            sustain,
            stretch: 0,
            forced_release: true,
            linear: false,
        })
    }

    /// Amplitude attack/decay/sustain/release in dB.
    pub fn adsr_db(attack_dt: u8, decay_dt: u8, sustain_val: u8, release_dt: u8) -> Self {
        Self {
            mode: EnvelopeMode::Amplitude,
            points: vec![
                EnvelopePoint::new(0, 0),
                EnvelopePoint::new(attack_dt, 127),
                EnvelopePoint::new(decay_dt, sustain_val),
                EnvelopePoint::new(release_dt, 0),
            ],
            sustain: Some(2),
            stretch: 64,
            forced_release: true,
            linear: false,
        }
    }

    /// Pitch glide into the note and away from it on release.
    pub fn asr_freq(attack_val: u8, attack_dt: u8, release_dt: u8, release_val: u8) -> Self {
        Self {
            mode: EnvelopeMode::Frequency,
            points: vec![
                EnvelopePoint::new(0, attack_val),
                EnvelopePoint::new(attack_dt, 64),
                EnvelopePoint::new(release_dt, release_val),
            ],
            sustain: Some(1),
            stretch: 0,
            forced_release: false,
            linear: false,
        }
    }

    pub fn adsr_filter(
        attack_val: u8,
        attack_dt: u8,
        decay_val: u8,
        decay_dt: u8,
        release_dt: u8,
        release_val: u8,
    ) -> Self {
        Self {
            mode: EnvelopeMode::Filter,
            points: vec![
                EnvelopePoint::new(0, attack_val),
                EnvelopePoint::new(attack_dt, decay_val),
                EnvelopePoint::new(decay_dt, 64),
                EnvelopePoint::new(release_dt, release_val),
            ],
            sustain: Some(2),
            stretch: 0,
            forced_release: true,
            linear: false,
        }
    }

    pub fn with_stretch(mut self, stretch: u8) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_forced_release(mut self, forced_release: bool) -> Self {
        self.forced_release = forced_release;
        self
    }

    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// Bypasses validation, standing in for params that arrive deserialized.
    #[cfg(test)]
    pub(crate) fn set_sustain_unchecked(&mut self, sustain: Option<usize>) {
        self.sustain = sustain;
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points
    }

    pub fn sustain(&self) -> Option<usize> {
        self.sustain
    }

    /// Segment duration in milliseconds, exponential over 0..~41 s.
    pub fn point_dt_ms(&self, index: usize) -> f32 {
        let dt = self.points[index].dt as f32;
        (2.0f32.powf(dt / 127.0 * 12.0) - 1.0) * 10.0
    }

    /// Point level in the units of [`EnvelopeMode`].
    pub fn point_value(&self, index: usize) -> f32 {
        let value = self.points[index].value as f32;
        match self.mode {
            EnvelopeMode::Amplitude if self.linear => value / 127.0,
            EnvelopeMode::Amplitude => (1.0 - value / 127.0) * -40.0,
            EnvelopeMode::Frequency => {
                let cents = (2.0f32.powf(6.0 * (value - 64.0).abs() / 64.0) - 1.0) * 100.0;
                if value < 64.0 {
                    -cents
                } else {
                    cents
                }
            }
            EnvelopeMode::Filter => (value - 64.0) / 64.0 * 6.0,
            EnvelopeMode::Bandwidth => (value - 64.0) / 64.0 * 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_point_count_and_sustain() {
        let two = vec![EnvelopePoint::new(0, 0), EnvelopePoint::new(10, 127)];
        assert!(EnvelopeParams::new(EnvelopeMode::Amplitude, two.clone(), None).is_ok());
        assert_eq!(
            EnvelopeParams::new(EnvelopeMode::Amplitude, two[..1].to_vec(), None),
            Err(ParamsError::TooFewPoints(1))
        );
        assert!(matches!(
            EnvelopeParams::new(EnvelopeMode::Amplitude, two.clone(), Some(2)),
            Err(ParamsError::SustainOutOfRange { sustain: 2, points: 2 })
        ));
        assert!(EnvelopeParams::new(EnvelopeMode::Amplitude, two, Some(0)).is_err());
        let three = vec![EnvelopePoint::new(0, 0); 3];
        assert!(EnvelopeParams::new(EnvelopeMode::Amplitude, three.clone(), Some(1)).is_ok());
        assert_eq!(
            EnvelopeParams::new(EnvelopeMode::Amplitude, three, Some(2)),
            Err(ParamsError::SustainOutOfRange { sustain: 2, points: 3 }),
            "sustain on the last point leaves nothing to release to"
        );
        let many = vec![EnvelopePoint::new(1, 1); MAX_ENVELOPE_POINTS + 1];
        assert!(EnvelopeParams::new(EnvelopeMode::Filter, many, None).is_err());
    }

    #[test]
    fn point_values_by_mode() {
        let amp = EnvelopeParams::adsr_db(0, 40, 127, 25);
        assert!((amp.point_value(0) + 40.0).abs() < 1e-6);
        assert!(amp.point_value(1).abs() < 1e-6);
        assert!((amp.clone().with_linear(true).point_value(1) - 1.0).abs() < 1e-6);

        let freq = EnvelopeParams::asr_freq(0, 50, 64, 127);
        assert!(freq.point_value(1).abs() < 1e-6);
        assert!(freq.point_value(0) < -6000.0);

        let filter = EnvelopeParams::adsr_filter(0, 40, 64, 70, 60, 127);
        assert!((filter.point_value(0) + 6.0).abs() < 1e-6);
    }

    #[test]
    fn dt_zero_is_instant() {
        let amp = EnvelopeParams::adsr_db(0, 127, 127, 25);
        assert_eq!(amp.point_dt_ms(1), 0.0);
        assert!((amp.point_dt_ms(2) - 40_950.0).abs() < 1.0);
    }
}
