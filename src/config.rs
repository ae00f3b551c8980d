#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, MAX_BLOCK_SIZE};

/// Audio-thread timing shared by every note: sample rate and the fixed buffer
/// length `note_out` renders per call.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthConfig {
    sample_rate: u32,
    buffer_size: usize,
}

impl SynthConfig {
    pub fn new(sample_rate: u32, buffer_size: usize) -> Result<Self, ConfigError> {
        let config = Self {
            sample_rate,
            buffer_size,
        };
        if let Err(err) = config.validate() {
            tracing::warn!(sample_rate, buffer_size, %err, "rejected synth config");
            return Err(err);
        }
        Ok(config)
    }

    /// Re-check a config that bypassed [`SynthConfig::new`] (e.g. deserialized).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.buffer_size == 0 || self.buffer_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BufferSize {
                size: self.buffer_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_rate_f(&self) -> f32 {
        self.sample_rate as f32
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn buffer_size_f(&self) -> f32 {
        self.buffer_size as f32
    }

    /// Seconds covered by one buffer; modulation sources advance this much per call.
    pub fn dt(&self) -> f32 {
        self.buffer_size_f() / self.sample_rate_f()
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_size: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_one_buffer_in_seconds() {
        let config = SynthConfig::new(48_000, 480).unwrap();
        assert!((config.dt() - 0.01).abs() < 1e-7);
        assert_eq!(config.buffer_size_f(), 480.0);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert_eq!(SynthConfig::new(0, 256), Err(ConfigError::ZeroSampleRate));
        assert!(matches!(
            SynthConfig::new(48_000, 0),
            Err(ConfigError::BufferSize { size: 0, .. })
        ));
        assert!(SynthConfig::new(48_000, MAX_BLOCK_SIZE + 1).is_err());
        assert!(SynthConfig::new(48_000, MAX_BLOCK_SIZE).is_ok());
    }
}
