//! Errors raised on the control path.
//!
//! Rendering never fails; these only come back from construction and
//! configuration calls, which run off the audio thread.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("buffer size {size} outside 1..={max}")]
    BufferSize { size: usize, max: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("{kind} pool exhausted ({capacity} slots in use)")]
    Exhausted { kind: &'static str, capacity: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    #[error("envelope needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("envelope has {count} points, limit is {max}")]
    TooManyPoints { count: usize, max: usize },
    #[error("sustain point {sustain} must lie in 1..{} so a release point follows it", .points - 1)]
    SustainOutOfRange { sustain: usize, points: usize },
}
