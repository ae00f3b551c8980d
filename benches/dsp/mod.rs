//! Benchmarks for low-level DSP primitives.

mod filter;
mod interpolate;
mod modulation;

pub use filter::bench_filter;
pub use interpolate::bench_interpolate;
pub use modulation::bench_modulation;
