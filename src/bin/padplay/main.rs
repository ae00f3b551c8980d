//! padplay - play a pad patch from the computer keyboard
//!
//! Run with: cargo run --bin padplay
//! Logs go to stderr; set RUST_LOG=padsynth_dsp=debug and redirect stderr to
//! a file to watch notes start.

mod app;
mod bank;
mod ui;

use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    app::PadPlay::new().run()
}
