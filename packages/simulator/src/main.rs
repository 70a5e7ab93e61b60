#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crowd density simulator binary.
//!
//! Run with `--help` for flags. See the library docs for the environment
//! variables each flag falls back to.

use clap::Parser;
use crowdbreak_simulator::{Cli, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let settings = Settings::resolve(Cli::parse(), |key| std::env::var(key).ok())?;

    log::info!(
        "Starting simulator: dataset={}, store={}, interval={}s",
        settings.dataset.display(),
        settings.store,
        settings.interval.as_secs()
    );

    let summary = crowdbreak_simulator::run(settings).await?;

    log::info!(
        "Simulator finished after {} cycles ({} failed publishes)",
        summary.cycles,
        summary.failed_publishes
    );

    Ok(())
}
