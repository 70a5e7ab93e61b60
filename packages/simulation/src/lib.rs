#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crowd density simulation cycle.
//!
//! Each cycle picks a historical date for the configured mode, turns every
//! region's mobility deviation on that date into a bounded density score,
//! assesses risk from the most congested regions, and publishes the result
//! as one snapshot. [`publisher::CyclePublisher`] repeats this on a fixed
//! cadence.

pub mod density;
pub mod pacer;
pub mod publisher;
pub mod risk;
pub mod scenario;

pub use pacer::{Pacer, TokioPacer};
pub use publisher::{CycleReport, CyclePublisher, RunSummary};
pub use scenario::ScenarioTable;

use crowdbreak_simulation_models::Mode;

/// Errors that can occur while loading a scenario table.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// I/O error reading an override file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table is not valid TOML or does not match the schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The table has no entry for the fallback mode.
    #[error("Scenario table has no '{}' entry", Mode::Normal)]
    MissingNormal,

    /// A mode lists no candidate dates.
    #[error("Scenario '{mode}' has no candidate dates")]
    NoDates {
        /// The offending mode.
        mode: Mode,
    },
}
