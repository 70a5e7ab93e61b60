#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared-state clients for the crowd density simulator.
//!
//! The simulator reads its mode from a [`ConfigSource`] and writes each
//! cycle's snapshot to a [`SnapshotSink`]. Three backends implement both:
//!
//! - [`realtime_db::RealtimeDbStore`]: a Firebase-style Realtime Database
//!   over its REST interface.
//! - [`file::JsonFileStore`]: JSON documents in a local directory.
//! - [`memory::MemoryStore`]: in-process state, used by tests.
//!
//! Whether a snapshot write replaces the stored document or merges into it
//! is chosen explicitly with [`WriteMode`].

pub mod file;
pub mod memory;
pub mod realtime_db;

use async_trait::async_trait;
use crowdbreak_simulation_models::{SimulationConfig, Snapshot};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors that can occur while talking to a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store answered with a non-success status.
    #[error("Store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The stored document is not a JSON object.
    #[error("Stored document at {location} is not a JSON object")]
    NotAnObject {
        /// Where the document lives (path or URL).
        location: String,
    },
}

/// How a snapshot write combines with what is already stored.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WriteMode {
    /// Overwrite only the keys present in the snapshot. Regions skipped in
    /// a cycle keep whatever value an earlier cycle wrote.
    #[default]
    Merge,
    /// Replace the whole document, so it holds exactly this cycle's keys.
    Replace,
}

/// Source of the remotely editable simulation config.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Reads the current config. `Ok(None)` means no config is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or the stored
    /// value is malformed.
    async fn fetch_config(&self) -> Result<Option<SimulationConfig>, StoreError>;
}

/// Destination for published snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Writes one snapshot as a single logical update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Applies `update` to `document` according to `mode`.
pub fn apply_update(
    document: &mut serde_json::Map<String, serde_json::Value>,
    update: serde_json::Map<String, serde_json::Value>,
    mode: WriteMode,
) {
    match mode {
        WriteMode::Merge => document.extend(update),
        WriteMode::Replace => *document = update,
    }
}
