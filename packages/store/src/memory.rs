//! In-process store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use crowdbreak_simulation_models::{SimulationConfig, Snapshot};

use crate::{ConfigSource, SnapshotSink, StoreError, WriteMode, apply_update};

/// Holds config and published state in memory.
///
/// Can be told to fail reads or writes to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: Mutex<Option<SimulationConfig>>,
    document: Mutex<serde_json::Map<String, serde_json::Value>>,
    published: Mutex<Vec<Snapshot>>,
    write_mode: WriteMode,
    fail_config: AtomicBool,
    fail_publish: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store with the given write mode.
    #[must_use]
    pub fn new(write_mode: WriteMode) -> Self {
        Self {
            write_mode,
            ..Self::default()
        }
    }

    /// Sets the stored config; `None` clears it.
    pub fn set_config(&self, config: Option<SimulationConfig>) {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Sets the stored mode signal.
    pub fn set_mode(&self, mode: &str) {
        self.set_config(Some(SimulationConfig {
            current_mode: Some(mode.to_owned()),
        }));
    }

    /// Makes subsequent config reads fail (or succeed again).
    pub fn fail_config_reads(&self, fail: bool) {
        self.fail_config.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent publishes fail (or succeed again).
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// The document as a reader of the store would see it.
    #[must_use]
    pub fn document(&self) -> serde_json::Map<String, serde_json::Value> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every snapshot successfully published, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<Snapshot> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ConfigSource for MemoryStore {
    async fn fetch_config(&self) -> Result<Option<SimulationConfig>, StoreError> {
        if self.fail_config.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "config unavailable".to_owned(),
            });
        }
        Ok(self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[async_trait]
impl SnapshotSink for MemoryStore {
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "sink unavailable".to_owned(),
            });
        }

        let update = snapshot.to_update()?;
        apply_update(
            &mut self.document.lock().unwrap_or_else(PoisonError::into_inner),
            update,
            self.write_mode,
        );
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
        Ok(())
    }
}
