//! JSON documents in a local directory.
//!
//! Useful for running the simulator without a hosted database: another
//! process can edit `{config_name}.json` to switch modes and read
//! `{snapshot_name}.json` for the latest snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crowdbreak_simulation_models::{SimulationConfig, Snapshot};

use crate::{ConfigSource, SnapshotSink, StoreError, WriteMode, apply_update};

/// File-backed store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    config_file: PathBuf,
    snapshot_file: PathBuf,
    write_mode: WriteMode,
}

impl JsonFileStore {
    /// Creates a store keeping `{config_name}.json` and
    /// `{snapshot_name}.json` under `dir`.
    #[must_use]
    pub fn new(dir: &Path, config_name: &str, snapshot_name: &str, write_mode: WriteMode) -> Self {
        Self {
            config_file: dir.join(format!("{config_name}.json")),
            snapshot_file: dir.join(format!("{snapshot_name}.json")),
            write_mode,
        }
    }

    /// Path of the config document.
    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Path of the snapshot document.
    #[must_use]
    pub fn snapshot_file(&self) -> &Path {
        &self.snapshot_file
    }

    /// Reads the current snapshot document, empty if it does not exist.
    async fn read_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.snapshot_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = serde_json::from_str(&contents)?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            serde_json::Value::Null => Ok(serde_json::Map::new()),
            _ => Err(StoreError::NotAnObject {
                location: self.snapshot_file.display().to_string(),
            }),
        }
    }
}

#[async_trait]
impl ConfigSource for JsonFileStore {
    async fn fetch_config(&self) -> Result<Option<SimulationConfig>, StoreError> {
        match tokio::fs::read_to_string(&self.config_file).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SnapshotSink for JsonFileStore {
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let update = snapshot.to_update()?;

        let mut document = match self.write_mode {
            WriteMode::Merge => self.read_document().await?,
            WriteMode::Replace => serde_json::Map::new(),
        };
        apply_update(&mut document, update, self.write_mode);

        if let Some(parent) = self.snapshot_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers only ever see a complete document.
        let tmp = self.snapshot_file.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&serde_json::Value::Object(document))?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.snapshot_file).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use crowdbreak_simulation_models::{Mode, RiskAssessment, RiskLevel, ZoneState};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crowdbreak_file_store_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn snapshot(zone_id: &str, density: u8) -> Snapshot {
        let mut zones = BTreeMap::new();
        zones.insert(
            zone_id.to_owned(),
            ZoneState {
                density,
                speed: 0.5,
                lat: 1.0,
                lng: 2.0,
            },
        );
        Snapshot {
            mode: Mode::Festival,
            date: NaiveDate::from_ymd_opt(2021, 11, 4).unwrap(),
            zones,
            risk: RiskAssessment {
                level: RiskLevel::Medium,
                explanation: "e".to_owned(),
                action: "a".to_owned(),
            },
        }
    }

    #[tokio::test]
    async fn missing_config_file_is_absent() {
        let dir = scratch_dir("missing_config");
        let store = JsonFileStore::new(&dir, "simulationConfig", "snapshot", WriteMode::Merge);
        assert_eq!(store.fetch_config().await.unwrap(), None);
    }

    #[tokio::test]
    async fn reads_config_file() {
        let dir = scratch_dir("config");
        std::fs::create_dir_all(&dir).unwrap();
        let store = JsonFileStore::new(&dir, "simulationConfig", "snapshot", WriteMode::Merge);
        std::fs::write(store.config_file(), r#"{"currentMode":"protest"}"#).unwrap();

        let config = store.fetch_config().await.unwrap().unwrap();
        assert_eq!(config.mode(), Mode::Protest);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn merge_accumulates_keys() {
        let dir = scratch_dir("merge");
        let store = JsonFileStore::new(&dir, "simulationConfig", "snapshot", WriteMode::Merge);

        store.publish(&snapshot("goa", 40)).await.unwrap();
        store.publish(&snapshot("delhi", 80)).await.unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.snapshot_file()).unwrap()).unwrap();
        assert_eq!(doc["goa"]["density"], 40);
        assert_eq!(doc["delhi"]["density"], 80);
        assert_eq!(doc["risk"]["action"], "a");
        assert!(!store.snapshot_file().with_extension("json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn replace_keeps_only_latest() {
        let dir = scratch_dir("replace");
        let store = JsonFileStore::new(&dir, "simulationConfig", "snapshot", WriteMode::Replace);

        store.publish(&snapshot("goa", 40)).await.unwrap();
        store.publish(&snapshot("delhi", 80)).await.unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.snapshot_file()).unwrap()).unwrap();
        assert!(doc.get("goa").is_none());
        assert_eq!(doc["delhi"]["density"], 80);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_non_object_document() {
        let dir = scratch_dir("non_object");
        std::fs::create_dir_all(&dir).unwrap();
        let store = JsonFileStore::new(&dir, "simulationConfig", "snapshot", WriteMode::Merge);
        std::fs::write(store.snapshot_file(), "[1, 2, 3]").unwrap();

        let err = store.publish(&snapshot("goa", 40)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
