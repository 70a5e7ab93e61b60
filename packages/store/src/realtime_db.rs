//! Realtime Database client over the REST interface.
//!
//! Every node is addressable as `{base_url}/{path}.json`. A `GET` returns
//! the node (JSON `null` when absent), `PATCH` merges children into it, and
//! `PUT` replaces it.

use async_trait::async_trait;
use crowdbreak_simulation_models::{SimulationConfig, Snapshot};

use crate::{ConfigSource, SnapshotSink, StoreError, WriteMode};

/// Default node holding the simulation config.
pub const DEFAULT_CONFIG_PATH: &str = "simulationConfig";

/// Default node receiving snapshots.
pub const DEFAULT_SNAPSHOT_PATH: &str = "final_demo_data";

/// Realtime Database store.
pub struct RealtimeDbStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    config_path: String,
    snapshot_path: String,
    write_mode: WriteMode,
}

impl RealtimeDbStore {
    /// Creates a client rooted at `base_url` using the default node paths
    /// and [`WriteMode::Merge`].
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_token: None,
            config_path: DEFAULT_CONFIG_PATH.to_owned(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_owned(),
            write_mode: WriteMode::Merge,
        }
    }

    /// Sends `token` as the `auth` query parameter on every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Overrides the config node path.
    #[must_use]
    pub fn with_config_path(mut self, path: &str) -> Self {
        self.config_path = path.trim_matches('/').to_owned();
        self
    }

    /// Overrides the snapshot node path.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: &str) -> Self {
        self.snapshot_path = path.trim_matches('/').to_owned();
        self
    }

    /// Sets how snapshots combine with the stored node.
    #[must_use]
    pub const fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// REST URL for a node.
    #[must_use]
    pub fn node_url(&self, path: &str) -> String {
        format!("{}/{path}.json", self.base_url)
    }

    /// Attaches the auth parameter when configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    /// Builds the config read: `GET` on the config node.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the URL is invalid.
    pub fn config_request(&self) -> Result<reqwest::Request, StoreError> {
        let url = self.node_url(&self.config_path);
        Ok(self.authorize(self.client.get(url)).build()?)
    }

    /// Builds the snapshot write: `PATCH` for [`WriteMode::Merge`], `PUT`
    /// for [`WriteMode::Replace`], with the flattened snapshot as body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot cannot be serialized or the
    /// URL is invalid.
    pub fn snapshot_request(&self, snapshot: &Snapshot) -> Result<reqwest::Request, StoreError> {
        let url = self.node_url(&self.snapshot_path);
        let update = snapshot.to_update()?;

        let request = match self.write_mode {
            WriteMode::Merge => self.client.patch(url),
            WriteMode::Replace => self.client.put(url),
        };

        Ok(self.authorize(request).json(&update).build()?)
    }

    /// Reads a response body, turning non-success statuses into errors.
    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        check_status(status, body)
    }
}

/// Passes `body` through on success, else [`StoreError::Status`].
fn check_status(status: reqwest::StatusCode, body: String) -> Result<String, StoreError> {
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[async_trait]
impl ConfigSource for RealtimeDbStore {
    async fn fetch_config(&self) -> Result<Option<SimulationConfig>, StoreError> {
        let response = self.client.execute(self.config_request()?).await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SnapshotSink for RealtimeDbStore {
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let request = self.snapshot_request(snapshot)?;
        let url = request.url().clone();

        let response = self.client.execute(request).await?;
        Self::read_body(response).await?;

        log::debug!(
            "Wrote {} zones to {} ({})",
            snapshot.zones.len(),
            url.path(),
            self.write_mode
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use crowdbreak_simulation_models::{Mode, RiskAssessment, RiskLevel, ZoneState};

    fn snapshot() -> Snapshot {
        Snapshot {
            mode: Mode::Protest,
            date: NaiveDate::from_ymd_opt(2021, 1, 26).unwrap(),
            zones: BTreeMap::from([(
                "delhi".to_owned(),
                ZoneState {
                    density: 93,
                    speed: 0.15,
                    lat: 28.7041,
                    lng: 77.1025,
                },
            )]),
            risk: RiskAssessment {
                level: RiskLevel::High,
                explanation: "e".to_owned(),
                action: "a".to_owned(),
            },
        }
    }

    fn body(request: &reqwest::Request) -> serde_json::Value {
        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn merge_writes_patch() {
        let store = RealtimeDbStore::new("https://example.firebaseio.com");
        let request = store.snapshot_request(&snapshot()).unwrap();

        assert_eq!(request.method(), &reqwest::Method::PATCH);
        assert_eq!(
            request.url().as_str(),
            "https://example.firebaseio.com/final_demo_data.json"
        );
        let body = body(&request);
        assert_eq!(body["delhi"]["density"], 93);
        assert_eq!(body["risk"]["level"], "High");
    }

    #[test]
    fn replace_writes_put() {
        let store = RealtimeDbStore::new("https://example.firebaseio.com")
            .with_write_mode(WriteMode::Replace);
        let request = store.snapshot_request(&snapshot()).unwrap();
        assert_eq!(request.method(), &reqwest::Method::PUT);
    }

    #[test]
    fn config_read_is_authorized_get() {
        let store = RealtimeDbStore::new("https://example.firebaseio.com")
            .with_auth_token(Some("secret".to_owned()))
            .with_config_path("settings");
        let request = store.config_request().unwrap();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(request.url().path(), "/settings.json");
        assert_eq!(request.url().query(), Some("auth=secret"));
        assert!(request.body().is_none());
    }

    #[test]
    fn error_status_is_reported() {
        let err = check_status(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":"Permission denied"}"#.to_owned(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Status { status: 401, ref body } if body.contains("Permission denied")
        ));

        assert_eq!(
            check_status(reqwest::StatusCode::OK, "null".to_owned()).unwrap(),
            "null"
        );
    }

    #[test]
    fn node_urls() {
        let store = RealtimeDbStore::new("https://example.firebaseio.com/");
        assert_eq!(
            store.node_url(DEFAULT_CONFIG_PATH),
            "https://example.firebaseio.com/simulationConfig.json"
        );

        let store = store.with_snapshot_path("/zones/");
        assert_eq!(
            store.node_url(&store.snapshot_path),
            "https://example.firebaseio.com/zones.json"
        );
    }

    #[test]
    fn empty_auth_token_is_ignored() {
        let store = RealtimeDbStore::new("https://example.firebaseio.com")
            .with_auth_token(Some(String::new()));
        assert!(store.auth_token.is_none());
    }

    #[test]
    fn null_node_is_absent_config() {
        let config: Option<SimulationConfig> = serde_json::from_str("null").unwrap();
        assert!(config.is_none());
    }
}
