#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types produced and consumed by a simulation cycle.
//!
//! A cycle reads a [`SimulationConfig`], resolves it to a [`Mode`], and
//! produces a [`Snapshot`]: one [`ZoneState`] per region with data plus a
//! single [`RiskAssessment`].

use std::collections::BTreeMap;
use std::str::FromStr as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Key under which the risk assessment is published, alongside the
/// per-region zone keys.
pub const RISK_KEY: &str = "risk";

/// Lowest density a zone can report.
pub const MIN_DENSITY: u8 = 10;

/// Highest density a zone can report.
pub const MAX_DENSITY: u8 = 100;

/// Top-region density above which the risk level is [`RiskLevel::High`].
pub const HIGH_RISK_THRESHOLD: u8 = 75;

/// Historical scenario driving the current cycle.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Mode {
    /// Festive travel surge.
    Festival,
    /// Protest or demonstration.
    Protest,
    /// Religious mass gathering.
    Religious,
    /// Ordinary day.
    #[default]
    Normal,
}

impl Mode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Festival, Self::Protest, Self::Religious, Self::Normal]
    }

    /// Resolves an external mode signal, falling back to [`Mode::Normal`]
    /// when the signal is absent or unrecognized.
    #[must_use]
    pub fn from_signal(signal: Option<&str>) -> Self {
        signal
            .and_then(|s| Self::from_str(s.trim()).ok())
            .unwrap_or_default()
    }

    /// Whether this mode amplifies congestion.
    #[must_use]
    pub const fn is_amplified(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Remotely editable simulation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Raw mode signal as written by the operator.
    #[serde(default)]
    pub current_mode: Option<String>,
}

impl SimulationConfig {
    /// The resolved mode, defaulting to [`Mode::Normal`].
    #[must_use]
    pub fn mode(&self) -> Mode {
        Mode::from_signal(self.signal())
    }

    /// The trimmed mode signal. Blank signals count as absent.
    #[must_use]
    pub fn signal(&self) -> Option<&str> {
        self.current_mode
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Congestion state of a single region for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Density score in `[MIN_DENSITY, MAX_DENSITY]`.
    pub density: u8,
    /// Flow speed, `round(1 - density / 110, 2)`.
    pub speed: f64,
    /// Region latitude.
    pub lat: f64,
    /// Region longitude.
    pub lng: f64,
}

/// Qualitative risk level.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Top region at or below the threshold.
    Medium,
    /// Top region above the threshold.
    High,
}

impl RiskLevel {
    /// Classifies the most congested region's density.
    #[must_use]
    pub const fn from_density(density: u8) -> Self {
        if density > HIGH_RISK_THRESHOLD {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Narrative risk assessment for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Risk level.
    pub level: RiskLevel,
    /// What is happening.
    pub explanation: String,
    /// What responders should do.
    pub action: String,
}

/// A region ranked by density, fed to the risk assessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRegion {
    /// Region display name.
    pub name: String,
    /// Region density for this cycle.
    pub density: u8,
}

/// Everything one cycle publishes.
///
/// Zones and risk always describe the same mode and scenario date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Mode the cycle ran under.
    pub mode: Mode,
    /// Historical date the cycle sampled.
    pub date: NaiveDate,
    /// Zone states keyed by region id.
    pub zones: BTreeMap<String, ZoneState>,
    /// Risk assessment for the cycle.
    pub risk: RiskAssessment,
}

impl Snapshot {
    /// Flattens the snapshot into the store layout: one entry per region
    /// id plus a [`RISK_KEY`] entry.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a value fails to serialize
    /// (e.g. a non-finite coordinate).
    pub fn to_update(&self) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
        let mut update = serde_json::Map::new();
        for (id, zone) in &self.zones {
            update.insert(id.clone(), serde_json::to_value(zone)?);
        }
        update.insert(RISK_KEY.to_owned(), serde_json::to_value(&self.risk)?);
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_signal_is_absent() {
        let config = |mode: Option<&str>| SimulationConfig {
            current_mode: mode.map(str::to_owned),
        };
        assert_eq!(config(Some("  ")).signal(), None);
        assert_eq!(config(Some("")).signal(), None);
        assert_eq!(config(None).signal(), None);
        assert_eq!(config(Some(" Protest ")).signal(), Some("Protest"));
        assert_eq!(config(Some("   ")).mode(), Mode::Normal);
    }

    #[test]
    fn mode_from_signal() {
        assert_eq!(Mode::from_signal(Some("protest")), Mode::Protest);
        assert_eq!(Mode::from_signal(Some("Festival")), Mode::Festival);
        assert_eq!(Mode::from_signal(Some(" religious ")), Mode::Religious);
        assert_eq!(Mode::from_signal(Some("carnival")), Mode::Normal);
        assert_eq!(Mode::from_signal(Some("")), Mode::Normal);
        assert_eq!(Mode::from_signal(None), Mode::Normal);
    }

    #[test]
    fn only_normal_is_unamplified() {
        for mode in Mode::all() {
            assert_eq!(mode.is_amplified(), *mode != Mode::Normal);
        }
    }

    #[test]
    fn config_defaults_to_normal() {
        let config: SimulationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mode(), Mode::Normal);

        let config: SimulationConfig =
            serde_json::from_str(r#"{"currentMode":"festival"}"#).unwrap();
        assert_eq!(config.mode(), Mode::Festival);
    }

    #[test]
    fn risk_level_threshold_is_strict() {
        assert_eq!(RiskLevel::from_density(75), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_density(76), RiskLevel::High);
        assert_eq!(RiskLevel::from_density(MIN_DENSITY), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_density(MAX_DENSITY), RiskLevel::High);
    }

    #[test]
    fn update_layout_is_flat() {
        let mut zones = BTreeMap::new();
        zones.insert(
            "delhi".to_owned(),
            ZoneState {
                density: 93,
                speed: 0.15,
                lat: 28.7041,
                lng: 77.1025,
            },
        );
        let snapshot = Snapshot {
            mode: Mode::Protest,
            date: NaiveDate::from_ymd_opt(2021, 1, 26).unwrap(),
            zones,
            risk: RiskAssessment {
                level: RiskLevel::High,
                explanation: "x".to_owned(),
                action: "y".to_owned(),
            },
        };

        let update = snapshot.to_update().unwrap();
        assert_eq!(update.len(), 2);
        assert_eq!(update["delhi"]["density"], 93);
        assert_eq!(update["delhi"]["lng"], 77.1025);
        assert_eq!(update[RISK_KEY]["level"], "High");
    }
}
