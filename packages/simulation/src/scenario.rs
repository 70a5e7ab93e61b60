//! Scenario table: candidate dates and risk narrative per mode.
//!
//! Each mode maps to a fixed list of historical dates whose mobility
//! figures stand in for that kind of day. The table is parsed once at
//! startup and read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use crowdbreak_simulation_models::Mode;
use rand::Rng;
use serde::Deserialize;

use crate::ScenarioError;

/// Table compiled into the binary.
const DEFAULT_TABLE: &str = include_str!("../scenarios/default.toml");

/// One mode's entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Candidate historical dates. Never empty.
    pub dates: Vec<NaiveDate>,
    /// Explanation template.
    pub explanation: String,
    /// Recommended action template.
    pub action: String,
}

/// Validated mode -> scenario lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioTable {
    normal: Scenario,
    others: BTreeMap<Mode, Scenario>,
}

impl ScenarioTable {
    /// Returns the built-in table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded table fails to parse. Since it is a
    /// compile-time constant, a failure indicates a development error and
    /// is caught by the tests below.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_toml_str(DEFAULT_TABLE)
            .unwrap_or_else(|e| panic!("Failed to parse built-in scenario table: {e}"))
    }

    /// Parses and validates a table.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the TOML is malformed, names an unknown
    /// mode, lacks the `normal` entry, or has a mode without dates.
    pub fn from_toml_str(contents: &str) -> Result<Self, ScenarioError> {
        let mut others: BTreeMap<Mode, Scenario> = toml::from_str(contents)?;

        if let Some((mode, _)) = others.iter().find(|(_, s)| s.dates.is_empty()) {
            return Err(ScenarioError::NoDates { mode: *mode });
        }
        let normal = others
            .remove(&Mode::Normal)
            .ok_or(ScenarioError::MissingNormal)?;

        Ok(Self { normal, others })
    }

    /// Reads and validates a table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// The entry for `mode`, or the `normal` entry when `mode` has none.
    #[must_use]
    pub fn scenario(&self, mode: Mode) -> &Scenario {
        self.others.get(&mode).unwrap_or(&self.normal)
    }

    /// Candidate dates for `mode`, never empty.
    #[must_use]
    pub fn candidates(&self, mode: Mode) -> &[NaiveDate] {
        &self.scenario(mode).dates
    }

    /// Picks one of `mode`'s candidate dates uniformly at random.
    pub fn select_date<R: Rng + ?Sized>(&self, mode: Mode, rng: &mut R) -> NaiveDate {
        let dates = self.candidates(mode);
        dates[rng.random_range(0..dates.len())]
    }
}

/// Fills `{density}` and `{excess}` in a template.
///
/// `{excess}` is the density above the 40-point baseline capacity and may
/// be negative. No region-specific text is ever substituted.
#[must_use]
pub fn render(template: &str, density: u8) -> String {
    let excess = i16::from(density) - 40;
    template
        .replace("{density}", &density.to_string())
        .replace("{excess}", &excess.to_string())
}
