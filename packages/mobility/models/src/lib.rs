#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Historical mobility record types.
//!
//! Records come from a country-filtered extract of a community mobility
//! report. Each one carries the percentage change in transit-station
//! visits relative to a pre-established baseline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column holding the region display name.
pub const REGION_COLUMN: &str = "sub_region_1";
/// Column holding the ISO `YYYY-MM-DD` date.
pub const DATE_COLUMN: &str = "date";
/// Column holding the country name.
pub const COUNTRY_COLUMN: &str = "country_region";
/// Column holding the transit-station baseline deviation.
pub const DEVIATION_COLUMN: &str = "transit_stations_percent_change_from_baseline";

/// One row of the filtered mobility extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilityRecord {
    /// Region display name.
    #[serde(rename = "sub_region_1")]
    pub region: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Percentage change from baseline. `None` when the report has no
    /// value for this region and date.
    #[serde(rename = "transit_stations_percent_change_from_baseline")]
    pub deviation: Option<f64>,
}

/// Read-only `(region, date) -> deviation` lookup.
///
/// Implementations must be prepared up front; a lookup never re-reads the
/// underlying source.
pub trait MobilityLookup: Send + Sync {
    /// Returns the baseline deviation for `region` on `date`.
    ///
    /// `None` means "no data" and is distinct from a deviation of zero.
    fn lookup(&self, region: &str, date: NaiveDate) -> Option<f64>;
}
