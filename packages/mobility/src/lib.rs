#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mobility report access for the crowd density simulator.
//!
//! The raw global report is large, so it is narrowed to a single country
//! once ([`prepare`]) and the reduced extract is cached on disk. The
//! extract is then loaded into an in-memory [`MobilityDataset`] that
//! answers `(region, date)` lookups for every simulation cycle.

pub mod dataset;
pub mod prepare;

use std::path::PathBuf;

pub use dataset::MobilityDataset;
pub use prepare::{filter_country, load_or_prepare};

/// Errors that can occur while preparing or loading mobility data.
#[derive(Debug, thiserror::Error)]
pub enum MobilityError {
    /// I/O error (file read/write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read or write failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("{} has no '{column}' column", path.display())]
    MissingColumn {
        /// File being read.
        path: PathBuf,
        /// Name of the missing column.
        column: String,
    },

    /// Neither the cached extract nor the raw report is available.
    #[error("No mobility data found at {} or {}", cached.display(), raw.display())]
    Unavailable {
        /// Expected cached extract location.
        cached: PathBuf,
        /// Expected raw report location.
        raw: PathBuf,
    },

    /// The file parsed but produced no usable records.
    #[error("{} contains no mobility records", path.display())]
    Empty {
        /// File that was read.
        path: PathBuf,
    },
}

/// Finds the index of `column` in a CSV header row.
fn column_index(
    headers: &csv::StringRecord,
    column: &str,
    path: &std::path::Path,
) -> Result<usize, MobilityError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| MobilityError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_paths() {
        let err = MobilityError::MissingColumn {
            path: PathBuf::from("data/extract.csv"),
            column: "date".to_owned(),
        };
        assert_eq!(err.to_string(), "data/extract.csv has no 'date' column");

        let err = MobilityError::Unavailable {
            cached: PathBuf::from("a.csv"),
            raw: PathBuf::from("b.csv"),
        };
        assert_eq!(err.to_string(), "No mobility data found at a.csv or b.csv");

        let err = MobilityError::Empty {
            path: PathBuf::from("a.csv"),
        };
        assert_eq!(err.to_string(), "a.csv contains no mobility records");
    }

    #[test]
    fn missing_column_is_reported() {
        let headers = csv::StringRecord::from(vec!["sub_region_1", " date "]);
        let path = std::path::Path::new("x.csv");
        assert_eq!(column_index(&headers, "date", path).unwrap(), 1);
        assert!(matches!(
            column_index(&headers, "country_region", path),
            Err(MobilityError::MissingColumn { column, .. }) if column == "country_region"
        ));
    }
}
