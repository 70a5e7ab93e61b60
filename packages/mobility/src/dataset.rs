//! In-memory mobility index keyed by date, then region.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use crowdbreak_mobility_models::{
    DATE_COLUMN, DEVIATION_COLUMN, MobilityLookup, MobilityRecord, REGION_COLUMN,
};

use crate::{MobilityError, column_index};

/// Pre-loaded mobility data.
///
/// When the same `(region, date)` pair appears more than once, the first
/// row is kept. In the report the region-level aggregate precedes its
/// district rows, so the first row is the one that describes the region.
#[derive(Debug, Clone, Default)]
pub struct MobilityDataset {
    by_date: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>,
    rows: usize,
}

impl MobilityDataset {
    /// Builds a dataset from already-parsed records.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = MobilityRecord>) -> Self {
        let mut dataset = Self::default();
        for record in records {
            dataset.insert(record);
        }
        dataset
    }

    /// Loads a filtered extract from disk.
    ///
    /// Rows with an empty region or an unparsable date are skipped. Empty,
    /// unparsable, or non-finite deviations are recorded as "no data".
    ///
    /// # Errors
    ///
    /// Returns [`MobilityError`] if the file cannot be read, lacks one of
    /// the required columns, or yields no records at all.
    pub fn from_csv_path(path: &Path) -> Result<Self, MobilityError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

        let headers = reader.headers()?.clone();
        let region_idx = column_index(&headers, REGION_COLUMN, path)?;
        let date_idx = column_index(&headers, DATE_COLUMN, path)?;
        let deviation_idx = column_index(&headers, DEVIATION_COLUMN, path)?;

        let mut dataset = Self::default();
        let mut skipped = 0_u64;

        for result in reader.records() {
            let row = result?;

            let region = row.get(region_idx).unwrap_or("").trim();
            if region.is_empty() {
                skipped += 1;
                continue;
            }

            let raw_date = row.get(date_idx).unwrap_or("").trim();
            let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
                skipped += 1;
                continue;
            };

            let deviation = parse_deviation(row.get(deviation_idx).unwrap_or(""));

            dataset.insert(MobilityRecord {
                region: region.to_owned(),
                date,
                deviation,
            });
        }

        if dataset.is_empty() {
            return Err(MobilityError::Empty {
                path: path.to_path_buf(),
            });
        }

        log::info!(
            "Loaded {} mobility rows covering {} dates from {} ({skipped} skipped)",
            dataset.rows,
            dataset.by_date.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// Adds a record unless its `(region, date)` pair is already present.
    pub fn insert(&mut self, record: MobilityRecord) {
        let deviation = record.deviation.filter(|d| d.is_finite());
        let day = self.by_date.entry(record.date).or_default();
        if !day.contains_key(&record.region) {
            day.insert(record.region, deviation);
            self.rows += 1;
        }
    }

    /// Number of distinct `(region, date)` pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows
    }

    /// Whether no rows were loaded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Whether any row exists for `date`.
    #[must_use]
    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }
}

impl MobilityLookup for MobilityDataset {
    fn lookup(&self, region: &str, date: NaiveDate) -> Option<f64> {
        self.by_date.get(&date)?.get(region).copied().flatten()
    }
}

/// Parses a deviation cell, treating blanks and garbage as missing.
fn parse_deviation(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            log::debug!("Ignoring unparsable deviation value '{trimmed}'");
            None
        }
    }
}
