//! One-time reduction of the global mobility report to a single country.
//!
//! The global report is several hundred megabytes; the simulator only
//! needs four columns for one country. The reduced extract is written next
//! to the raw file and reused on later starts.

use std::path::Path;

use crowdbreak_mobility_models::{COUNTRY_COLUMN, DATE_COLUMN, DEVIATION_COLUMN, REGION_COLUMN};

use crate::{MobilityDataset, MobilityError, column_index};

/// Columns kept in the extract, in output order.
const EXTRACT_COLUMNS: [&str; 4] = [REGION_COLUMN, DATE_COLUMN, COUNTRY_COLUMN, DEVIATION_COLUMN];

/// Streams `raw` and writes the rows for `country` to `out`.
///
/// Only rows with a non-empty region are kept. The extract is written to
/// a temporary file first and renamed into place, so an interrupted run
/// never leaves a truncated cache behind.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`MobilityError`] if the raw report cannot be read, lacks a
/// required column, or the extract cannot be written.
pub fn filter_country(raw: &Path, country: &str, out: &Path) -> Result<u64, MobilityError> {
    log::info!(
        "Filtering {} to country '{country}' (one-time setup)...",
        raw.display()
    );

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(raw)?;
    let headers = reader.headers()?.clone();

    let mut indices = [0_usize; EXTRACT_COLUMNS.len()];
    for (slot, column) in indices.iter_mut().zip(EXTRACT_COLUMNS) {
        *slot = column_index(&headers, column, raw)?;
    }
    let [region_idx, _, country_idx, _] = indices;

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = out.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(EXTRACT_COLUMNS)?;

    let mut kept: u64 = 0;
    let mut scanned: u64 = 0;

    for result in reader.records() {
        let row = result?;
        scanned += 1;

        if row.get(country_idx).map(str::trim) != Some(country) {
            continue;
        }
        if row.get(region_idx).is_none_or(|r| r.trim().is_empty()) {
            continue;
        }

        writer.write_record(indices.iter().map(|&i| row.get(i).unwrap_or("").trim()))?;
        kept += 1;
    }

    writer.flush()?;
    drop(writer);
    std::fs::rename(&tmp, out)?;

    log::info!(
        "Wrote {kept} of {scanned} rows for '{country}' to {}",
        out.display()
    );

    Ok(kept)
}

/// Loads the cached extract, building it from the raw report first if the
/// cache does not exist yet.
///
/// # Errors
///
/// Returns [`MobilityError::Unavailable`] when neither file exists, and
/// any error from [`filter_country`] or [`MobilityDataset::from_csv_path`].
pub fn load_or_prepare(
    cached: &Path,
    raw: &Path,
    country: &str,
) -> Result<MobilityDataset, MobilityError> {
    if !cached.exists() {
        if !raw.exists() {
            return Err(MobilityError::Unavailable {
                cached: cached.to_path_buf(),
                raw: raw.to_path_buf(),
            });
        }
        filter_country(raw, country, cached)?;
    } else {
        log::debug!("Using cached mobility extract at {}", cached.display());
    }

    MobilityDataset::from_csv_path(cached)
}
