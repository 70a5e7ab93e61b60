#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region and coordinate types.
//!
//! A region is one of the fixed geographic zones the simulator tracks. Its
//! identifier doubles as the key under which the region's zone state is
//! published, so it must stay stable and key-safe.

use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A tracked geographic region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Key-safe slug derived from [`Region::name`] (e.g. `"tamil_nadu"`).
    pub id: String,
    /// Display name exactly as it appears in the mobility dataset's
    /// `sub_region_1` column (e.g. `"Tamil Nadu"`).
    pub name: String,
    /// Representative point for the region.
    pub coordinates: Coordinates,
}

impl Region {
    /// Creates a region, deriving its identifier from the display name.
    #[must_use]
    pub fn new(name: &str, coordinates: Coordinates) -> Self {
        Self {
            id: region_slug(name),
            name: name.to_owned(),
            coordinates,
        }
    }
}

/// Normalizes a display name into a store-key-safe slug.
///
/// Spaces become underscores, `&` becomes `and`, and the result is
/// lowercased: `"Jammu & Kashmir"` becomes `"jammu_and_kashmir"`.
#[must_use]
pub fn region_slug(name: &str) -> String {
    name.trim()
        .replace(' ', "_")
        .replace('&', "and")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_spaces_and_lowercases() {
        assert_eq!(region_slug("Tamil Nadu"), "tamil_nadu");
        assert_eq!(region_slug("Delhi"), "delhi");
    }

    #[test]
    fn slug_spells_out_ampersand() {
        assert_eq!(region_slug("Jammu & Kashmir"), "jammu_and_kashmir");
        assert_eq!(
            region_slug("Dadra and Nagar Haveli & Daman and Diu"),
            "dadra_and_nagar_haveli_and_daman_and_diu"
        );
    }

    #[test]
    fn slug_ignores_surrounding_whitespace() {
        assert_eq!(region_slug("  Goa "), "goa");
    }

    #[test]
    fn new_region_derives_id() {
        let region = Region::new("West Bengal", Coordinates::new(22.9868, 87.8550));
        assert_eq!(region.id, "west_bengal");
        assert_eq!(region.name, "West Bengal");
        assert!((region.coordinates.lat - 22.9868).abs() < f64::EPSILON);
    }
}
