#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compiled-in catalog of simulated regions.
//!
//! The catalog is built once at startup and never mutated. Its enumeration
//! order is the tie-break order used when ranking regions by density.

use crowdbreak_geography_models::{Coordinates, Region};

/// Indian states and union territories with a representative point each.
///
/// Names match the `sub_region_1` values of the mobility report. Listed in
/// alphabetical order.
pub const INDIA_REGIONS: &[(&str, f64, f64)] = &[
    ("Andaman and Nicobar Islands", 11.7401, 92.6586),
    ("Andhra Pradesh", 15.9129, 79.7400),
    ("Arunachal Pradesh", 27.1000, 93.6167),
    ("Assam", 26.2006, 92.9376),
    ("Bihar", 25.0961, 85.3131),
    ("Chandigarh", 30.7333, 76.7794),
    ("Chhattisgarh", 21.2514, 81.6296),
    ("Delhi", 28.7041, 77.1025),
    ("Goa", 15.2993, 74.1240),
    ("Gujarat", 22.2587, 71.1924),
    ("Haryana", 29.0588, 76.0856),
    ("Himachal Pradesh", 31.1048, 77.1734),
    ("Jammu and Kashmir", 33.7782, 76.5762),
    ("Jharkhand", 23.6102, 85.2799),
    ("Karnataka", 12.9716, 77.5946),
    ("Kerala", 10.1632, 76.6413),
    ("Ladakh", 34.1526, 77.5770),
    ("Lakshadweep", 10.5667, 72.6417),
    ("Madhya Pradesh", 23.2599, 77.4126),
    ("Maharashtra", 19.0760, 72.8777),
    ("Manipur", 24.6637, 93.9063),
    ("Meghalaya", 25.4670, 91.3662),
    ("Mizoram", 23.1645, 92.9376),
    ("Nagaland", 26.1584, 94.5624),
    ("Odisha", 20.9517, 85.0985),
    ("Puducherry", 11.9416, 79.8083),
    ("Punjab", 30.7333, 76.7794),
    ("Rajasthan", 27.0238, 74.2179),
    ("Sikkim", 27.5330, 88.5122),
    ("Tamil Nadu", 11.1271, 78.6569),
    ("Telangana", 17.3850, 78.4867),
    ("Tripura", 23.9408, 91.9882),
    ("Uttar Pradesh", 26.8467, 80.9462),
    ("Uttarakhand", 30.0668, 79.0193),
    ("West Bengal", 22.9868, 87.8550),
];

/// Immutable, ordered registry of regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// Builds the catalog of Indian states and union territories.
    #[must_use]
    pub fn india() -> Self {
        Self::from_table(INDIA_REGIONS)
    }

    /// Builds a catalog from `(name, lat, lng)` rows, preserving order.
    #[must_use]
    pub fn from_table(rows: &[(&str, f64, f64)]) -> Self {
        Self {
            regions: rows
                .iter()
                .map(|&(name, lat, lng)| Region::new(name, Coordinates::new(lat, lng)))
                .collect(),
        }
    }

    /// Iterates the regions in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Looks up a region by its display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Returns the fixed coordinates of the region with this display name.
    #[must_use]
    pub fn coordinates(&self, name: &str) -> Option<Coordinates> {
        self.get(name).map(|r| r.coordinates)
    }

    /// Number of regions in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the catalog has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<'a> IntoIterator for &'a RegionCatalog {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn india_region_count() {
        assert_eq!(RegionCatalog::india().len(), 35);
    }

    #[test]
    fn region_ids_are_unique() {
        let catalog = RegionCatalog::india();
        let mut seen = BTreeSet::new();
        for region in &catalog {
            assert!(seen.insert(&region.id), "Duplicate region id: {}", region.id);
        }
    }

    #[test]
    fn region_ids_never_collide_with_risk_key() {
        for region in &RegionCatalog::india() {
            assert_ne!(region.id, "risk");
        }
    }

    #[test]
    fn enumeration_order_matches_table() {
        let catalog = RegionCatalog::india();
        let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<&str> = INDIA_REGIONS.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn coordinates_lookup() {
        let catalog = RegionCatalog::india();
        let delhi = catalog.coordinates("Delhi").unwrap();
        assert!((delhi.lat - 28.7041).abs() < f64::EPSILON);
        assert!((delhi.lng - 77.1025).abs() < f64::EPSILON);
        assert!(catalog.coordinates("Atlantis").is_none());
    }

    #[test]
    fn ids_are_slugs() {
        let catalog = RegionCatalog::india();
        assert_eq!(catalog.get("Tamil Nadu").unwrap().id, "tamil_nadu");
        assert_eq!(
            catalog.get("Andaman and Nicobar Islands").unwrap().id,
            "andaman_and_nicobar_islands"
        );
    }
}
