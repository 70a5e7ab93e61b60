//! Mobility deviation to density/speed transform.
//!
//! Larger deviations from baseline, in either direction, read as heavier
//! crowding. Non-normal scenarios amplify the effect. The result saturates
//! at [`MAX_DENSITY`] and never drops below [`MIN_DENSITY`].

use crowdbreak_geography_models::Region;
use crowdbreak_simulation_models::{MAX_DENSITY, MIN_DENSITY, Mode, ZoneState};

/// Density of a region sitting exactly on its baseline.
pub const BASE_DENSITY: f64 = 45.0;

/// Density points per percentage point of deviation.
pub const DEVIATION_WEIGHT: f64 = 0.5;

/// Deviation multiplier applied in every mode except `normal`.
pub const AMPLIFIED_MULTIPLIER: f64 = 1.6;

/// Density at which speed would reach zero.
pub const SPEED_DIVISOR: f64 = 110.0;

/// Deviation multiplier for `mode`.
#[must_use]
pub const fn multiplier(mode: Mode) -> f64 {
    if mode.is_amplified() {
        AMPLIFIED_MULTIPLIER
    } else {
        1.0
    }
}

/// Density score for a baseline deviation.
///
/// `clamp(round(45 + |deviation| * 0.5 * multiplier), 10, 100)`. A NaN
/// deviation yields [`MIN_DENSITY`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn density_for(deviation: f64, mode: Mode) -> u8 {
    let raw = deviation
        .abs()
        .mul_add(DEVIATION_WEIGHT * multiplier(mode), BASE_DENSITY);
    if raw.is_nan() {
        return MIN_DENSITY;
    }
    raw.round()
        .clamp(f64::from(MIN_DENSITY), f64::from(MAX_DENSITY)) as u8
}

/// Flow speed for a density, `round(1 - density / 110, 2)`.
#[must_use]
pub fn speed_for(density: u8) -> f64 {
    ((1.0 - f64::from(density) / SPEED_DIVISOR) * 100.0).round() / 100.0
}

/// Computes a region's zone state from its deviation under `mode`.
#[must_use]
pub fn compute_zone(region: &Region, deviation: f64, mode: Mode) -> ZoneState {
    let density = density_for(deviation, mode);
    ZoneState {
        density,
        speed: speed_for(density),
        lat: region.coordinates.lat,
        lng: region.coordinates.lng,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crowdbreak_geography_models::Coordinates;

    fn delhi() -> Region {
        Region::new("Delhi", Coordinates::new(28.7041, 77.1025))
    }

    #[test]
    fn normal_mode_example() {
        let zone = compute_zone(&delhi(), -60.0, Mode::Normal);
        assert_eq!(zone.density, 75);
        assert_eq!(zone.speed, 0.32);
        assert_eq!(zone.lat, 28.7041);
        assert_eq!(zone.lng, 77.1025);
    }

    #[test]
    fn protest_mode_example() {
        let zone = compute_zone(&delhi(), -60.0, Mode::Protest);
        assert_eq!(zone.density, 93);
        assert_eq!(zone.speed, 0.15);
    }

    #[test]
    fn zero_deviation_is_base_density() {
        assert_eq!(density_for(0.0, Mode::Normal), 45);
        assert_eq!(density_for(0.0, Mode::Festival), 45);
    }

    #[test]
    fn saturates_at_max() {
        assert_eq!(density_for(-500.0, Mode::Normal), MAX_DENSITY);
        assert_eq!(density_for(f64::INFINITY, Mode::Religious), MAX_DENSITY);
        assert_eq!(speed_for(MAX_DENSITY), 0.09);
    }

    #[test]
    fn nan_is_floored() {
        assert_eq!(density_for(f64::NAN, Mode::Normal), MIN_DENSITY);
        assert_eq!(speed_for(MIN_DENSITY), 0.91);
    }

    #[test]
    fn bounded_for_all_deviations() {
        for mode in Mode::all() {
            for tenth in -3000..=3000 {
                let deviation = f64::from(tenth) / 10.0;
                let zone = compute_zone(&delhi(), deviation, *mode);
                assert!((MIN_DENSITY..=MAX_DENSITY).contains(&zone.density));
                assert!((0.0..=0.91).contains(&zone.speed));
                assert_eq!(zone.speed, speed_for(zone.density));
            }
        }
    }

    #[test]
    fn monotonic_in_absolute_deviation() {
        for mode in Mode::all() {
            let mut previous = 0;
            for tenth in 0..=3000 {
                let magnitude = f64::from(tenth) / 10.0;
                let up = density_for(magnitude, *mode);
                let down = density_for(-magnitude, *mode);
                assert_eq!(up, down, "sign should not matter at {magnitude}");
                assert!(up >= previous, "{mode} decreased at {magnitude}");
                previous = up;
            }
        }
    }

    #[test]
    fn amplified_modes_never_lower_density() {
        for tenth in 0..=3000 {
            let deviation = -f64::from(tenth) / 10.0;
            let normal = density_for(deviation, Mode::Normal);
            for mode in [Mode::Festival, Mode::Protest, Mode::Religious] {
                assert!(density_for(deviation, mode) >= normal);
            }
        }
    }

    #[test]
    fn pure_function() {
        let a = compute_zone(&delhi(), -37.5, Mode::Festival);
        let b = compute_zone(&delhi(), -37.5, Mode::Festival);
        assert_eq!(a.density, b.density);
        assert_eq!(a.speed.to_bits(), b.speed.to_bits());
        assert_eq!(a.lat.to_bits(), b.lat.to_bits());
    }
}
