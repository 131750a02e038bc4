//! Haversine distance and great-circle bearing.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes.

use crate::GeoPoint;
use std::f64::consts::TAU;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two points in meters.
///
/// Uses the Haversine formula on a sphere of radius [`EARTH_RADIUS_M`]. The
/// result is symmetric in its arguments and zero for identical points.
///
/// # Example
/// ```
/// use roadlink_geo::{distance, GeoPoint};
///
/// let berlin = GeoPoint::new(52.5200, 13.4050);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let meters = distance(&berlin, &paris);
/// assert!((meters - 878_000.0).abs() < 10_000.0);
/// ```
#[inline]
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` towards `to`, in radians.
///
/// Measured clockwise from true north and normalised to `[0, 2π)`. The bearing
/// between identical points is `0.0`.
#[inline]
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();
    let d_lon = lon2 - lon1;

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let theta = y.atan2(x).rem_euclid(TAU);
    // rem_euclid can return TAU itself for tiny negative inputs
    if theta >= TAU { 0.0 } else { theta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    // Test data: known distances between cities
    const BERLIN: GeoPoint = GeoPoint { latitude: 52.5200, longitude: 13.4050 };
    const PARIS: GeoPoint = GeoPoint { latitude: 48.8566, longitude: 2.3522 };
    const NEW_YORK: GeoPoint = GeoPoint { latitude: 40.7128, longitude: -74.0060 };
    const TOKYO: GeoPoint = GeoPoint { latitude: 35.6762, longitude: 139.6503 };

    #[test]
    fn test_berlin_to_paris() {
        let meters = distance(&BERLIN, &PARIS);
        // Expected: ~878 km
        assert!((meters - 878_000.0).abs() < 5_000.0, "Berlin-Paris: {}", meters);
    }

    #[test]
    fn test_new_york_to_tokyo() {
        let meters = distance(&NEW_YORK, &TOKYO);
        // Expected: ~10,838 km
        assert!((meters - 10_838_000.0).abs() < 50_000.0, "NYC-Tokyo: {}", meters);
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert!(distance(&BERLIN, &BERLIN).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_points_half_circumference() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let expected = PI * EARTH_RADIUS_M;
        assert!((distance(&a, &b) - expected).abs() < 1.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = GeoPoint::new(1.0, 0.0);
        let east = GeoPoint::new(0.0, 1.0);
        let south = GeoPoint::new(-1.0, 0.0);

        assert!(bearing(&origin, &north).abs() < 1e-9);
        assert!((bearing(&origin, &east) - FRAC_PI_2).abs() < 1e-9);
        assert!((bearing(&origin, &south) - PI).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_west_is_normalised() {
        let origin = GeoPoint::new(0.0, 0.0);
        let west = GeoPoint::new(0.0, -1.0);
        assert!((bearing(&origin, &west) - 3.0 * FRAC_PI_2).abs() < 1e-9);
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in point(), b in point()) {
            let d1 = distance(&a, &b);
            let d2 = distance(&b, &a);
            prop_assert!((d1 - d2).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_to_self_is_zero(a in point()) {
            prop_assert!(distance(&a, &a).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_is_non_negative_and_bounded(a in point(), b in point()) {
            let d = distance(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= PI * EARTH_RADIUS_M + 1.0);
        }

        #[test]
        fn prop_bearing_in_range(a in point(), b in point()) {
            let theta = bearing(&a, &b);
            prop_assert!((0.0..TAU).contains(&theta));
        }
    }
}
