//! Equirectangular point offsets.
//!
//! Moves a point a given distance along a bearing by treating the neighbourhood
//! of the origin as a flat plane: one degree of latitude is a constant
//! [`METERS_PER_DEGREE_LAT`] and a degree of longitude shrinks by `cos(latitude)`.
//!
//! This is accurate to well under one percent at city scale (below ~50 km) and
//! is what the simulated peer placement relies on. It is **not** geodesically
//! exact: it degrades towards the poles, where `cos(latitude)` approaches zero,
//! and longitudes that cross the antimeridian are simply wrapped.

use crate::{GeoError, GeoPoint, Result};

/// Length of one degree of latitude in meters used by the approximation.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Returns the point `distance_meters` away from `origin` along
/// `bearing_radians` (clockwise from north).
///
/// Latitude is clamped to `[-90, 90]` and longitude wrapped into
/// `[-180, 180]`, so the result is always a valid [`GeoPoint`].
///
/// # Errors
/// Returns [`GeoError::InvalidDistance`] for negative or non-finite distances.
///
/// # Example
/// ```
/// use roadlink_geo::{distance, offset, GeoPoint};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let north = offset(&london, 2000.0, 0.0).unwrap();
///
/// assert!((distance(&london, &north) - 2000.0).abs() < 20.0);
/// ```
pub fn offset(origin: &GeoPoint, distance_meters: f64, bearing_radians: f64) -> Result<GeoPoint> {
    if !distance_meters.is_finite() || distance_meters < 0.0 {
        return Err(GeoError::InvalidDistance(distance_meters));
    }

    let lat_offset = distance_meters * bearing_radians.cos() / METERS_PER_DEGREE_LAT;

    let lng_scale = METERS_PER_DEGREE_LAT * origin.latitude.to_radians().cos();
    let lng_offset = if lng_scale.abs() < f64::EPSILON {
        0.0
    } else {
        distance_meters * bearing_radians.sin() / lng_scale
    };

    let latitude = (origin.latitude + lat_offset).clamp(-90.0, 90.0);
    let longitude = wrap_longitude(origin.longitude + lng_offset);

    Ok(GeoPoint::new(latitude, longitude))
}

/// Wraps a longitude into `[-180, 180]`. In-range values, both bounds
/// included, come back untouched; anything outside lands in `[-180, 180)`.
#[inline]
fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    const LONDON: GeoPoint = GeoPoint { latitude: 51.5074, longitude: -0.1278 };

    #[test]
    fn test_london_two_km_north() {
        let north = offset(&LONDON, 2000.0, 0.0).unwrap();
        let d = distance(&LONDON, &north);
        assert!((d - 2000.0).abs() < 20.0, "read back {}", d);
        assert!(north.latitude > LONDON.latitude);
        assert!((north.longitude - LONDON.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_east_keeps_latitude() {
        let east = offset(&LONDON, 1500.0, FRAC_PI_2).unwrap();
        assert!((east.latitude - LONDON.latitude).abs() < 1e-9);
        assert!(east.longitude > LONDON.longitude);
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let same = offset(&LONDON, 0.0, 1.234).unwrap();
        assert_eq!(same, LONDON);
    }

    #[test]
    fn test_negative_distance_rejected() {
        assert_eq!(
            offset(&LONDON, -1.0, 0.0),
            Err(GeoError::InvalidDistance(-1.0))
        );
        assert!(offset(&LONDON, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_result_stays_valid_near_pole_and_antimeridian() {
        let near_pole = GeoPoint::new(89.99, 10.0);
        assert!(offset(&near_pole, 5000.0, 0.0).unwrap().is_valid());

        let dateline = GeoPoint::new(0.0, 179.999);
        let wrapped = offset(&dateline, 5000.0, FRAC_PI_2).unwrap();
        assert!(wrapped.is_valid());
        assert!(wrapped.longitude < 0.0);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(10.0), 10.0);
        assert!((wrap_longitude(181.0) - (-179.0)).abs() < 1e-9);
        assert!((wrap_longitude(-181.0) - 179.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_longitude_bounds() {
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(540.0), -180.0);
        assert!(GeoPoint::new(0.0, wrap_longitude(180.0)).is_valid());
    }

    proptest! {
        #[test]
        fn prop_offset_round_trip_within_one_percent(
            lat in -80.0f64..80.0,
            lng in -170.0f64..170.0,
            d in 1.0f64..10_000.0,
            theta in 0.0f64..TAU,
        ) {
            let origin = GeoPoint::new(lat, lng);
            let moved = offset(&origin, d, theta).unwrap();
            let back = distance(&origin, &moved);
            prop_assert!((back - d).abs() <= d * 0.01, "d={} back={}", d, back);
        }

        #[test]
        fn prop_offset_south_decreases_latitude(lat in -80.0f64..80.0, d in 1.0f64..10_000.0) {
            let origin = GeoPoint::new(lat, 0.0);
            let moved = offset(&origin, d, PI).unwrap();
            prop_assert!(moved.latitude < origin.latitude);
        }
    }
}
