//! Geospatial math for the RoadLink proximity engine.
//!
//! This crate provides:
//! - Haversine great-circle distance in meters
//! - Initial great-circle bearing
//! - Equirectangular offsets for placing points near an origin
//! - Distance labels for display
//!
//! Everything here is a pure function over [`GeoPoint`] values.
//!
//! # Example
//!
//! ```
//! use roadlink_geo::{distance, GeoPoint};
//!
//! let berlin = GeoPoint::new(52.5200, 13.4050);
//! let paris = GeoPoint::new(48.8566, 2.3522);
//!
//! let meters = distance(&berlin, &paris);
//! assert!((meters - 878_000.0).abs() < 10_000.0);
//! ```

mod error;
mod format;
mod haversine;
mod offset;

pub use error::{GeoError, GeoErrorCode, Result};
pub use format::format_distance;
pub use haversine::{bearing, distance, EARTH_RADIUS_M};
pub use offset::{offset, METERS_PER_DEGREE_LAT};

/// A geographic point with latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point without validating it.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a new point, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    /// [`GeoError::InvalidLatitude`] or [`GeoError::InvalidLongitude`].
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self::new(latitude, longitude);
        point.validate()?;
        Ok(point)
    }

    /// Returns true if the point has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks both components, reporting the first one that is out of range.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}
