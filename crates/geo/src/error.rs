//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not finite
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Distance argument was negative or not finite
    #[error("Invalid distance: {0}")]
    InvalidDistance(f64),
}

/// Error code for integration with roadlink-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Latitude out of range
    InvalidLatitude = 10001,
    /// Longitude out of range
    InvalidLongitude = 10002,
    /// Negative or non-finite distance
    InvalidDistance = 10003,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidLatitude(_) => GeoErrorCode::InvalidLatitude,
            GeoError::InvalidLongitude(_) => GeoErrorCode::InvalidLongitude,
            GeoError::InvalidDistance(_) => GeoErrorCode::InvalidDistance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GeoError::InvalidLatitude(91.0).code(), GeoErrorCode::InvalidLatitude);
        assert_eq!(GeoErrorCode::InvalidLongitude as u32, 10002);
    }

    #[test]
    fn test_error_display() {
        let err = GeoError::InvalidLongitude(200.5);
        assert_eq!(err.to_string(), "Invalid longitude: 200.5");
    }
}
