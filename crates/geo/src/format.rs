//! Human-readable distance labels.

/// Formats a distance for display next to a peer or message.
///
/// Below one kilometre the value is rounded to whole meters, above it is shown
/// in kilometres with one decimal.
///
/// ```
/// use roadlink_geo::format_distance;
///
/// assert_eq!(format_distance(432.4), "432m away");
/// assert_eq!(format_distance(2_345.0), "2.3km away");
/// ```
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m away", meters.round() as i64)
    } else {
        format!("{:.1}km away", meters / 1000.0)
    }
}
