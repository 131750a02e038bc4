//! `distance` and `offset`

use anyhow::Result;
use roadlink_cli::output::compass_point;
use roadlink_geo::{bearing, format_distance, GeoPoint};

pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64, json: bool) -> Result<()> {
    let from = GeoPoint::try_new(lat1, lng1)?;
    let to = GeoPoint::try_new(lat2, lng2)?;
    let meters = roadlink_geo::distance(&from, &to);
    let degrees = bearing(&from, &to).to_degrees();

    if json {
        let output = serde_json::json!({
            "from": from,
            "to": to,
            "distance_meters": meters,
            "bearing_degrees": degrees,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} → {}", from, to);
        println!("Distance: {:.1} m ({})", meters, format_distance(meters));
        println!("Bearing:  {:.1}° {}", degrees, compass_point(degrees));
    }
    Ok(())
}

pub fn offset(lat: f64, lng: f64, meters: f64, bearing_deg: f64, json: bool) -> Result<()> {
    let origin = GeoPoint::try_new(lat, lng)?;
    let target = roadlink_geo::offset(&origin, meters, bearing_deg.to_radians())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&target)?);
    } else {
        println!("{}", target);
        println!(
            "Check: {:.1} m back to origin",
            roadlink_geo::distance(&origin, &target)
        );
    }
    Ok(())
}
