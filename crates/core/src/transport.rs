//! Boundaries to external collaborators
//!
//! The engine never talks to GPS hardware, a pub/sub backend or a socket. Hosts
//! implement these traits (or use the fakes in `roadlink-sim`) and feed their
//! output into a [`Session`](crate::session::Session).

use crate::registry::PeerSnapshot;
use crate::router::Message;
use roadlink_geo::GeoPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("Location permission denied. Please enable location access.")]
    PermissionDenied,
    #[error("Location information unavailable.")]
    Unavailable,
    #[error("Location request timed out.")]
    Timeout,
}

/// Supplies the observer's position.
pub trait LocationProvider {
    /// One-shot position request.
    fn current_position(&mut self) -> Result<GeoPoint, LocationError>;

    /// Next update from the continuous watch; `None` once the watch has ended.
    fn next_update(&mut self) -> Option<Result<GeoPoint, LocationError>>;
}

/// A change reported by a peer transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerEvent {
    /// First or repeated sighting
    Sighted(PeerSnapshot),
    /// The peer signalled that it is leaving
    Departed { id: String },
}

/// Supplies peer sightings and departures.
pub trait PeerTransport {
    /// Events accumulated since the previous poll.
    fn poll(&mut self) -> Vec<PeerEvent>;
}

/// A message received from another party, not yet attributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

/// Carries messages between the local user and other parties.
pub trait MessageTransport {
    /// Hand an accepted local message over for delivery.
    fn deliver(&mut self, message: &Message);

    /// Messages that arrived since the previous poll.
    fn poll_inbound(&mut self) -> Vec<InboundMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_error_messages() {
        assert!(LocationError::PermissionDenied.to_string().contains("permission denied"));
        assert_eq!(LocationError::Timeout.to_string(), "Location request timed out.");
    }

    #[test]
    fn test_peer_event_serialization() {
        let event = PeerEvent::Departed { id: "driver_abc".to_string() };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"departed","id":"driver_abc"}"#);
    }
}
