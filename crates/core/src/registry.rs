//! Authoritative set of known peers
//!
//! The registry stores what peer transports report and when each peer was last
//! seen. Distances are never stored: [`PeerRegistry::query_within`] measures
//! every peer against the observer on each call.

use crate::clock::{to_chrono, SharedClock, SystemClock};
use crate::error::{Error, ErrorCode, Result};
use crate::validation::Validator;
use chrono::{DateTime, Utc};
use roadlink_geo::{distance, GeoPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A peer as reported by a peer transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// Stable identifier for the peer's lifetime
    pub id: String,
    /// Name shown next to markers and messages
    pub display_name: String,
    /// Vehicle registration, when the peer shares it
    pub vehicle_label: Option<String>,
    /// Last reported position
    pub position: GeoPoint,
}

impl PeerSnapshot {
    /// Create a snapshot without a vehicle label
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            vehicle_label: None,
            position,
        }
    }

    /// Attach a vehicle label
    #[must_use]
    pub fn with_vehicle_label(mut self, label: impl Into<String>) -> Self {
        self.vehicle_label = Some(label.into());
        self
    }
}

/// A tracked peer measured against the observer.
///
/// `distance_meters` is only meaningful for the observer position and range it
/// was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub display_name: String,
    pub vehicle_label: Option<String>,
    pub position: GeoPoint,
    pub last_seen_at: DateTime<Utc>,
    pub distance_meters: f64,
    pub visible: bool,
}

impl Peer {
    /// True when anything a subscriber renders differs from `other`.
    ///
    /// `last_seen_at` is ignored: a re-sighting at the same spot is not a change.
    pub fn differs_from(&self, other: &Peer) -> bool {
        self.distance_meters != other.distance_meters
            || self.position != other.position
            || self.display_name != other.display_name
            || self.vehicle_label != other.vehicle_label
    }
}

/// Registry entry: the latest snapshot plus freshness.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPeer {
    pub snapshot: PeerSnapshot,
    pub last_seen_at: DateTime<Utc>,
}

impl TrackedPeer {
    /// Measure this peer from `observer`, marking it visible within `range_meters`.
    pub fn measure(&self, observer: &GeoPoint, range_meters: f64) -> Peer {
        let distance_meters = distance(observer, &self.snapshot.position);
        Peer {
            id: self.snapshot.id.clone(),
            display_name: self.snapshot.display_name.clone(),
            vehicle_label: self.snapshot.vehicle_label.clone(),
            position: self.snapshot.position,
            last_seen_at: self.last_seen_at,
            distance_meters,
            visible: distance_meters <= range_meters,
        }
    }
}

/// Current peer set, keyed by id.
#[derive(Debug)]
pub struct PeerRegistry {
    peers: BTreeMap<String, TrackedPeer>,
    clock: SharedClock,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerRegistry {
    /// Create an empty registry stamped by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty registry stamped by `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            peers: BTreeMap::new(),
            clock,
        }
    }

    /// Insert or replace a peer by id, stamping `last_seen_at` with now.
    ///
    /// # Errors
    /// Validation errors for an empty id or an off-globe position. The registry
    /// is left untouched in that case.
    pub fn upsert(&mut self, snapshot: PeerSnapshot) -> Result<()> {
        if snapshot.id.trim().is_empty() {
            return Err(Error::invalid_peer_id());
        }
        Validator::new()
            .coordinate("position", &snapshot.position)
            .validate()
            .into_result(ErrorCode::InvalidCoordinate)
            .map_err(|e| e.with_context(format!("Peer {}", snapshot.id)))?;

        let now = self.clock.now();
        let id = snapshot.id.clone();
        let previous = self.peers.insert(
            id.clone(),
            TrackedPeer {
                snapshot,
                last_seen_at: now,
            },
        );

        if previous.is_none() {
            info!(peer_id = %id, "Peer sighted");
        } else {
            debug!(peer_id = %id, "Peer updated");
        }
        Ok(())
    }

    /// Remove a peer. Unknown ids are a silent no-op.
    ///
    /// Returns whether a peer was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.peers.remove(id).is_some();
        if removed {
            info!(peer_id = %id, "Peer departed");
        }
        removed
    }

    /// Remove every peer last seen more than `staleness` before `now`.
    ///
    /// Returns the removed ids in ascending order.
    pub fn expire(&mut self, now: DateTime<Utc>, staleness: Duration) -> Vec<String> {
        let Some(cutoff) = now.checked_sub_signed(to_chrono(staleness)) else {
            return Vec::new();
        };

        let stale: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.last_seen_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.peers.remove(id);
        }

        if !stale.is_empty() {
            info!(count = stale.len(), staleness_secs = staleness.as_secs(), "Expired stale peers");
        }
        stale
    }

    /// Peers within `range_meters` of `observer`, nearest first.
    ///
    /// Ties in distance are broken by id so the order is fully deterministic.
    pub fn query_within(&self, observer: &GeoPoint, range_meters: f64) -> Vec<Peer> {
        let mut within: Vec<Peer> = self
            .peers
            .values()
            .map(|peer| peer.measure(observer, range_meters))
            .filter(|peer| peer.visible)
            .collect();

        within.sort_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then_with(|| a.id.cmp(&b.id))
        });
        within
    }

    /// Distance from `observer` to a tracked peer, if present.
    pub fn distance_to(&self, id: &str, observer: &GeoPoint) -> Option<f64> {
        self.peers
            .get(id)
            .map(|peer| distance(observer, &peer.snapshot.position))
    }

    /// Look up a tracked peer
    pub fn get(&self, id: &str) -> Option<&TrackedPeer> {
        self.peers.get(id)
    }

    /// Whether `id` is tracked
    pub fn contains(&self, id: &str) -> bool {
        self.peers.contains_key(id)
    }

    /// Tracked ids in ascending order
    pub fn ids(&self) -> Vec<String> {
        self.peers.keys().cloned().collect()
    }

    /// Number of tracked peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are tracked
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// The clock used to stamp sightings
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }
}
