//! Visibility feed
//!
//! Turns observer movement and registry mutations into diffs against the last
//! emitted visible set. Each recompute queries the registry once and produces
//! at most one [`Diff`], so subscribers never see a half-applied batch.
//!
//! ```text
//!          start(p)                 stop()
//!   Idle ───────────▶ Active ───────────────▶ Idle
//!                     │   ▲
//!   report_observer_position / refresh / set_range
//!                     └───┘
//! ```

use crate::error::{Error, Result};
use crate::registry::{Peer, PeerRegistry};
use crate::subscription::{Handler, SubscriptionId, Subscribers};
use crate::validation;
use roadlink_geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Default visibility range in meters.
pub const DEFAULT_RANGE_METERS: f64 = 5000.0;

/// Change between two successive visible sets.
///
/// `added` and `updated` are ordered nearest first (ties by id); `removed` is
/// ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub added: Vec<Peer>,
    pub updated: Vec<Peer>,
    pub removed: Vec<String>,
}

impl Diff {
    /// Compare the previously emitted set with a fresh, sorted query result.
    pub fn between(previous: &BTreeMap<String, Peer>, current: &[Peer]) -> Self {
        let mut diff = Diff::default();

        for peer in current {
            match previous.get(&peer.id) {
                None => diff.added.push(peer.clone()),
                Some(before) if peer.differs_from(before) => diff.updated.push(peer.clone()),
                Some(_) => {}
            }
        }

        let still_visible: HashSet<&str> = current.iter().map(|p| p.id.as_str()).collect();
        diff.removed = previous
            .keys()
            .filter(|id| !still_visible.contains(id.as_str()))
            .cloned()
            .collect();

        diff
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Lifecycle of a [`ProximityFeed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedState {
    Idle,
    Active,
}

#[derive(Debug)]
enum State {
    Idle,
    Active {
        observer: GeoPoint,
        visible: BTreeMap<String, Peer>,
    },
}

/// Subscription-based notifier of visible-peer changes.
#[derive(Debug)]
pub struct ProximityFeed {
    state: State,
    range_meters: f64,
    subscribers: Subscribers<Diff>,
}

impl Default for ProximityFeed {
    fn default() -> Self {
        Self {
            state: State::Idle,
            range_meters: DEFAULT_RANGE_METERS,
            subscribers: Subscribers::new(),
        }
    }
}

impl ProximityFeed {
    /// Create an idle feed with the given range.
    ///
    /// # Errors
    /// Validation error for a non-positive or non-finite range.
    pub fn new(range_meters: f64) -> Result<Self> {
        Ok(Self {
            range_meters: validation::range_meters(range_meters)?,
            ..Self::default()
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> FeedState {
        match self.state {
            State::Idle => FeedState::Idle,
            State::Active { .. } => FeedState::Active,
        }
    }

    /// Whether the feed is active
    pub fn is_active(&self) -> bool {
        self.state() == FeedState::Active
    }

    /// Current visibility range
    pub fn range_meters(&self) -> f64 {
        self.range_meters
    }

    /// Register a diff subscriber
    pub fn subscribe(&mut self, handler: impl FnMut(&Diff) + Send + 'static) -> SubscriptionId {
        let handler: Handler<Diff> = Box::new(handler);
        self.subscribers.subscribe(handler)
    }

    /// Remove a diff subscriber
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Activate the feed at `observer` and emit every visible peer as added.
    ///
    /// The start diff is emitted even when nothing is in range. Starting an
    /// active feed restarts it from an empty visible set.
    pub fn start(&mut self, observer: GeoPoint, registry: &PeerRegistry) -> Result<Diff> {
        observer.validate()?;

        let current = registry.query_within(&observer, self.range_meters);
        let diff = Diff::between(&BTreeMap::new(), &current);

        self.state = State::Active {
            observer,
            visible: index(current),
        };

        info!(
            observer = %observer,
            range_meters = self.range_meters,
            visible = diff.added.len(),
            "Proximity feed started"
        );
        self.subscribers.emit(&diff);
        Ok(diff)
    }

    /// Return to idle. Later reports and refreshes emit nothing until restarted.
    pub fn stop(&mut self) {
        if self.is_active() {
            info!("Proximity feed stopped");
        }
        self.state = State::Idle;
    }

    /// Move the observer and recompute.
    ///
    /// While idle the report is ignored and `Ok(None)` returned.
    ///
    /// # Errors
    /// Validation error for an off-globe position.
    pub fn report_observer_position(
        &mut self,
        position: GeoPoint,
        registry: &PeerRegistry,
    ) -> Result<Option<Diff>> {
        position.validate()?;

        match &mut self.state {
            State::Idle => {
                debug!(position = %position, "Ignoring observer position while idle");
                return Ok(None);
            }
            State::Active { observer, .. } => *observer = position,
        }
        Ok(self.recompute(registry))
    }

    /// Recompute after a batch of registry mutations.
    pub fn refresh(&mut self, registry: &PeerRegistry) -> Option<Diff> {
        self.recompute(registry)
    }

    /// Change the range; an active feed recomputes against the new range.
    ///
    /// # Errors
    /// Validation error for a non-positive or non-finite range.
    pub fn set_range(&mut self, range_meters: f64, registry: &PeerRegistry) -> Result<Option<Diff>> {
        self.range_meters = validation::range_meters(range_meters)?;
        debug!(range_meters, "Range changed");
        Ok(self.recompute(registry))
    }

    /// The observer's position
    ///
    /// # Errors
    /// `NotStarted` while idle.
    pub fn observer(&self) -> Result<GeoPoint> {
        match &self.state {
            State::Active { observer, .. } => Ok(*observer),
            State::Idle => Err(Error::not_started("read observer position")),
        }
    }

    /// The last emitted visible set, nearest first
    ///
    /// # Errors
    /// `NotStarted` while idle.
    pub fn visible(&self) -> Result<Vec<Peer>> {
        match &self.state {
            State::Active { visible, .. } => {
                let mut peers: Vec<Peer> = visible.values().cloned().collect();
                peers.sort_by(|a, b| {
                    a.distance_meters
                        .total_cmp(&b.distance_meters)
                        .then_with(|| a.id.cmp(&b.id))
                });
                Ok(peers)
            }
            State::Idle => Err(Error::not_started("list visible peers")),
        }
    }

    fn recompute(&mut self, registry: &PeerRegistry) -> Option<Diff> {
        let State::Active { observer, visible } = &mut self.state else {
            return None;
        };

        let current = registry.query_within(observer, self.range_meters);
        let diff = Diff::between(visible, &current);
        *visible = index(current);

        if diff.is_empty() {
            return None;
        }

        debug!(
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len(),
            "Visible set changed"
        );
        self.subscribers.emit(&diff);
        Some(diff)
    }
}

fn index(peers: Vec<Peer>) -> BTreeMap<String, Peer> {
    peers.into_iter().map(|p| (p.id.clone(), p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::registry::PeerSnapshot;
    use roadlink_geo::offset;
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::sync::{Arc, Mutex};

    const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);

    fn registry() -> PeerRegistry {
        PeerRegistry::with_clock(Arc::new(ManualClock::starting_now()))
    }

    fn place(registry: &mut PeerRegistry, id: &str, meters: f64, bearing: f64) {
        let position = offset(&LONDON, meters, bearing).unwrap();
        registry.upsert(PeerSnapshot::new(id, id, position)).unwrap();
    }

    fn ids(peers: &[Peer]) -> Vec<&str> {
        peers.iter().map(|p| p.id.as_str()).collect()
    }

    /// Peers at 100 m, 6000 m and 3000 m along different bearings.
    fn three_peers() -> PeerRegistry {
        let mut registry = registry();
        place(&mut registry, "p100", 100.0, 0.0);
        place(&mut registry, "p6000", 6000.0, FRAC_PI_2);
        place(&mut registry, "p3000", 3000.0, PI);
        registry
    }

    #[test]
    fn test_start_emits_visible_as_added() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();

        let diff = feed.start(LONDON, &registry).unwrap();

        assert_eq!(ids(&diff.added), vec!["p100", "p3000"]);
        assert!(diff.updated.is_empty() && diff.removed.is_empty());
        assert!(diff.added[0].distance_meters < diff.added[1].distance_meters);
        assert!(feed.is_active());
    }

    #[test]
    fn test_start_with_nothing_in_range_still_emits() {
        let received = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&received);
        let mut feed = ProximityFeed::default();
        feed.subscribe(move |_| *counter.lock().unwrap() += 1);

        let diff = feed.start(LONDON, &registry()).unwrap();

        assert!(diff.is_empty());
        assert_eq!(*received.lock().unwrap(), 1);
    }

    #[test]
    fn test_peer_moving_out_of_range_is_removed() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();

        // p3000 sits due south; walking 4000 m north puts it at ~7000 m.
        let north = offset(&LONDON, 4000.0, 0.0).unwrap();
        let diff = feed.report_observer_position(north, &registry).unwrap().unwrap();

        assert_eq!(diff.removed, vec!["p3000".to_string()]);
        assert!(!ids(&diff.added).contains(&"p3000"));
        assert!(!ids(&diff.updated).contains(&"p3000"));
    }

    #[test]
    fn test_distance_change_within_range_is_updated() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();

        let nudged = offset(&LONDON, 50.0, PI).unwrap();
        let diff = feed.report_observer_position(nudged, &registry).unwrap().unwrap();

        assert_eq!(ids(&diff.updated), vec!["p100", "p3000"]);
        let p100 = &diff.updated[0];
        assert!((p100.distance_meters - 150.0).abs() < 3.0);
    }

    #[test]
    fn test_peer_reentering_range_is_added() {
        let mut registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();

        place(&mut registry, "p100", 5500.0, 0.0);
        assert_eq!(feed.refresh(&registry).unwrap().removed, vec!["p100"]);

        place(&mut registry, "p100", 200.0, 0.0);
        let diff = feed.refresh(&registry).unwrap();
        assert_eq!(ids(&diff.added), vec!["p100"]);
    }

    #[test]
    fn test_unchanged_recompute_emits_nothing() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();

        assert!(feed.refresh(&registry).is_none());
        assert!(feed.report_observer_position(LONDON, &registry).unwrap().is_none());
    }

    #[test]
    fn test_range_change_recomputes() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();

        let diff = feed.set_range(7000.0, &registry).unwrap().unwrap();
        assert_eq!(ids(&diff.added), vec!["p6000"]);

        let diff = feed.set_range(500.0, &registry).unwrap().unwrap();
        assert_eq!(diff.removed, vec!["p3000", "p6000"]);
        assert_eq!(ids(&feed.visible().unwrap()), vec!["p100"]);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let registry = three_peers();
        let mut feed = ProximityFeed::default();
        assert!(ProximityFeed::new(0.0).is_err());
        assert!(feed.set_range(-1.0, &registry).unwrap_err().is_validation());
        assert_eq!(feed.range_meters(), DEFAULT_RANGE_METERS);
    }

    #[test]
    fn test_stop_is_idempotent_and_silences_feed() {
        let registry = three_peers();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.subscribe(move |d: &Diff| sink.lock().unwrap().push(d.len()));

        feed.start(LONDON, &registry).unwrap();
        feed.stop();
        feed.stop();

        let north = offset(&LONDON, 4000.0, 0.0).unwrap();
        assert!(feed.report_observer_position(north, &registry).unwrap().is_none());
        assert!(feed.refresh(&registry).is_none());
        assert_eq!(feed.state(), FeedState::Idle);
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_idle_accessors_fail_not_started() {
        let feed = ProximityFeed::default();
        assert!(feed.observer().unwrap_err().is_not_started());
        assert!(feed.visible().unwrap_err().is_not_started());
    }

    #[test]
    fn test_restart_emits_fresh_all_added() {
        let registry = three_peers();
        let mut feed = ProximityFeed::new(5000.0).unwrap();
        feed.start(LONDON, &registry).unwrap();
        feed.stop();

        let diff = feed.start(LONDON, &registry).unwrap();
        assert_eq!(ids(&diff.added), vec!["p100", "p3000"]);
    }

    #[test]
    fn test_invalid_observer_rejected() {
        let mut feed = ProximityFeed::default();
        let err = feed.start(GeoPoint::new(0.0, 190.0), &registry()).unwrap_err();
        assert!(err.is_validation());
        assert!(!feed.is_active());
    }

    #[test]
    fn test_unsubscribed_handler_not_called() {
        let registry = three_peers();
        let received = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&received);
        let mut feed = ProximityFeed::default();
        let id = feed.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(feed.unsubscribe(id));
        feed.start(LONDON, &registry).unwrap();
        assert_eq!(*received.lock().unwrap(), 0);
    }
}
