//! One user's proximity session
//!
//! A [`Session`] owns exactly one registry, feed and router. Every mutating
//! method takes `&mut self`, so mutations, recomputes and sends are serialised
//! and each call runs to completion before the next one starts. Hosts that
//! share a session across threads wrap it in a `Mutex`.

use crate::clock::{SharedClock, SystemClock};
use crate::config::ProximityConfig;
use crate::error::{Error, Result};
use crate::feed::{Diff, ProximityFeed};
use crate::registry::{PeerRegistry, PeerSnapshot};
use crate::router::{LocalSender, Message, MessageRouter};
use crate::subscription::SubscriptionId;
use crate::transport::{InboundMessage, PeerEvent};
use crate::validation;
use roadlink_geo::GeoPoint;
use std::sync::Arc;
use tracing::{info, warn};

/// Input accepted by [`Session::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The location provider reported a new observer position
    ObserverMoved(GeoPoint),
    /// A batch of peer transport events, applied as one mutation
    Peers(Vec<PeerEvent>),
    /// A message arrived from another party
    Inbound(InboundMessage),
    /// Periodic housekeeping: expire stale peers
    Tick,
}

/// Result of [`Session::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Diff(Diff),
    Message(Message),
    Unchanged,
}

impl From<Option<Diff>> for Outcome {
    fn from(diff: Option<Diff>) -> Self {
        diff.map_or(Outcome::Unchanged, Outcome::Diff)
    }
}

/// Peers dropped by [`Session::expire_stale`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expiry {
    /// Every expired id, visible or not, ascending
    pub removed: Vec<String>,
    /// The diff emitted for the visible ones
    pub diff: Option<Diff>,
}

/// Owner of the registry, feed and router for one local user.
#[derive(Debug)]
pub struct Session {
    config: ProximityConfig,
    sender: LocalSender,
    clock: SharedClock,
    registry: PeerRegistry,
    feed: ProximityFeed,
    router: MessageRouter,
    online: bool,
}

impl Session {
    /// Create a session on the system clock.
    ///
    /// # Errors
    /// Validation error for an invalid range or an empty sender id/name.
    pub fn new(config: ProximityConfig, sender: LocalSender) -> Result<Self> {
        Self::with_clock(config, sender, Arc::new(SystemClock))
    }

    /// Create a session whose registry and router share `clock`.
    pub fn with_clock(config: ProximityConfig, sender: LocalSender, clock: SharedClock) -> Result<Self> {
        if sender.id.trim().is_empty() || sender.name.trim().is_empty() {
            return Err(Error::validation("Local sender needs an id and a display name"));
        }
        let feed = ProximityFeed::new(validation::range_meters(config.range_meters)?)?;

        info!(sender_id = %sender.id, range_meters = config.range_meters, "Session created");

        Ok(Self {
            registry: PeerRegistry::with_clock(Arc::clone(&clock)),
            router: MessageRouter::with_clock(Arc::clone(&clock)),
            feed,
            config,
            sender,
            clock,
            online: true,
        })
    }

    /// Begin tracking at the observer's first fix; returns the all-added diff.
    pub fn start(&mut self, position: GeoPoint) -> Result<Diff> {
        self.feed.start(position, &self.registry)
    }

    /// Stop emitting diffs. Idempotent.
    pub fn stop(&mut self) {
        self.feed.stop();
    }

    /// Feed a new observer position.
    pub fn report_observer_position(&mut self, position: GeoPoint) -> Result<Option<Diff>> {
        self.feed.report_observer_position(position, &self.registry)
    }

    /// Change the visibility range, recomputing everything.
    pub fn set_range(&mut self, range_meters: f64) -> Result<Option<Diff>> {
        let diff = self.feed.set_range(range_meters, &self.registry)?;
        self.config.range_meters = range_meters;
        Ok(diff)
    }

    /// Apply a batch of peer events and recompute once.
    ///
    /// Stops at the first invalid event; events before it stay applied and the
    /// feed is still refreshed before the error is returned.
    pub fn apply(&mut self, events: impl IntoIterator<Item = PeerEvent>) -> Result<Option<Diff>> {
        let mut outcome = Ok(());
        for event in events {
            let applied = match event {
                PeerEvent::Sighted(snapshot) => self.registry.upsert(snapshot),
                PeerEvent::Departed { id } => {
                    self.registry.remove(&id);
                    Ok(())
                }
            };
            if let Err(err) = applied {
                warn!(error = %err, "Rejected peer event");
                outcome = Err(err);
                break;
            }
        }

        let diff = self.feed.refresh(&self.registry);
        outcome.map(|()| diff)
    }

    /// Record a single sighting
    pub fn upsert_peer(&mut self, snapshot: PeerSnapshot) -> Result<Option<Diff>> {
        self.apply([PeerEvent::Sighted(snapshot)])
    }

    /// Record a departure; unknown ids are ignored
    pub fn remove_peer(&mut self, id: &str) -> Option<Diff> {
        self.registry.remove(id);
        self.feed.refresh(&self.registry)
    }

    /// Drop peers not seen within the configured staleness window.
    pub fn expire_stale(&mut self) -> Expiry {
        let removed = self
            .registry
            .expire(self.clock.now(), self.config.staleness());
        let diff = if removed.is_empty() {
            None
        } else {
            self.feed.refresh(&self.registry)
        };
        Expiry { removed, diff }
    }

    /// Send a message as the local user.
    ///
    /// # Errors
    /// Validation error for empty text or while offline.
    pub fn send_local(&mut self, text: &str) -> Result<Message> {
        if !self.online {
            return Err(Error::offline());
        }
        self.router.send_local(text, &self.sender)
    }

    /// Accept a message from a tracked peer.
    ///
    /// # Errors
    /// `NotStarted` before the first fix, validation error for empty text,
    /// `UnknownSender` for untracked peers.
    pub fn receive_remote(&mut self, text: &str, sender_id: &str) -> Result<Message> {
        let observer = self.feed.observer()?;
        self.router
            .receive_remote(text, sender_id, &self.registry, &observer)
    }

    /// Uniform entry point for hosts that queue events.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Outcome> {
        match event {
            SessionEvent::ObserverMoved(position) => {
                self.report_observer_position(position).map(Outcome::from)
            }
            SessionEvent::Peers(events) => self.apply(events).map(Outcome::from),
            SessionEvent::Inbound(inbound) => self
                .receive_remote(&inbound.text, &inbound.sender_id)
                .map(Outcome::Message),
            SessionEvent::Tick => Ok(self.expire_stale().diff.into()),
        }
    }

    /// Register a diff subscriber
    pub fn subscribe(&mut self, handler: impl FnMut(&Diff) + Send + 'static) -> SubscriptionId {
        self.feed.subscribe(handler)
    }

    /// Register a message subscriber
    pub fn on_message(&mut self, handler: impl FnMut(&Message) + Send + 'static) -> SubscriptionId {
        self.router.on_message(handler)
    }

    /// Become visible and able to send
    pub fn go_online(&mut self) {
        if !self.online {
            info!(sender_id = %self.sender.id, "Now online");
        }
        self.online = true;
    }

    /// Stop sending; tracking continues
    pub fn go_offline(&mut self) {
        if self.online {
            info!(sender_id = %self.sender.id, "Now offline");
        }
        self.online = false;
    }

    /// Whether the local user is online
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Local user identity
    pub fn sender(&self) -> &LocalSender {
        &self.sender
    }

    /// Effective configuration
    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Read access to the peer registry
    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Read access to the feed
    pub fn feed(&self) -> &ProximityFeed {
        &self.feed
    }

    /// Read access to the router
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// The session's clock
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }
}
