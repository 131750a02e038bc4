//! Virtual-time driver for a [`Session`]
//!
//! Each tick advances the manual clock, then routes simulated GPS, peer
//! traffic and canned replies into the session in that order, and finally
//! expires stale peers.

use crate::location::SimulatedLocationProvider;
use crate::peers::SimulatedPeerTransport;
use crate::responder::CannedResponder;
use roadlink_core::clock::ManualClock;
use roadlink_core::config::ConfigSchema;
use roadlink_core::error::Result;
use roadlink_core::feed::Diff;
use roadlink_core::router::{LocalSender, Message};
use roadlink_core::session::Session;
use roadlink_core::transport::{LocationError, LocationProvider, MessageTransport, PeerTransport};
use roadlink_geo::GeoPoint;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Diffs in emission order
    pub diffs: Vec<Diff>,
    /// Messages accepted from other drivers
    pub messages: Vec<Message>,
    /// Replies dropped because their sender had already left
    pub dropped_replies: usize,
    pub location_error: Option<LocationError>,
}

/// A session wired to seeded fakes.
#[derive(Debug)]
pub struct Simulation {
    session: Session,
    clock: Arc<ManualClock>,
    location: SimulatedLocationProvider,
    peers: SimulatedPeerTransport,
    responder: CannedResponder,
    tick_length: Duration,
    ticks: u64,
}

impl Simulation {
    /// Build the session and its fakes on a clock starting at the current time.
    pub fn new(config: &ConfigSchema, sender: LocalSender, start: GeoPoint, seed: u64) -> Result<Self> {
        Self::with_clock(config, sender, start, seed, Arc::new(ManualClock::starting_now()))
    }

    /// Build the session and its fakes on `clock`. Each fake gets its own
    /// stream derived from `seed`.
    pub fn with_clock(
        config: &ConfigSchema,
        sender: LocalSender,
        start: GeoPoint,
        seed: u64,
        clock: Arc<ManualClock>,
    ) -> Result<Self> {
        config.validate()?;
        start.validate()?;

        let session = Session::with_clock(config.proximity.clone(), sender, clock.clone())?;
        let sim = &config.simulation;

        Ok(Self {
            location: SimulatedLocationProvider::new(start, sim.step_meters, seed),
            peers: SimulatedPeerTransport::from_config(
                start,
                config.proximity.range_meters,
                sim,
                seed.wrapping_add(1),
            ),
            responder: CannedResponder::new(clock.clone(), seed.wrapping_add(2)).with_delay(
                Duration::from_millis(sim.response_delay_min_ms),
                Duration::from_millis(sim.response_delay_max_ms),
            ),
            tick_length: sim.tick(),
            ticks: 0,
            session,
            clock,
        })
    }

    /// Take the first fix, spawn the fleet and start the feed.
    ///
    /// # Errors
    /// The location provider's error, converted.
    pub fn start(&mut self) -> Result<Diff> {
        let position = self.location.current_position()?;
        self.session.apply(self.peers.poll())?;
        self.responder.set_roster(self.session.registry().ids());
        self.session.start(position)
    }

    /// Advance virtual time by one tick.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.ticks += 1;
        self.clock.advance(self.tick_length);
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };

        match self.location.next_update() {
            Some(Ok(position)) => {
                self.peers.set_center(position);
                report
                    .diffs
                    .extend(self.session.report_observer_position(position)?);
            }
            Some(Err(error)) => {
                warn!(%error, "Location update failed");
                report.location_error = Some(error);
            }
            None => {}
        }

        report.diffs.extend(self.session.apply(self.peers.poll())?);
        self.responder.set_roster(self.session.registry().ids());

        for inbound in self.responder.poll_inbound() {
            match self.session.receive_remote(&inbound.text, &inbound.sender_id) {
                Ok(message) => report.messages.push(message),
                Err(err) if err.is_unknown_sender() => {
                    debug!(peer_id = %inbound.sender_id, "Reply from a departed driver dropped");
                    report.dropped_replies += 1;
                }
                Err(err) => return Err(err),
            }
        }

        report.diffs.extend(self.session.expire_stale().diff);
        Ok(report)
    }

    /// Send as the local user and hand the message to the responder.
    pub fn send(&mut self, text: &str) -> Result<Message> {
        let message = self.session.send_local(text)?;
        self.responder.deliver(&message);
        Ok(message)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn location_mut(&mut self) -> &mut SimulatedLocationProvider {
        &mut self.location
    }

    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
