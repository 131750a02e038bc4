//! Simulated nearby drivers
//!
//! The first poll spawns the whole fleet around the current center. Later polls
//! nudge every driver a little and now and then let one drive off, replacing it
//! with a fresh driver so the fleet size stays constant.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roadlink_core::config::SimulationConfig;
use roadlink_core::registry::PeerSnapshot;
use roadlink_core::transport::{PeerEvent, PeerTransport};
use roadlink_geo::{offset, GeoPoint};
use std::f64::consts::TAU;
use tracing::debug;

pub const DRIVER_NAMES: [&str; 5] = ["Trucker Joe", "Lisa M", "Mike R", "Sarah K", "Driver Bob"];
pub const VEHICLE_LABELS: [&str; 5] = ["TRK 456", "CAR 789", "VAN 123", "SUV 321", "PKP 555"];

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Seeded fleet of fake drivers.
#[derive(Debug)]
pub struct SimulatedPeerTransport {
    center: GeoPoint,
    range_meters: f64,
    fleet_size: usize,
    departure_probability: f64,
    jitter_meters: f64,
    rng: StdRng,
    drivers: Vec<PeerSnapshot>,
    spawned: usize,
}

impl SimulatedPeerTransport {
    pub fn new(center: GeoPoint, range_meters: f64, seed: u64) -> Self {
        Self::from_config(center, range_meters, &SimulationConfig::default(), seed)
    }

    /// Fleet size, departure odds and jitter taken from `config`.
    pub fn from_config(center: GeoPoint, range_meters: f64, config: &SimulationConfig, seed: u64) -> Self {
        Self {
            center,
            range_meters: finite_or(range_meters, 1.0).max(1.0),
            fleet_size: config.peer_count,
            departure_probability: finite_or(config.departure_probability, 0.0).clamp(0.0, 1.0),
            jitter_meters: finite_or(config.step_meters, 0.0).max(0.0),
            rng: StdRng::seed_from_u64(seed),
            drivers: Vec::new(),
            spawned: 0,
        }
    }

    /// Spawn replacements around `center` from now on.
    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = center;
    }

    /// Drivers currently on the road
    pub fn drivers(&self) -> &[PeerSnapshot] {
        &self.drivers
    }

    fn spawn(&mut self) -> PeerSnapshot {
        let slot = self.spawned % DRIVER_NAMES.len();
        self.spawned += 1;

        let meters = self.rng.gen_range(0.0..self.range_meters);
        let bearing = self.rng.gen_range(0.0..TAU);
        let position = offset(&self.center, meters, bearing).unwrap_or(self.center);

        let id = self.driver_id();
        debug!(peer_id = %id, distance_meters = meters, "Simulated driver spawned");
        PeerSnapshot::new(id, DRIVER_NAMES[slot], position).with_vehicle_label(VEHICLE_LABELS[slot])
    }

    fn driver_id(&mut self) -> String {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| char::from(ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())]))
            .collect();
        format!("driver_{suffix}")
    }
}

/// `rand` panics on non-finite probabilities and bounds.
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

impl PeerTransport for SimulatedPeerTransport {
    fn poll(&mut self) -> Vec<PeerEvent> {
        if self.drivers.is_empty() && self.spawned == 0 {
            let fleet: Vec<PeerSnapshot> = (0..self.fleet_size).map(|_| self.spawn()).collect();
            self.drivers = fleet;
            return self.drivers.iter().cloned().map(PeerEvent::Sighted).collect();
        }

        let mut events = Vec::with_capacity(self.drivers.len() + 1);
        for index in 0..self.drivers.len() {
            if self.rng.gen_bool(self.departure_probability) {
                let replacement = self.spawn();
                let departed = std::mem::replace(&mut self.drivers[index], replacement.clone());
                events.push(PeerEvent::Departed { id: departed.id });
                events.push(PeerEvent::Sighted(replacement));
                continue;
            }

            let meters = self.rng.gen_range(0.0..=self.jitter_meters);
            let bearing = self.rng.gen_range(0.0..TAU);
            let driver = &mut self.drivers[index];
            if let Ok(moved) = offset(&driver.position, meters, bearing) {
                driver.position = moved;
            }
            events.push(PeerEvent::Sighted(driver.clone()));
        }
        events
    }
}
