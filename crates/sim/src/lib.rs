//! Simulated collaborators for the RoadLink proximity engine
//!
//! Stand-ins for GPS, the peer pub/sub backend and other drivers' replies. All
//! of them are driven by a seeded [`StdRng`](rand::rngs::StdRng) and a
//! [`ManualClock`](roadlink_core::clock::ManualClock), so runs are reproducible.

pub mod location;
pub mod peers;
pub mod responder;
pub mod simulation;

pub use location::SimulatedLocationProvider;
pub use peers::{SimulatedPeerTransport, DRIVER_NAMES, VEHICLE_LABELS};
pub use responder::{CannedResponder, CANNED_REPLIES};
pub use simulation::{Simulation, TickReport};
