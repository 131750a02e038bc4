//! Proximity engine for RoadLink
//!
//! Tracks nearby drivers relative to the observer's position and reports how
//! the visible set changes as anyone moves:
//!
//! - **Registry**: the set of known peers and their last reported positions
//! - **Feed**: the observer's visible set, emitted as added/updated/removed diffs
//! - **Router**: chat messages annotated with the sender's distance
//! - **Session**: one user's registry, feed and router behind a single `&mut self`
//! - **Configuration**: TOML-based configuration with validation
//!
//! # Example
//!
//! ```rust
//! use roadlink_core::prelude::*;
//! use roadlink_geo::GeoPoint;
//!
//! let mut session = Session::new(
//!     ProximityConfig::default(),
//!     LocalSender::new("driver_me", "Alex"),
//! )?;
//!
//! session.upsert_peer(PeerSnapshot::new(
//!     "driver_lisa",
//!     "Lisa M",
//!     GeoPoint::new(51.5083, -0.1278),
//! ))?;
//!
//! let diff = session.start(GeoPoint::new(51.5074, -0.1278))?;
//! assert_eq!(diff.added.len(), 1);
//! # Ok::<(), roadlink_core::Error>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod registry;
pub mod router;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SharedClock, SystemClock};
    pub use crate::config::{Config, ConfigSchema, ProximityConfig, SimulationConfig};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::feed::{Diff, FeedState, ProximityFeed, DEFAULT_RANGE_METERS};
    pub use crate::registry::{Peer, PeerRegistry, PeerSnapshot};
    pub use crate::router::{LocalSender, Message, MessageRouter};
    pub use crate::session::{Expiry, Outcome, Session, SessionEvent};
    pub use crate::subscription::SubscriptionId;
    pub use crate::transport::{
        InboundMessage, LocationError, LocationProvider, MessageTransport, PeerEvent, PeerTransport,
    };
    pub use crate::validation::{ValidationResult, Validator};
}
