//! Distance-annotated messaging
//!
//! The router accepts local and remote chat messages, stamps them, and fans
//! them out to subscribers in acceptance order. Remote messages record the
//! sender's distance at the moment they are accepted; that value is never
//! revisited when the sender later moves.

use crate::clock::{SharedClock, SystemClock};
use crate::error::{Error, Result};
use crate::registry::PeerRegistry;
use crate::subscription::{Handler, SubscriptionId, Subscribers};
use crate::validation;
use chrono::{DateTime, Utc};
use roadlink_geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// An accepted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic per router, starting at 1
    pub id: u64,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_vehicle_label: Option<String>,
    /// Trimmed, never empty
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub is_local: bool,
    /// Zero for local messages
    pub distance_meters: f64,
}

impl Message {
    /// Sender name with the vehicle label in parentheses when present.
    pub fn display_name(&self) -> String {
        match &self.sender_vehicle_label {
            Some(label) => format!("{} ({})", self.sender_name, label),
            None => self.sender_name.clone(),
        }
    }
}

/// Identity of the local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSender {
    pub id: String,
    pub name: String,
    pub vehicle_label: Option<String>,
    /// Only share the vehicle label when set
    pub show_vehicle_label: bool,
}

impl LocalSender {
    /// A sender that shares no vehicle label
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vehicle_label: None,
            show_vehicle_label: false,
        }
    }

    /// Attach a vehicle label and choose whether to share it
    #[must_use]
    pub fn with_vehicle_label(mut self, label: impl Into<String>, show: bool) -> Self {
        self.vehicle_label = Some(label.into());
        self.show_vehicle_label = show;
        self
    }

    /// The label other drivers get to see
    pub fn public_label(&self) -> Option<String> {
        if self.show_vehicle_label {
            self.vehicle_label.clone()
        } else {
            None
        }
    }
}

/// Accepts messages and notifies subscribers.
#[derive(Debug)]
pub struct MessageRouter {
    next_id: u64,
    history: Vec<Message>,
    subscribers: Subscribers<Message>,
    clock: SharedClock,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRouter {
    /// Router stamped by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Router stamped by `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            next_id: 1,
            history: Vec::new(),
            subscribers: Subscribers::new(),
            clock,
        }
    }

    /// Register a message subscriber
    pub fn on_message(&mut self, handler: impl FnMut(&Message) + Send + 'static) -> SubscriptionId {
        let handler: Handler<Message> = Box::new(handler);
        self.subscribers.subscribe(handler)
    }

    /// Remove a message subscriber
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Accept a message typed by the local user.
    ///
    /// # Errors
    /// Validation error when `text` is empty after trimming.
    pub fn send_local(&mut self, text: &str, sender: &LocalSender) -> Result<Message> {
        let text = validation::message_text(text)?;
        let message = Message {
            id: self.take_id(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            sender_vehicle_label: sender.public_label(),
            text,
            sent_at: self.clock.now(),
            is_local: true,
            distance_meters: 0.0,
        };
        debug!(message_id = message.id, "Local message accepted");
        Ok(self.accept(message))
    }

    /// Accept a message from a tracked peer, measuring it from `observer`.
    ///
    /// # Errors
    /// Validation error for empty text; `UnknownSender` when the registry does
    /// not currently track `sender_id`.
    pub fn receive_remote(
        &mut self,
        text: &str,
        sender_id: &str,
        registry: &PeerRegistry,
        observer: &GeoPoint,
    ) -> Result<Message> {
        let text = validation::message_text(text)?;
        let Some(sender) = registry.get(sender_id) else {
            return Err(Error::unknown_sender(sender_id));
        };
        let peer = sender.measure(observer, f64::INFINITY);

        let message = Message {
            id: self.take_id(),
            sender_id: peer.id,
            sender_name: peer.display_name,
            sender_vehicle_label: peer.vehicle_label,
            text,
            sent_at: self.clock.now(),
            is_local: false,
            distance_meters: peer.distance_meters,
        };
        info!(
            message_id = message.id,
            sender_id = %message.sender_id,
            distance_meters = message.distance_meters,
            "Remote message accepted"
        );
        Ok(self.accept(message))
    }

    /// Every accepted message, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    /// Number of accepted messages
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn accept(&mut self, message: Message) -> Message {
        self.history.push(message.clone());
        self.subscribers.emit(&message);
        message
    }
}
