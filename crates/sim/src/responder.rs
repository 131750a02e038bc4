//! Canned replies from other drivers

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use roadlink_core::clock::SharedClock;
use roadlink_core::router::Message;
use roadlink_core::transport::{InboundMessage, MessageTransport};
use std::time::Duration;
use tracing::debug;

pub const CANNED_REPLIES: [&str; 6] = [
    "Copy that!",
    "Thanks for the heads up!",
    "Roger that",
    "10-4, good buddy!",
    "Appreciated!",
    "Will do, thanks!",
];

#[derive(Debug)]
struct PendingReply {
    due: DateTime<Utc>,
    inbound: InboundMessage,
}

/// Answers every delivered local message after a random delay.
#[derive(Debug)]
pub struct CannedResponder {
    clock: SharedClock,
    rng: StdRng,
    delay_min: Duration,
    delay_max: Duration,
    roster: Vec<String>,
    pending: Vec<PendingReply>,
    delivered: usize,
}

impl CannedResponder {
    /// Replies arrive 2 to 5 seconds of `clock` time after delivery.
    pub fn new(clock: SharedClock, seed: u64) -> Self {
        Self {
            clock,
            rng: StdRng::seed_from_u64(seed),
            delay_min: Duration::from_secs(2),
            delay_max: Duration::from_secs(5),
            roster: Vec::new(),
            pending: Vec::new(),
            delivered: 0,
        }
    }

    /// Override the reply delay bounds; they are swapped if inverted.
    #[must_use]
    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.delay_min = min.min(max);
        self.delay_max = min.max(max);
        self
    }

    /// Peers allowed to reply.
    pub fn set_roster(&mut self, ids: Vec<String>) {
        self.roster = ids;
    }

    /// Replies scheduled but not yet due
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Local messages handed over so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn delay(&mut self) -> Duration {
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(min..=max))
    }
}

impl MessageTransport for CannedResponder {
    fn deliver(&mut self, message: &Message) {
        if !message.is_local {
            return;
        }
        self.delivered += 1;

        let Some(sender_id) = self.roster.choose(&mut self.rng).cloned() else {
            debug!(message_id = message.id, "Nobody around to reply");
            return;
        };
        let text = CANNED_REPLIES.choose(&mut self.rng).copied().unwrap_or(CANNED_REPLIES[0]);
        let delay = self.delay();
        let due = self.clock.now() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());

        debug!(peer_id = %sender_id, delay_ms = delay.as_millis() as u64, "Reply scheduled");
        self.pending.push(PendingReply {
            due,
            inbound: InboundMessage {
                sender_id,
                text: text.to_string(),
            },
        });
    }

    fn poll_inbound(&mut self) -> Vec<InboundMessage> {
        let now = self.clock.now();
        let (mut due, waiting): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|r| r.due <= now);
        self.pending = waiting;
        due.sort_by_key(|r| r.due);
        due.into_iter().map(|r| r.inbound).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadlink_core::clock::ManualClock;
    use std::sync::Arc;

    fn local(id: u64) -> Message {
        Message {
            id,
            sender_id: "driver_me".to_string(),
            sender_name: "Alex".to_string(),
            sender_vehicle_label: None,
            text: "Slow traffic ahead".to_string(),
            sent_at: Utc::now(),
            is_local: true,
            distance_meters: 0.0,
        }
    }

    #[test]
    fn test_reply_arrives_within_delay_window() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut responder = CannedResponder::new(clock.clone(), 4);
        responder.set_roster(vec!["driver_a".to_string(), "driver_b".to_string()]);

        responder.deliver(&local(1));
        assert_eq!(responder.pending(), 1);

        clock.advance(Duration::from_millis(1999));
        assert!(responder.poll_inbound().is_empty());

        clock.advance(Duration::from_millis(3001));
        let replies = responder.poll_inbound();
        assert_eq!(replies.len(), 1);
        assert!(CANNED_REPLIES.contains(&replies[0].text.as_str()));
        assert!(replies[0].sender_id.starts_with("driver_"));
        assert_eq!(responder.pending(), 0);
    }

    #[test]
    fn test_no_roster_no_reply() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut responder = CannedResponder::new(clock.clone(), 4);
        responder.deliver(&local(1));
        assert_eq!(responder.delivered(), 1);
        assert_eq!(responder.pending(), 0);
    }

    #[test]
    fn test_remote_messages_are_not_answered() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut responder = CannedResponder::new(clock, 4);
        responder.set_roster(vec!["driver_a".to_string()]);
        let mut remote = local(2);
        remote.is_local = false;
        responder.deliver(&remote);
        assert_eq!(responder.delivered(), 0);
        assert_eq!(responder.pending(), 0);
    }

    #[test]
    fn test_replies_come_out_in_due_order() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut responder = CannedResponder::new(clock.clone(), 8)
            .with_delay(Duration::from_secs(1), Duration::from_secs(10));
        responder.set_roster(vec!["driver_a".to_string()]);
        for id in 1..=5 {
            responder.deliver(&local(id));
        }

        clock.advance(Duration::from_secs(10));
        assert_eq!(responder.poll_inbound().len(), 5);
    }
}
