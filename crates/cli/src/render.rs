//! Rendering of proximity diffs and chat messages
//!
//! The `*_line` functions return plain text so callers and tests can inspect
//! it; the `print_*` functions add colour.

use crate::output::compass_point;
use owo_colors::OwoColorize;
use roadlink_core::feed::Diff;
use roadlink_core::registry::Peer;
use roadlink_core::router::Message;
use roadlink_geo::{bearing, format_distance, GeoPoint};

/// How a line in a rendered diff relates to the previous visible set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Updated,
    Removed,
}

impl Change {
    fn marker(self) -> char {
        match self {
            Change::Added => '+',
            Change::Updated => '~',
            Change::Removed => '-',
        }
    }
}

/// A peer's name with the vehicle label in parentheses when present
pub fn peer_label(peer: &Peer) -> String {
    match &peer.vehicle_label {
        Some(label) => format!("{} ({})", peer.display_name, label),
        None => peer.display_name.clone(),
    }
}

/// One nearby driver, e.g. `Lisa M (CAR 789)  800m away  NE`.
/// The compass point is only shown when the observer is known.
pub fn peer_line(peer: &Peer, observer: Option<&GeoPoint>) -> String {
    let mut line = format!("{}  {}", peer_label(peer), format_distance(peer.distance_meters));
    if let Some(observer) = observer {
        let degrees = bearing(observer, &peer.position).to_degrees();
        line.push_str("  ");
        line.push_str(compass_point(degrees));
    }
    line
}

/// Every change in `diff`: additions, then updates, then removals.
pub fn diff_lines(diff: &Diff, observer: Option<&GeoPoint>) -> Vec<(Change, String)> {
    let added = diff
        .added
        .iter()
        .map(|p| (Change::Added, peer_line(p, observer)));
    let updated = diff
        .updated
        .iter()
        .map(|p| (Change::Updated, peer_line(p, observer)));
    let removed = diff.removed.iter().map(|id| (Change::Removed, id.clone()));
    added.chain(updated).chain(removed).collect()
}

/// A chat line, e.g. `[14:02:11] Lisa M (CAR 789): Roger that · 800m away`.
pub fn message_line(message: &Message) -> String {
    let mut line = format!(
        "[{}] {}: {}",
        message.sent_at.format("%H:%M:%S"),
        message.display_name(),
        message.text
    );
    if !message.is_local {
        line.push_str(" · ");
        line.push_str(&format_distance(message.distance_meters));
    }
    line
}

/// Print a diff with coloured change markers
pub fn print_diff(diff: &Diff, observer: Option<&GeoPoint>) {
    for (change, text) in diff_lines(diff, observer) {
        let marker = change.marker();
        match change {
            Change::Added => println!("  {} {}", marker.green(), text),
            Change::Updated => println!("  {} {}", marker.blue(), text.dimmed()),
            Change::Removed => println!("  {} {}", marker.red(), text.dimmed()),
        }
    }
}

/// Print a chat message, local ones highlighted
pub fn print_message(message: &Message) {
    let line = message_line(message);
    if message.is_local {
        println!("  {} {}", "»".cyan(), line.bold());
    } else {
        println!("  {} {}", "«".magenta(), line);
    }
}
