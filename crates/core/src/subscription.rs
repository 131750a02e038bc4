//! Subscriber lists for diffs and messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle returned by `subscribe`/`on_message`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

/// Boxed subscriber callback.
pub type Handler<T> = Box<dyn FnMut(&T) + Send>;

/// Ordered list of handlers, invoked in registration order.
pub(crate) struct Subscribers<T> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<T>)>,
}

impl<T> Subscribers<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, handler: Handler<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    pub(crate) fn emit(&mut self, value: &T) {
        for (_, handler) in &mut self.handlers {
            handler(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.handlers.len())
            .finish()
    }
}
