//! The realtime push channel.
//!
//! A process-wide publish/subscribe resource with an explicit lifecycle:
//! `connect()` at session start, `disconnect()` at logout. The channel is
//! injected into sessions rather than imported as ambient global state,
//! so tests can drive delivery deterministically.
//!
//! Delivery model: each subscriber owns a FIFO queue; `publish` enqueues
//! a copy per matching subscriber and `drain` returns them in publish
//! order. Events published while disconnected are dropped; clients go
//! stale and converge on their next fetch. Subscriptions must be
//! released on view teardown; a leaked subscription is a resource leak,
//! not a correctness bug, because queue consumers are idempotent.

use std::collections::VecDeque;

use crate::event::{EventKind, RealtimeEvent};

/// Opaque handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    kinds: Vec<EventKind>,
    queue: VecDeque<RealtimeEvent>,
}

impl Subscriber {
    fn wants(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// The push channel shared by the backend and every connected client.
#[derive(Debug, Default)]
pub struct RealtimeChannel {
    connected: bool,
    next_id: u64,
    subscribers: Vec<Subscriber>,
    dropped: u64,
}

impl RealtimeChannel {
    /// Create a channel in the disconnected state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connected: false,
            next_id: 0,
            subscribers: Vec::new(),
            dropped: 0,
        }
    }

    /// Open the channel for delivery.
    pub fn connect(&mut self) {
        self.connected = true;
        tracing::debug!("realtime channel connected");
    }

    /// Close the channel. Pending undrained events are discarded.
    pub fn disconnect(&mut self) {
        self.connected = false;
        for sub in &mut self.subscribers {
            sub.queue.clear();
        }
        tracing::debug!("realtime channel disconnected");
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Register a subscriber for the given event kinds.
    ///
    /// Subscribing is allowed while disconnected; delivery starts once
    /// the channel connects.
    pub fn subscribe(&mut self, kinds: &[EventKind]) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            kinds: kinds.to_vec(),
            queue: VecDeque::new(),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Publish one event to every matching subscriber.
    ///
    /// Returns the number of queues the event was delivered to. While
    /// disconnected the event is dropped and counted, not delivered.
    pub fn publish(&mut self, event: &RealtimeEvent) -> usize {
        if !self.connected {
            self.dropped += 1;
            tracing::debug!(kind = %event.kind(), "event dropped: channel disconnected");
            return 0;
        }

        let mut delivered = 0;
        for sub in &mut self.subscribers {
            if sub.wants(event.kind()) {
                sub.queue.push_back(event.clone());
                delivered += 1;
            }
        }
        delivered
    }

    /// Take every queued event for `id`, in publish order.
    ///
    /// Unknown subscription ids drain nothing.
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<RealtimeEvent> {
        self.subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| s.queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of events dropped while disconnected (diagnostics).
    #[must_use]
    pub const fn dropped_count(&self) -> u64 {
        self.dropped
    }
}
