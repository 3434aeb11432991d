//! Broadcast-backed lifecycle bus.

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::{EventKind, WidgtEvent};

/// Default channel capacity for the lifecycle bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Publish-subscribe channel for deployment lifecycle events.
///
/// Events are delivered to every live receiver in publish order. Publishing
/// never blocks: a receiver that falls more than the channel capacity
/// behind loses the oldest events and is told how many it missed.
#[derive(Debug)]
pub struct LifecycleBus {
    sender: broadcast::Sender<WidgtEvent>,
    capacity: usize,
}

impl LifecycleBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with the given per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of receivers the event was delivered to. Zero
    /// subscribers is not an error.
    pub fn publish(&self, event: WidgtEvent) -> usize {
        trace!(event_type = event.event_type(), "publishing lifecycle event");

        match self.sender.send(event) {
            Ok(count) => {
                debug!(receiver_count = count, "lifecycle event published");
                count
            },
            Err(_) => {
                trace!("no receivers for lifecycle event");
                0
            },
        }
    }

    /// Subscribe to all lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            kind: None,
        }
    }

    /// Subscribe to events of one kind only.
    #[must_use]
    pub fn subscribe_kind(&self, kind: EventKind) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            kind: Some(kind),
        }
    }

    /// The number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// The per-subscriber channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LifecycleBus {
    fn clone(&self) -> Self {
        // A clone shares the same channel: events published on either reach
        // all subscribers.
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

/// Receiver half of a lifecycle subscription.
pub struct EventReceiver {
    receiver: broadcast::Receiver<WidgtEvent>,
    kind: Option<EventKind>,
}

impl EventReceiver {
    fn matches(&self, event: &WidgtEvent) -> bool {
        self.kind.is_none_or(|kind| event.kind() == kind)
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once the bus is dropped and all buffered events are
    /// drained. Missed events due to lag are logged and skipped.
    pub async fn recv(&mut self) -> Option<WidgtEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "lifecycle receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without waiting.
    ///
    /// Returns `None` when no event is buffered or the bus is closed.
    pub fn try_recv(&mut self) -> Option<WidgtEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "lifecycle receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgt_core::{WidgetManifest, WidgetModel};

    fn model(id: &str) -> WidgetModel {
        let manifest = WidgetManifest {
            widget_id: Some(id.to_owned()),
            ..WidgetManifest::default()
        };
        WidgetModel::new(manifest, "/tmp/w".into())
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = LifecycleBus::new();
        let mut receiver = bus.subscribe();

        let delivered = bus.publish(WidgtEvent::deployed(model("a")));
        assert_eq!(delivered, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "deployed");
        assert_eq!(event.model().manifest().widget_id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn no_subscribers_is_not_an_error() {
        let bus = LifecycleBus::new();
        assert_eq!(bus.publish(WidgtEvent::deployed(model("a"))), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = LifecycleBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(WidgtEvent::undeployed(model("a"))), 2);

        assert_eq!(first.recv().await.unwrap().event_type(), "undeployed");
        assert_eq!(second.recv().await.unwrap().event_type(), "undeployed");
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = LifecycleBus::new();
        let mut receiver = bus.subscribe();

        bus.publish(WidgtEvent::deployed(model("a")));
        bus.publish(WidgtEvent::undeployed(model("a")));

        assert_eq!(receiver.recv().await.unwrap().event_type(), "deployed");
        assert_eq!(receiver.recv().await.unwrap().event_type(), "undeployed");
    }

    #[tokio::test]
    async fn kind_filter_skips_other_events() {
        let bus = LifecycleBus::new();
        let mut undeploys = bus.subscribe_kind(EventKind::Undeployed);

        bus.publish(WidgtEvent::deployed(model("a")));
        bus.publish(WidgtEvent::undeployed(model("a")));

        let event = undeploys.recv().await.unwrap();
        assert_eq!(event.kind(), EventKind::Undeployed);
        assert!(undeploys.try_recv().is_none());
    }

    #[tokio::test]
    async fn try_recv_on_empty_bus() {
        let bus = LifecycleBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn cloned_bus_shares_the_channel() {
        let bus = LifecycleBus::new();
        let cloned = bus.clone();
        let mut receiver = bus.subscribe();

        cloned.publish(WidgtEvent::deployed(model("a")));
        assert!(receiver.try_recv().is_some());
    }
}
