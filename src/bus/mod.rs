//! Notification bus
//!
//! One broadcast channel per query. Publishing is best-effort: events sent
//! while nobody listens are dropped, and late subscribers get no replay.

mod events;

pub use events::NotificationEvent;

use crate::results::QueryId;
use futures::Stream;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default per-query channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Per-query publish/subscribe hub
pub struct NotificationBus {
    channels: RwLock<HashMap<QueryId, broadcast::Sender<NotificationEvent>>>,
    capacity: usize,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Open the channel for a query (no-op if already open)
    pub fn open(&self, query_id: &str) {
        let mut channels = self.channels.write();
        if !channels.contains_key(query_id) {
            let (tx, _) = broadcast::channel(self.capacity);
            channels.insert(query_id.to_string(), tx);
        }
    }

    /// Deliver an event to current subscribers, returning how many received it
    pub fn publish(&self, event: NotificationEvent) -> usize {
        let channels = self.channels.read();
        let Some(tx) = channels.get(event.query_id()) else {
            return 0;
        };
        // An error only means there are no receivers right now
        let delivered = tx.send(event).unwrap_or(0);
        debug!("Published to {} subscriber(s)", delivered);
        delivered
    }

    /// Subscribe to an open channel
    pub fn subscribe(&self, query_id: &str) -> Option<Subscription> {
        self.channels.read().get(query_id).map(|tx| Subscription {
            query_id: query_id.to_string(),
            receiver: Some(tx.subscribe()),
        })
    }

    /// Release a subscription
    pub fn unsubscribe(&self, subscription: Subscription) {
        debug!("Subscriber left query {}", subscription.query_id);
        drop(subscription);
    }

    /// Tear down a channel; open subscriptions drain what is buffered and end
    pub fn close(&self, query_id: &str) {
        if self.channels.write().remove(query_id).is_some() {
            debug!("Closed event channel for query {}", query_id);
        }
    }

    pub fn is_open(&self, query_id: &str) -> bool {
        self.channels.read().contains_key(query_id)
    }

    pub fn subscriber_count(&self, query_id: &str) -> usize {
        self.channels
            .read()
            .get(query_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of open channels
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving end for one query's events
pub struct Subscription {
    query_id: QueryId,
    receiver: Option<broadcast::Receiver<NotificationEvent>>,
}

impl Subscription {
    /// A subscription that has already ended
    pub fn closed(query_id: impl Into<QueryId>) -> Self {
        Self {
            query_id: query_id.into(),
            receiver: None,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Next event, or `None` once the channel is closed and drained
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscriber of query {} lagged, {} event(s) dropped",
                        self.query_id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Adapt into a stream of events
    pub fn into_stream(self) -> impl Stream<Item = NotificationEvent> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|event| (event, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn started(query_id: &str, provider: &str) -> NotificationEvent {
        NotificationEvent::ProviderStarted {
            query_id: query_id.to_string(),
            provider: provider.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = NotificationBus::default();
        assert_eq!(bus.publish(started("q1", "openai")), 0);
        bus.open("q1");
        assert_eq!(bus.publish(started("q1", "openai")), 0);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let bus = NotificationBus::default();
        bus.open("q1");
        let mut a = bus.subscribe("q1").unwrap();
        let mut b = bus.subscribe("q1").unwrap();
        assert_eq!(bus.subscriber_count("q1"), 2);

        assert_eq!(bus.publish(started("q1", "openai")), 2);
        assert_eq!(a.recv().await.unwrap().provider(), Some("openai"));
        assert_eq!(b.recv().await.unwrap().provider(), Some("openai"));
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let bus = NotificationBus::default();
        bus.open("q1");
        let _early = bus.subscribe("q1").unwrap();
        bus.publish(started("q1", "openai"));

        let mut late = bus.subscribe("q1").unwrap();
        bus.publish(started("q1", "anthropic"));
        assert_eq!(late.recv().await.unwrap().provider(), Some("anthropic"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let bus = NotificationBus::default();
        bus.open("q1");
        let subscription = bus.subscribe("q1").unwrap();
        bus.publish(started("q1", "openai"));
        bus.close("q1");

        assert!(!bus.is_open("q1"));
        assert!(bus.subscribe("q1").is_none());
        let events: Vec<_> = subscription.into_stream().collect().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_channels_are_isolated() {
        let bus = NotificationBus::default();
        bus.open("q1");
        bus.open("q2");
        let mut q2 = bus.subscribe("q2").unwrap();
        bus.publish(started("q1", "openai"));
        bus.publish(started("q2", "anthropic"));
        assert_eq!(q2.recv().await.unwrap().provider(), Some("anthropic"));
        assert_eq!(bus.channel_count(), 2);
    }

    #[tokio::test]
    async fn test_closed_subscription_ends_immediately() {
        let mut subscription = Subscription::closed("q1");
        assert!(subscription.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let bus = NotificationBus::default();
        bus.open("q1");
        let subscription = bus.subscribe("q1").unwrap();
        bus.unsubscribe(subscription);
        assert_eq!(bus.subscriber_count("q1"), 0);
    }
}
