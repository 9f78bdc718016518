//! Explicit publish/subscribe for cart and checkout changes.
//!
//! Views that need to refresh when another view changes the cart or the
//! checkout selection hold a [`Subscription`]; dropping it unsubscribes.
//! When a NATS client is attached every event is also forwarded to
//! `storefront.events.<kind>`.

use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::events::DomainEvent;

const SUBJECT_PREFIX: &str = "storefront.events";

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, nats: None }
    }

    pub fn with_nats(mut self, client: async_nats::Client) -> Self {
        self.nats = Some(client);
        self
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { receiver: self.sender.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver `event` to current subscribers and forward it to NATS if
    /// configured. Returns the number of local subscribers reached.
    pub fn publish(&self, event: DomainEvent) -> usize {
        tracing::debug!(kind = event.kind(), ?event, "publishing event");
        if let Some(client) = &self.nats {
            self.forward(client.clone(), &event);
        }
        // No subscribers is a normal state, not an error.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    fn forward(&self, client: async_nats::Client, event: &DomainEvent) {
        let subject = format!("{SUBJECT_PREFIX}.{}", event.kind());
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, %subject, "failed to encode event");
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                tracing::error!(error = %e, %subject, "failed to publish event to NATS");
            }
        });
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl Subscription {
    /// Next event, or `None` once every publisher is gone. A subscriber that
    /// falls behind skips the overwritten events.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
