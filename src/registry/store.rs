//! Subscriber registry implementation
//!
//! Tracks every live push-channel subscriber and fans accepted updates out to
//! all of them. Delivery is per-subscriber and independent: each subscriber
//! owns a bounded mpsc channel, and `broadcast` only ever `try_send`s, so a
//! slow or dead subscriber can never block the producer or its peers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};

use super::config::RegistryConfig;
use crate::message::PushMessage;

/// Opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Registry of currently connected push-channel subscribers
///
/// Thread-safe via `RwLock`. Broadcasting takes the read lock and never
/// awaits while holding it; removal of dead subscribers happens afterwards
/// under the write lock.
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<u64, mpsc::Sender<PushMessage>>>,
    next_id: AtomicU64,
    config: RegistryConfig,
}

impl SubscriberRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Add a subscriber to the live set.
    ///
    /// Returns the handle to unregister with and the receiving end of the
    /// subscriber's channel. Registration is valid mid-broadcast; the new
    /// subscriber sees every broadcast that starts after this call returns.
    pub async fn register(&self) -> (SubscriberHandle, mpsc::Receiver<PushMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, tx);

        tracing::info!(
            subscriber_id = id,
            subscribers = subscribers.len(),
            "Subscriber registered"
        );

        (SubscriberHandle(id), rx)
    }

    /// Remove a subscriber. Idempotent; returns false if the handle was
    /// already gone (e.g. dropped by a broadcast that found it dead).
    pub async fn unregister(&self, handle: SubscriberHandle) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&handle.id()).is_some();

        if removed {
            tracing::info!(
                subscriber_id = handle.id(),
                subscribers = subscribers.len(),
                "Subscriber unregistered"
            );
        }

        removed
    }

    /// Deliver `message` to every currently registered subscriber.
    ///
    /// Best-effort fan-out: a subscriber whose channel is full or closed is
    /// dropped from the registry on the spot, never retried. Returns the
    /// number of subscribers the message was handed to. The producer never
    /// sees a failure.
    pub async fn broadcast(&self, message: PushMessage) -> usize {
        let mut dead = Vec::new();
        let delivered = {
            let subscribers = self.subscribers.read().await;
            let mut delivered = 0;

            for (&id, tx) in subscribers.iter() {
                match tx.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(subscriber_id = id, "Subscriber buffer full, dropping");
                        dead.push(id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(subscriber_id = id, "Subscriber channel closed");
                        dead.push(id);
                    }
                }
            }

            delivered
        };

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in dead {
                subscribers.remove(&id);
            }
        }

        tracing::debug!(delivered = delivered, "Broadcast fan-out");
        delivered
    }

    /// Number of currently registered subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TransportState;

    fn state_message(bar: u32) -> PushMessage {
        PushMessage::State(TransportState {
            bar,
            ..TransportState::default()
        })
    }

    #[tokio::test]
    async fn test_register_and_count() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.subscriber_count().await, 0);

        let (h1, _rx1) = registry.register().await;
        let (h2, _rx2) = registry.register().await;

        assert_ne!(h1, h2);
        assert_eq!(registry.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all() {
        let registry = SubscriberRegistry::new();
        let (_h1, mut rx1) = registry.register().await;
        let (_h2, mut rx2) = registry.register().await;
        let (_h3, mut rx3) = registry.register().await;

        let delivered = registry.broadcast(state_message(9)).await;
        assert_eq!(delivered, 3);

        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg, state_message(9));
        }
    }

    #[tokio::test]
    async fn test_broadcast_preserves_order() {
        let registry = SubscriberRegistry::new();
        let (_h, mut rx) = registry.register().await;

        for bar in 1..=5 {
            registry.broadcast(state_message(bar)).await;
        }

        for bar in 1..=5 {
            assert_eq!(rx.recv().await.unwrap(), state_message(bar));
        }
    }

    #[tokio::test]
    async fn test_unregister_idempotent() {
        let registry = SubscriberRegistry::new();
        let (handle, _rx) = registry.register().await;

        assert!(registry.unregister(handle).await);
        assert!(!registry.unregister(handle).await);
        assert_eq!(registry.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_dead_subscriber_dropped_without_error() {
        let registry = SubscriberRegistry::new();
        let (_h1, rx1) = registry.register().await;
        let (_h2, mut rx2) = registry.register().await;

        // Simulate a disconnected subscriber
        drop(rx1);

        let delivered = registry.broadcast(state_message(2)).await;
        assert_eq!(delivered, 1);
        assert_eq!(registry.subscriber_count().await, 1);

        // The live subscriber still gets the message
        assert_eq!(rx2.recv().await.unwrap(), state_message(2));
    }

    #[tokio::test]
    async fn test_full_buffer_subscriber_dropped() {
        let registry =
            SubscriberRegistry::with_config(RegistryConfig::default().channel_capacity(1));
        let (_h, mut rx) = registry.register().await;

        registry.broadcast(state_message(1)).await;
        // Second broadcast finds the 1-slot buffer full
        let delivered = registry.broadcast(state_message(2)).await;

        assert_eq!(delivered, 0);
        assert_eq!(registry.subscriber_count().await, 0);

        // The dropped subscriber drains what it got, then sees closure
        assert_eq!(rx.recv().await.unwrap(), state_message(1));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_subscribers() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.broadcast(state_message(1)).await, 0);
    }
}
