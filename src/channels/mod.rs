/// Named realtime channels
///
/// Every WebSocket connection listens on exactly one channel at a time:
/// [`ANONYMOUS`] until the client logs in, then the channel named by its
/// user uuid. Publishing never fails; an event for a channel nobody listens
/// on is dropped and reported as delivered to zero connections.

use crate::metrics;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::{broadcast, RwLock};

/// Channel every fresh connection joins
pub const ANONYMOUS: &str = "anonymous";

/// Buffered events per channel before slow receivers start lagging
const CHANNEL_CAPACITY: usize = 64;

/// An event published to a channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub data: Value,
}

/// Registry of broadcast channels keyed by name
#[derive(Clone, Default)]
pub struct ChannelHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChannelEvent>>>>,
    connections: Arc<AtomicUsize>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel, creating it on first use
    pub async fn join(&self, name: &str) -> broadcast::Receiver<ChannelEvent> {
        if let Some(sender) = self.channels.read().await.get(name) {
            return sender.subscribe();
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Forget a channel once its last receiver is gone
    ///
    /// Callers drop their receiver first. A channel that still has
    /// listeners is left alone.
    pub async fn leave(&self, name: &str) {
        let mut channels = self.channels.write().await;
        if channels
            .get(name)
            .map(|sender| sender.receiver_count() == 0)
            .unwrap_or(false)
        {
            channels.remove(name);
            tracing::debug!(channel = name, "Closed idle realtime channel");
        }
    }

    /// Number of channels currently registered
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Publish an event; returns how many subscribers received it
    pub async fn publish(&self, name: &str, event: &str, data: Value) -> usize {
        let message = ChannelEvent {
            channel: name.to_string(),
            event: event.to_string(),
            data,
        };

        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(name) {
                Some(sender) => sender.send(message).unwrap_or(0),
                None => 0,
            }
        };

        if delivered == 0 {
            self.leave(name).await;
            tracing::debug!(channel = name, event, "No listeners for realtime event");
        }

        metrics::record_realtime_event(event, delivered > 0);
        delivered
    }

    /// Register an open connection; the count drops when the guard does
    pub fn connect(&self) -> ConnectionGuard {
        self.connections.fetch_add(1, Ordering::SeqCst);
        metrics::REALTIME_CONNECTIONS.inc();
        ConnectionGuard {
            connections: self.connections.clone(),
        }
    }

    /// Number of open realtime connections
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Keeps a connection counted while alive
pub struct ConnectionGuard {
    connections: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.connections.fetch_sub(1, Ordering::SeqCst);
        metrics::REALTIME_CONNECTIONS.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_joined_receivers() {
        let hub = ChannelHub::new();
        let mut first = hub.join("user-1").await;
        let mut second = hub.join("user-1").await;
        let mut other = hub.join("user-2").await;

        let delivered = hub
            .publish("user-1", "PresentationVerified", json!({ "isVerified": true }))
            .await;
        assert_eq!(delivered, 2);

        let received = first.recv().await.unwrap();
        assert_eq!(received.channel, "user-1");
        assert_eq!(received.event, "PresentationVerified");
        assert_eq!(received.data["isVerified"], true);
        assert_eq!(second.recv().await.unwrap(), received);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_listeners() {
        let hub = ChannelHub::new();
        assert_eq!(hub.publish("nobody", "PresentationVerified", json!({})).await, 0);

        let receiver = hub.join("gone").await;
        drop(receiver);
        assert_eq!(hub.publish("gone", "PresentationVerified", json!({})).await, 0);
        assert!(hub.channels.read().await.get("gone").is_none());
    }

    #[tokio::test]
    async fn test_leave_drops_idle_channels() {
        let hub = ChannelHub::new();
        for i in 0..100 {
            let name = format!("user-{}", i);
            let receiver = hub.join(&name).await;
            drop(receiver);
            hub.leave(&name).await;
        }
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_leave_keeps_channels_with_listeners() {
        let hub = ChannelHub::new();
        let first = hub.join("user-1").await;
        let mut second = hub.join("user-1").await;

        drop(first);
        hub.leave("user-1").await;
        assert_eq!(hub.channel_count().await, 1);
        assert_eq!(hub.publish("user-1", "presentationVerified", json!({})).await, 1);
        assert!(second.recv().await.is_ok());

        drop(second);
        hub.leave("user-1").await;
        hub.leave("never-joined").await;
        assert_eq!(hub.channel_count().await, 0);
    }

    #[test]
    fn test_connection_guard_counts() {
        let hub = ChannelHub::new();
        let a = hub.connect();
        let b = hub.connect();
        assert_eq!(hub.connection_count(), 2);
        drop(a);
        assert_eq!(hub.connection_count(), 1);
        drop(b);
        assert_eq!(hub.connection_count(), 0);
    }
}
